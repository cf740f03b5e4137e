use anyhow::Result;
use clap::Parser;
use log::error;

use cortex_compliance_cloner::api::CortexClient;
use cortex_compliance_cloner::cli::Cli;
use cortex_compliance_cloner::clone::Cloner;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let client = CortexClient::new(&cli.tenant, cli.key, cli.key_id)?;
    let cloner = Cloner::new(client, cli.prefix);

    match cloner.run(&cli.standard).await {
        Ok(report) => {
            report.print();
            Ok(())
        }
        Err(fatal) => {
            error!("{fatal}");
            std::process::exit(1);
        }
    }
}
