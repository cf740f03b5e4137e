//! Command line interface

use clap::Parser;

/// Clone a Cortex compliance standard with all of its controls and rules.
#[derive(Debug, Parser)]
#[command(name = "cortex-compliance-cloner", version)]
#[command(about = "Clone a Cortex XSIAM/XDR compliance standard with all controls and rules")]
pub struct Cli {
    /// API key for the tenant
    #[arg(long, env = "CORTEX_API_KEY", hide_env_values = true)]
    pub key: String,

    /// API key id matching the key
    #[arg(long = "id", env = "CORTEX_API_KEY_ID")]
    pub key_id: String,

    /// Tenant FQDN, e.g. api-example.xdr.eu.paloaltonetworks.com
    #[arg(long, env = "CORTEX_TENANT")]
    pub tenant: String,

    /// Name of the standard to clone
    #[arg(long)]
    pub standard: String,

    /// Prefix for cloned items
    #[arg(long, default_value = "Clone - ")]
    pub prefix: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_arguments() {
        let cli = Cli::parse_from([
            "cortex-compliance-cloner",
            "--key",
            "k",
            "--id",
            "1",
            "--tenant",
            "api-t.example.com",
            "--standard",
            "CIS AWS Foundations Benchmark",
        ]);
        assert_eq!(cli.standard, "CIS AWS Foundations Benchmark");
        assert_eq!(cli.prefix, "Clone - ");
        assert!(!cli.debug);
    }

    #[test]
    fn prefix_is_overridable() {
        let cli = Cli::parse_from([
            "cortex-compliance-cloner",
            "--key",
            "k",
            "--id",
            "1",
            "--tenant",
            "t",
            "--standard",
            "ISO 27001",
            "--prefix",
            "MyCompany - ",
            "--debug",
        ]);
        assert_eq!(cli.prefix, "MyCompany - ");
        assert!(cli.debug);
    }
}
