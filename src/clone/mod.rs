//! Cloning orchestrator
//!
//! Drives the end-to-end workflow as an explicit state machine:
//!
//! `Init → RegistryLoaded → SourceFound → TargetStandardCreated →
//!  ControlsCreated → RulesAttached → Linked → Done`
//!
//! Rule attachment is deliberately a separate phase from control creation:
//! the target API drops rules attached immediately after their control is
//! created, so the orchestrator collects every control's rules first and
//! attaches them after a settling delay. Per-entity failures (one control,
//! one rule batch) are recorded and the run continues; failures of the
//! registry load, source lookup, target standard creation or final link are
//! fatal.

pub mod mapper;
pub mod summary;
pub mod validator;

use std::fmt;
use std::time::Duration;

use log::{info, warn};

use crate::api::models::{Registry, SourceRule, Standard};
use crate::api::{ComplianceGateway, RetryConfig, RetryPolicy};
use crate::error::{Error, Result};

pub use summary::{CloneReport, FailedRuleBatch, SkippedControl};

const STANDARDS_PAGE_SIZE: usize = 100;
const ID_RECOVERY_ATTEMPTS: u32 = 3;

/// Workflow states, used to label fatal failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    RegistryLoaded,
    SourceFound,
    TargetStandardCreated,
    ControlsCreated,
    RulesAttached,
    Linked,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Init => "registry load",
            Phase::RegistryLoaded => "source standard lookup",
            Phase::SourceFound => "target standard creation",
            Phase::TargetStandardCreated => "control creation",
            Phase::ControlsCreated => "rule attachment",
            Phase::RulesAttached => "control linking",
            Phase::Linked => "finalization",
            Phase::Done => "done",
        };
        f.write_str(s)
    }
}

/// A fatal step failure; the run ends in the `Failed` state.
#[derive(Debug, thiserror::Error)]
#[error("clone failed during {phase}: {error}")]
pub struct FatalError {
    pub phase: Phase,
    #[source]
    pub error: Error,
}

/// Bookkeeping for one successfully created target control, carried from
/// the creation phase into the rule-attachment phase.
#[derive(Debug, Clone)]
struct CreatedControl {
    source_id: String,
    target_id: String,
    name: String,
    rules: Vec<SourceRule>,
}

/// The cloning orchestrator. Generic over the gateway so the whole workflow
/// can run against an in-memory implementation in tests.
pub struct Cloner<G> {
    gateway: G,
    prefix: String,
    retry: RetryPolicy,
    settle_delay: Duration,
}

impl<G: ComplianceGateway> Cloner<G> {
    pub fn new(gateway: G, prefix: impl Into<String>) -> Self {
        Self {
            gateway,
            prefix: prefix.into(),
            retry: RetryPolicy::default(),
            settle_delay: Duration::from_secs(2),
        }
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry = RetryPolicy::new(config);
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Run the full clone workflow for one named standard.
    pub async fn run(&self, standard_name: &str) -> std::result::Result<CloneReport, FatalError> {
        let fatal = |phase: Phase| move |error: Error| FatalError { phase, error };

        info!("cloning standard '{standard_name}' with prefix '{}'", self.prefix);

        let registry = self.load_registry().await.map_err(fatal(Phase::Init))?;

        let source = self
            .find_source_standard(standard_name)
            .await
            .map_err(fatal(Phase::RegistryLoaded))?;
        info!(
            "found source standard '{}' ({}) with {} controls",
            source.name,
            source.id,
            source.controls_ids.len()
        );

        let target_name = mapper::target_standard_name(&source.name, &self.prefix);
        let target_id = self
            .ensure_target_standard(&source, &target_name)
            .await
            .map_err(fatal(Phase::SourceFound))?;
        info!("target standard '{target_name}' ready ({target_id})");

        let mut report = CloneReport {
            source_standard: source.name.clone(),
            target_standard: target_name,
            target_standard_id: target_id.clone(),
            controls_total: source.controls_ids.len(),
            ..CloneReport::default()
        };

        // Phase 1: create every control, remembering its rules for later.
        let mut created = Vec::new();
        for source_control_id in &source.controls_ids {
            match self.clone_control(source_control_id, &registry).await {
                Ok(control) => {
                    info!(
                        "created control '{}' from source {} ({} rules pending)",
                        control.name,
                        control.source_id,
                        control.rules.len()
                    );
                    report.rules_total += control.rules.len();
                    created.push(control);
                }
                Err(error) => {
                    warn!("skipping control {source_control_id}: {error}");
                    report.skipped_controls.push(SkippedControl {
                        source_id: source_control_id.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }
        report.controls_created = created.len();

        // Phase 2: attach rules only after the target has settled. Rules
        // attached immediately after control creation were silently dropped.
        if created.iter().any(|c| !c.rules.is_empty()) {
            tokio::time::sleep(self.settle_delay).await;
        }
        for control in &created {
            if control.rules.is_empty() {
                continue;
            }
            match self.attach_rules(control).await {
                Ok(attached) => {
                    info!("attached {attached} rules to '{}'", control.name);
                    report.rules_attached += attached;
                }
                Err(error) => {
                    warn!("failed to attach rules to '{}': {error}", control.name);
                    report.failed_rule_batches.push(FailedRuleBatch {
                        control_id: control.target_id.clone(),
                        control_name: control.name.clone(),
                        rules: control.rules.len(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        // Link whatever was created. The standard stays populated but
        // unlinked if this fails; rollback is out of scope.
        let new_ids: Vec<String> = created.iter().map(|c| c.target_id.clone()).collect();
        if new_ids.is_empty() {
            warn!("no controls were created, nothing to link");
        } else {
            self.link_controls(&target_id, &new_ids)
                .await
                .map_err(fatal(Phase::RulesAttached))?;
            info!("linked {} controls to '{}'", new_ids.len(), report.target_standard);
        }

        Ok(report)
    }

    async fn load_registry(&self) -> Result<Registry> {
        let registry = self
            .retry
            .execute("get_control_categories_and_subcategories", || {
                self.gateway.get_registry()
            })
            .await?;
        info!("loaded {} valid categories", registry.category_count());
        if registry.is_empty() {
            warn!("category registry is empty, all controls will use the fallback pair");
        }
        Ok(registry)
    }

    /// Exact name filter first; some tenants ignore the filter, so fall
    /// back to scanning pages. Multiple matches resolve to the first with a
    /// logged ambiguity.
    async fn find_source_standard(&self, name: &str) -> Result<Standard> {
        let mut matches: Vec<Standard> = self
            .retry
            .execute("get_standards", || self.gateway.search_standards(name))
            .await?
            .into_iter()
            .filter(|s| s.name.eq_ignore_ascii_case(name))
            .collect();

        if matches.is_empty() {
            let mut search_from = 0;
            loop {
                let page = self
                    .retry
                    .execute("get_standards (scan)", || {
                        self.gateway
                            .list_standards(search_from, search_from + STANDARDS_PAGE_SIZE)
                    })
                    .await?;
                if page.is_empty() {
                    break;
                }
                matches.extend(
                    page.into_iter()
                        .filter(|s| s.name.eq_ignore_ascii_case(name)),
                );
                if !matches.is_empty() {
                    break;
                }
                search_from += STANDARDS_PAGE_SIZE;
            }
        }

        if matches.len() > 1 {
            warn!(
                "{} standards match '{name}', using the first ({})",
                matches.len(),
                matches[0].id
            );
        }
        matches
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Create the target standard, or reuse one with the target name left
    /// over from an earlier run. `add_standard` sometimes acks without an
    /// id; in that case the id is recovered by name lookup after a settle.
    async fn ensure_target_standard(&self, source: &Standard, target_name: &str) -> Result<String> {
        let existing = self
            .retry
            .execute("get_standards", || self.gateway.search_standards(target_name))
            .await?;
        if let Some(standard) = existing
            .into_iter()
            .find(|s| s.name.eq_ignore_ascii_case(target_name))
        {
            info!("target standard already exists, reusing {}", standard.id);
            return Ok(standard.id);
        }

        let payload = mapper::map_standard(source, &self.prefix);
        if let Some(id) = self
            .retry
            .execute("add_standard", || self.gateway.create_standard(&payload))
            .await?
        {
            return Ok(id);
        }

        tokio::time::sleep(self.settle_delay).await;
        let found = self
            .retry
            .execute("get_standards", || self.gateway.search_standards(target_name))
            .await?;
        found
            .into_iter()
            .find(|s| s.name.eq_ignore_ascii_case(target_name))
            .map(|s| s.id)
            .ok_or_else(|| {
                Error::Transport(format!(
                    "standard '{target_name}' was created but cannot be found yet"
                ))
            })
    }

    /// One control's read + map + create, each API call under its own
    /// retry. Any failure here skips only this control.
    async fn clone_control(&self, source_control_id: &str, registry: &Registry) -> Result<CreatedControl> {
        let detail = self
            .retry
            .execute("get_control", || self.gateway.get_control(source_control_id))
            .await?
            .ok_or_else(|| Error::NotFound(format!("control '{source_control_id}'")))?;

        let payload = mapper::map_control(&detail, &self.prefix, registry)?;

        let target_id = match self
            .retry
            .execute("add_control", || self.gateway.create_control(&payload))
            .await?
        {
            Some(id) => id,
            None => self.recover_control_id(&payload.control_name).await?,
        };

        Ok(CreatedControl {
            source_id: detail.id,
            target_id,
            name: payload.control_name,
            rules: detail.rules,
        })
    }

    /// `add_control` acked without an id; poll the name lookup until the
    /// new control becomes visible.
    async fn recover_control_id(&self, control_name: &str) -> Result<String> {
        for _ in 0..ID_RECOVERY_ATTEMPTS {
            tokio::time::sleep(self.settle_delay).await;
            let found = self
                .retry
                .execute("get_controls", || {
                    self.gateway.find_controls_by_name(control_name)
                })
                .await?;
            if let Some(control) = found.into_iter().next() {
                return Ok(control.id);
            }
        }
        Err(Error::Transport(format!(
            "control '{control_name}' was created but cannot be found yet"
        )))
    }

    /// Map and attach one control's rules as a single batch. Returns the
    /// number of rules attached; rules missing identity fields are skipped
    /// with a warning and an unmappable severity fails the whole batch.
    async fn attach_rules(&self, control: &CreatedControl) -> Result<usize> {
        let mut payloads = Vec::with_capacity(control.rules.len());
        for rule in &control.rules {
            match mapper::map_rule(rule, &self.prefix)? {
                Some(mapped) => {
                    if let Some(original) = &mapped.coerced_type {
                        warn!(
                            "rule '{}': type '{original}' not supported by the API, recreating as '{}'",
                            mapped.payload.name,
                            validator::ACCEPTED_RULE_TYPE
                        );
                    }
                    if mapped.dropped_assets > 0 {
                        warn!(
                            "rule '{}': dropping {} scannable assets the API refuses at creation",
                            mapped.payload.name, mapped.dropped_assets
                        );
                    }
                    payloads.push(mapped.payload);
                }
                None => {
                    warn!(
                        "skipping rule without name or logical_id on control '{}'",
                        control.name
                    );
                }
            }
        }

        if payloads.is_empty() {
            return Ok(0);
        }

        self.retry
            .execute("add_rules_to_control", || {
                self.gateway
                    .add_rules_to_control(&control.target_id, &payloads)
            })
            .await?;
        Ok(payloads.len())
    }

    /// One `edit_standard` call linking every created control, merged with
    /// the ids already on the standard so reruns keep earlier links.
    async fn link_controls(&self, standard_id: &str, new_ids: &[String]) -> Result<()> {
        let existing = self
            .retry
            .execute("get_standards", || self.gateway.get_standard(standard_id))
            .await?
            .map(|s| s.controls_ids)
            .unwrap_or_default();

        let mut combined = existing;
        for id in new_ids {
            if !combined.contains(id) {
                combined.push(id.clone());
            }
        }

        self.retry
            .execute("edit_standard", || {
                self.gateway.edit_standard(standard_id, &combined)
            })
            .await
    }
}
