//! Run summary
//!
//! Per-phase bookkeeping collected by the orchestrator and printed at the
//! end of the run. Partial failures live here so the final output can be
//! reconciled against the warnings logged while they happened.

use colored::Colorize;

/// A source control that could not be cloned.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedControl {
    pub source_id: String,
    pub reason: String,
}

/// A created control whose rule batch could not be attached.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedRuleBatch {
    pub control_id: String,
    pub control_name: String,
    pub rules: usize,
    pub reason: String,
}

/// Final outcome of a clone run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloneReport {
    pub source_standard: String,
    pub target_standard: String,
    pub target_standard_id: String,
    pub controls_total: usize,
    pub controls_created: usize,
    pub rules_total: usize,
    pub rules_attached: usize,
    pub skipped_controls: Vec<SkippedControl>,
    pub failed_rule_batches: Vec<FailedRuleBatch>,
}

impl CloneReport {
    pub fn has_failures(&self) -> bool {
        !self.skipped_controls.is_empty() || !self.failed_rule_batches.is_empty()
    }

    /// Human-readable summary on stdout.
    pub fn print(&self) {
        let line = "=".repeat(60);
        println!("\n{line}");
        println!("{}", "CLONE SUMMARY".bold());
        println!("{line}");
        println!("Source Standard: {}", self.source_standard);
        println!("Target Standard: {}", self.target_standard.bright_green());
        println!("Target Standard ID: {}", self.target_standard_id);
        println!(
            "Controls Cloned: {}",
            format!("{}/{}", self.controls_created, self.controls_total).bright_yellow()
        );
        println!(
            "Rules Attached: {}",
            format!("{}/{}", self.rules_attached, self.rules_total).bright_yellow()
        );

        if !self.skipped_controls.is_empty() {
            println!("\n{}", "Skipped Controls:".red().bold());
            for skipped in &self.skipped_controls {
                println!("  - {}: {}", skipped.source_id, skipped.reason);
            }
        }

        if !self.failed_rule_batches.is_empty() {
            println!("\n{}", "Failed Rule Batches:".red().bold());
            for failed in &self.failed_rule_batches {
                println!(
                    "  - Control '{}': {} rules failed ({})",
                    failed.control_name, failed.rules, failed.reason
                );
            }
        }

        if !self.has_failures() {
            println!("\n{}", "All entities cloned successfully.".green());
        }
        println!("{line}\n");
    }
}
