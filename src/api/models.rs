//! Wire types for the Cortex compliance API
//!
//! Source entities are deserialized leniently (the API is inconsistent about
//! which fields it populates); creation payloads serialize exactly the shape
//! the `add_*` endpoints accept.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A compliance standard as returned by `get_standards`.
#[derive(Debug, Clone, Deserialize)]
pub struct Standard {
    pub id: String,
    #[serde(alias = "standard_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub controls_ids: Vec<String>,
}

/// Full control detail from `get_control`, including its embedded rules.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlDetail {
    pub id: String,
    #[serde(alias = "control_name")]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default, alias = "compliance_rules")]
    pub rules: Vec<SourceRule>,
}

/// Slim control record from `get_controls` searches.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlSummary {
    pub id: String,
    #[serde(alias = "control_name")]
    pub name: String,
}

/// A rule as embedded in a source control. All fields are optional on the
/// wire; the mapper decides which absences are fatal for a given rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceRule {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logical_id: Option<String>,
    #[serde(default, rename = "type")]
    pub rule_type: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub remediation_steps: Option<String>,
    #[serde(default)]
    pub mitigation: Option<String>,
    #[serde(default)]
    pub scannable_assets: Vec<String>,
    #[serde(default)]
    pub generate_findings: Option<bool>,
    #[serde(default)]
    pub generate_issues: Option<bool>,
    #[serde(default)]
    pub generate_scan_logs: Option<bool>,
}

/// The five severities the target API accepts, serialized lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        };
        f.write_str(s)
    }
}

/// Valid category → subcategory reference data, fetched once per run and
/// treated as immutable. BTreeMap keeps fallback selection deterministic.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    categories: BTreeMap<String, Vec<String>>,
}

impl Registry {
    pub fn new(categories: BTreeMap<String, Vec<String>>) -> Self {
        Self { categories }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    pub fn subcategories(&self, category: &str) -> &[String] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Body of `add_standard`'s `request_data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateStandardPayload {
    pub standard_name: String,
    pub description: String,
    pub labels: Vec<String>,
    pub controls_ids: Vec<String>,
}

/// Body of `add_control`'s `request_data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateControlPayload {
    pub control_name: String,
    pub category: String,
    pub subcategory: String,
    pub severity: Severity,
    pub description: String,
}

/// One entry of `add_rules_to_control`'s `rules` array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateRulePayload {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    pub logical_id: String,
    pub severity: Severity,
    pub scannable_assets: Vec<String>,
    pub remediation_steps: String,
    pub generate_findings: bool,
    pub generate_issues: bool,
    pub generate_scan_logs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn standard_deserializes_with_missing_optionals() {
        let std: Standard =
            serde_json::from_value(json!({"id": "std-1", "name": "CIS AWS"})).unwrap();
        assert_eq!(std.id, "std-1");
        assert!(std.labels.is_empty());
        assert!(std.controls_ids.is_empty());
    }

    #[test]
    fn control_accepts_control_name_alias() {
        let ctl: ControlDetail = serde_json::from_value(json!({
            "id": "c-1",
            "control_name": "1.1 Ensure MFA",
            "compliance_rules": [{"name": "r", "logical_id": "lid"}]
        }))
        .unwrap();
        assert_eq!(ctl.name, "1.1 Ensure MFA");
        assert_eq!(ctl.rules.len(), 1);
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Severity::Critical).unwrap(), json!("critical"));
        assert_eq!(serde_json::to_value(Severity::Info).unwrap(), json!("info"));
    }

    #[test]
    fn rule_payload_renames_type_field() {
        let payload = CreateRulePayload {
            name: "r".into(),
            description: String::new(),
            rule_type: "Identity".into(),
            logical_id: "lid".into(),
            severity: Severity::Low,
            scannable_assets: vec![],
            remediation_steps: String::new(),
            generate_findings: true,
            generate_issues: true,
            generate_scan_logs: true,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], json!("Identity"));
        assert!(value.get("rule_type").is_none());
    }
}
