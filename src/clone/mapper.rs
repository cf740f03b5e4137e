//! Source entity → creation payload transforms
//!
//! Pure transforms with no I/O. Anything the caller should warn about
//! (coerced rule types, dropped scannable assets) is reported in the return
//! value rather than logged here.

use crate::api::models::{
    ControlDetail, CreateControlPayload, CreateRulePayload, CreateStandardPayload, Registry,
    Severity, SourceRule, Standard,
};
use crate::clone::validator;
use crate::error::Result;

/// Field length limits enforced by the target API.
pub const MAX_NAME_LEN: usize = 200;
pub const MAX_TEXT_LEN: usize = 2000;
pub const MAX_LOGICAL_ID_LEN: usize = 100;

/// A mapped rule plus the normalizations applied to it, so the caller can
/// surface them as warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRule {
    pub payload: CreateRulePayload,
    /// The source rule type when it differed from the accepted value.
    pub coerced_type: Option<String>,
    /// Number of scannable assets dropped from the source rule.
    pub dropped_assets: usize,
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Build the target standard's name from the run prefix.
pub fn target_standard_name(source_name: &str, prefix: &str) -> String {
    truncate(&format!("{prefix}{source_name}"), MAX_NAME_LEN)
}

pub fn map_standard(source: &Standard, prefix: &str) -> CreateStandardPayload {
    CreateStandardPayload {
        standard_name: target_standard_name(&source.name, prefix),
        description: truncate(&source.description, MAX_TEXT_LEN),
        labels: source.labels.clone(),
        controls_ids: Vec::new(),
    }
}

/// Map a source control into an `add_control` payload. The (category,
/// subcategory) pair is forced into the registry; a declared severity must
/// normalize or the whole control fails, while an absent one defaults to
/// medium.
pub fn map_control(
    source: &ControlDetail,
    prefix: &str,
    registry: &Registry,
) -> Result<CreateControlPayload> {
    let (category, subcategory) = validator::fix_category(
        registry,
        source.category.as_deref(),
        source.subcategory.as_deref(),
    );

    let severity = match source.severity.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => validator::normalize_severity(s)?,
        _ => Severity::Medium,
    };

    Ok(CreateControlPayload {
        control_name: truncate(&format!("{prefix}{}", source.name), MAX_NAME_LEN),
        category,
        subcategory,
        severity,
        description: truncate(&source.description, MAX_TEXT_LEN),
    })
}

/// Map a source rule into an `add_rules_to_control` entry. Returns
/// `Ok(None)` for rules missing the identifying fields the API requires; a
/// declared-but-unmappable severity propagates as a `Mapping` error.
pub fn map_rule(source: &SourceRule, prefix: &str) -> Result<Option<MappedRule>> {
    let (name, logical_id) = match (source.name.as_deref(), source.logical_id.as_deref()) {
        (Some(name), Some(lid)) if !name.is_empty() && !lid.is_empty() => (name, lid),
        _ => return Ok(None),
    };

    let severity = match source.severity.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => validator::normalize_severity(s)?,
        _ => Severity::Low,
    };

    let (rule_type, coerced_type) = validator::coerce_rule_type(source.rule_type.as_deref());

    // remediation_steps is preferred; older tenants expose the same text
    // under mitigation.
    let remediation = source
        .remediation_steps
        .as_deref()
        .or(source.mitigation.as_deref())
        .unwrap_or_default();

    // Keep the clone's logical_id unique on the target by prefixing it.
    let id_prefix = prefix.replace(' ', "_");
    let logical_id = truncate(&format!("{id_prefix}{logical_id}"), MAX_LOGICAL_ID_LEN);

    let payload = CreateRulePayload {
        name: truncate(name, MAX_NAME_LEN),
        description: truncate(source.description.as_deref().unwrap_or_default(), MAX_TEXT_LEN),
        rule_type: rule_type.to_string(),
        logical_id,
        severity,
        // The API refuses rules with scannable assets on creation; the
        // source assets are surfaced only via dropped_assets.
        scannable_assets: Vec::new(),
        remediation_steps: truncate(remediation, MAX_TEXT_LEN),
        generate_findings: source.generate_findings.unwrap_or(true),
        generate_issues: source.generate_issues.unwrap_or(true),
        generate_scan_logs: source.generate_scan_logs.unwrap_or(true),
    };

    Ok(Some(MappedRule {
        payload,
        coerced_type,
        dropped_assets: source.scannable_assets.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::BTreeMap;

    fn registry() -> Registry {
        let mut map = BTreeMap::new();
        map.insert("Access Control".to_string(), vec!["1.1".to_string()]);
        map.insert("Identity".to_string(), vec!["2.1".to_string(), "2.2".to_string()]);
        Registry::new(map)
    }

    fn rule(name: &str, logical_id: &str) -> SourceRule {
        SourceRule {
            name: Some(name.to_string()),
            logical_id: Some(logical_id.to_string()),
            ..SourceRule::default()
        }
    }

    #[test]
    fn standard_name_is_prefixed() {
        let source = Standard {
            id: "s1".into(),
            name: "CIS AWS Foundations Benchmark".into(),
            description: "AWS baseline".into(),
            labels: vec!["aws".into()],
            controls_ids: vec!["c1".into()],
        };
        let payload = map_standard(&source, "MyCompany - ");
        assert_eq!(payload.standard_name, "MyCompany - CIS AWS Foundations Benchmark");
        assert_eq!(payload.description, "AWS baseline");
        assert_eq!(payload.labels, vec!["aws".to_string()]);
        assert!(payload.controls_ids.is_empty());
    }

    #[test]
    fn control_with_declared_severity_normalizes_it() {
        let source = ControlDetail {
            id: "c1".into(),
            name: "2.1 Ensure logging".into(),
            category: Some("Identity".into()),
            subcategory: Some("2.2".into()),
            description: "desc".into(),
            severity: Some("SEV_020_LOW".into()),
            rules: vec![],
        };
        let payload = map_control(&source, "Clone - ", &registry()).unwrap();
        assert_eq!(payload.control_name, "Clone - 2.1 Ensure logging");
        assert_eq!(payload.severity, Severity::Low);
        assert_eq!(payload.category, "Identity");
        assert_eq!(payload.subcategory, "2.2");
    }

    #[test]
    fn control_without_severity_defaults_to_medium() {
        let source = ControlDetail {
            id: "c1".into(),
            name: "ctl".into(),
            category: None,
            subcategory: None,
            description: String::new(),
            severity: None,
            rules: vec![],
        };
        let payload = map_control(&source, "", &registry()).unwrap();
        assert_eq!(payload.severity, Severity::Medium);
        assert_eq!(payload.category, "Access Control");
        assert_eq!(payload.subcategory, "1.1");
    }

    #[test]
    fn control_with_unmappable_severity_fails_loudly() {
        let source = ControlDetail {
            id: "c1".into(),
            name: "ctl".into(),
            category: None,
            subcategory: None,
            description: String::new(),
            severity: Some("urgent".into()),
            rules: vec![],
        };
        assert!(matches!(
            map_control(&source, "", &registry()),
            Err(Error::Mapping(_))
        ));
    }

    #[test]
    fn rule_assets_are_always_dropped() {
        let mut source = rule("r1", "lid-1");
        source.scannable_assets = vec!["vm-a".into(), "vm-b".into()];
        let mapped = map_rule(&source, "Clone - ").unwrap().unwrap();
        assert!(mapped.payload.scannable_assets.is_empty());
        assert_eq!(mapped.dropped_assets, 2);
    }

    #[test]
    fn rule_type_is_coerced_with_record() {
        let mut source = rule("r1", "lid-1");
        source.rule_type = Some("Config".into());
        let mapped = map_rule(&source, "").unwrap().unwrap();
        assert_eq!(mapped.payload.rule_type, "Identity");
        assert_eq!(mapped.coerced_type.as_deref(), Some("Config"));

        source.rule_type = Some("Identity".into());
        let mapped = map_rule(&source, "").unwrap().unwrap();
        assert!(mapped.coerced_type.is_none());
    }

    #[test]
    fn rule_logical_id_is_prefixed_and_bounded() {
        let mapped = map_rule(&rule("r1", "lid-1"), "My Clone - ").unwrap().unwrap();
        assert_eq!(mapped.payload.logical_id, "My_Clone_-_lid-1");

        let long_id = "x".repeat(300);
        let mapped = map_rule(&rule("r1", &long_id), "p_").unwrap().unwrap();
        assert_eq!(mapped.payload.logical_id.chars().count(), MAX_LOGICAL_ID_LEN);
    }

    #[test]
    fn rule_without_identity_fields_is_skipped() {
        assert!(map_rule(&SourceRule::default(), "").unwrap().is_none());
        let mut source = rule("named", "");
        source.logical_id = None;
        assert!(map_rule(&source, "").unwrap().is_none());
    }

    #[test]
    fn rule_remediation_falls_back_to_mitigation() {
        let mut source = rule("r1", "lid-1");
        source.mitigation = Some("rotate the key".into());
        let mapped = map_rule(&source, "").unwrap().unwrap();
        assert_eq!(mapped.payload.remediation_steps, "rotate the key");

        source.remediation_steps = Some("use the console".into());
        let mapped = map_rule(&source, "").unwrap().unwrap();
        assert_eq!(mapped.payload.remediation_steps, "use the console");
    }

    #[test]
    fn rule_with_unknown_severity_propagates_mapping_error() {
        let mut source = rule("r1", "lid-1");
        source.severity = Some("SEV_999_X".into());
        assert!(matches!(map_rule(&source, ""), Err(Error::Mapping(_))));
    }

    #[test]
    fn names_are_truncated_to_api_limit() {
        let long = "n".repeat(500);
        let mapped = map_rule(&rule(&long, "lid"), "").unwrap().unwrap();
        assert_eq!(mapped.payload.name.chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn descriptions_are_truncated_to_api_limit() {
        let long = "d".repeat(MAX_TEXT_LEN + 100);

        let standard = Standard {
            id: "s1".into(),
            name: "CIS".into(),
            description: long.clone(),
            labels: vec![],
            controls_ids: vec![],
        };
        let payload = map_standard(&standard, "");
        assert_eq!(payload.description.chars().count(), MAX_TEXT_LEN);

        let control = ControlDetail {
            id: "c1".into(),
            name: "ctl".into(),
            category: None,
            subcategory: None,
            description: long.clone(),
            severity: None,
            rules: vec![],
        };
        let payload = map_control(&control, "", &registry()).unwrap();
        assert_eq!(payload.description.chars().count(), MAX_TEXT_LEN);

        let mut source = rule("r1", "lid-1");
        source.description = Some(long);
        let mapped = map_rule(&source, "").unwrap().unwrap();
        assert_eq!(mapped.payload.description.chars().count(), MAX_TEXT_LEN);
    }
}
