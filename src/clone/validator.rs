//! Normalization against the target API's undocumented validation rules
//!
//! The `add_control` and `add_rules_to_control` endpoints silently reject
//! payloads whose category, subcategory, type or severity fall outside the
//! sets they accept. Everything here maps source values into those sets
//! before anything is sent.

use log::warn;

use crate::api::models::{Registry, Severity};
use crate::error::{Error, Result};

/// Default pair used when the source category is absent or matches nothing
/// in the registry.
pub const DEFAULT_CATEGORY: &str = "Access Control";
pub const DEFAULT_SUBCATEGORY: &str = "1.1";

/// The only rule type `add_rules_to_control` accepts.
pub const ACCEPTED_RULE_TYPE: &str = "Identity";

/// Resolve a candidate (category, subcategory) pair into one the registry
/// accepts. Valid input passes through unchanged; an invalid subcategory
/// falls back to the first subcategory of the resolved category; an invalid
/// category falls back to the default pair. Deterministic for a given
/// registry and input.
pub fn fix_category(
    registry: &Registry,
    category: Option<&str>,
    subcategory: Option<&str>,
) -> (String, String) {
    let category = match resolve_category(registry, category) {
        Some(cat) => cat,
        None => {
            if let Some(raw) = category.filter(|c| !c.trim().is_empty()) {
                warn!("category '{raw}' not in registry, using fallback '{DEFAULT_CATEGORY}'");
            }
            DEFAULT_CATEGORY.to_string()
        }
    };

    let subcategory = resolve_subcategory(registry, &category, subcategory);
    (category, subcategory)
}

fn resolve_category(registry: &Registry, raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if registry.contains_category(raw) {
        return Some(raw.to_string());
    }

    let raw_lower = raw.to_lowercase();
    // Case-insensitive match first, then substring leniency either way
    // ("Access" matches "Access Control" and vice versa).
    if let Some(cat) = registry
        .category_names()
        .find(|c| c.to_lowercase() == raw_lower)
    {
        return Some(cat.to_string());
    }
    registry
        .category_names()
        .find(|c| {
            let c_lower = c.to_lowercase();
            c_lower.contains(&raw_lower) || raw_lower.contains(&c_lower)
        })
        .map(str::to_string)
}

fn resolve_subcategory(registry: &Registry, category: &str, raw: Option<&str>) -> String {
    let valid = registry.subcategories(category);

    if let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) {
        if let Some(sub) = valid.iter().find(|s| s.eq_ignore_ascii_case(raw)) {
            return sub.clone();
        }
        warn!("subcategory '{raw}' not valid under '{category}', using first valid subcategory");
    }

    valid
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_SUBCATEGORY.to_string())
}

/// Map a raw severity token to one of the five accepted values. Covers the
/// canonical spellings, the `informational` variant, and the legacy coded
/// ladder (`SEV_020_LOW` etc). Anything else is a data-quality defect in
/// the source and fails rather than defaulting.
pub fn normalize_severity(token: &str) -> Result<Severity> {
    let severity = match token.trim().to_lowercase().as_str() {
        "critical" | "sev_050_critical" => Severity::Critical,
        "high" | "sev_040_high" => Severity::High,
        "medium" | "sev_030_medium" => Severity::Medium,
        "low" | "sev_020_low" => Severity::Low,
        "info" | "informational" | "sev_010_info" => Severity::Info,
        _ => return Err(Error::Mapping(format!("unknown severity token '{token}'"))),
    };
    if !token.trim().eq_ignore_ascii_case(&severity.to_string()) {
        warn!("severity '{token}' normalized to '{severity}'");
    }
    Ok(severity)
}

/// Force a rule type to the single accepted value, reporting the original
/// when it differed so the caller can surface a warning.
pub fn coerce_rule_type(token: Option<&str>) -> (&'static str, Option<String>) {
    match token {
        Some(t) if !t.is_empty() && t != ACCEPTED_RULE_TYPE => {
            (ACCEPTED_RULE_TYPE, Some(t.to_string()))
        }
        _ => (ACCEPTED_RULE_TYPE, None),
    }
}
