//! Gateway trait over the compliance API
//!
//! The orchestrator only ever talks to this trait, so tests can drive the
//! whole workflow against an in-memory implementation.

use async_trait::async_trait;

use super::models::{
    ControlDetail, ControlSummary, CreateControlPayload, CreateRulePayload,
    CreateStandardPayload, Registry, Standard,
};
use crate::error::Result;

/// The eight compliance endpoint operations the cloner depends on.
///
/// `create_*` return `Ok(None)` when the API acknowledged the write without
/// echoing the new entity id; the caller then recovers the id by lookup.
#[async_trait]
pub trait ComplianceGateway: Send + Sync {
    /// `get_control_categories_and_subcategories`
    async fn get_registry(&self) -> Result<Registry>;

    /// `get_standards` with an exact name filter.
    async fn search_standards(&self, name: &str) -> Result<Vec<Standard>>;

    /// `get_standards` paged, for tenants where the name filter is a no-op.
    async fn list_standards(&self, search_from: usize, search_to: usize) -> Result<Vec<Standard>>;

    /// `get_standards` with an id filter.
    async fn get_standard(&self, id: &str) -> Result<Option<Standard>>;

    /// `add_standard`
    async fn create_standard(&self, payload: &CreateStandardPayload) -> Result<Option<String>>;

    /// `edit_standard`, replacing the standard's linked control ids.
    async fn edit_standard(&self, id: &str, controls_ids: &[String]) -> Result<()>;

    /// `get_control`, returning the full detail including embedded rules.
    async fn get_control(&self, id: &str) -> Result<Option<ControlDetail>>;

    /// `get_controls` with an exact name filter.
    async fn find_controls_by_name(&self, name: &str) -> Result<Vec<ControlSummary>>;

    /// `add_control`
    async fn create_control(&self, payload: &CreateControlPayload) -> Result<Option<String>>;

    /// `add_rules_to_control`, attaching a batch of rules to one control.
    async fn add_rules_to_control(
        &self,
        control_id: &str,
        rules: &[CreateRulePayload],
    ) -> Result<()>;
}
