//! Cortex compliance API surface
//!
//! The orchestrator depends on the [`ComplianceGateway`] trait; the
//! [`CortexClient`] is the HTTP implementation used by the binary.

pub mod client;
pub mod gateway;
pub mod models;
pub mod retry;

pub use client::CortexClient;
pub use gateway::ComplianceGateway;
pub use models::{
    ControlDetail, ControlSummary, CreateControlPayload, CreateRulePayload,
    CreateStandardPayload, Registry, Severity, SourceRule, Standard,
};
pub use retry::{RetryConfig, RetryPolicy};
