//! Clone a Cortex XSIAM/XDR compliance standard, with all of its controls
//! and each control's rules, under a new name prefix.

pub mod api;
pub mod cli;
pub mod clone;
pub mod error;

pub use clone::{CloneReport, Cloner, FatalError};
pub use error::Error;
