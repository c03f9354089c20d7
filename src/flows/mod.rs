//! Flows module - Multi-step workflows
//!
//! - count: discovery, parsing, counting and concordance filtering

pub mod count;
