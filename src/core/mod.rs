//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Unified result model (FileRecord, CountResult)
//! - Tokenizer, word counter and concordance filter
//! - Rendering functions for different output formats
//! - Path normalization utilities
//! - Common utilities

pub mod concordance;
pub mod counter;
pub mod model;
pub mod paths;
pub mod render;
pub mod tokenizer;
pub mod util;
