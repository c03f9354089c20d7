//! Backends module - External tool integrations and file operations
//!
//! Provides:
//! - exec: External command execution (timeout, cancellation)
//! - fs: Directory walking and line reads
//! - discovery: locate/find pipelines and the in-process traversal
//! - parse: Discovery output parsing
//! - doctor: Dependency checking

pub mod discovery;
pub mod doctor;
pub mod exec;
pub mod fs;
pub mod parse;

use exec::CommandExecutor;
use fs::{DirectoryWalker, LineSource};

/// The collaborators a counting run talks to
#[derive(Clone, Copy)]
pub struct Backends<'a> {
    pub executor: &'a dyn CommandExecutor,
    pub walker: &'a dyn DirectoryWalker,
    pub reader: &'a dyn LineSource,
}

impl<'a> Backends<'a> {
    pub fn new(
        executor: &'a dyn CommandExecutor,
        walker: &'a dyn DirectoryWalker,
        reader: &'a dyn LineSource,
    ) -> Self {
        Self {
            executor,
            walker,
            reader,
        }
    }
}
