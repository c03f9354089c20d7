//! Filesystem access
//!
//! Directory walking and line-oriented reads, behind traits so the counting flow
//! can run against in-memory fakes.

use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lazily enumerates regular files under a root
pub trait DirectoryWalker: Send + Sync {
    fn walk<'a>(&'a self, root: &Path) -> Box<dyn Iterator<Item = PathBuf> + 'a>;
}

/// Opens files for sequential line reads
pub trait LineSource: Send + Sync {
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead>>;
}

/// The local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl DirectoryWalker for LocalFs {
    fn walk<'a>(&'a self, root: &Path) -> Box<dyn Iterator<Item = PathBuf> + 'a> {
        let iter = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(err) => {
                    debug!("skipping unreadable entry: {}", err);
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path());

        Box::new(iter)
    }
}

impl LineSource for LocalFs {
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead>> {
        // opening a FIFO blocks until a writer shows up, so check first
        if !std::fs::metadata(path)?.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}
