use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use thiserror::Error;

/// Number of pages a freshly created store holds.
pub const STORE_PAGES: usize = 1024;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backing store {path} cannot be opened: {source}")]
    Unavailable {
        path: String,
        source: std::io::Error,
    },
    #[error("page {0} not found in backing store")]
    PageNotFound(usize),
    #[error("backing store line {line} is malformed: {text:?}")]
    Malformed { line: usize, text: String },
}

/// Source of page contents that are not resident in physical memory.
pub trait PageStore {
    fn load(&self, page_index: usize) -> Result<i64, StoreError>;
}

/// Text-file store, one page per line: `Page <index>: <value>`.
/// Pages are addressed by line position.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates a default store of [`STORE_PAGES`] pages if none exists.
    /// Idempotent: an existing store is left untouched.
    pub fn ensure_exists(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.unavailable(source))?;
            }
        }
        let mut content = String::new();
        for page in 0..STORE_PAGES {
            content.push_str(&format!("Page {}: {}\n", page, 1000 + page));
        }
        fs::write(&self.path, content).map_err(|source| self.unavailable(source))?;
        info!(
            "created backing store {} with {} pages",
            self.path.display(),
            STORE_PAGES
        );
        Ok(())
    }

    fn unavailable(&self, source: std::io::Error) -> StoreError {
        StoreError::Unavailable {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl PageStore for FileStore {
    fn load(&self, page_index: usize) -> Result<i64, StoreError> {
        let content = fs::read_to_string(&self.path).map_err(|source| self.unavailable(source))?;
        let line = content
            .lines()
            .nth(page_index)
            .ok_or(StoreError::PageNotFound(page_index))?;
        let value = line
            .rsplit(':')
            .next()
            .and_then(|text| text.trim().parse().ok())
            .ok_or_else(|| StoreError::Malformed {
                line: page_index + 1,
                text: line.to_string(),
            })?;
        debug!("loaded page {} from backing store: {}", page_index, value);
        Ok(value)
    }
}
