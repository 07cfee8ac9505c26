use std::{fs, path::Path};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("physical address {address} is outside physical memory of {size} words")]
    OutOfRange { address: usize, size: usize },
    #[error("cannot read memory image {path}: {source}")]
    Image {
        path: String,
        source: std::io::Error,
    },
    #[error("memory image line {line}: invalid word {token:?}")]
    BadWord { line: usize, token: String },
}

/// Physical memory as an ordered sequence of words. The initial
/// contents come from a text image; afterwards the sequence only
/// grows, one word per `append`.
#[derive(Debug, Default)]
pub struct PhysicalMemory {
    words: Vec<i64>,
}

impl PhysicalMemory {
    pub fn from_words(words: Vec<i64>) -> Self {
        Self { words }
    }

    /// Loads a memory image: one integer per line, blank lines skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MemoryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| MemoryError::Image {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, MemoryError> {
        let mut words = Vec::new();
        for (line, text) in content.lines().enumerate() {
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            let word = text.parse().map_err(|_| MemoryError::BadWord {
                line: line + 1,
                token: text.to_string(),
            })?;
            words.push(word);
        }
        Ok(Self { words })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn read(&self, address: usize) -> Result<i64, MemoryError> {
        self.words
            .get(address)
            .copied()
            .ok_or(MemoryError::OutOfRange {
                address,
                size: self.words.len(),
            })
    }

    /// Appends one word and returns its index.
    pub fn append(&mut self, word: i64) -> usize {
        self.words.push(word);
        self.words.len() - 1
    }
}
