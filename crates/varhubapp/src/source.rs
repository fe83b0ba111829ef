//! # Load Collaborator
//!
//! Fetching is the only suspending operation in the core. [`LibrarySource`] is the
//! seam: the host integration implements it against the real backend, the CLI reads
//! a JSON snapshot from disk, and tests use [`MemorySource`].
//!
//! Failures surface as [`VarhubError::Load`]; the session turns them into a blocking
//! "Error: <message>" state in place of the view.

use std::path::PathBuf;

use crate::error::{Result, VarhubError};
use crate::model::{LibrarySnapshot, SecureFile, VariableGroup};

#[allow(async_fn_in_trait)]
pub trait LibrarySource {
    async fn fetch_variable_groups(&self) -> Result<Vec<VariableGroup>>;

    async fn fetch_secure_files(&self) -> Result<Vec<SecureFile>>;

    /// Both fetches; fails if either does.
    async fn fetch_snapshot(&self) -> Result<LibrarySnapshot> {
        let variable_groups = self.fetch_variable_groups().await?;
        let secure_files = self.fetch_secure_files().await?;
        Ok(LibrarySnapshot {
            variable_groups,
            secure_files,
        })
    }
}

/// Reads a `{ "variableGroups": [...], "secureFiles": [...] }` document.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> Result<LibrarySnapshot> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| VarhubError::Load(format!("{}: {}", self.path.display(), e)))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl LibrarySource for JsonFileSource {
    async fn fetch_variable_groups(&self) -> Result<Vec<VariableGroup>> {
        Ok(self.read().await?.variable_groups)
    }

    async fn fetch_secure_files(&self) -> Result<Vec<SecureFile>> {
        Ok(self.read().await?.secure_files)
    }

    async fn fetch_snapshot(&self) -> Result<LibrarySnapshot> {
        self.read().await
    }
}

/// An in-memory source, optionally failing with a fixed message.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    snapshot: LibrarySnapshot,
    failure: Option<String>,
}

impl MemorySource {
    pub fn new(variable_groups: Vec<VariableGroup>, secure_files: Vec<SecureFile>) -> Self {
        Self {
            snapshot: LibrarySnapshot {
                variable_groups,
                secure_files,
            },
            failure: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            snapshot: LibrarySnapshot::default(),
            failure: Some(message.into()),
        }
    }

    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(VarhubError::Load(message.clone())),
            None => Ok(()),
        }
    }
}

impl LibrarySource for MemorySource {
    async fn fetch_variable_groups(&self) -> Result<Vec<VariableGroup>> {
        self.check()?;
        Ok(self.snapshot.variable_groups.clone())
    }

    async fn fetch_secure_files(&self) -> Result<Vec<SecureFile>> {
        self.check()?;
        Ok(self.snapshot.secure_files.clone())
    }
}
