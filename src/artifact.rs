use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// The zip archive produced by a build, named with the millisecond
/// timestamp of the run that created it.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    pub file_name: String,
    pub path: PathBuf,
}

impl BuildArtifact {
    pub fn new(timestamp: DateTime<Utc>) -> anyhow::Result<Self> {
        let file_name = format!("AppHubBuild_{}.zip", timestamp.timestamp_millis());
        let path = env::current_dir()
            .context("resolving build output directory")?
            .join(&file_name);
        Ok(Self { file_name, path })
    }

    pub fn sha256(&self) -> anyhow::Result<String> {
        let data = fs::read(&self.path)
            .with_context(|| format!("reading build file {}", self.path.display()))?;
        let mut hasher = Sha256::new();
        hasher.update(&data);
        Ok(format!("{:x}", hasher.finalize()))
    }

    pub fn remove(&self) -> anyhow::Result<()> {
        fs::remove_file(&self.path)
            .with_context(|| format!("removing build file {}", self.path.display()))
    }
}
