use std::fs;
use std::path::Path;

use anyhow::Context;
use dialoguer::{Input, Password};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the credentials file, resolved against the working directory.
pub const CREDENTIALS_FILE: &str = ".apphub";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub app_hub_id: String,
    pub app_hub_secret: String,
}

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("AppHub credential '{0}' is blank")]
    BlankField(&'static str),
}

impl Credentials {
    pub fn validate(&self) -> Result<(), CredentialsError> {
        if self.app_hub_id.trim().is_empty() {
            return Err(CredentialsError::BlankField("appHubId"));
        }
        if self.app_hub_secret.trim().is_empty() {
            return Err(CredentialsError::BlankField("appHubSecret"));
        }
        Ok(())
    }
}

pub fn load(path: &Path) -> anyhow::Result<Credentials> {
    let data = fs::read_to_string(path).with_context(|| {
        format!(
            "reading credentials at {} (run with --configure to create it)",
            path.display()
        )
    })?;
    let credentials: Credentials = serde_json::from_str(&data)
        .with_context(|| format!("parsing credentials at {}", path.display()))?;
    credentials
        .validate()
        .with_context(|| format!("validating credentials at {}", path.display()))?;
    debug!("found {} file, using saved credentials", path.display());
    Ok(credentials)
}

pub fn save(path: &Path, credentials: &Credentials) -> anyhow::Result<()> {
    let data = serde_json::to_string_pretty(credentials)?;
    fs::write(path, data).with_context(|| format!("writing credentials to {}", path.display()))?;

    // Owner-only: the file holds the application secret.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("restricting permissions on {}", path.display()))?;
    }

    Ok(())
}

/// Prompt for both credential values, persist them, and hand them to the
/// rest of the run.
pub fn configure(path: &Path) -> anyhow::Result<Credentials> {
    let app_hub_id: String = Input::new()
        .with_prompt("AppHub Application ID")
        .interact_text()
        .context("reading AppHub Application ID")?;
    let app_hub_secret = Password::new()
        .with_prompt("AppHub Application Secret")
        .interact()
        .context("reading AppHub Application Secret")?;

    let credentials = Credentials {
        app_hub_id,
        app_hub_secret,
    };
    credentials.validate()?;
    save(path, &credentials)?;
    println!("Saved credentials to {}.", path.display());

    Ok(credentials)
}
