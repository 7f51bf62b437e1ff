//! AppHub upload API client.
//!
//! Deploys run in two phases: ask the AppHub API for a presigned upload
//! URL, then PUT the build archive to that URL.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use thiserror::Error;

use crate::credentials::Credentials;
use crate::metadata::BuildMetadata;

pub const UPLOAD_API_BASE: &str = "https://api.apphub.io";
pub const DASHBOARD_URL_BASE: &str = "https://dashboard.apphub.io/projects/";

const APPLICATION_ID_HEADER: &str = "X-AppHub-Application-ID";
const APPLICATION_SECRET_HEADER: &str = "X-AppHub-Application-Secret";
const BUILD_METADATA_HEADER: &str = "X-AppHub-Build-Metadata";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("upload service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("unexpected upload response: {0}")]
    InvalidResponse(reqwest::Error),
    #[error("serializing build metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("reading build archive {}: {source}", .path.display())]
    ReadArtifact {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Deserialize)]
struct UploadUrlResponse {
    data: UploadUrlData,
}

#[derive(Debug, Deserialize)]
struct UploadUrlData {
    s3_url: String,
}

pub struct UploadClient {
    http: reqwest::blocking::Client,
    api_base: String,
    credentials: Credentials,
}

impl UploadClient {
    pub fn new(credentials: Credentials) -> Result<Self, UploadError> {
        Self::with_base_url(credentials, UPLOAD_API_BASE.to_string())
    }

    pub fn with_base_url(credentials: Credentials, api_base: String) -> Result<Self, UploadError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("apphub-deploy/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_base,
            credentials,
        })
    }

    /// Ask the AppHub API where to put the archive. Credentials travel in
    /// headers, as does the optional build metadata blob.
    pub fn request_upload_url(
        &self,
        metadata: Option<&BuildMetadata>,
    ) -> Result<String, UploadError> {
        let mut request = self
            .http
            .get(format!("{}/v1/upload", self.api_base))
            .header(APPLICATION_ID_HEADER, self.credentials.app_hub_id.as_str())
            .header(APPLICATION_SECRET_HEADER, self.credentials.app_hub_secret.as_str())
            .header(CONTENT_TYPE, "application/zip");

        if let Some(metadata) = metadata {
            let blob = metadata.to_header_value()?;
            debug!("build metadata: {blob}");
            request = request.header(BUILD_METADATA_HEADER, blob);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Http {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let body: UploadUrlResponse = response.json().map_err(UploadError::InvalidResponse)?;
        debug!("upload url: {}", body.data.s3_url);
        Ok(body.data.s3_url)
    }

    /// PUT the archive bytes to the presigned URL from the first phase.
    pub fn upload_archive(&self, upload_url: &str, archive: &Path) -> Result<(), UploadError> {
        let bytes = fs::read(archive).map_err(|source| UploadError::ReadArtifact {
            path: archive.to_path_buf(),
            source,
        })?;

        let response = self
            .http
            .put(upload_url)
            .header(CONTENT_TYPE, "application/zip")
            .body(bytes)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Http {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        Ok(())
    }
}
