//! Face match service client
//!
//! POST /faces/compare `{probe, reference}` with base64 images returns
//! `{match: bool}`. A 422 means no usable face was found in one of the
//! images; like any other non-200 it is a failure, never a mismatch.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::http;
use crate::domain::result::{Collaborator, Error as DomainError, Result as DomainResult};
use crate::domain::FilePayload;
use crate::ports::FaceMatcher;

const SERVICE_NAME: &str = "face match service";

#[derive(Serialize)]
struct CompareRequest<'a> {
    probe: &'a str,
    reference: &'a str,
}

#[derive(Deserialize)]
struct CompareResponse {
    #[serde(rename = "match")]
    is_match: bool,
}

/// Face match service client
#[derive(Debug)]
pub struct FaceServiceClient {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl FaceServiceClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http::build_client(timeout_secs)?,
            base_url: http::normalize_base_url(base_url)?,
            timeout_secs,
        })
    }

    pub fn compare(&self, probe: &FilePayload, reference: &FilePayload) -> Result<bool> {
        let url = format!("{}/faces/compare", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&CompareRequest {
                probe: &probe.file_b64,
                reference: &reference.file_b64,
            })
            .send()
            .map_err(|e| http::map_request_error(SERVICE_NAME, self.timeout_secs, e))?;

        match response.status().as_u16() {
            200 => {
                let data: CompareResponse = response
                    .json()
                    .context("Failed to parse face match response")?;
                Ok(data.is_match)
            }
            422 => anyhow::bail!("Face match service found no usable face"),
            status => anyhow::bail!("Face match service error: HTTP {}", status),
        }
    }
}

impl FaceMatcher for FaceServiceClient {
    fn compare(&self, probe: &FilePayload, reference: &FilePayload) -> DomainResult<bool> {
        FaceServiceClient::compare(self, probe, reference)
            .map_err(|e| DomainError::upstream(Collaborator::FaceMatch, e.to_string()))
    }
}
