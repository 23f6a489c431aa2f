use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::face_oracle::FaceOracle;
use crate::detection::domain::raw_detection::RawDetection;
use crate::shared::frame_ref::FrameRef;
use crate::storage::domain::frame_storage::{FrameStorage, StorageError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("cannot load frame for detection: {0}")]
    Frame(#[from] StorageError),
    #[error("detection request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("detection service {url} answered {status}")]
    Status { url: String, status: u16 },
    #[error("malformed detection response: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DetectResponse {
    #[serde(default)]
    face_details: Vec<RawDetection>,
}

/// Sends each stored frame to a remote detection endpoint.
///
/// The frame bytes are posted as-is; the service answers with
/// `{"FaceDetails": [{"BoundingBox": {...}, "Confidence": ...}]}`.
pub struct HttpFaceOracle {
    client: reqwest::blocking::Client,
    endpoint: String,
    storage: Arc<dyn FrameStorage>,
}

impl HttpFaceOracle {
    pub fn new(
        endpoint: impl Into<String>,
        storage: Arc<dyn FrameStorage>,
    ) -> Result<Self, OracleError> {
        let endpoint = endpoint.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| OracleError::Request {
                url: endpoint.clone(),
                source: e,
            })?;
        Ok(Self {
            client,
            endpoint,
            storage,
        })
    }

    fn request(&self, frame: &FrameRef) -> Result<Vec<RawDetection>, OracleError> {
        let bytes = self.storage.get(&frame.key())?;

        let request_err = |source| OracleError::Request {
            url: self.endpoint.clone(),
            source,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(bytes)
            .send()
            .map_err(request_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(request_err)?;
        parse_response(&body)
    }
}

impl FaceOracle for HttpFaceOracle {
    fn detect(
        &mut self,
        frame: &FrameRef,
    ) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
        Ok(self.request(frame)?)
    }
}

fn parse_response(body: &[u8]) -> Result<Vec<RawDetection>, OracleError> {
    let parsed: DetectResponse = serde_json::from_slice(body)?;
    Ok(parsed.face_details)
}
