// SPDX-License-Identifier: MPL-2.0

//! tmpfiles.org uploader
//!
//! `POST` multipart form with a single `file` part; the host answers
//! `{"status":"success","data":{"url":"https://tmpfiles.org/<n>/<name>"}}`.

use super::{FAULT_NETWORK, ShareUploader, parse_upload_response, to_direct_url};
use crate::constants::share;
use crate::errors::{BoothError, BoothResult};
use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct TmpfilesUploader {
    client: reqwest::Client,
    endpoint: String,
}

impl TmpfilesUploader {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> BoothResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Uploader for the public host with the default timeout
    pub fn public() -> BoothResult<Self> {
        Self::new(share::UPLOAD_URL, share::REQUEST_TIMEOUT)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload and return the direct-download URL
    pub async fn upload_png(&self, file_name: String, png: Vec<u8>) -> BoothResult<String> {
        debug!(file = %file_name, bytes = png.len(), endpoint = %self.endpoint, "Uploading");

        let part = Part::bytes(png)
            .file_name(file_name.clone())
            .mime_str("image/png")?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BoothError::UploadFailure(format!(
                "{}: HTTP {}",
                FAULT_NETWORK, status
            )));
        }

        let body = response.text().await?;
        let view_url = parse_upload_response(&body)?;
        let direct = to_direct_url(&view_url);
        info!(file = %file_name, url = %direct, "Upload complete");
        Ok(direct)
    }
}

impl ShareUploader for TmpfilesUploader {
    fn upload(&self, file_name: String, png: Arc<Vec<u8>>) -> BoxFuture<'static, BoothResult<String>> {
        let uploader = self.clone();
        async move {
            let bytes = Arc::unwrap_or_clone(png);
            uploader.upload_png(file_name, bytes).await
        }
        .boxed()
    }
}
