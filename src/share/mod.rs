// SPDX-License-Identifier: MPL-2.0

//! Share uploads
//!
//! Captured photos are pushed to a temporary file host; the returned link is
//! rewritten to its direct-download form and offered as a QR code.

pub mod qr;
pub mod tmpfiles;

pub use qr::qr_image_url;
pub use tmpfiles::TmpfilesUploader;

use crate::constants::share::{DIRECT_URL_FRAGMENT, VIEW_URL_FRAGMENT};
use crate::errors::{BoothError, BoothResult};
use futures::future::BoxFuture;
use serde::Deserialize;
use std::sync::Arc;

/// Non-2xx response from the host
pub const FAULT_NETWORK: &str = "NETWORK_IO_ERROR";
/// 2xx response the host did not mark as a success
pub const FAULT_REJECTED: &str = "API_REJECTED";

/// Remote file host
pub trait ShareUploader: Send + Sync {
    /// Upload PNG bytes as `file_name`; resolves to the direct-download URL
    fn upload(&self, file_name: String, png: Arc<Vec<u8>>) -> BoxFuture<'static, BoothResult<String>>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    status: String,
    #[serde(default)]
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    #[serde(default)]
    url: Option<String>,
}

/// Extract the view URL from an upload response body
pub fn parse_upload_response(body: &str) -> BoothResult<String> {
    let response: UploadResponse = serde_json::from_str(body)
        .map_err(|e| BoothError::UploadFailure(format!("{}: {}", FAULT_REJECTED, e)))?;

    match response.data.and_then(|d| d.url) {
        Some(url) if response.status == "success" && !url.is_empty() => Ok(url),
        _ => Err(BoothError::UploadFailure(format!(
            "{}: status {}",
            FAULT_REJECTED, response.status
        ))),
    }
}

/// Rewrite a view URL into the direct-download form (first occurrence only)
pub fn to_direct_url(view_url: &str) -> String {
    view_url.replacen(VIEW_URL_FRAGMENT, DIRECT_URL_FRAGMENT, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_url_rewrite() {
        assert_eq!(
            to_direct_url("https://tmpfiles.org/123456/NODE_ABCD1234.png"),
            "https://tmpfiles.org/dl/123456/NODE_ABCD1234.png"
        );
        assert_eq!(to_direct_url("https://example.com/x.png"), "https://example.com/x.png");
    }

    #[test]
    fn test_parse_success() {
        let url = parse_upload_response(
            r#"{"status":"success","data":{"url":"http://tmpfiles.org/1/a.png"}}"#,
        )
        .unwrap();
        assert_eq!(url, "http://tmpfiles.org/1/a.png");
    }

    #[test]
    fn test_parse_rejections() {
        for body in [
            r#"{"status":"error"}"#,
            r#"{"status":"success","data":{}}"#,
            r#"{"status":"success","data":{"url":""}}"#,
            r#"{"status":"failed","data":{"url":"http://tmpfiles.org/1/a.png"}}"#,
            "<html>bad gateway</html>",
        ] {
            let err = parse_upload_response(body).unwrap_err();
            assert!(matches!(err, BoothError::UploadFailure(ref m) if m.starts_with(FAULT_REJECTED)));
        }
    }
}
