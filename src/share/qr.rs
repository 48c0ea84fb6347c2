// SPDX-License-Identifier: GPL-3.0-only

//! QR code links
//!
//! The kiosk does not rasterize QR codes itself; it links to a rendering
//! service with the share URL as payload.

use crate::constants::share::{QR_SERVICE_URL, QR_SIZE};

/// Percent-encode a query value (RFC 3986 unreserved characters pass through)
pub(crate) fn urlencoding_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char)
            }
            _ => result.push_str(&format!("%{:02X}", byte)),
        }
    }
    result
}

/// Image URL of a QR code encoding `data`
pub fn qr_image_url(data: &str) -> String {
    format!(
        "{}?size={}x{}&data={}",
        QR_SERVICE_URL,
        QR_SIZE,
        QR_SIZE,
        urlencoding_encode(data)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_reserved_characters() {
        assert_eq!(urlencoding_encode("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(
            urlencoding_encode("https://tmpfiles.org/dl/1/a b.png?x=1&y"),
            "https%3A%2F%2Ftmpfiles.org%2Fdl%2F1%2Fa%20b.png%3Fx%3D1%26y"
        );
        assert_eq!(urlencoding_encode("é"), "%C3%A9");
    }

    #[test]
    fn test_qr_url() {
        assert_eq!(
            qr_image_url("https://tmpfiles.org/dl/7/x.png"),
            "https://api.qrserver.com/v1/create-qr-code/?size=250x250&data=https%3A%2F%2Ftmpfiles.org%2Fdl%2F7%2Fx.png"
        );
    }
}
