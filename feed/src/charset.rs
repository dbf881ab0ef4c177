// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Text encoding detection from HTTP `Content-Type` headers.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;

static CONTENT_TYPE_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)[; ]\s*charset="?([^";]+)"?"#).expect("charset pattern compiles")
});

/// Resolves the text encoding of a fetched payload from its `Content-Type`
/// header value.
///
/// Defaults to UTF-8, the encoding the iCalendar format itself assumes
/// (RFC 5545 §3.1.4). A `charset=` parameter is matched case-insensitively
/// and may be quoted; an unrecognized or unsupported label also falls back
/// to UTF-8 rather than failing the sync.
#[must_use]
pub fn charset_from_content_type(content_type: Option<&str>) -> &'static Encoding {
    let Some(content_type) = content_type else {
        return UTF_8;
    };
    let Some(label) = CONTENT_TYPE_CHARSET
        .captures(content_type)
        .and_then(|caps| caps.get(1))
    else {
        return UTF_8;
    };

    match Encoding::for_label(label.as_str().trim().as_bytes()) {
        Some(encoding) => {
            tracing::trace!(charset = encoding.name(), "using charset from Content-Type");
            encoding
        }
        None => {
            tracing::debug!(
                label = label.as_str(),
                "unsupported charset, assuming UTF-8"
            );
            UTF_8
        }
    }
}
