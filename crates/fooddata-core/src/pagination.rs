// ABOUTME: Opaque pagination cursor codec binding a tool name, page, and page size
// ABOUTME: URL-safe base64 of compact JSON; any decode failure is one uniform error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::tools;
use crate::errors::CursorError;

/// URL-safe alphabet, no padding on encode, padding optional on decode
const CURSOR_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Page position recovered from a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,
    /// Items per page
    pub page_size: u32,
}

impl PageRequest {
    /// First page with the given size
    #[must_use]
    pub const fn first(page_size: u32) -> Self {
        Self { page: 1, page_size }
    }

    /// The page after this one, same size
    #[must_use]
    pub const fn next(self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            page_size: self.page_size,
        }
    }

    /// Encode this position as a cursor owned by `tool_name`
    #[must_use]
    pub fn to_cursor(self, tool_name: &str) -> String {
        encode_cursor(tool_name, self.page, self.page_size)
    }
}

#[derive(Serialize)]
struct CursorPayload<'a> {
    tool: &'a str,
    page: u32,
    size: u32,
}

#[derive(Deserialize)]
struct RawCursorPayload {
    tool: String,
    page: Value,
    #[serde(default)]
    size: Option<Value>,
}

/// Encode `{tool, page, size}` into an opaque URL-safe cursor
#[must_use]
pub fn encode_cursor(tool_name: &str, page: u32, page_size: u32) -> String {
    let payload = CursorPayload {
        tool: tool_name,
        page,
        size: page_size,
    };
    // Serializing a struct of a str and two integers cannot fail
    let json = serde_json::to_vec(&payload).unwrap_or_default();
    CURSOR_ENGINE.encode(json)
}

/// Decode a cursor for `expected_tool`, using that tool's documented default
/// page size when the cursor carries no usable size.
///
/// # Errors
///
/// Returns [`CursorError::Invalid`] for any malformed cursor, a cursor issued
/// for a different tool, or a page below 1.
pub fn decode_cursor(cursor: &str, expected_tool: &str) -> Result<PageRequest, CursorError> {
    decode_cursor_with_default(cursor, expected_tool, tools::default_page_size(expected_tool))
}

/// Decode a cursor for `expected_tool` with an explicit fallback page size
///
/// # Errors
///
/// Returns [`CursorError::Invalid`] under the same conditions as [`decode_cursor`].
pub fn decode_cursor_with_default(
    cursor: &str,
    expected_tool: &str,
    default_page_size: u32,
) -> Result<PageRequest, CursorError> {
    let invalid = || CursorError::invalid(expected_tool);

    // Accept cursors that went through a standard-alphabet re-encoding
    let normalized: String = cursor
        .trim()
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = CURSOR_ENGINE.decode(normalized).map_err(|_| invalid())?;
    let raw: RawCursorPayload = serde_json::from_slice(&bytes).map_err(|_| invalid())?;

    if raw.tool != expected_tool {
        tracing::debug!(
            expected = expected_tool,
            found = %raw.tool,
            "Rejected cursor issued for a different tool"
        );
        return Err(invalid());
    }

    let page = positive_u32(&raw.page).ok_or_else(invalid)?;
    let page_size = raw
        .size
        .as_ref()
        .and_then(positive_u32)
        .unwrap_or(default_page_size);

    Ok(PageRequest { page, page_size })
}

fn positive_u32(value: &Value) -> Option<u32> {
    value
        .as_u64()
        .filter(|n| *n >= 1)
        .and_then(|n| u32::try_from(n).ok())
}
