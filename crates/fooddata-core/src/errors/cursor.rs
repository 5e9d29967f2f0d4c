// ABOUTME: Uniform error for opaque pagination cursors that fail to decode
// ABOUTME: Deliberately carries no diagnostics beyond the tool the cursor targeted

/// A cursor could not be used by the requesting tool.
///
/// Malformed base64, bad JSON, a foreign tool name and an out-of-range page
/// all collapse into this one variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// Cursor is not valid for `tool_name`
    #[error("Invalid cursor for tool '{tool_name}'")]
    Invalid {
        /// Tool the caller tried to resume
        tool_name: String,
    },
}

impl CursorError {
    /// Create an invalid-cursor error for a tool
    #[must_use]
    pub fn invalid(tool_name: impl Into<String>) -> Self {
        Self::Invalid {
            tool_name: tool_name.into(),
        }
    }
}
