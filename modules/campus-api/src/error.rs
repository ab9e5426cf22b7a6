use thiserror::Error;

/// A tool call that could not be answered. "Nothing found" is never one of
/// these; it is an empty result.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        source: serde_json::Error,
    },

    #[error("failed to serialize tool result: {0}")]
    Serialize(#[from] serde_json::Error),
}
