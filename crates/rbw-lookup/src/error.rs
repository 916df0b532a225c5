//! Lookup errors

use thiserror::Error;

/// Errors that abort a lookup batch
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("rbw vault locked. Run 'rbw unlock'.")]
    Locked,

    #[error("failed to run {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Non-zero exit from the tool; the message is its stderr verbatim
    #[error("{stderr}")]
    Tool { stderr: String },

    #[error("field {field} does not exist in {}", .terms.join(", "))]
    FieldNotFound { field: String, terms: Vec<String> },

    #[error("rbw printed no output")]
    EmptyOutput,

    #[error("failed to parse rbw output: {0}")]
    Decode(#[from] serde_json::Error),
}
