use thiserror::Error;

/// Structural problems found while decoding model input.
///
/// Evaluation never fails; these errors only surface at the decoding boundary.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("link instance {id} must reference exactly two documents, found {found}")]
    LinkEndpoints { id: String, found: usize },

    #[error("unknown attributes resource {0}")]
    UnknownResource(String),

    #[error("invalid model json: {0}")]
    Json(#[from] serde_json::Error),
}
