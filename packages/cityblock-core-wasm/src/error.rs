use thiserror::Error;

/// Result type for pipeline-level operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that stop a generation request.
///
/// Per-footprint, union and per-tier serialization failures have their own
/// types and are absorbed into the run report; only these reach the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Unsupported content type: expected application/json, got {0}")]
    UnsupportedContentType(String),

    #[error("Request body is empty")]
    EmptyBody,

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid GeoJSON: payload must be a JSON object")]
    NotAnObject,

    #[error("Invalid GeoJSON: missing or non-array 'features'")]
    MissingFeatures,

    #[error("Invalid GeoJSON: no features")]
    NoFeatures,

    #[error("No usable Polygon or MultiPolygon geometry in {features} feature(s)")]
    NoUsableGeometry { features: usize },

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Failed to serialize mesh: {0}")]
    SerializationExhausted(String),
}

impl PipelineError {
    /// HTTP-style status code the transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::UnsupportedContentType(_) => 415,
            PipelineError::EmptyBody
            | PipelineError::InvalidJson(_)
            | PipelineError::NotAnObject
            | PipelineError::MissingFeatures
            | PipelineError::NoFeatures
            | PipelineError::InvalidOptions(_) => 400,
            PipelineError::NoUsableGeometry { .. } => 422,
            PipelineError::SerializationExhausted(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_client_errors() {
        for err in [
            PipelineError::EmptyBody,
            PipelineError::InvalidJson("eof".into()),
            PipelineError::NotAnObject,
            PipelineError::MissingFeatures,
            PipelineError::NoFeatures,
            PipelineError::UnsupportedContentType("text/plain".into()),
        ] {
            assert!(err.is_client_error(), "{err:?}");
        }
    }

    #[test]
    fn exhausted_serialization_is_a_server_error() {
        let err = PipelineError::SerializationExhausted("all tiers failed".into());
        assert_eq!(err.status_code(), 500);
        assert!(!err.is_client_error());
    }

    #[test]
    fn no_features_message_is_descriptive() {
        assert!(PipelineError::NoFeatures.to_string().contains("no features"));
    }
}
