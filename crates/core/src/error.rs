use crate::models::Tier;
use providers::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("resume profile missing: {0}")]
    ProfileMissing(String),
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
    #[error("evaluation failed at {tier} tier: {source}")]
    EvaluationFailed {
        tier: Tier,
        #[source]
        source: Box<EvalError>,
    },
}

impl EvalError {
    pub fn failed(tier: Tier, source: EvalError) -> Self {
        EvalError::EvaluationFailed {
            tier,
            source: Box::new(source),
        }
    }

    /// Stable slug for failed-record output, so failures can be triaged
    /// and reprocessed later.
    pub fn kind(&self) -> &'static str {
        match self {
            EvalError::ProfileMissing(_) => "profile_missing",
            EvalError::ModelUnavailable(_) => "model_unavailable",
            EvalError::MalformedResponse(_) => "malformed_response",
            EvalError::EvaluationFailed { source, .. } => source.kind(),
        }
    }
}

impl From<ProviderError> for EvalError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::EmptyCompletion => {
                EvalError::MalformedResponse("empty completion".into())
            }
            other => EvalError::ModelUnavailable(other.to_string()),
        }
    }
}
