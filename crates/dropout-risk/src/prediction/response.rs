use serde::Deserialize;

/// One interpreted reply from the prediction service.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionReply {
    Score(f64),
    /// The service's own failure message, kept verbatim.
    ServiceError(String),
}

#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(default)]
    risk_score: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl PredictionReply {
    /// Interprets a response body. An `error` message wins over a score.
    pub fn from_slice(body: &[u8]) -> Result<Self, ProtocolViolation> {
        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|err| ProtocolViolation::NotJson(err.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ProtocolViolation> {
        if !value.is_object() {
            return Err(ProtocolViolation::NotAnObject);
        }

        let raw: RawReply = serde_json::from_value(value)
            .map_err(|err| ProtocolViolation::NotJson(err.to_string()))?;

        if let Some(message) = raw.error.as_ref().and_then(|error| error.as_str()) {
            if !message.is_empty() {
                return Ok(Self::ServiceError(message.to_string()));
            }
        }

        match raw.risk_score {
            Some(score) => score
                .as_f64()
                .filter(|score| score.is_finite())
                .map(Self::Score)
                .ok_or(ProtocolViolation::InvalidScore(score.to_string())),
            None => Err(ProtocolViolation::MissingFields),
        }
    }
}

/// A response that carries neither a usable score nor an error message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    #[error("response body is not valid JSON: {0}")]
    NotJson(String),
    #[error("response body is not a JSON object")]
    NotAnObject,
    #[error("response carries neither risk_score nor error")]
    MissingFields,
    #[error("risk_score {0} is not a finite number")]
    InvalidScore(String),
}
