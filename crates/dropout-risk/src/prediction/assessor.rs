use super::classifier::RiskAssessment;
use super::client::{PredictionService, TransportError};
use super::encoder::{EncodedPayload, FeatureEncoder};
use super::profile::StudentProfile;
use super::response::PredictionReply;
use super::schema::FieldSchema;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Operator-facing text for any transport failure.
pub const CONNECTIVITY_MESSAGE: &str = "Network error — prediction service not reachable";

/// Result of one prediction attempt. Only `Assessed` carries a band.
#[derive(Debug, Clone, PartialEq)]
pub enum AssessmentOutcome {
    Assessed(RiskAssessment),
    ServiceError(String),
    TransportFailure(TransportError),
}

impl AssessmentOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Assessed(_) => OutcomeKind::Assessed,
            Self::ServiceError(_) => OutcomeKind::ServiceError,
            Self::TransportFailure(_) => OutcomeKind::TransportFailure,
        }
    }

    pub fn assessment(&self) -> Option<&RiskAssessment> {
        match self {
            Self::Assessed(assessment) => Some(assessment),
            Self::ServiceError(_) | Self::TransportFailure(_) => None,
        }
    }

    /// Message to show the operator when no band was computed.
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Assessed(_) => None,
            Self::ServiceError(message) => Some(message),
            Self::TransportFailure(_) => Some(CONNECTIVITY_MESSAGE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Assessed,
    ServiceError,
    TransportFailure,
}

/// Encode, submit, and classify pipeline over a prediction service.
pub struct RiskAssessor<S> {
    encoder: FeatureEncoder,
    service: S,
}

impl<S> RiskAssessor<S>
where
    S: PredictionService,
{
    pub fn new(encoder: FeatureEncoder, service: S) -> Self {
        Self { encoder, service }
    }

    pub fn schema(&self) -> &FieldSchema {
        self.encoder.schema()
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Runs one attempt against a snapshot of `profile`.
    ///
    /// The caller keeps ownership of the live profile; whatever it does to it
    /// after this call starts cannot reach the payload already encoded.
    pub async fn assess(&self, profile: &StudentProfile) -> AssessmentOutcome {
        let snapshot = profile.clone();
        let payload = self.encoder.encode(&snapshot);
        self.submit(&payload).await
    }

    /// Sends an already encoded payload and interprets the reply.
    pub async fn submit(&self, payload: &EncodedPayload) -> AssessmentOutcome {
        debug!(keys = payload.len(), "submitting encoded payload");

        match self.service.predict(payload).await {
            Ok(PredictionReply::Score(score)) => {
                let assessment = RiskAssessment::from_score(score);
                info!(score, band = ?assessment.band, "risk assessed");
                AssessmentOutcome::Assessed(assessment)
            }
            Ok(PredictionReply::ServiceError(message)) => {
                info!(%message, "prediction service reported an error");
                AssessmentOutcome::ServiceError(message)
            }
            Err(err) => {
                warn!(error = %err, "prediction service transport failure");
                AssessmentOutcome::TransportFailure(err)
            }
        }
    }
}
