//! Student dropout risk: field vocabulary, feature encoding, risk banding, and
//! the client boundary to the remote scoring model.

pub mod assessor;
pub mod classifier;
pub mod client;
pub mod columns;
pub mod encoder;
pub mod profile;
pub mod response;
pub mod schema;

pub use assessor::{AssessmentOutcome, OutcomeKind, RiskAssessor, CONNECTIVITY_MESSAGE};
pub use classifier::{
    classify, RiskAssessment, RiskBand, LOW_RISK_CEILING, MODERATE_RISK_CEILING,
};
pub use client::{ClientBuildError, HttpPredictionService, PredictionService, TransportError};
pub use columns::{model_column_name, training_columns, ModelColumn, ModelFeatureRow};
pub use encoder::{encode, EncodedPayload, FeatureEncoder, MissingCategoryPolicy, PayloadValue};
pub use profile::{
    parse_numeric_or_default, ProfileInputError, ProfileValue, StudentProfile, NUMERIC_DEFAULT,
};
pub use response::{PredictionReply, ProtocolViolation};
pub use schema::{
    CategoryOption, FieldDescriptor, FieldId, FieldKind, FieldSchema, SchemaError, UnknownField,
};
