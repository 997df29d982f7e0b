use dropout_risk::config::PredictionConfig;
use dropout_risk::error::AppError;
use dropout_risk::prediction::{
    FeatureEncoder, FieldId, FieldSchema, HttpPredictionService, ProfileInputError, RiskAssessor,
    StudentProfile,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn http_assessor(
    config: &PredictionConfig,
) -> Result<RiskAssessor<HttpPredictionService>, AppError> {
    let service = HttpPredictionService::new(config)?;
    Ok(RiskAssessor::new(configured_encoder(config), service))
}

/// Standard schema encoder honouring the configured missing-category policy.
pub(crate) fn configured_encoder(config: &PredictionConfig) -> FeatureEncoder {
    FeatureEncoder::new(FieldSchema::standard(), config.missing_category)
}

/// Builds a profile from a submitted form object of field id to raw value.
///
/// `null` leaves a field unset. Numbers and strings go through the same raw
/// input rules an operator's keystrokes would.
pub(crate) fn profile_from_form(
    schema: &FieldSchema,
    form: &BTreeMap<String, Value>,
) -> Result<StudentProfile, ProfileInputError> {
    let mut profile = StudentProfile::new();

    for (name, value) in form {
        let field: FieldId = name.parse()?;
        match value {
            Value::Null => profile.clear(field),
            Value::String(raw) => profile.apply_raw(schema, field, raw),
            Value::Number(number) => match number.as_f64() {
                Some(value)
                    if schema
                        .field(field)
                        .map(|descriptor| descriptor.is_numeric())
                        .unwrap_or(false) =>
                {
                    profile.set_number(field, value)
                }
                _ => profile.apply_raw(schema, field, &number.to_string()),
            },
            other => profile.apply_raw(schema, field, &other.to_string()),
        }
    }

    Ok(profile)
}

/// Builds a profile from repeated `--set field=value` arguments.
pub(crate) fn profile_from_assignments(
    schema: &FieldSchema,
    assignments: &[String],
) -> Result<StudentProfile, ProfileInputError> {
    let mut profile = StudentProfile::new();
    for assignment in assignments {
        profile.apply_assignment(schema, assignment)?;
    }
    Ok(profile)
}
