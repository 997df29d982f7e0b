use super::profile::StudentProfile;
use super::schema::{FieldKind, FieldSchema};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// What an unselected categorical field contributes to the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCategoryPolicy {
    /// No key at all.
    #[default]
    Omit,
    /// `{ "<field id>": null }`.
    NullPlaceholder,
}

impl MissingCategoryPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "omit" | "absent" => Some(Self::Omit),
            "null" | "null_placeholder" => Some(Self::NullPlaceholder),
            _ => None,
        }
    }
}

/// A single payload value as it appears on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Text(String),
    Number(f64),
    Null,
}

impl Serialize for PayloadValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PayloadValue::Text(text) => serializer.serialize_str(text),
            // Whole numbers go out as JSON integers so `120` stays `120`.
            PayloadValue::Number(value)
                if value.fract() == 0.0 && value.abs() < i64::MAX as f64 =>
            {
                serializer.serialize_i64(*value as i64)
            }
            PayloadValue::Number(value) => serializer.serialize_f64(*value),
            PayloadValue::Null => serializer.serialize_none(),
        }
    }
}

/// Flat, key-ordered record sent to the prediction service.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EncodedPayload {
    entries: BTreeMap<String, PayloadValue>,
}

impl EncodedPayload {
    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    pub(super) fn insert(&mut self, key: impl Into<String>, value: PayloadValue) {
        self.entries.insert(key.into(), value);
    }
}

/// Stateless encoder applying one rule per field kind.
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    schema: FieldSchema,
    policy: MissingCategoryPolicy,
}

impl FeatureEncoder {
    pub fn new(schema: FieldSchema, policy: MissingCategoryPolicy) -> Self {
        Self { schema, policy }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn policy(&self) -> MissingCategoryPolicy {
        self.policy
    }

    pub fn encode(&self, profile: &StudentProfile) -> EncodedPayload {
        encode(profile, &self.schema, self.policy)
    }
}

/// Translates a profile into the payload shape the remote model expects.
///
/// Never fails: selections that are not options of their field count as
/// unselected, and numeric fields with no usable input encode as `0`.
pub fn encode(
    profile: &StudentProfile,
    schema: &FieldSchema,
    policy: MissingCategoryPolicy,
) -> EncodedPayload {
    let mut payload = EncodedPayload::default();

    for field in schema.fields() {
        match field.kind {
            FieldKind::Categorical { .. } => {
                let selected = profile
                    .selection(field.id)
                    .and_then(|key| field.option(key));

                match (selected, policy) {
                    (Some(option), _) => {
                        payload.insert(option.key, PayloadValue::Text(option.key.to_string()))
                    }
                    (None, MissingCategoryPolicy::NullPlaceholder) => {
                        payload.insert(field.id.as_str(), PayloadValue::Null)
                    }
                    (None, MissingCategoryPolicy::Omit) => {}
                }
            }
            FieldKind::Numeric { .. } => {
                payload.insert(
                    field.id.as_str(),
                    PayloadValue::Number(profile.number(field.id)),
                );
            }
        }
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::schema::FieldId;
    use serde_json::json;

    fn sample_profile() -> StudentProfile {
        let mut profile = StudentProfile::new();
        profile.select(FieldId::Gender, "gender_F");
        profile.select(FieldId::AgeBand, "age_band_0-35");
        profile.set_number(FieldId::StudiedCredits, 120.0);
        profile
    }

    #[test]
    fn selected_categories_encode_as_self_keyed_indicators() {
        let schema = FieldSchema::standard();
        let payload = encode(&sample_profile(), &schema, MissingCategoryPolicy::Omit);
        let body = payload.to_json();

        assert_eq!(body["gender_F"], json!("gender_F"));
        assert_eq!(body["age_band_0-35"], json!("age_band_0-35"));
        assert_eq!(body["studied_credits"], json!(120));
        assert!(!payload.contains_key("gender_M"));
        assert!(!payload.contains_key("gender"));
        assert!(!payload.keys().any(|key| key.starts_with("region")));
        assert!(!payload.keys().any(|key| key.starts_with("disability")));
    }

    #[test]
    fn numeric_fields_are_always_present() {
        let schema = FieldSchema::standard();
        let payload = encode(&StudentProfile::new(), &schema, MissingCategoryPolicy::Omit);

        assert_eq!(payload.len(), 9);
        for field in schema.numeric() {
            assert_eq!(
                payload.get(field.id.as_str()),
                Some(&PayloadValue::Number(0.0))
            );
        }
    }

    #[test]
    fn out_of_range_numbers_are_not_clamped() {
        let schema = FieldSchema::standard();
        let mut profile = StudentProfile::new();
        profile.set_number(FieldId::StudiedCredits, 9000.0);
        profile.set_number(FieldId::DateRegistration, -400.5);

        let body = encode(&profile, &schema, MissingCategoryPolicy::Omit).to_json();
        assert_eq!(body["studied_credits"], json!(9000));
        assert_eq!(body["date_registration"], json!(-400.5));
    }

    #[test]
    fn null_placeholder_marks_unselected_fields() {
        let schema = FieldSchema::standard();
        let payload = encode(
            &sample_profile(),
            &schema,
            MissingCategoryPolicy::NullPlaceholder,
        );

        assert_eq!(payload.get("region"), Some(&PayloadValue::Null));
        assert_eq!(payload.get("disability"), Some(&PayloadValue::Null));
        assert!(!payload.contains_key("gender"));
        assert_eq!(payload.to_json()["imd_band"], serde_json::Value::Null);
    }

    #[test]
    fn foreign_selection_degrades_to_unselected() {
        let schema = FieldSchema::standard();
        let mut profile = StudentProfile::new();
        profile.select(FieldId::Gender, "region_Wales");
        profile.select(FieldId::Disability, "disability_maybe");

        let payload = encode(&profile, &schema, MissingCategoryPolicy::Omit);
        assert!(!payload.contains_key("region_Wales"));
        assert!(!payload.keys().any(|key| key.starts_with("disability")));
    }

    #[test]
    fn one_indicator_per_categorical_field() {
        let schema = FieldSchema::standard();
        let mut profile = sample_profile();
        profile.select(FieldId::Gender, "gender_M");

        let payload = encode(&profile, &schema, MissingCategoryPolicy::Omit);
        for field in schema.categorical() {
            let emitted = payload
                .keys()
                .filter(|key| field.option(key).is_some())
                .count();
            assert!(emitted <= 1, "{} emitted {emitted} indicators", field.id);
        }
        assert!(payload.contains_key("gender_M"));
        assert!(!payload.contains_key("gender_F"));
    }

    #[test]
    fn serialized_payload_is_stable() {
        let encoder = FeatureEncoder::default();
        let profile = sample_profile();

        let first = serde_json::to_string(&encoder.encode(&profile)).expect("serializes");
        let second = serde_json::to_string(&encoder.encode(&profile)).expect("serializes");
        assert_eq!(first, second);
        assert!(first.contains("\"studied_credits\":120"));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&first).expect("valid json"),
            encoder.encode(&profile).to_json()
        );
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!(
            MissingCategoryPolicy::parse("OMIT"),
            Some(MissingCategoryPolicy::Omit)
        );
        assert_eq!(
            MissingCategoryPolicy::parse("null"),
            Some(MissingCategoryPolicy::NullPlaceholder)
        );
        assert_eq!(MissingCategoryPolicy::parse("zero"), None);
    }
}
