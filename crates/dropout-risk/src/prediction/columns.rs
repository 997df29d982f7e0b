//! Column naming used by the scoring model after its own preprocessing.
//!
//! The model was trained on one-hot columns with a `<field>_nan` column per
//! categorical field and with names cleaned for the gradient-boosting library.
//! Nothing here is sent over the wire; it shows how the scoring service reads
//! an encoded payload into the model's feature space.

use super::encoder::{EncodedPayload, PayloadValue};
use super::schema::{FieldId, FieldKind, FieldSchema};
use serde::Serialize;

/// Order in which the categorical fields appear in the training table.
const TRAINING_CATEGORY_ORDER: [FieldId; 6] = [
    FieldId::Gender,
    FieldId::Region,
    FieldId::HighestEducation,
    FieldId::ImdBand,
    FieldId::AgeBand,
    FieldId::Disability,
];

/// Rewrites a feature name the way the training pipeline did.
pub fn model_column_name(raw: &str) -> String {
    raw.replace('<', "lt")
        .replace('>', "gt")
        .replace('[', "(")
        .replace(']', ")")
        .replace('%', "pct")
        .replace(' ', "_")
}

fn missing_column(field: FieldId) -> String {
    format!("{}_nan", field.as_str())
}

/// Ordered training columns: numeric fields first, then each categorical
/// field's sorted options followed by its `_nan` column.
pub fn training_columns(schema: &FieldSchema) -> Vec<String> {
    let mut columns: Vec<String> = schema
        .numeric()
        .map(|field| model_column_name(field.id.as_str()))
        .collect();

    for id in TRAINING_CATEGORY_ORDER {
        let Some(FieldKind::Categorical { options }) = schema.field(id).map(|field| field.kind)
        else {
            continue;
        };

        let mut keys: Vec<&str> = options.iter().map(|option| option.key).collect();
        keys.sort_unstable();
        columns.extend(keys.into_iter().map(model_column_name));
        columns.push(missing_column(id));
    }

    columns
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelColumn {
    pub name: String,
    pub value: f64,
}

/// Dense feature row over [`training_columns`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelFeatureRow {
    columns: Vec<ModelColumn>,
}

impl ModelFeatureRow {
    /// Expands a payload into the dense row the way the scoring service does.
    ///
    /// Numeric values are copied by field id. A categorical field is read from
    /// the key equal to its field id: a text value naming a training column
    /// sets that column to `1`, anything else sets the field's `_nan` column.
    /// Self-keyed indicators such as `{"gender_F": "gender_F"}` are not read,
    /// so under [`MissingCategoryPolicy::Omit`] every categorical field lands
    /// in `_nan`.
    ///
    /// [`MissingCategoryPolicy::Omit`]: super::encoder::MissingCategoryPolicy::Omit
    pub fn from_payload(schema: &FieldSchema, payload: &EncodedPayload) -> Self {
        let mut columns: Vec<ModelColumn> = training_columns(schema)
            .into_iter()
            .map(|name| ModelColumn { name, value: 0.0 })
            .collect();

        let mut set = |name: &str, value: f64| -> bool {
            match columns.iter_mut().find(|column| column.name == name) {
                Some(column) => {
                    column.value = value;
                    true
                }
                None => false,
            }
        };

        for field in schema.numeric() {
            if let Some(PayloadValue::Number(value)) = payload.get(field.id.as_str()) {
                set(&model_column_name(field.id.as_str()), *value);
            }
        }

        for field in schema.categorical() {
            let marked = match payload.get(field.id.as_str()) {
                Some(PayloadValue::Text(value)) => set(&model_column_name(value), 1.0),
                _ => false,
            };
            if !marked {
                set(&missing_column(field.id), 1.0);
            }
        }

        Self { columns }
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.value)
    }

    pub fn active(&self) -> impl Iterator<Item = &ModelColumn> {
        self.columns.iter().filter(|column| column.value != 0.0)
    }
}
