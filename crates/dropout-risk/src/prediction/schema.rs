use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Every input the remote model knows about, named by its wire identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Gender,
    AgeBand,
    Region,
    HighestEducation,
    ImdBand,
    Disability,
    NumOfPrevAttempts,
    StudiedCredits,
    DateRegistration,
    VleTotalClicks,
    VleDaysActive,
    #[serde(rename = "vle_first14")]
    VleFirst14,
    #[serde(rename = "vle_first28")]
    VleFirst28,
    AvgAssessmentScore,
    NSubmissions,
}

impl FieldId {
    pub const fn ordered() -> [Self; 15] {
        [
            Self::Gender,
            Self::AgeBand,
            Self::Region,
            Self::HighestEducation,
            Self::ImdBand,
            Self::Disability,
            Self::NumOfPrevAttempts,
            Self::StudiedCredits,
            Self::DateRegistration,
            Self::VleTotalClicks,
            Self::VleDaysActive,
            Self::VleFirst14,
            Self::VleFirst28,
            Self::AvgAssessmentScore,
            Self::NSubmissions,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::AgeBand => "age_band",
            Self::Region => "region",
            Self::HighestEducation => "highest_education",
            Self::ImdBand => "imd_band",
            Self::Disability => "disability",
            Self::NumOfPrevAttempts => "num_of_prev_attempts",
            Self::StudiedCredits => "studied_credits",
            Self::DateRegistration => "date_registration",
            Self::VleTotalClicks => "vle_total_clicks",
            Self::VleDaysActive => "vle_days_active",
            Self::VleFirst14 => "vle_first14",
            Self::VleFirst28 => "vle_first28",
            Self::AvgAssessmentScore => "avg_assessment_score",
            Self::NSubmissions => "n_submissions",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldId {
    type Err = UnknownField;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ordered()
            .into_iter()
            .find(|id| id.as_str() == trimmed)
            .ok_or_else(|| UnknownField(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field '{0}'")]
pub struct UnknownField(pub String);

/// One selectable category. `key` is the exact feature name the model expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryOption {
    pub key: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Categorical {
        options: &'static [CategoryOption],
    },
    /// `min`/`max` are advisory only; encoded values are never clamped.
    Numeric { min: f64, max: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub id: FieldId,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn option(&self, key: &str) -> Option<&'static CategoryOption> {
        match self.kind {
            FieldKind::Categorical { options } => options.iter().find(|option| option.key == key),
            FieldKind::Numeric { .. } => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, FieldKind::Numeric { .. })
    }
}

/// Ordered, validated set of field descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    fields: Vec<FieldDescriptor>,
}

impl FieldSchema {
    /// The vocabulary the production model was trained on.
    pub fn standard() -> Self {
        Self {
            fields: STANDARD_FIELDS.to_vec(),
        }
    }

    /// Builds a schema after checking that every payload key it can emit is unique.
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self, SchemaError> {
        let mut ids = BTreeSet::new();
        for field in &fields {
            if !ids.insert(field.id) {
                return Err(SchemaError::DuplicateField(field.id));
            }
        }

        let mut keys = BTreeSet::new();
        for field in &fields {
            if let FieldKind::Categorical { options } = field.kind {
                if options.is_empty() {
                    return Err(SchemaError::EmptyOptions(field.id));
                }
                for option in options {
                    if ids.iter().any(|id| id.as_str() == option.key) || !keys.insert(option.key)
                    {
                        return Err(SchemaError::DuplicateOptionKey {
                            field: field.id,
                            key: option.key,
                        });
                    }
                }
            }
        }

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn categorical(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| !field.is_numeric())
    }

    pub fn numeric(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.is_numeric())
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::standard()
    }
}

impl Serialize for FieldSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("field '{0}' is described more than once")]
    DuplicateField(FieldId),
    #[error("categorical field '{0}' has no options")]
    EmptyOptions(FieldId),
    #[error("option key '{key}' on field '{field}' collides with another payload key")]
    DuplicateOptionKey { field: FieldId, key: &'static str },
}

const fn option(key: &'static str, label: &'static str) -> CategoryOption {
    CategoryOption { key, label }
}

const fn categorical(
    id: FieldId,
    label: &'static str,
    options: &'static [CategoryOption],
) -> FieldDescriptor {
    FieldDescriptor {
        id,
        label,
        kind: FieldKind::Categorical { options },
    }
}

const fn numeric(id: FieldId, label: &'static str, min: f64, max: f64) -> FieldDescriptor {
    FieldDescriptor {
        id,
        label,
        kind: FieldKind::Numeric { min, max },
    }
}

const GENDER: &[CategoryOption] = &[option("gender_M", "Male"), option("gender_F", "Female")];

const AGE_BAND: &[CategoryOption] = &[
    option("age_band_0-35", "0–35"),
    option("age_band_35-55", "35–55"),
    option("age_band_55<=", "55+"),
];

const REGION: &[CategoryOption] = &[
    option("region_East Anglian Region", "East Anglian Region"),
    option("region_East Midlands Region", "East Midlands Region"),
    option("region_Ireland", "Ireland"),
    option("region_London Region", "London Region"),
    option("region_North Region", "North Region"),
    option("region_North Western Region", "North Western Region"),
    option("region_Scotland", "Scotland"),
    option("region_South East Region", "South East Region"),
    option("region_South Region", "South Region"),
    option("region_South West Region", "South West Region"),
    option("region_Wales", "Wales"),
    option("region_West Midlands Region", "West Midlands Region"),
    option("region_Yorkshire Region", "Yorkshire Region"),
];

const HIGHEST_EDUCATION: &[CategoryOption] = &[
    option(
        "highest_education_A Level or Equivalent",
        "A Level or Equivalent",
    ),
    option("highest_education_HE Qualification", "HE Qualification"),
    option("highest_education_Lower Than A Level", "Lower Than A Level"),
    option("highest_education_No Formal quals", "No Formal quals"),
    option(
        "highest_education_Post Graduate Qualification",
        "Post Graduate Qualification",
    ),
];

// "10-20" has no percent sign in the training data.
const IMD_BAND: &[CategoryOption] = &[
    option("imd_band_0-10%", "0–10%"),
    option("imd_band_10-20", "10–20%"),
    option("imd_band_20-30%", "20–30%"),
    option("imd_band_30-40%", "30–40%"),
    option("imd_band_40-50%", "40–50%"),
    option("imd_band_50-60%", "50–60%"),
    option("imd_band_60-70%", "60–70%"),
    option("imd_band_70-80%", "70–80%"),
    option("imd_band_80-90%", "80–90%"),
    option("imd_band_90-100%", "90–100%"),
];

const DISABILITY: &[CategoryOption] = &[option("disability_N", "No"), option("disability_Y", "Yes")];

const STANDARD_FIELDS: [FieldDescriptor; 15] = [
    categorical(FieldId::Gender, "Gender", GENDER),
    categorical(FieldId::AgeBand, "Age Band", AGE_BAND),
    categorical(FieldId::Region, "Region", REGION),
    categorical(
        FieldId::HighestEducation,
        "Highest Education",
        HIGHEST_EDUCATION,
    ),
    categorical(FieldId::ImdBand, "IMD Band", IMD_BAND),
    categorical(FieldId::Disability, "Disability", DISABILITY),
    numeric(FieldId::NumOfPrevAttempts, "Previous Attempts", 0.0, 10.0),
    numeric(FieldId::StudiedCredits, "Studied Credits", 0.0, 600.0),
    numeric(FieldId::DateRegistration, "Registration Date", -365.0, 365.0),
    numeric(FieldId::VleTotalClicks, "VLE Total Clicks", 0.0, 100_000.0),
    numeric(FieldId::VleDaysActive, "VLE Days Active", 0.0, 365.0),
    numeric(FieldId::VleFirst14, "VLE First 14 Days", 0.0, 14.0),
    numeric(FieldId::VleFirst28, "VLE First 28 Days", 0.0, 28.0),
    numeric(
        FieldId::AvgAssessmentScore,
        "Avg Assessment Score",
        0.0,
        100.0,
    ),
    numeric(FieldId::NSubmissions, "Number of Submissions", 0.0, 50.0),
];
