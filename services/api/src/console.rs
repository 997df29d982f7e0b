use crate::infra::{configured_encoder, http_assessor, profile_from_assignments};
use crate::routes::AssessmentResponse;
use chrono::Utc;
use clap::Args;
use dropout_risk::config::AppConfig;
use dropout_risk::error::AppError;
use dropout_risk::prediction::{
    training_columns, AssessmentOutcome, EncodedPayload, FieldDescriptor, FieldKind, FieldSchema,
    ModelFeatureRow,
};
use dropout_risk::telemetry;

#[derive(Args, Debug, Default)]
pub(crate) struct AssessArgs {
    /// Field assignment such as `gender=gender_F` or `studied_credits=120` (repeatable)
    #[arg(long, value_name = "FIELD=VALUE")]
    pub(crate) set: Vec<String>,
    /// Override the configured prediction service endpoint
    #[arg(long)]
    pub(crate) prediction_url: Option<String>,
    /// Print the encoded payload before submitting it
    #[arg(long)]
    pub(crate) show_payload: bool,
    /// Print the outcome as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SchemaArgs {
    /// List the model's training columns instead of the input fields
    #[arg(long)]
    pub(crate) columns: bool,
    /// With --columns, show only the columns a profile activates (repeatable)
    #[arg(long, value_name = "FIELD=VALUE")]
    pub(crate) set: Vec<String>,
}

pub(crate) async fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let AssessArgs {
        set,
        prediction_url,
        show_payload,
        json,
    } = args;

    let mut config = AppConfig::load()?;
    if let Some(endpoint) = prediction_url {
        config.prediction.endpoint = endpoint;
    }
    telemetry::init(&config.telemetry)?;

    let assessor = http_assessor(&config.prediction)?;
    let profile = profile_from_assignments(assessor.schema(), &set)?;
    let payload = assessor.encoder().encode(&profile);

    if show_payload {
        render_payload(&payload);
    }

    let outcome = assessor.submit(&payload).await;

    if json {
        let response = AssessmentResponse::from_outcome(&outcome, Utc::now());
        match serde_json::to_string_pretty(&response) {
            Ok(body) => println!("{body}"),
            Err(err) => println!("Outcome unavailable as JSON: {err}"),
        }
    } else {
        for line in describe_outcome(&outcome) {
            println!("{line}");
        }
    }

    Ok(())
}

pub(crate) fn run_schema(args: SchemaArgs) -> Result<(), AppError> {
    let schema = FieldSchema::standard();

    if !args.columns {
        for field in schema.fields() {
            println!("{}", describe_field(field));
        }
        return Ok(());
    }

    if args.set.is_empty() {
        for (index, column) in training_columns(&schema).iter().enumerate() {
            println!("{:>2}. {}", index + 1, column);
        }
        return Ok(());
    }

    let config = AppConfig::load()?;
    let encoder = configured_encoder(&config.prediction);
    let profile = profile_from_assignments(&schema, &args.set)?;
    let payload = encoder.encode(&profile);
    let row = ModelFeatureRow::from_payload(&schema, &payload);
    println!(
        "Active model columns (missing categories: {:?})",
        encoder.policy()
    );
    for column in row.active() {
        println!("- {} = {}", column.name, column.value);
    }

    Ok(())
}

fn render_payload(payload: &EncodedPayload) {
    match serde_json::to_string_pretty(payload) {
        Ok(body) => println!("Encoded payload:\n{body}"),
        Err(err) => println!("Encoded payload unavailable: {err}"),
    }
}

pub(crate) fn describe_outcome(outcome: &AssessmentOutcome) -> Vec<String> {
    match outcome {
        AssessmentOutcome::Assessed(assessment) => vec![
            format!("Predicted risk score: {}", assessment.percent()),
            format!("{}: {}", assessment.band.label(), assessment.advisory),
        ],
        AssessmentOutcome::ServiceError(message) => {
            vec![format!("Prediction failed: {message}")]
        }
        AssessmentOutcome::TransportFailure(err) => vec![
            outcome
                .failure_message()
                .unwrap_or_default()
                .to_string(),
            format!("  ({err})"),
        ],
    }
}

fn describe_field(field: &FieldDescriptor) -> String {
    match field.kind {
        FieldKind::Categorical { options } => {
            let choices = options
                .iter()
                .map(|option| format!("{} [{}]", option.key, option.label))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} ({}): {}", field.id, field.label, choices)
        }
        FieldKind::Numeric { min, max } => format!(
            "{} ({}): number, advisory range {} to {}, defaults to 0",
            field.id, field.label, min, max
        ),
    }
}
