use crate::console::{run_assess, run_schema, AssessArgs, SchemaArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use dropout_risk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Student Dropout Risk",
    about = "Encode student profiles, score them against the dropout model, and band the result",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score one student profile against the prediction service
    Assess(AssessArgs),
    /// Print the field vocabulary or the model's training columns
    Schema(SchemaArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured prediction service endpoint
    #[arg(long)]
    pub(crate) prediction_url: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Assess(args) => run_assess(args).await,
        Command::Schema(args) => run_schema(args),
    }
}
