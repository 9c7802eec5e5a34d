//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::Url;
use tracing::Instrument;
use uuid::Uuid;
use wikiq_session::{SessionState, origin_key};
use wikiq_telemetry::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, command_span, init_logging, record_outcome,
};

use crate::client::{
    AppContext, CliResult, CommandOutcome, OutcomeReporter, parse_url, timestamp_now_ms,
};
use crate::commands::session::{handle_login, handle_whoami};
use crate::commands::wiki::{
    handle_ask, handle_documents, handle_extract, handle_search, handle_status,
};

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

/// Parse CLI arguments, execute the selected command, and return the exit code.
pub async fn run() -> i32 {
    run_with_cli(Cli::parse()).await
}

pub(crate) async fn run_with_cli(cli: Cli) -> i32 {
    let logging = LoggingConfig {
        level: &cli.log_level,
        format: LogFormat::from_label(&cli.log_format),
        build_sha: env!("CARGO_PKG_VERSION"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    let trace_id = Uuid::new_v4().to_string();
    let command = command_label(&cli.command);
    let api_origin = origin_key(&cli.api_url);
    let reporter = OutcomeReporter::from_env();

    let span = command_span(command, &trace_id);
    let (result, session) = execute(cli, &trace_id).instrument(span.clone()).await;

    let (outcome, exit_code, message) = match &result {
        Ok(()) => ("success", 0, None),
        Err(err) => ("error", err.exit_code(), Some(err.display_message())),
    };
    record_outcome(&span, outcome, exit_code);

    if let Some(message) = &message {
        eprintln!("{message}");
    }

    if let Some(reporter) = reporter {
        reporter
            .report(&CommandOutcome {
                command,
                outcome,
                trace_id: &trace_id,
                exit_code,
                api_origin: &api_origin,
                session: session.map_or("unknown", SessionState::as_str),
                message: message.as_deref(),
                timestamp_ms: timestamp_now_ms(),
            })
            .await;
    }

    exit_code
}

/// Run the command and report the session state it left behind.
async fn execute(cli: Cli, trace_id: &str) -> (CliResult<()>, Option<SessionState>) {
    let ctx = match AppContext::from_cli(&cli, trace_id) {
        Ok(ctx) => ctx,
        Err(err) => return (Err(err), None),
    };
    let result = dispatch(&ctx, cli.command, cli.output).await;
    (result, Some(ctx.api.gatekeeper().session_state()))
}

async fn dispatch(ctx: &AppContext, command: Command, format: OutputFormat) -> CliResult<()> {
    match command {
        Command::Login(args) => handle_login(ctx, args).await,
        Command::Whoami => handle_whoami(ctx, format).await,
        Command::Status => handle_status(ctx, format).await,
        Command::Extract(args) => handle_extract(ctx, args, format).await,
        Command::Ask(args) => handle_ask(ctx, args, format).await,
        Command::Search(args) => handle_search(ctx, args, format).await,
        Command::Documents => handle_documents(ctx, format).await,
    }
}

pub(crate) const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Login(_) => "login",
        Command::Whoami => "whoami",
        Command::Status => "status",
        Command::Extract(_) => "extract",
        Command::Ask(_) => "ask",
        Command::Search(_) => "search",
        Command::Documents => "documents",
    }
}

#[derive(Parser)]
#[command(
    name = "wikiq",
    about = "Command-line client for the wiki knowledge assistant",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "WIKIQ_API_URL",
        default_value = DEFAULT_API_URL,
        value_parser = parse_url
    )]
    pub(crate) api_url: Url,
    #[arg(long, global = true, env = "WIKIQ_SESSION_FILE")]
    pub(crate) session_file: Option<PathBuf>,
    #[arg(long, global = true, env = "WIKIQ_HTTP_TIMEOUT_SECS")]
    pub(crate) timeout: Option<u64>,
    #[arg(long, global = true, env = "WIKIQ_WIKI_BASE_URL", value_parser = parse_url)]
    pub(crate) wiki_base_url: Option<Url>,
    #[arg(long, global = true, env = "WIKIQ_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub(crate) log_level: String,
    #[arg(long, global = true, env = "WIKIQ_LOG_FORMAT", default_value = "pretty")]
    pub(crate) log_format: String,
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Exchange credentials for a session token.
    Login(LoginArgs),
    /// Show the profile behind the stored session.
    Whoami,
    /// Show knowledge base status.
    Status,
    /// Ingest wiki content into the knowledge base.
    Extract(ExtractArgs),
    /// Ask the assistant a question.
    Ask(AskArgs),
    /// Run a similarity search over indexed chunks.
    Search(SearchArgs),
    /// List indexed documents.
    Documents,
}

#[derive(Args)]
pub(crate) struct LoginArgs {
    #[arg(long, short = 'u', env = "WIKIQ_USERNAME")]
    pub(crate) username: String,
    #[arg(long, env = "WIKIQ_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
}

#[derive(Args)]
pub(crate) struct ExtractArgs {
    #[arg(long, env = "WIKIQ_WIKI_URL", value_parser = parse_url)]
    pub(crate) wiki_url: Option<Url>,
}

#[derive(Args)]
pub(crate) struct AskArgs {
    #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
    pub(crate) question: Vec<String>,
}

#[derive(Args)]
pub(crate) struct SearchArgs {
    pub(crate) query: String,
    #[arg(long)]
    pub(crate) limit: Option<u32>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}
