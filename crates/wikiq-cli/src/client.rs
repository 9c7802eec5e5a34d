//! Shared client wiring, error types, navigation, and telemetry helpers for the CLI.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::anyhow;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use wikiq_session::{
    ApiError, Destination, FileSessionStore, Gatekeeper, Navigator, SessionError, WikiApi,
    origin_key,
};

use crate::cli::Cli;

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";
pub(crate) const TELEMETRY_ENDPOINT_ENV: &str = "WIKIQ_TELEMETRY_ENDPOINT";
const TELEMETRY_TIMEOUT: Duration = Duration::from_secs(2);

/// CLI-level error type to distinguish validation, session, and operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Session(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
            Self::Session(_) => 4,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::Session(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        tracing::debug!(error = ?err, "session operation failed");
        match &err {
            SessionError::SessionExpired | SessionError::Unauthenticated => {
                Self::Session(err.user_message())
            }
            SessionError::Rejected { .. } => Self::Validation(err.user_message()),
            _ => Self::Failure(anyhow!(err.user_message())),
        }
    }
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Session(inner) => inner.into(),
            ApiError::Server { status, .. }
                if matches!(
                    status,
                    StatusCode::BAD_REQUEST
                        | StatusCode::CONFLICT
                        | StatusCode::UNPROCESSABLE_ENTITY
                ) =>
            {
                Self::Validation(err.user_message())
            }
            other => Self::Failure(anyhow!(other.user_message())),
        }
    }
}

/// HTTP client shared by every call of one invocation.
///
/// Requests carry the invocation's trace id; a timeout applies only when one
/// was configured.
pub(crate) fn build_http_client(timeout_secs: Option<u64>, trace_id: &str) -> CliResult<Client> {
    let mut default_headers = HeaderMap::new();
    let request_id = HeaderValue::from_str(trace_id).map_err(|_| {
        CliError::failure(anyhow!("trace identifier contains invalid characters"))
    })?;
    default_headers.insert(HEADER_REQUEST_ID, request_id);

    let mut builder = Client::builder().default_headers(default_headers);
    if let Some(secs) = timeout_secs.filter(|secs| *secs > 0) {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) api: WikiApi,
    pub(crate) wiki_base_url: Option<Url>,
}

impl AppContext {
    /// Wire the gatekeeper to the session file and terminal for `cli`.
    pub(crate) fn from_cli(cli: &Cli, trace_id: &str) -> CliResult<Self> {
        let session_path = match &cli.session_file {
            Some(path) => path.clone(),
            None => default_session_path()?,
        };
        let store = Arc::new(FileSessionStore::new(session_path, &cli.api_url));
        tracing::debug!(
            origin = store.origin(),
            path = %store.path().display(),
            "session store ready"
        );
        let navigator = Arc::new(TerminalNavigator::new(origin_key(&cli.api_url)));
        let client = build_http_client(cli.timeout, trace_id)?;

        Ok(Self {
            api: WikiApi::new(Gatekeeper::new(
                client,
                cli.api_url.clone(),
                store,
                navigator,
            )),
            wiki_base_url: cli.wiki_base_url.clone(),
        })
    }
}

/// Navigator that tells the terminal user where to go next.
pub(crate) struct TerminalNavigator {
    origin: String,
}

impl TerminalNavigator {
    pub(crate) const fn new(origin: String) -> Self {
        Self { origin }
    }

    pub(crate) fn hint(&self, destination: Destination) -> String {
        match destination {
            Destination::Login => "session expired or missing; run `wikiq login`".to_string(),
            Destination::Landing => format!("logged in to {}", self.origin),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, destination: Destination) {
        eprintln!("{}", self.hint(destination));
    }
}

/// Summary of one invocation, posted to the telemetry endpoint when set.
#[derive(Debug, Serialize)]
pub(crate) struct CommandOutcome<'a> {
    pub(crate) command: &'a str,
    pub(crate) outcome: &'a str,
    pub(crate) trace_id: &'a str,
    pub(crate) exit_code: i32,
    /// Origin of the API the command talked to.
    pub(crate) api_origin: &'a str,
    /// Session state once the command finished, `unknown` when the context
    /// could not be built.
    pub(crate) session: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<&'a str>,
    pub(crate) timestamp_ms: u64,
}

/// Best-effort reporter for command outcomes.
#[derive(Clone)]
pub(crate) struct OutcomeReporter {
    client: Client,
    endpoint: Url,
}

impl OutcomeReporter {
    pub(crate) fn new(endpoint: Url) -> CliResult<Self> {
        let client = Client::builder()
            .timeout(TELEMETRY_TIMEOUT)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build telemetry client: {err}")))?;
        Ok(Self { client, endpoint })
    }

    /// Reporter for `WIKIQ_TELEMETRY_ENDPOINT`; an unusable value disables
    /// reporting rather than failing the command.
    pub(crate) fn from_env() -> Option<Self> {
        let raw = std::env::var(TELEMETRY_ENDPOINT_ENV).ok()?;
        let reporter = parse_url(&raw)
            .map_err(CliError::validation)
            .and_then(Self::new);
        match reporter {
            Ok(reporter) => Some(reporter),
            Err(err) => {
                tracing::debug!(error = %err.display_message(), "telemetry disabled");
                None
            }
        }
    }

    pub(crate) async fn report(&self, outcome: &CommandOutcome<'_>) {
        let sent = self
            .client
            .post(self.endpoint.clone())
            .json(outcome)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);
        if let Err(err) = sent {
            tracing::debug!(error = %err, command = outcome.command, "telemetry report failed");
        }
    }
}

/// Parse an HTTP(S) URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    let url = input
        .trim()
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported URL scheme '{other}' in '{input}'; use http or https")),
    }
}

/// Session file used when none is configured.
pub(crate) fn default_session_path() -> CliResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("wikiq").join("session.json"))
        .ok_or_else(|| {
            CliError::validation(
                "could not determine a config directory; pass --session-file or set WIKIQ_SESSION_FILE",
            )
        })
}

/// Milliseconds since the Unix epoch, saturating on overflow.
pub(crate) fn timestamp_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use anyhow::{Result, anyhow};
    use httpmock::MockServer;
    use reqwest::Client;
    use wikiq_session::{
        Gatekeeper, MemorySessionStore, RecordingNavigator, SessionToken, WikiApi,
    };

    use super::AppContext;

    pub(crate) struct TestContext {
        pub(crate) ctx: AppContext,
        pub(crate) store: Arc<MemorySessionStore>,
        pub(crate) navigator: Arc<RecordingNavigator>,
    }

    pub(crate) fn context_with(server: &MockServer, token: Option<&str>) -> Result<TestContext> {
        let store = Arc::new(token.map_or_else(MemorySessionStore::new, |value| {
            MemorySessionStore::with_token(SessionToken::new(value))
        }));
        let navigator = Arc::new(RecordingNavigator::default());
        let gatekeeper = Gatekeeper::new(
            Client::new(),
            server
                .base_url()
                .parse()
                .map_err(|_| anyhow!("valid URL"))?,
            store.clone(),
            navigator.clone(),
        );
        Ok(TestContext {
            ctx: AppContext {
                api: WikiApi::new(gatekeeper),
                wiki_base_url: Some(
                    "http://wiki.local"
                        .parse()
                        .map_err(|_| anyhow!("valid URL"))?,
                ),
            },
            store,
            navigator,
        })
    }
}
