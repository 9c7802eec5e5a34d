use std::io::{self, IsTerminal};

use anyhow::anyhow;
use wikiq_session::Credential;

use crate::cli::{LoginArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_profile;

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    if args.username.trim().is_empty() {
        return Err(CliError::validation("username must not be empty"));
    }
    let password = resolve_password(args.password)?;

    ctx.api
        .gatekeeper()
        .login(&Credential::new(args.username, password))
        .await?;
    Ok(())
}

pub(crate) async fn handle_whoami(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    ctx.api.gatekeeper().require_session()?;
    let profile = ctx.api.me().await?;
    render_profile(&profile, format)
}

/// Passwords are sent verbatim; only an entirely empty value is rejected.
fn resolve_password(flag: Option<String>) -> CliResult<String> {
    if let Some(value) = flag {
        if value.is_empty() {
            return Err(CliError::validation("password must not be empty"));
        }
        return Ok(value);
    }

    if io::stdin().is_terminal() {
        let password = rpassword::prompt_password("Password: ").map_err(|err| {
            CliError::failure(anyhow!("failed to read password from stdin: {err}"))
        })?;
        if password.is_empty() {
            return Err(CliError::validation("password must not be empty"));
        }
        Ok(password)
    } else {
        Err(CliError::validation(
            "password required; supply via --password or WIKIQ_PASSWORD when running non-interactively",
        ))
    }
}
