use crate::cli::{AskArgs, ExtractArgs, OutputFormat, SearchArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_answer, render_documents, render_extract, render_search, render_status};

pub(crate) async fn handle_status(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    ctx.api.gatekeeper().require_session()?;
    let status = ctx.api.status().await?;
    render_status(&status, format)
}

pub(crate) async fn handle_extract(
    ctx: &AppContext,
    args: ExtractArgs,
    format: OutputFormat,
) -> CliResult<()> {
    ctx.api.gatekeeper().require_session()?;
    let wiki_url = args.wiki_url.ok_or_else(|| {
        CliError::validation("wiki URL is required (pass --wiki-url or set WIKIQ_WIKI_URL)")
    })?;

    let extract = ctx.api.extract(wiki_url.as_str()).await?;
    render_extract(&extract, format)?;

    // A failed refresh is reported on its own; the extraction already succeeded.
    if format == OutputFormat::Table {
        match ctx.api.status().await {
            Ok(status) => render_status(&status, format)?,
            Err(err) => {
                tracing::warn!(error = %err, "status refresh after extract failed");
                eprintln!("could not refresh status: {}", err.user_message());
            }
        }
    }
    Ok(())
}

pub(crate) async fn handle_ask(
    ctx: &AppContext,
    args: AskArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let question = args.question.join(" ");
    if question.trim().is_empty() {
        return Err(CliError::validation("question must not be empty"));
    }
    ctx.api.gatekeeper().require_session()?;

    let answer = ctx.api.ask(&question).await?;
    render_answer(&answer, ctx.wiki_base_url.as_ref(), format)
}

pub(crate) async fn handle_search(
    ctx: &AppContext,
    args: SearchArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let query = args.query.trim();
    if query.is_empty() {
        return Err(CliError::validation("query must not be empty"));
    }
    if args.limit == Some(0) {
        return Err(CliError::validation("limit must be greater than zero"));
    }
    ctx.api.gatekeeper().require_session()?;

    let results = ctx.api.search(query, args.limit).await?;
    render_search(&results, format)
}

pub(crate) async fn handle_documents(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    ctx.api.gatekeeper().require_session()?;
    let documents = ctx.api.documents().await?;
    render_documents(&documents, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::context_with;
    use anyhow::{Result, anyhow};
    use httpmock::prelude::*;
    use serde_json::json;
    use wikiq_api_models::{ASK_PATH, DOCUMENTS_PATH, EXTRACT_PATH, SEARCH_PATH, STATUS_PATH};
    use wikiq_session::{Destination, SessionStore, SessionToken};

    fn ask_args(words: &[&str]) -> AskArgs {
        AskArgs {
            question: words.iter().map(ToString::to_string).collect(),
        }
    }

    #[tokio::test]
    async fn status_expiry_clears_token_and_redirects() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path(STATUS_PATH)
                .header("authorization", "Bearer T1");
            then.status(401);
        });

        let harness = context_with(&server, Some("T1"))?;
        let err = handle_status(&harness.ctx, OutputFormat::Table)
            .await
            .expect_err("expired session");

        mock.assert();
        assert_eq!(err.exit_code(), 4);
        assert!(harness.store.get().is_none());
        assert_eq!(harness.navigator.destinations(), vec![Destination::Login]);
        Ok(())
    }

    #[tokio::test]
    async fn status_server_error_keeps_token() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path(STATUS_PATH);
            then.status(500)
                .header("content-type", "application/json")
                .json_body(json!({"error": "database offline"}));
        });

        let harness = context_with(&server, Some("T1"))?;
        let err = handle_status(&harness.ctx, OutputFormat::Table)
            .await
            .expect_err("server error");

        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("database offline"));
        assert_eq!(harness.store.get(), Some(SessionToken::new("T1")));
        Ok(())
    }

    #[tokio::test]
    async fn ask_sends_question_with_bearer() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(ASK_PATH)
                .header("authorization", "Bearer T1")
                .header("content-type", "application/json")
                .json_body(json!({"question": "how do I deploy"}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "answer": "y",
                    "confidence": 0.8,
                    "context_chunks_used": 3,
                    "sources": []
                }));
        });

        let harness = context_with(&server, Some("T1"))?;
        handle_ask(
            &harness.ctx,
            ask_args(&["how", "do", "I", "deploy"]),
            OutputFormat::Table,
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;

        mock.assert();
        assert_eq!(harness.store.get(), Some(SessionToken::new("T1")));
        Ok(())
    }

    #[tokio::test]
    async fn blank_question_is_rejected_before_any_request() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path(ASK_PATH);
            then.status(200);
        });

        let harness = context_with(&server, Some("T1"))?;
        let err = handle_ask(&harness.ctx, ask_args(&["  "]), OutputFormat::Table)
            .await
            .expect_err("blank question");

        assert_eq!(err.exit_code(), 2);
        mock.assert_hits(0);
        Ok(())
    }

    #[tokio::test]
    async fn ask_without_session_redirects_to_login() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path(ASK_PATH);
            then.status(200);
        });

        let harness = context_with(&server, None)?;
        let err = handle_ask(&harness.ctx, ask_args(&["x"]), OutputFormat::Table)
            .await
            .expect_err("no session");

        assert_eq!(err.exit_code(), 4);
        mock.assert_hits(0);
        assert_eq!(harness.navigator.last(), Some(Destination::Login));
        Ok(())
    }

    #[tokio::test]
    async fn extract_posts_url_then_refreshes_status() -> Result<()> {
        let server = MockServer::start_async().await;
        let extract = server.mock(|when, then| {
            when.method(POST)
                .path(EXTRACT_PATH)
                .json_body(json!({"wiki_url": "http://wiki.local/"}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "message": "done",
                    "documents_processed": 2,
                    "total_chunks_created": 9
                }));
        });
        let status = server.mock(|when, then| {
            when.method(GET).path(STATUS_PATH);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"status": "ready", "documents": 2, "chunks": 9}));
        });

        let harness = context_with(&server, Some("T1"))?;
        let args = ExtractArgs {
            wiki_url: Some("http://wiki.local/".parse()?),
        };
        handle_extract(&harness.ctx, args, OutputFormat::Table)
            .await
            .map_err(|err| anyhow!(err.display_message()))?;

        extract.assert();
        status.assert();
        Ok(())
    }

    #[tokio::test]
    async fn extract_succeeds_when_status_refresh_fails() -> Result<()> {
        let server = MockServer::start_async().await;
        let extract = server.mock(|when, then| {
            when.method(POST).path(EXTRACT_PATH);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"documents_processed": 1, "total_chunks_created": 3}));
        });
        let status = server.mock(|when, then| {
            when.method(GET).path(STATUS_PATH);
            then.status(500)
                .header("content-type", "application/json")
                .json_body(json!({"error": "index unavailable"}));
        });

        let harness = context_with(&server, Some("T1"))?;
        let args = ExtractArgs {
            wiki_url: Some("http://wiki.local/".parse()?),
        };
        handle_extract(&harness.ctx, args, OutputFormat::Table)
            .await
            .map_err(|err| anyhow!(err.display_message()))?;

        extract.assert();
        status.assert();
        assert_eq!(harness.store.get(), Some(SessionToken::new("T1")));
        Ok(())
    }

    #[tokio::test]
    async fn extract_requires_a_wiki_url() -> Result<()> {
        let server = MockServer::start_async().await;
        let harness = context_with(&server, Some("T1"))?;
        let err = handle_extract(
            &harness.ctx,
            ExtractArgs { wiki_url: None },
            OutputFormat::Table,
        )
        .await
        .expect_err("missing URL");
        assert_eq!(err.exit_code(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn search_forwards_limit() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(SEARCH_PATH)
                .json_body(json!({"query": "deploy", "limit": 3}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "query": "deploy",
                    "results": [{
                        "content": "Run the pipeline.",
                        "metadata": {"title": "Deploying"},
                        "similarity_score": 0.91
                    }]
                }));
        });

        let harness = context_with(&server, Some("T1"))?;
        let args = SearchArgs {
            query: " deploy ".to_string(),
            limit: Some(3),
        };
        handle_search(&harness.ctx, args, OutputFormat::Table)
            .await
            .map_err(|err| anyhow!(err.display_message()))?;

        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn documents_lists_catalog() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path(DOCUMENTS_PATH)
                .header("authorization", "Bearer T1");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "documents": [{"id": 1, "title": "Home", "url": "http://wiki.local/Home"}]
                }));
        });

        let harness = context_with(&server, Some("T1"))?;
        handle_documents(&harness.ctx, OutputFormat::Json)
            .await
            .map_err(|err| anyhow!(err.display_message()))?;

        mock.assert();
        Ok(())
    }
}
