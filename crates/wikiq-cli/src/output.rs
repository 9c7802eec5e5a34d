//! Output renderers and formatting helpers for CLI commands.

use std::fmt::Write as _;

use anyhow::anyhow;
use reqwest::Url;
use serde::Serialize;
use wikiq_api_models::{
    AskResponse, DocumentListResponse, ExtractResponse, SearchResponse, StatusResponse,
    UserProfile,
};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};
use crate::render::{confidence_percent, rewrite_wiki_images};

const SNIPPET_CHARS: usize = 160;

pub(crate) fn render_answer(
    answer: &AskResponse,
    wiki_base_url: Option<&Url>,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(answer),
        OutputFormat::Table => {
            print!("{}", answer_text(answer, wiki_base_url)?);
            Ok(())
        }
    }
}

pub(crate) fn render_status(status: &StatusResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(status),
        OutputFormat::Table => {
            print!("{}", status_text(status));
            Ok(())
        }
    }
}

pub(crate) fn render_extract(extract: &ExtractResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(extract),
        OutputFormat::Table => {
            println!("{}", extract_text(extract));
            Ok(())
        }
    }
}

pub(crate) fn render_search(search: &SearchResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(search),
        OutputFormat::Table => {
            if search.results.is_empty() {
                println!("no results for \"{}\"", search.query);
                return Ok(());
            }
            for (index, hit) in search.results.iter().enumerate() {
                let score = hit
                    .similarity_score
                    .map_or_else(String::new, |score| format!(" (score {score:.2})"));
                println!("[{}] {}{score}", index + 1, hit.metadata.title);
                println!("    {}", snippet(&hit.content));
            }
            Ok(())
        }
    }
}

pub(crate) fn render_documents(list: &DocumentListResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(list),
        OutputFormat::Table => {
            println!("{:>6} {:<40} URL", "ID", "TITLE");
            for document in &list.documents {
                let id = document
                    .id
                    .map_or_else(|| "-".to_string(), |id| id.to_string());
                println!("{id:>6} {:<40} {}", document.title, document.url);
            }
            Ok(())
        }
    }
}

pub(crate) fn render_profile(profile: &UserProfile, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(profile),
        OutputFormat::Table => {
            println!("id: {}", profile.id);
            println!("username: {}", profile.username);
            println!("role: {}", profile.role);
            Ok(())
        }
    }
}

/// Human-readable answer block: rewritten text, footer, and sources.
pub(crate) fn answer_text(answer: &AskResponse, wiki_base_url: Option<&Url>) -> CliResult<String> {
    let mut text = rewrite_wiki_images(&answer.answer, wiki_base_url)?;
    text.push_str("\n\n");
    let _ = writeln!(
        text,
        "confidence: {}% | chunks consulted: {}",
        confidence_percent(answer.confidence),
        answer.context_chunks_used
    );
    if !answer.sources.is_empty() {
        text.push_str("sources:\n");
        for source in &answer.sources {
            let _ = writeln!(text, "- {} ({})", source.title, source.url);
        }
    }
    Ok(text)
}

pub(crate) fn status_text(status: &StatusResponse) -> String {
    let headline = if status.is_ready() {
        "knowledge base active"
    } else {
        "knowledge base empty"
    };
    format!(
        "{headline}\ndocuments: {}\nchunks: {}\n",
        status.documents, status.chunks
    )
}

pub(crate) fn extract_text(extract: &ExtractResponse) -> String {
    let mut text = format!(
        "processed {} documents and {} text chunks",
        extract.documents_processed, extract.total_chunks_created
    );
    if let Some(pages) = extract.total_pages_found {
        let _ = write!(text, " ({pages} pages found)");
    }
    text
}

fn snippet(content: &str) -> String {
    let flattened = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= SNIPPET_CHARS {
        return flattened;
    }
    let mut cut: String = flattened.chars().take(SNIPPET_CHARS).collect();
    cut.push_str("...");
    cut
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}
