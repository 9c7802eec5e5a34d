//! Answer text transformations applied before printing.

use anyhow::anyhow;
use once_cell::sync::OnceCell;
use regex::{Captures, Regex};
use reqwest::Url;

use crate::client::{CliError, CliResult};

const WIKI_IMAGE_PATTERN: &str = r"<WIKI_IMAGE>(.*?)</WIKI_IMAGE>";

static WIKI_IMAGE: OnceCell<Regex> = OnceCell::new();

fn wiki_image_pattern() -> CliResult<&'static Regex> {
    WIKI_IMAGE
        .get_or_try_init(|| Regex::new(WIKI_IMAGE_PATTERN))
        .map_err(|err| CliError::failure(anyhow!("failed to compile image pattern: {err}")))
}

/// Direct file link for an image hosted on the wiki.
pub(crate) fn wiki_image_url(base: &Url, name: &str) -> String {
    format!(
        "{}/index.php?title=Special:Filepath/{name}",
        base.as_str().trim_end_matches('/')
    )
}

/// Replace `<WIKI_IMAGE>` tags with Markdown image links, or a plain marker
/// when no wiki base URL is known.
pub(crate) fn rewrite_wiki_images(answer: &str, base: Option<&Url>) -> CliResult<String> {
    let rewritten = wiki_image_pattern()?.replace_all(answer, |caps: &Captures<'_>| {
        let name = caps.get(1).map_or("", |found| found.as_str()).trim();
        base.map_or_else(
            || format!("[image: {name}]"),
            |base| format!("![{name}]({})", wiki_image_url(base, name)),
        )
    });
    Ok(rewritten.into_owned())
}

/// Confidence as a whole percentage, rounded half away from zero.
#[allow(
    clippy::cast_possible_truncation,
    reason = "confidence is clamped to [0, 1] before scaling"
)]
pub(crate) fn confidence_percent(confidence: f64) -> i64 {
    if confidence.is_nan() {
        return 0;
    }
    (confidence.clamp(0.0, 1.0) * 100.0).round() as i64
}
