// src/fetch/mod.rs
//! Page clients: build a page URL, download it, and hand the named table
//! to the parse core. One GET per call; no retries, no caching.

use anyhow::{Context, Result};
use reqwest::Client;
use scraper::Html;
use tracing::info;
use url::Url;

use crate::parse::{find_table, parse_stats_table, Registry, RowFilter, StatsTable};

pub mod fantasy;
pub mod player;

pub use fantasy::Fantasy;
pub use player::Player;

/// GET `url` and return the body; any non-success status is an error.
pub async fn fetch_page(client: &Client, url: &Url) -> Result<String> {
    info!(url = %url, "fetching");
    let body = client
        .get(url.as_str())
        .send()
        .await
        .with_context(|| format!("requesting {}", url))?
        .error_for_status()
        .with_context(|| format!("fetching {}", url))?
        .text()
        .await
        .with_context(|| format!("reading body of {}", url))?;
    Ok(body)
}

/// Parse the `<table id="{table_id}">` of an already downloaded page.
pub fn parse_page_table(
    html: &str,
    table_id: &str,
    row_filter: &RowFilter,
    overrides: Option<&Registry>,
) -> Result<StatsTable> {
    let doc = Html::parse_document(html);
    let table = find_table(&doc, table_id)
        .with_context(|| format!("page has no table `{}`", table_id))?;
    let parsed = parse_stats_table(table, Some(row_filter), overrides)
        .with_context(|| format!("parsing table `{}`", table_id))?;
    Ok(parsed)
}

/// `{base}/{path}` as a URL.
fn page_url(base: &str, path: &str) -> Result<Url> {
    let raw = format!("{}/{}", base.trim_end_matches('/'), path);
    Url::parse(&raw).with_context(|| format!("invalid page url {}", raw))
}
