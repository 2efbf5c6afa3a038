// src/fetch/fantasy.rs

use anyhow::Result;
use reqwest::Client;
use url::Url;

use super::{fetch_page, page_url, parse_page_table};
use crate::config;
use crate::parse::{Registry, RowFilter, StatsTable};

pub const RANKINGS_TABLE: &str = "fantasy";

/// Season fantasy rankings.
#[derive(Debug, Clone)]
pub struct Fantasy {
    season: String,
    base_url: String,
}

impl Fantasy {
    pub fn new(season: impl Into<String>) -> Self {
        Self::with_base_url(season, config::base_url())
    }

    pub fn with_base_url(season: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            season: season.into(),
            base_url: base_url.into(),
        }
    }

    pub fn rankings_url(&self) -> Result<Url> {
        page_url(&self.base_url, &format!("years/{}/fantasy.htm", self.season))
    }

    pub async fn rankings(
        &self,
        client: &Client,
        overrides: Option<&Registry>,
    ) -> Result<StatsTable> {
        let html = fetch_page(client, &self.rankings_url()?).await?;
        parse_rankings_page(&html, overrides)
    }
}

/// HTML half of [`Fantasy::rankings`]. The body repeats its header every
/// thirty rows as `class="thead"`; those rows are skipped.
pub fn parse_rankings_page(html: &str, overrides: Option<&Registry>) -> Result<StatsTable> {
    parse_page_table(
        html,
        RANKINGS_TABLE,
        &RowFilter::skip_section_breaks(),
        overrides,
    )
}
