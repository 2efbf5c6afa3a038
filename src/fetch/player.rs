// src/fetch/player.rs

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use url::Url;

use super::{fetch_page, page_url, parse_page_table};
use crate::config;
use crate::parse::{Registry, RowFilter, StatsTable};

pub const REGULAR_SEASON_TABLE: &str = "stats";
pub const PLAYOFFS_TABLE: &str = "stats_playoffs";

/// Game rows carry ids like `stats.423`; totals and section breaks do not.
static STAT_ROW_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^stats\..*$").expect("valid stat row pattern"));

pub fn gamelog_row_filter() -> RowFilter {
    RowFilter::id_pattern(STAT_ROW_ID.clone())
}

/// A player's pages, addressed by the site's player id (e.g. `AlleJo02`).
#[derive(Debug, Clone)]
pub struct Player {
    name: String,
    player_id: String,
    base_url: String,
}

impl Player {
    pub fn new(name: impl Into<String>, player_id: impl Into<String>) -> Self {
        Self::with_base_url(name, player_id, config::base_url())
    }

    pub fn with_base_url(
        name: impl Into<String>,
        player_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            player_id: player_id.into(),
            base_url: base_url.into(),
        }
    }

    /// `{base}/players/{first letter of id}/{id}`
    pub fn url_base(&self) -> Result<Url> {
        let first = self
            .player_id
            .chars()
            .next()
            .ok_or_else(|| anyhow!("player `{}` has an empty id", self.name))?;
        page_url(
            &self.base_url,
            &format!("players/{}/{}", first, self.player_id),
        )
    }

    /// Game log for `season`, or the career log when `None`.
    pub fn gamelog_url(&self, season: Option<&str>) -> Result<Url> {
        let base = self.url_base()?;
        page_url(
            base.as_str(),
            &format!("gamelog/{}", season.unwrap_or_default()),
        )
    }

    pub async fn regular_season_gamelog(
        &self,
        client: &Client,
        season: Option<&str>,
        overrides: Option<&Registry>,
    ) -> Result<StatsTable> {
        let html = fetch_page(client, &self.gamelog_url(season)?).await?;
        parse_gamelog_page(&html, REGULAR_SEASON_TABLE, overrides)
    }

    pub async fn playoffs_gamelog(
        &self,
        client: &Client,
        season: Option<&str>,
        overrides: Option<&Registry>,
    ) -> Result<StatsTable> {
        let html = fetch_page(client, &self.gamelog_url(season)?).await?;
        parse_gamelog_page(&html, PLAYOFFS_TABLE, overrides)
    }
}

/// HTML half of the game log clients.
pub fn parse_gamelog_page(
    html: &str,
    table_id: &str,
    overrides: Option<&Registry>,
) -> Result<StatsTable> {
    parse_page_table(html, table_id, &gamelog_row_filter(), overrides)
}
