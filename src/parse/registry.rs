// src/parse/registry.rs

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

use super::field::FieldParser;

/// Column identifier (`data-stat`) → field parser.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    parsers: HashMap<String, Arc<FieldParser>>,
}

static DEFAULTS: Lazy<Registry> = Lazy::new(build_defaults);

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide base bindings. Built on first use, never mutated.
    pub fn defaults() -> &'static Registry {
        &DEFAULTS
    }

    /// Bind `column` to `parser`, returning the binding it replaced.
    pub fn insert(
        &mut self,
        column: impl Into<String>,
        parser: FieldParser,
    ) -> Option<Arc<FieldParser>> {
        self.parsers.insert(column.into(), Arc::new(parser))
    }

    /// Builder form of [`Registry::insert`].
    pub fn with(mut self, column: impl Into<String>, parser: FieldParser) -> Self {
        self.insert(column, parser);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Arc<FieldParser>> {
        self.parsers.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.parsers.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }

    /// View of `self` with `overrides` on top. Override bindings win; `self`
    /// is only read.
    pub fn layered<'a>(&'a self, overrides: Option<&'a Registry>) -> Layered<'a> {
        Layered {
            base: self,
            overrides,
        }
    }
}

impl FromIterator<(String, FieldParser)> for Registry {
    fn from_iter<I: IntoIterator<Item = (String, FieldParser)>>(iter: I) -> Self {
        let mut reg = Registry::new();
        reg.extend(iter);
        reg
    }
}

impl Extend<(String, FieldParser)> for Registry {
    fn extend<I: IntoIterator<Item = (String, FieldParser)>>(&mut self, iter: I) {
        for (column, parser) in iter {
            self.insert(column, parser);
        }
    }
}

/// Registry resolved for a single parse call.
#[derive(Debug, Clone, Copy)]
pub struct Layered<'a> {
    base: &'a Registry,
    overrides: Option<&'a Registry>,
}

impl<'a> Layered<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Arc<FieldParser>> {
        self.overrides
            .and_then(|o| o.get(column))
            .or_else(|| self.base.get(column))
    }
}

/// `gs` on game logs: an asterisk when the player started.
pub fn games_started_marker() -> Registry {
    Registry::new().with("gs", FieldParser::marker("gs", "*"))
}

/// `gs` on season and fantasy tables: number of games started.
pub fn games_started_count() -> Registry {
    Registry::new().with("gs", FieldParser::nullable_int("gs"))
}

fn build_defaults() -> Registry {
    use FieldParser as P;

    let mut reg = Registry::new();
    let mut bind = |column: &str, parser: fn(String) -> FieldParser| {
        reg.insert(column, parser(column.to_string()));
    };

    // Game identity
    bind("year_id", P::int);
    bind("game_date", P::identity);
    bind("game_num", P::int);
    bind("week_num", P::int);
    bind("age", P::identity);
    bind("team", P::identity);
    bind("game_location", P::identity);
    bind("opp", P::identity);
    bind("game_result", P::identity);
    // Raw text: game logs mark starts with `*`, season tables count them.
    // Callers pick one with games_started_marker()/games_started_count().
    bind("gs", P::identity);

    // Passing
    bind("pass_cmp", P::nullable_int);
    bind("pass_att", P::nullable_int);
    bind("pass_cmp_perc", P::nullable_percentage);
    bind("pass_yds", P::nullable_int);
    bind("pass_td", P::nullable_int);
    bind("pass_int", P::nullable_int);
    bind("pass_rating", P::nullable_float);
    bind("pass_sacked", P::nullable_int);
    bind("pass_sacked_yds", P::nullable_int);
    bind("pass_yds_per_att", P::nullable_float);
    bind("pass_adj_yds_per_att", P::nullable_float);

    // Rushing & receiving
    bind("rush_att", P::nullable_int);
    bind("rush_yds", P::nullable_int);
    bind("rush_yds_per_att", P::nullable_float);
    bind("rush_td", P::nullable_int);
    bind("targets", P::nullable_int);
    bind("rec", P::nullable_int);
    bind("rec_yds", P::nullable_int);
    bind("rec_yds_per_rec", P::nullable_float);
    bind("rec_td", P::nullable_int);
    bind("catch_pct", P::percentage);
    bind("rec_yds_per_tgt", P::nullable_float);

    // Scoring & snaps
    bind("two_pt_md", P::nullable_int);
    bind("all_td", P::nullable_int);
    bind("scoring", P::nullable_int);
    bind("fumbles", P::nullable_int);
    bind("fumbles_lost", P::nullable_int);
    bind("offense", P::nullable_int);
    bind("off_pct", P::nullable_percentage);

    // Special teams
    bind("kick_ret", P::nullable_int);
    bind("kick_ret_yds", P::nullable_int);
    bind("kick_ret_yds_per_ret", P::nullable_float);
    bind("kick_ret_td", P::nullable_int);
    bind("punt_ret", P::nullable_int);
    bind("punt_ret_yds", P::nullable_int);
    bind("punt_ret_yds_per_ret", P::nullable_float);
    bind("punt_ret_td", P::nullable_int);
    bind("special_teams", P::nullable_int);
    bind("st_pct", P::nullable_percentage);

    // Defense
    bind("sacks", P::nullable_float);
    bind("tackles_solo", P::nullable_int);
    bind("tackles_assists", P::nullable_int);
    bind("tackles_combined", P::nullable_int);
    bind("tackles_loss", P::nullable_int);
    bind("qb_hits", P::nullable_int);
    bind("fumbles_forced", P::nullable_int);
    bind("fumbles_rec", P::nullable_int);
    bind("fumbles_rec_yds", P::nullable_int);
    bind("fumbles_rec_td", P::nullable_int);
    bind("def_int", P::nullable_int);
    bind("def_int_yds", P::nullable_int);
    bind("def_int_td", P::nullable_int);
    bind("pass_defended", P::nullable_int);
    bind("defense", P::nullable_int);
    bind("def_pct", P::nullable_percentage);

    // Fantasy
    bind("player", P::identity);
    bind("fantasy_pos", P::identity);
    bind("g", P::nullable_int);
    bind("two_pt_pass", P::nullable_float);
    bind("fantasy_points", P::nullable_float);
    bind("fantasy_points_ppr", P::nullable_float);
    bind("draftkings_points", P::nullable_float);
    bind("fanduel_points", P::nullable_float);
    bind("vbd", P::nullable_int);
    bind("fantasy_rank_pos", P::nullable_int);
    bind("fantasy_rank_overall", P::nullable_int);

    reg
}
