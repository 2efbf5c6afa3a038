// src/parse/table.rs

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{debug, warn};

use super::error::{ParseError, Result};
use super::filter::RowFilter;
use super::registry::Registry;
use super::value::Value;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("valid selector"));
static THEAD: Lazy<Selector> = Lazy::new(|| Selector::parse("thead").expect("valid selector"));
static TBODY: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody").expect("valid selector"));

/// Attribute naming the statistic a header cell describes.
pub const COLUMN_ID_ATTR: &str = "data-stat";

/// One retained header cell: its `data-stat` identifier and display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnHeader {
    pub id: String,
    pub label: String,
}

/// Typed contents of one statistics table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsTable {
    /// Source columns, ranking column excluded.
    pub headers: Vec<ColumnHeader>,
    /// Output field names; a composite column contributes several.
    pub columns: Vec<String>,
    /// One entry per data row, each exactly `columns.len()` wide.
    pub rows: Vec<Vec<Value>>,
}

impl StatsTable {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of output column `name`, top to bottom.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Rows as JSON objects keyed by output column name.
    pub fn records(&self) -> serde_json::Result<Vec<serde_json::Map<String, serde_json::Value>>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(name, value)| Ok((name.clone(), serde_json::to_value(value)?)))
                    .collect::<serde_json::Result<_>>()
            })
            .collect()
    }
}

/// First `<table id="{id}">` in the document.
pub fn find_table<'a>(doc: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    doc.select(&TABLE).find(|t| t.value().id() == Some(id))
}

/// Direct element children of `el` with tag `name`.
fn children_named<'a>(el: ElementRef<'a>, name: &'a str) -> impl Iterator<Item = ElementRef<'a>> {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

/// Parse one statistics table into typed rows.
///
/// Columns come from the last `<thead>` row, minus the leading ranking
/// column. Each body row's `<td>` cells are paired with those columns by
/// position, never by key; a short row leaves its trailing fields `Null`.
///
/// `overrides` sit on top of [`Registry::defaults`] for this call only. An
/// unbound column or a cell its parser rejects fails the whole table.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(table = table.value().id().unwrap_or("<anonymous>"))
)]
pub fn parse_stats_table(
    table: ElementRef<'_>,
    row_filter: Option<&RowFilter>,
    overrides: Option<&Registry>,
) -> Result<StatsTable> {
    // 1) header definitions live in the final header row
    let thead = table
        .select(&THEAD)
        .next()
        .ok_or(ParseError::MissingSection("<thead>"))?;
    let header_row = children_named(thead, "tr")
        .last()
        .ok_or(ParseError::MissingSection("header row"))?;

    // 2) (data-stat, label) per header cell
    let mut headers = Vec::new();
    for (index, th) in children_named(header_row, "th").enumerate() {
        let id = th
            .value()
            .attr(COLUMN_ID_ATTR)
            .ok_or(ParseError::MissingColumnId { index })?;
        headers.push(ColumnHeader {
            id: id.to_string(),
            label: th.text().collect(),
        });
    }

    // 3) ranking column is never data
    if !headers.is_empty() {
        headers.remove(0);
    }

    // 4) + 5) resolve every parser up front; fixes row width and field order
    let registry = Registry::defaults().layered(overrides);
    let parsers = headers
        .iter()
        .map(|h| {
            registry.get(&h.id).ok_or_else(|| ParseError::UnknownColumn {
                column: h.id.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let columns: Vec<String> = parsers
        .iter()
        .flat_map(|p| p.output_fields().iter().cloned())
        .collect();
    debug!(
        headers = headers.len(),
        width = columns.len(),
        "resolved columns"
    );

    // 6) data rows: direct children of the body that pass the filter
    let tbody = table
        .select(&TBODY)
        .next()
        .ok_or(ParseError::MissingSection("<tbody>"))?;
    let selected = children_named(tbody, "tr")
        .filter(|tr| row_filter.map_or(true, |f| f.matches(*tr)));

    // 7) lockstep: the Nth <td> is read by the Nth header's parser
    let mut rows = Vec::new();
    for (row_idx, tr) in selected.enumerate() {
        let mut row = vec![Value::Null; columns.len()];
        let mut cursor = 0;
        let mut cells = 0;
        for ((header, parser), td) in headers.iter().zip(&parsers).zip(children_named(tr, "td")) {
            let values = parser.parse(td).map_err(|e| e.in_column(&header.id))?;
            for (_, value) in values {
                row[cursor] = value;
                cursor += 1;
            }
            cells += 1;
        }

        // 8) short rows are tolerated
        if cells < parsers.len() {
            warn!(
                row = row_idx,
                cells,
                expected = parsers.len(),
                "ragged row; trailing fields left null"
            );
        }
        rows.push(row);
    }

    debug!(rows = rows.len(), "parsed table");
    Ok(StatsTable {
        headers,
        columns,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::field::FieldParser;
    use regex::Regex;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    fn table_html(header_ids: &[&str], body: &str) -> String {
        let ths: String = header_ids
            .iter()
            .map(|id| format!(r#"<th data-stat="{0}">{0}</th>"#, id))
            .collect();
        format!(
            r#"<html><body><table id="stats">
                <thead>
                    <tr class="over_header"><th></th><th colspan="3">Passing</th></tr>
                    <tr>{}</tr>
                </thead>
                <tbody>{}</tbody>
            </table></body></html>"#,
            ths, body
        )
    }

    fn parse(
        html: &str,
        filter: Option<&RowFilter>,
        overrides: Option<&Registry>,
    ) -> Result<StatsTable> {
        let doc = Html::parse_document(html);
        let table = find_table(&doc, "stats").expect("fixture table");
        parse_stats_table(table, filter, overrides)
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn assert_close(v: &Value, expected: f64) {
        let got = v.as_f64().expect("numeric");
        assert!((got - expected).abs() < 1e-12, "{} != {}", got, expected);
    }

    #[test]
    fn passing_table_end_to_end() {
        let overrides = Registry::new()
            .with("player", FieldParser::identity("player"))
            .with("pass_yds", FieldParser::int("pass_yds"))
            .with("pass_cmp_perc", FieldParser::percentage("pass_cmp_perc"));
        let html = table_html(
            &["rank", "player", "pass_yds", "pass_cmp_perc"],
            r#"<tr><th data-stat="rank">1</th><td data-stat="player">Josh Allen</td><td data-stat="pass_yds">4283</td><td data-stat="pass_cmp_perc">63.3%</td></tr>"#,
        );

        let out = parse(&html, None, Some(&overrides)).unwrap();
        assert_eq!(out.columns, ["player", "pass_yds", "pass_cmp_perc"]);
        assert_eq!(out.len(), 1);
        let row = &out.rows[0];
        assert_eq!(row[0], Value::from("Josh Allen"));
        assert_eq!(row[1], Value::Int(4283));
        assert_close(&row[2], 0.633);

        let labels: Vec<&str> = out.headers.iter().map(|h| h.label.as_str()).collect();
        assert_eq!(labels, ["player", "pass_yds", "pass_cmp_perc"]);
    }

    #[test]
    fn ranking_column_is_dropped_whatever_its_id() {
        // `pass_yds` in the first slot is still the ranking column
        let html = table_html(
            &["pass_yds", "team"],
            r#"<tr><th>1</th><td>BUF</td></tr>"#,
        );
        let out = parse(&html, None, None).unwrap();
        assert_eq!(out.columns, ["team"]);
        assert_eq!(out.rows, vec![vec![Value::from("BUF")]]);
    }

    #[test]
    fn composite_player_column_expands_to_three() {
        let overrides = Registry::new().with("player", FieldParser::player());
        let html = table_html(
            &["ranker", "player", "team", "pass_td"],
            r#"<tr><th>1</th><td data-stat="player" data-append-csv="AlleJo02" csk="AllenJosh"><a href="/players/A/AlleJo02.htm">Josh Allen</a></td><td>BUF</td><td>29</td></tr>"#,
        );

        let out = parse(&html, None, Some(&overrides)).unwrap();
        assert_eq!(
            out.columns,
            ["player_id", "player_csk", "player_name", "team", "pass_td"]
        );
        assert_eq!(
            out.rows[0],
            vec![
                Value::from("AlleJo02"),
                Value::from("AllenJosh"),
                Value::from("Josh Allen"),
                Value::from("BUF"),
                Value::Int(29),
            ]
        );
        assert_eq!(out.headers.len(), 3);
    }

    #[test]
    fn shape_follows_parser_output_fields() {
        let overrides = Registry::new().with("player", FieldParser::player());
        let html = table_html(
            &["ranker", "team", "player", "rec", "catch_pct"],
            r#"<tr><th>1</th><td>KC</td><td data-append-csv="KelcTr00" csk="KelceTravis">Travis Kelce</td><td>93</td><td>76.9%</td></tr>
               <tr><th>2</th><td>SF</td><td data-append-csv="KittGe00" csk="KittleGeorge">George Kittle</td><td></td><td>71.4%</td></tr>"#,
        );
        let out = parse(&html, None, Some(&overrides)).unwrap();

        let layered = Registry::defaults().layered(Some(&overrides));
        let expected: usize = out
            .headers
            .iter()
            .map(|h| layered.get(&h.id).unwrap().output_fields().len())
            .sum();
        assert_eq!(out.width(), expected);
        assert!(out.rows.iter().all(|r| r.len() == expected));
        assert_eq!(
            out.columns,
            ["team", "player_id", "player_csk", "player_name", "rec", "catch_pct"]
        );
        assert!(out.rows[1][4].is_null());
    }

    #[test]
    fn override_takes_precedence_over_defaults() {
        let html = table_html(&["ranker", "gs"], r#"<tr><th>1</th><td>*</td></tr>"#);

        let raw = parse(&html, None, None).unwrap();
        assert_eq!(raw.rows[0][0], Value::from("*"));

        let marker = crate::parse::registry::games_started_marker();
        let flagged = parse(&html, None, Some(&marker)).unwrap();
        assert_eq!(flagged.rows[0][0], Value::Bool(true));
    }

    #[test]
    fn unknown_column_fails_before_rows() {
        // the row would also fail to parse; the unknown column is reported first
        let html = table_html(
            &["ranker", "pass_yds", "mystery_stat"],
            r#"<tr><th>1</th><td>not a number</td><td>x</td></tr>"#,
        );
        match parse(&html, None, None) {
            Err(ParseError::UnknownColumn { column }) => assert_eq!(column, "mystery_stat"),
            other => panic!("expected UnknownColumn, got {:?}", other),
        }
    }

    #[test]
    fn malformed_cell_aborts_the_whole_table() {
        let html = table_html(
            &["ranker", "year_id"],
            r#"<tr><th>1</th><td>2023</td></tr><tr><th>2</th><td>2023*</td></tr>"#,
        );
        match parse(&html, None, None) {
            Err(ParseError::MalformedValue { column, field, raw, .. }) => {
                assert_eq!(column, "year_id");
                assert_eq!(field, "year_id");
                assert_eq!(raw, "2023*");
            }
            other => panic!("expected MalformedValue, got {:?}", other),
        }
    }

    #[test]
    fn ragged_row_leaves_trailing_nulls() {
        let html = table_html(
            &["ranker", "team", "opp", "rush_yds"],
            r#"<tr><th>1</th><td>BUF</td><td>NYJ</td><td>12</td></tr>
               <tr><th>2</th><td>BUF</td><td>LVR</td></tr>"#,
        );
        let out = parse(&html, None, None).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.rows[0][2], Value::Int(12));
        assert_eq!(out.rows[1].len(), 3);
        assert_eq!(out.rows[1][1], Value::from("LVR"));
        assert!(out.rows[1][2].is_null());
    }

    #[test]
    fn ragged_row_is_logged_as_a_warning() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let full = table_html(&["ranker", "team", "opp"], r#"<tr><th>1</th><td>BUF</td><td>NYJ</td></tr>"#);
        tracing::subscriber::with_default(subscriber, || parse(&full, None, None)).unwrap();
        assert!(!logs.contents().contains("ragged row"));

        let overrides = Registry::new().with("player", FieldParser::player());
        let short = table_html(
            &["ranker", "player", "team", "opp"],
            r#"<tr><th>1</th><td data-append-csv="AlleJo02" csk="AllenJosh">Josh Allen</td></tr>"#,
        );
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let out = tracing::subscriber::with_default(subscriber, || {
            parse(&short, None, Some(&overrides))
        })
        .unwrap();

        assert_eq!(out.rows[0].len(), 5);
        assert_eq!(out.rows[0][2], Value::from("Josh Allen"));
        assert!(out.rows[0][3].is_null() && out.rows[0][4].is_null());

        let logged = logs.contents();
        assert!(logged.contains("WARN"), "{}", logged);
        assert!(logged.contains("ragged row"), "{}", logged);
        assert!(logged.contains("cells=1"), "{}", logged);
        assert!(logged.contains("expected=3"), "{}", logged);
    }

    #[test]
    fn cell_errors_name_the_header_column() {
        let missing_id = table_html(
            &["ranker", "player"],
            r#"<tr><th>1</th><td csk="AllenJosh">Josh Allen</td></tr>"#,
        );
        let overrides = Registry::new().with("player", FieldParser::player());
        match parse(&missing_id, None, Some(&overrides)) {
            Err(ParseError::MissingAttribute { column, field, attr }) => {
                assert_eq!(column, "player");
                assert_eq!(field, "player_id");
                assert_eq!(attr, "data-append-csv");
            }
            other => panic!("expected MissingAttribute, got {:?}", other),
        }

        // bound under a different output name
        let renamed = Registry::new().with("gs", FieldParser::int("games_started"));
        let html = table_html(&["ranker", "gs"], r#"<tr><th>1</th><td>*</td></tr>"#);
        let err = parse(&html, None, Some(&renamed)).unwrap_err();
        assert!(err.to_string().contains("column `gs`"), "{}", err);
        match err {
            ParseError::MalformedValue { column, field, .. } => {
                assert_eq!(column, "gs");
                assert_eq!(field, "games_started");
            }
            other => panic!("expected MalformedValue, got {:?}", other),
        }
    }

    #[test]
    fn row_filter_skips_section_breaks_and_non_stat_rows() {
        let html = table_html(
            &["ranker", "week_num", "opp"],
            r#"<tr id="stats.1"><th>1</th><td>1</td><td>NYJ</td></tr>
               <tr class="thead"><th>Rk</th><td>Week</td><td>Opp</td></tr>
               <tr id="stats.2"><th>2</th><td>2</td><td>LVR</td></tr>"#,
        );

        let by_class = parse(&html, Some(&RowFilter::skip_section_breaks()), None).unwrap();
        let by_id = parse(
            &html,
            Some(&RowFilter::id_pattern(Regex::new(r"^stats\..*$").unwrap())),
            None,
        )
        .unwrap();
        assert_eq!(by_class, by_id);
        let weeks: Vec<&Value> = by_class.column("week_num").unwrap().collect();
        assert_eq!(weeks, [&Value::Int(1), &Value::Int(2)]);

        // without a filter the "Week" text reaches the integer parser
        assert!(parse(&html, None, None).is_err());
    }

    #[test]
    fn single_header_row_is_accepted() {
        let html = r#"<table id="stats"><thead><tr><th data-stat="ranker">Rk</th><th data-stat="opp">Opp</th></tr></thead>
            <tbody><tr><th>1</th><td>MIA</td></tr></tbody></table>"#;
        let out = parse(html, None, None).unwrap();
        assert_eq!(out.rows, vec![vec![Value::from("MIA")]]);
    }

    #[test]
    fn missing_sections_are_reported() {
        let no_body = r#"<table id="stats"><thead><tr><th data-stat="ranker"></th></tr></thead></table>"#;
        assert!(matches!(
            parse(no_body, None, None),
            Err(ParseError::MissingSection("<tbody>"))
        ));

        let no_stat = r#"<table id="stats"><thead><tr><th data-stat="ranker"></th><th>Opp</th></tr></thead><tbody></tbody></table>"#;
        assert!(matches!(
            parse(no_stat, None, None),
            Err(ParseError::MissingColumnId { index: 1 })
        ));
    }

    #[test]
    fn records_are_keyed_by_column() {
        let html = table_html(
            &["ranker", "team", "off_pct"],
            r#"<tr><th>1</th><td>BUF</td><td></td></tr>"#,
        );
        let out = parse(&html, None, None).unwrap();
        let records = out.records().unwrap();
        assert_eq!(records[0]["team"], serde_json::json!("BUF"));
        assert!(records[0]["off_pct"].is_null());
    }

    #[test]
    fn records_serialise_cells_like_value() {
        let overrides = Registry::new()
            .with("game_date", FieldParser::date("game_date"))
            .with("gametime", FieldParser::time("gametime"))
            .with("rating", FieldParser::float("rating"));
        let html = table_html(
            &["ranker", "game_date", "gametime", "rating", "gs"],
            r#"<tr><th>1</th><td>2023-09-11</td><td>8:15PM</td><td>NaN</td><td>*</td></tr>"#,
        );
        let out = parse(&html, None, Some(&overrides)).unwrap();
        let records = out.records().unwrap();

        assert_eq!(records[0]["game_date"], serde_json::json!("2023-09-11"));
        assert_eq!(records[0]["gametime"], serde_json::json!("20:15:00"));
        // no JSON number for NaN
        assert!(records[0]["rating"].is_null());
        for (name, value) in out.columns.iter().zip(&out.rows[0]) {
            assert_eq!(records[0][name], serde_json::to_value(value).unwrap());
        }
    }
}
