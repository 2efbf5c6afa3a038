// src/parse/filter.rs

use regex::Regex;
use scraper::ElementRef;

#[derive(Debug, Clone)]
pub enum AttrPredicate {
    Equals(String),
    NotEquals(String),
    Matches(Regex),
}

/// Selects which body rows are data rows.
///
/// All predicates must hold. `class` is compared per token, so a row with
/// `class="thead over_header"` counts as equal to `thead`. A missing
/// attribute never equals or matches anything, and always passes
/// `attr_ne`.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    predicates: Vec<(String, AttrPredicate)>,
}

impl RowFilter {
    /// Accepts every row.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr_eq(mut self, attr: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates
            .push((attr.into(), AttrPredicate::Equals(value.into())));
        self
    }

    pub fn attr_ne(mut self, attr: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates
            .push((attr.into(), AttrPredicate::NotEquals(value.into())));
        self
    }

    pub fn attr_matches(mut self, attr: impl Into<String>, pattern: Regex) -> Self {
        self.predicates
            .push((attr.into(), AttrPredicate::Matches(pattern)));
        self
    }

    /// Drops the repeated header rows (`class="thead"`) embedded in long bodies.
    pub fn skip_section_breaks() -> Self {
        Self::new().attr_ne("class", "thead")
    }

    /// Keeps rows whose `id` matches `pattern`, e.g. `^stats\.` on game logs.
    pub fn id_pattern(pattern: Regex) -> Self {
        Self::new().attr_matches("id", pattern)
    }

    pub fn matches(&self, row: ElementRef<'_>) -> bool {
        self.predicates.iter().all(|(attr, pred)| {
            let raw = row.value().attr(attr);
            let mut tokens = attr_tokens(attr, raw);
            match pred {
                AttrPredicate::Equals(v) => tokens.any(|t| t == v.as_str()),
                AttrPredicate::NotEquals(v) => !tokens.any(|t| t == v.as_str()),
                AttrPredicate::Matches(re) => tokens.any(|t| re.is_match(t)),
            }
        })
    }
}

fn attr_tokens<'a>(attr: &str, raw: Option<&'a str>) -> Box<dyn Iterator<Item = &'a str> + 'a> {
    match raw {
        None => Box::new(std::iter::empty()),
        Some(v) if attr == "class" => Box::new(v.split_whitespace()),
        Some(v) => Box::new(std::iter::once(v)),
    }
}
