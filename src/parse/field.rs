// src/parse/field.rs

use chrono::{NaiveDate, NaiveTime};
use scraper::ElementRef;
use std::str::FromStr;

use super::error::{ParseError, Result};
use super::value::Value;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_TIME_FORMAT: &str = "%I:%M%p";

/// Output fields of the composite player column, in emission order.
pub const PLAYER_FIELDS: [&str; 3] = ["player_id", "player_csk", "player_name"];

/// Attribute carrying the site's player id (e.g. `AlleJo02`).
const PLAYER_ID_ATTR: &str = "data-append-csv";
/// Attribute carrying the sort key (e.g. `AllenJosh`).
const PLAYER_CSK_ATTR: &str = "csk";

/// Text conversion applied by a single-field parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    Identity,
    StrToInt,
    NullableStrToInt,
    StrToFloat,
    NullableStrToFloat,
    StrPercentageToFloat,
    NullableStrPercentageToFloat,
    /// `true` when the cell text equals the marker, e.g. `*` for games started.
    Marker(String),
    /// chrono format string
    DateString(String),
    /// chrono format string
    Time(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserKind {
    /// One field, read from the cell text.
    Unary(Conversion),
    /// Three fields, read from the id and sort-key attributes plus the text.
    Player,
}

/// Converts one table cell into its named output values.
///
/// A parser is immutable once built: its kind and the ordered list of field
/// names it emits are fixed by the constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldParser {
    kind: ParserKind,
    fields: Vec<String>,
}

impl FieldParser {
    fn unary(conversion: Conversion, field: impl Into<String>) -> Self {
        Self {
            kind: ParserKind::Unary(conversion),
            fields: vec![field.into()],
        }
    }

    pub fn identity(field: impl Into<String>) -> Self {
        Self::unary(Conversion::Identity, field)
    }

    pub fn int(field: impl Into<String>) -> Self {
        Self::unary(Conversion::StrToInt, field)
    }

    pub fn nullable_int(field: impl Into<String>) -> Self {
        Self::unary(Conversion::NullableStrToInt, field)
    }

    pub fn float(field: impl Into<String>) -> Self {
        Self::unary(Conversion::StrToFloat, field)
    }

    pub fn nullable_float(field: impl Into<String>) -> Self {
        Self::unary(Conversion::NullableStrToFloat, field)
    }

    pub fn percentage(field: impl Into<String>) -> Self {
        Self::unary(Conversion::StrPercentageToFloat, field)
    }

    pub fn nullable_percentage(field: impl Into<String>) -> Self {
        Self::unary(Conversion::NullableStrPercentageToFloat, field)
    }

    pub fn marker(field: impl Into<String>, marker: impl Into<String>) -> Self {
        Self::unary(Conversion::Marker(marker.into()), field)
    }

    pub fn date(field: impl Into<String>) -> Self {
        Self::date_with_format(field, DEFAULT_DATE_FORMAT)
    }

    pub fn date_with_format(field: impl Into<String>, fmt: impl Into<String>) -> Self {
        Self::unary(Conversion::DateString(fmt.into()), field)
    }

    pub fn time(field: impl Into<String>) -> Self {
        Self::time_with_format(field, DEFAULT_TIME_FORMAT)
    }

    pub fn time_with_format(field: impl Into<String>, fmt: impl Into<String>) -> Self {
        Self::unary(Conversion::Time(fmt.into()), field)
    }

    /// Composite player cell: id attribute, sort-key attribute and visible name.
    pub fn player() -> Self {
        Self {
            kind: ParserKind::Player,
            fields: PLAYER_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn kind(&self) -> &ParserKind {
        &self.kind
    }

    /// Names this parser emits, in emission order.
    pub fn output_fields(&self) -> &[String] {
        &self.fields
    }

    /// Parse a cell into `(field, value)` pairs, exactly `output_fields()` in order.
    pub fn parse<'p>(&'p self, cell: ElementRef<'_>) -> Result<Vec<(&'p str, Value)>> {
        let text: String = cell.text().collect();

        match &self.kind {
            ParserKind::Unary(conversion) => {
                let field = self.fields[0].as_str();
                Ok(vec![(field, convert(conversion, field, text)?)])
            }
            ParserKind::Player => {
                let id = required_attr(cell, &self.fields[0], PLAYER_ID_ATTR)?;
                let csk = required_attr(cell, &self.fields[1], PLAYER_CSK_ATTR)?;
                Ok(vec![
                    (self.fields[0].as_str(), Value::from(id)),
                    (self.fields[1].as_str(), Value::from(csk)),
                    (self.fields[2].as_str(), Value::Str(text)),
                ])
            }
        }
    }
}

fn convert(conversion: &Conversion, field: &str, text: String) -> Result<Value> {
    let value = match conversion {
        Conversion::Identity => Value::Str(text),
        Conversion::StrToInt => Value::Int(number(field, &text, "an integer")?),
        Conversion::NullableStrToInt => {
            nullable(&text, |t| number(field, t, "an integer").map(Value::Int))?
        }
        Conversion::StrToFloat => Value::Float(number(field, &text, "a float")?),
        Conversion::NullableStrToFloat => {
            nullable(&text, |t| number(field, t, "a float").map(Value::Float))?
        }
        Conversion::StrPercentageToFloat => Value::Float(percentage(field, &text)?),
        Conversion::NullableStrPercentageToFloat => {
            nullable(&text, |t| percentage(field, t).map(Value::Float))?
        }
        Conversion::Marker(marker) => Value::Bool(text == *marker),
        Conversion::DateString(fmt) => NaiveDate::parse_from_str(text.trim(), fmt)
            .map(Value::Date)
            .map_err(|_| ParseError::malformed(field, &text, "a date"))?,
        Conversion::Time(fmt) => NaiveTime::parse_from_str(text.trim(), fmt)
            .map(Value::Time)
            .map_err(|_| ParseError::malformed(field, &text, "a time"))?,
    };
    Ok(value)
}

/// Empty text is an absent value, never zero.
fn nullable(text: &str, parse: impl FnOnce(&str) -> Result<Value>) -> Result<Value> {
    if text.is_empty() {
        Ok(Value::Null)
    } else {
        parse(text)
    }
}

fn number<T: FromStr>(field: &str, text: &str, expected: &'static str) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| ParseError::malformed(field, text, expected))
}

/// `"54.3%"` → `0.543`
fn percentage(field: &str, text: &str) -> Result<f64> {
    let digits = text
        .trim()
        .strip_suffix('%')
        .ok_or_else(|| ParseError::malformed(field, text, "a percentage"))?;
    digits
        .trim()
        .parse::<f64>()
        .map(|pct| pct / 100.0)
        .map_err(|_| ParseError::malformed(field, text, "a percentage"))
}

fn required_attr<'a>(cell: ElementRef<'a>, field: &str, attr: &'static str) -> Result<&'a str> {
    cell.value()
        .attr(attr)
        .ok_or_else(|| ParseError::missing_attr(field, attr))
}
