use crate::error::{Error, Result};
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static NON_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\D+").expect("Invalid regex pattern"));

/// Join the digit runs of `input` with single spaces.
///
/// The input must hold exactly `count` runs and start and end with a digit.
/// The first run is a four digit year, the others one or two digits each.
fn digit_fields(type_name: &str, input: &str, count: usize) -> Result<String> {
    let fields: Vec<&str> = NON_DIGITS.split(input).collect();
    let well_formed = fields.len() == count
        && fields[0].len() == 4
        && fields[1..].iter().all(|field| (1..=2).contains(&field.len()));
    if !well_formed {
        return Err(Error::conversion(
            type_name,
            input,
            format!("expected {count} separated digit groups"),
        ));
    }
    Ok(fields.join(" "))
}

/// Parse a date from any text whose digits read `YYYY MM DD`.
///
/// `2020-01-02`, `2020/01/02` and `2020.01.02` are all the same date.
pub fn parse_date(input: &str) -> Result<Value> {
    let fields = digit_fields("date", input, 3)?;
    NaiveDate::parse_from_str(&fields, "%Y %m %d")
        .map(Value::Date)
        .map_err(|e| Error::conversion("date", input, e))
}

/// Parse a datetime from any text whose digits read `YYYY MM DD HH MM SS`.
pub fn parse_datetime(input: &str) -> Result<Value> {
    let fields = digit_fields("datetime", input, 6)?;
    NaiveDateTime::parse_from_str(&fields, "%Y %m %d %H %M %S")
        .map(Value::DateTime)
        .map_err(|e| Error::conversion("datetime", input, e))
}
