// Search query validation: untyped JSON input -> typed SearchQuery

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// Error types for input validation
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid {field} IATA code '{value}', expected 3-letter code")]
    InvalidAirportCode { field: &'static str, value: String },

    #[error("Invalid {field} '{value}', expected an integer")]
    NotAnInteger { field: &'static str, value: String },

    #[error("{field} cannot be negative (got {value})")]
    NegativeCount { field: &'static str, value: i64 },

    #[error("{field} is too large (got {value})")]
    CountTooLarge { field: &'static str, value: i64 },

    #[error("At least one passenger must be specified")]
    NoPassengers,

    #[error("Number of infants cannot exceed number of adults")]
    InfantsExceedAdults,

    #[error("Invalid currency '{0}', expected 3-letter ISO code")]
    InvalidCurrency(String),

    #[error("Invalid locale '{0}', expected pattern like 'en-gb'")]
    InvalidLocale(String),

    #[error("Invalid {field} '{value}', expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("dateTo is required for ROUND_TRIP searches")]
    MissingReturnDate,

    #[error("dateTo must be on or after dateFrom for ROUND_TRIP")]
    ReturnBeforeDeparture,

    #[error("maxItems must be a positive integer when provided")]
    InvalidMaxItems,

    #[error("Invalid proxy URL '{0}'")]
    InvalidProxyUrl(String),

    #[error("Invalid proxy URL scheme '{0}', expected http or https")]
    InvalidProxyScheme(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripType {
    OneWay,
    RoundTrip,
}

impl TripType {
    /// Case-insensitive mapping with `-` treated as `_`; `RETURN` is a
    /// synonym for round trip and anything unrecognised means one way.
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_uppercase().replace('-', "_").as_str() {
            "ROUND_TRIP" | "RETURN" => TripType::RoundTrip,
            _ => TripType::OneWay,
        }
    }
}

/// A fully validated availability search. Immutable once constructed;
/// serializes back to the same camelCase shape it was parsed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub origin: String,
    pub destination: String,
    pub date_from: String,
    /// Raw return date. Required for round trips; for one-way searches a
    /// provided value is carried through untouched and never read again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    pub trip_type: TripType,
    pub adults: u32,
    pub teens: u32,
    pub children: u32,
    pub infants: u32,
    pub currency: String,
    pub locale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

impl SearchQuery {
    /// Validates an untyped input object and builds the typed query.
    /// Fails on the first violated rule: required fields, then per-field
    /// formats, then cross-field constraints.
    pub fn from_value(input: &Value) -> Result<Self, ValidationError> {
        let origin = require_string(input, "origin")?.to_uppercase();
        let destination = require_string(input, "destination")?.to_uppercase();
        let date_from = require_string(input, "dateFrom")?;
        let trip_type = TripType::from_raw(&require_string(input, "tripType")?);
        let date_to = input
            .get("dateTo")
            .filter(|v| !v.is_null())
            .map(coerce_string);

        check_airport_code(&origin, "origin")?;
        check_airport_code(&destination, "destination")?;

        let adults = coerce_count(input, "adults", 1)?;
        let teens = coerce_count(input, "teens", 0)?;
        let children = coerce_count(input, "children", 0)?;
        let infants = coerce_count(input, "infants", 0)?;
        check_passengers(adults, teens, children, infants)?;

        let currency = optional_string(input, "currency")
            .unwrap_or_else(|| "EUR".to_string())
            .to_uppercase();
        if !is_alpha_code(&currency) {
            return Err(ValidationError::InvalidCurrency(currency));
        }

        let locale = optional_string(input, "locale")
            .unwrap_or_else(|| "en-gb".to_string())
            .to_lowercase();
        if !locale.contains('-') {
            return Err(ValidationError::InvalidLocale(locale));
        }

        let departure = parse_date(&date_from, "dateFrom")?;
        if trip_type == TripType::RoundTrip {
            let raw = date_to
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or(ValidationError::MissingReturnDate)?;
            let ret = parse_date(raw, "dateTo")?;
            if ret < departure {
                return Err(ValidationError::ReturnBeforeDeparture);
            }
        }

        let max_items = coerce_max_items(input)?;

        Ok(SearchQuery {
            origin,
            destination,
            date_from,
            date_to,
            trip_type,
            adults: adults as u32,
            teens: teens as u32,
            children: children as u32,
            infants: infants as u32,
            currency,
            locale,
            max_items,
        })
    }
}

fn require_string(input: &Value, field: &'static str) -> Result<String, ValidationError> {
    input
        .get(field)
        .filter(|v| !v.is_null())
        .map(coerce_string)
        .ok_or(ValidationError::MissingField(field))
}

fn optional_string(input: &Value, field: &str) -> Option<String> {
    input.get(field).filter(|v| !v.is_null()).map(coerce_string)
}

// Strings pass through as-is; scalars keep their JSON rendering.
fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce_count(input: &Value, field: &'static str, default: i64) -> Result<i64, ValidationError> {
    let value = match input.get(field) {
        None | Some(Value::Null) => return Ok(default),
        Some(v) => v,
    };
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ValidationError::NotAnInteger {
        field,
        value: coerce_string(value),
    })
}

fn coerce_max_items(input: &Value) -> Result<Option<usize>, ValidationError> {
    match input.get("maxItems") {
        None | Some(Value::Null) => Ok(None),
        Some(_) => {
            let n =
                coerce_count(input, "maxItems", 0).map_err(|_| ValidationError::InvalidMaxItems)?;
            if n <= 0 {
                return Err(ValidationError::InvalidMaxItems);
            }
            Ok(Some(n as usize))
        }
    }
}

fn is_alpha_code(code: &str) -> bool {
    code.chars().count() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

fn check_airport_code(code: &str, field: &'static str) -> Result<(), ValidationError> {
    if !is_alpha_code(code) {
        return Err(ValidationError::InvalidAirportCode {
            field,
            value: code.to_string(),
        });
    }
    Ok(())
}

fn check_passengers(
    adults: i64,
    teens: i64,
    children: i64,
    infants: i64,
) -> Result<(), ValidationError> {
    for (field, value) in [
        ("adults", adults),
        ("teens", teens),
        ("children", children),
        ("infants", infants),
    ] {
        if value < 0 {
            return Err(ValidationError::NegativeCount { field, value });
        }
        // Counts are stored as u32; anything beyond that range must not
        // silently truncate.
        if value > i64::from(u32::MAX) {
            return Err(ValidationError::CountTooLarge { field, value });
        }
    }
    if adults + teens + children + infants == 0 {
        return Err(ValidationError::NoPassengers);
    }
    if infants > adults {
        return Err(ValidationError::InfantsExceedAdults);
    }
    Ok(())
}

fn parse_date(raw: &str, field: &'static str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}
