// Availability response normalization: nested payload -> flat flight records

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One flattened flight, one per (trip, date, flight) entry in the payload.
/// Field names follow the export format consumed downstream; absent values
/// serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    #[serde(rename = "Origin")]
    pub origin: Option<String>,
    #[serde(rename = "Destination")]
    pub destination: Option<String>,
    #[serde(rename = "Flight duration")]
    pub duration: Option<String>,
    #[serde(rename = "Flight number")]
    pub flight_number: Option<String>,
    #[serde(rename = "Price")]
    pub price: Option<f64>,
    #[serde(rename = "Time departure")]
    pub time_departure: Option<String>,
    #[serde(rename = "Time arrival")]
    pub time_arrival: Option<String>,
    #[serde(rename = "key")]
    pub key: Option<String>,
    #[serde(rename = "scrapedAt")]
    pub scraped_at: String,
    /// Opaque fare detail, passed through uninterpreted.
    #[serde(rename = "regularFare")]
    pub regular_fare: Option<Value>,
    /// Opaque operating-carrier detail, passed through uninterpreted.
    #[serde(rename = "operatedBy")]
    pub operated_by: Option<Value>,
}

/// Flattens `trips[*].dates[*].flights[*]` into records, in input order.
///
/// Never fails: missing or malformed nested fields become absent values and
/// malformed containers are treated as empty. Each record inherits the
/// enclosing trip's origin/destination, and every record from one call shares
/// a single `scrapedAt` timestamp captured before traversal. Emission stops
/// across the whole traversal once `max_items` records have been produced.
pub fn normalize_availability(payload: &Value, max_items: Option<usize>) -> Vec<FlightRecord> {
    let scraped_at = Utc::now().to_rfc3339();
    let mut records = Vec::new();

    for trip in array(payload, "trips") {
        let origin = text(trip, "origin");
        let destination = text(trip, "destination");
        for date_block in array(trip, "dates") {
            for flight in array(date_block, "flights") {
                let times = array(flight, "timeUTC");
                records.push(FlightRecord {
                    origin: origin.clone(),
                    destination: destination.clone(),
                    duration: text(flight, "duration"),
                    flight_number: text(flight, "flightNumber"),
                    price: extract_price(flight),
                    time_departure: times.first().and_then(as_text),
                    time_arrival: times.get(1).and_then(as_text),
                    key: text(flight, "key"),
                    scraped_at: scraped_at.clone(),
                    regular_fare: passthrough(flight, "regularFare"),
                    operated_by: passthrough(flight, "operatedBy"),
                });
                if let Some(cap) = max_items {
                    if records.len() >= cap {
                        return records;
                    }
                }
            }
        }
    }

    records
}

// First fare's amount, if the fare list is non-empty and the amount is
// numerically coercible.
fn extract_price(flight: &Value) -> Option<f64> {
    let amount = flight
        .get("regularFare")?
        .get("fares")?
        .as_array()?
        .first()?
        .get("amount")?;
    match amount {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn text(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(as_text)
}

fn as_text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_owned)
}

fn passthrough(value: &Value, key: &str) -> Option<Value> {
    value.get(key).filter(|v| !v.is_null()).cloned()
}
