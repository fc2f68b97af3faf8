// Orchestration: validate -> fetch -> normalize -> export

use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::client::{
    AvailabilityClient, HttpAvailabilityClient, TransportError, DEFAULT_MAX_RETRIES,
};
use crate::config::Settings;
use crate::export::{write_records, ExportError};
use crate::normalize::{normalize_availability, FlightRecord};
use crate::query::{SearchQuery, ValidationError};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Runs one search against an injected transport. Any stage failure aborts
/// the sequence; the output file is only written once the complete record
/// list exists.
pub async fn run_search(
    input: &Value,
    client: &dyn AvailabilityClient,
    output_path: &Path,
) -> Result<Vec<FlightRecord>, PipelineError> {
    let query = SearchQuery::from_value(input)?;
    execute(&query, client, output_path).await
}

/// Convenience entry point that builds the HTTP transport from settings.
/// Validation runs first, then client construction, so input errors surface
/// before configuration ones and nothing touches the network on failure.
pub async fn run_with_settings(
    input: &Value,
    settings: &Settings,
    output_path: &Path,
) -> Result<Vec<FlightRecord>, PipelineError> {
    let query = SearchQuery::from_value(input)?;
    let proxy = settings.proxy()?;
    let client = HttpAvailabilityClient::new(
        &settings.base_url,
        settings.timeout(),
        proxy,
        DEFAULT_MAX_RETRIES,
    )?;
    execute(&query, &client, output_path).await
}

async fn execute(
    query: &SearchQuery,
    client: &dyn AvailabilityClient,
    output_path: &Path,
) -> Result<Vec<FlightRecord>, PipelineError> {
    info!(
        origin = %query.origin,
        destination = %query.destination,
        date = %query.date_from,
        "starting flight availability search"
    );

    let raw_response = client.fetch(query).await?;
    let records = normalize_availability(&raw_response, query.max_items);
    write_records(&records, output_path)?;

    info!(
        count = records.len(),
        output = %output_path.display(),
        "completed search"
    );
    Ok(records)
}
