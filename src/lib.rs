// Ryanair flight availability scraper: validates a search request, queries
// the public availability endpoint and exports flat JSON flight records.

pub mod client;
pub mod config;
pub mod export;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod query;

// Re-export key types for convenience
pub use client::{AvailabilityClient, HttpAvailabilityClient, TransportError, DEFAULT_MAX_RETRIES};
pub use config::{Settings, DEFAULT_BASE_URL};
pub use export::{write_records, ExportError};
pub use normalize::{normalize_availability, FlightRecord};
pub use pipeline::{run_search, run_with_settings, PipelineError};
pub use query::{SearchQuery, TripType, ValidationError};
