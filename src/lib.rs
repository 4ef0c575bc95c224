//! Crop Advisor
//!
//! Agronomy advisory service: soil test readings in, ranked crop
//! recommendations and per-crop fertilizer/seed budgets out.
//!
//! ## Architecture
//! - `catalog.rs`: Crop reference table (built-in JSON or loaded from disk)
//! - `advisory/`: Soil classification, crop scoring, budget calculation
//! - `input.rs`: Request coercion, free-text parsing, validation
//! - `config.rs`: Environment-driven server settings
//! - `geocoding.rs`: Nominatim relay (feature `api`)
//! - `api_server.rs`: Axum routes and middleware (feature `api`)

pub mod catalog;
pub mod advisory;
pub mod input;
pub mod config;

#[cfg(feature = "api")]
pub mod geocoding;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use catalog::{CatalogError, CropCatalog, CropProfile, CropSummary};
pub use advisory::{classify_soil, compute_budget, score_crops, BudgetResult, ScoredCrop, SoilHealth, SoilReading};
pub use input::{BudgetInput, InputError, RecommendationInput};
pub use config::ServerConfig;

#[cfg(feature = "api")]
pub use geocoding::{GeocodeError, GeocodingClient};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
