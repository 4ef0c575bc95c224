//! Agronomy Advisory Engine
//!
//! Pure functions over a read-only [`CropCatalog`](crate::catalog::CropCatalog):
//! nothing here performs I/O or holds state between calls, so every
//! operation is safe to run concurrently from request handlers.
//!
//! ## Architecture
//! - `soil.rs` - NPK / pH classification with amendment advice
//! - `scoring.rs` - Multi-factor crop suitability ranking (top 5)
//! - `budget.rs` - Fertilizer & seed quantities and costs for one crop

pub mod soil;
pub mod scoring;
pub mod budget;

pub use soil::{classify_npk, classify_ph, classify_soil, NpkClass, NutrientLevel, PhClass, PhLevel, SoilHealth};
pub use scoring::{score_crops, ScoredCrop, SoilReading, MAX_RESULTS, MIN_SCORE};
pub use budget::{
    compute_budget, deficit_factor, BudgetResult, FertilizerBreakdown, FertilizerLine, SeedLine,
    FERTILIZER_PRICES,
};
