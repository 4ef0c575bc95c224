//! Crop Scoring - Rank catalog crops against a soil/climate reading
//!
//! Each crop accumulates an integer score from independent factor checks
//! (pH, N, P, K, temperature, rainfall, soil type). Crops scoring above
//! [`MIN_SCORE`] are kept, sorted best-first and capped at [`MAX_RESULTS`].
//!
//! The sort is stable, so crops with equal scores keep catalog order.

use crate::catalog::{CropCatalog, CropProfile, RainfallLevel, ANY_SOIL};
use serde::Serialize;

/// Crops must score strictly above this to be recommended
pub const MIN_SCORE: i32 = 30;

/// Maximum number of recommendations returned
pub const MAX_RESULTS: usize = 5;

// Factor weights
const PH_MATCH: i32 = 35;
const PH_MISMATCH: i32 = -20;
const N_MATCH: i32 = 20;
const N_BELOW: i32 = 10;
const P_MATCH: i32 = 15;
const K_MATCH: i32 = 15;
const TEMP_MATCH: i32 = 10;
const RAIN_MATCH: i32 = 5;
const RAIN_TOLERATED: i32 = 2;
const SOIL_UNSPECIFIED: i32 = 3;
const SOIL_MATCH: i32 = 5;
const SOIL_MISMATCH: i32 = -8;

/// One soil test plus coarse site climate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilReading {
    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub ph: f64,
    pub area: f64,
    pub avg_temp: f64,
    pub avg_rainfall: f64,
    pub soil_type: String,
}

impl SoilReading {
    fn scoring_inputs_finite(&self) -> bool {
        [self.n, self.p, self.k, self.ph, self.avg_temp, self.avg_rainfall]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// A catalog crop with its suitability score and the factors that matched
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCrop<'a> {
    #[serde(flatten)]
    pub crop: &'a CropProfile,
    pub score: i32,
    pub reasons: Vec<String>,
}

/// Trim and lowercase a soil tag; blank means "any"
pub fn normalize_soil_tag(soil_type: &str) -> String {
    let tag = soil_type.trim().to_lowercase();
    if tag.is_empty() {
        ANY_SOIL.to_string()
    } else {
        tag
    }
}

/// Score a single crop. Reasons are pushed in factor evaluation order.
pub fn score_crop<'a>(
    crop: &'a CropProfile,
    reading: &SoilReading,
    rainfall: RainfallLevel,
    soil_type: &str,
) -> ScoredCrop<'a> {
    let mut score = 0;
    let mut reasons = Vec::new();

    // pH carries the most weight
    if crop.ph.contains(reading.ph) {
        score += PH_MATCH;
        reasons.push(format!("pH {} is ideal", reading.ph));
    } else {
        score += PH_MISMATCH;
    }

    if crop.nitrogen.contains(reading.n) {
        score += N_MATCH;
        reasons.push("Nitrogen level suitable".to_string());
    } else if reading.n < crop.nitrogen.min {
        score += N_BELOW;
        reasons.push("Low N — fertilizer needed".to_string());
    }

    if crop.phosphorus.contains(reading.p) {
        score += P_MATCH;
    }

    if crop.potassium.contains(reading.k) {
        score += K_MATCH;
    }

    if crop.temp_range.contains(reading.avg_temp) {
        score += TEMP_MATCH;
        reasons.push("Temperature suits this crop".to_string());
    }

    if crop.rainfall == rainfall {
        score += RAIN_MATCH;
        reasons.push("Rainfall conditions match".to_string());
    } else if (crop.rainfall == RainfallLevel::Medium && rainfall != RainfallLevel::Low)
        || crop.rainfall == RainfallLevel::Low
    {
        score += RAIN_TOLERATED;
    }

    if soil_type == ANY_SOIL {
        score += SOIL_UNSPECIFIED;
    } else if crop.accepts_soil(soil_type) {
        score += SOIL_MATCH;
        reasons.push("Soil type is compatible".to_string());
    } else {
        score += SOIL_MISMATCH;
    }

    ScoredCrop { crop, score, reasons }
}

/// Rank the catalog for a reading: best first, at most five, score > 30.
///
/// Returns an empty list when any numeric input is NaN or infinite.
pub fn score_crops<'a>(catalog: &'a CropCatalog, reading: &SoilReading) -> Vec<ScoredCrop<'a>> {
    if !reading.scoring_inputs_finite() {
        tracing::debug!("Non-finite scoring input, returning no recommendations");
        return Vec::new();
    }

    let rainfall = RainfallLevel::from_average(reading.avg_rainfall);
    let soil_type = normalize_soil_tag(&reading.soil_type);

    let mut scored: Vec<ScoredCrop<'a>> = catalog
        .iter()
        .map(|crop| score_crop(crop, reading, rainfall, &soil_type))
        .filter(|c| c.score > MIN_SCORE)
        .collect();

    // Stable: equal scores keep catalog order
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(MAX_RESULTS);
    scored
}
