//! Crop Catalog - Static table of crop profiles
//!
//! Holds the agronomic profile of every supported crop: ideal pH / NPK /
//! temperature ranges, rainfall band, accepted soil types and per-acre input
//! requirements. Loaded once at startup and shared read-only by the scoring
//! and budget engines.
//!
//! Insertion order is preserved: it is the order crops are scored in, and the
//! tie-break order when two crops end up with the same score.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Built-in catalog shipped with the binary
const BUILTIN_CATALOG: &str = include_str!("../data/crops.json");

/// Soil-type tag that matches every soil
pub const ANY_SOIL: &str = "any";

// ============================================================================
// Profile Types
// ============================================================================

/// Inclusive `[min, max]` range, serialized as a two-element array
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Check whether `value` lies within the range (both ends inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn is_well_formed(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

impl From<[f64; 2]> for Range {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<Range> for [f64; 2] {
    fn from(range: Range) -> Self {
        [range.min, range.max]
    }
}

/// Qualitative rainfall band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RainfallLevel {
    Low,
    Medium,
    High,
}

impl RainfallLevel {
    /// Bucket an average rainfall reading: > 4 is high, > 1 is medium, else low
    pub fn from_average(avg_rainfall: f64) -> Self {
        if avg_rainfall > 4.0 {
            RainfallLevel::High
        } else if avg_rainfall > 1.0 {
            RainfallLevel::Medium
        } else {
            RainfallLevel::Low
        }
    }
}

/// Base fertilizer requirement per acre (kg/acre)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FertilizerNeed {
    pub urea: f64,
    pub dap: f64,
    pub mop: f64,
}

/// Agronomic profile for one crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropProfile {
    pub key: String,

    // Display metadata, opaque to scoring
    pub name: String,
    pub icon: String,
    pub season: String,
    pub duration: String,
    #[serde(rename = "yield")]
    pub expected_yield: String,
    pub notes: String,

    /// Ideal soil pH
    #[serde(rename = "pH")]
    pub ph: Range,

    /// Ideal nitrogen level (same units as soil readings)
    #[serde(rename = "N")]
    pub nitrogen: Range,

    /// Ideal phosphorus level
    #[serde(rename = "P")]
    pub phosphorus: Range,

    /// Ideal potassium level
    #[serde(rename = "K")]
    pub potassium: Range,

    /// Ideal average temperature (°C)
    pub temp_range: Range,

    pub rainfall: RainfallLevel,

    /// Accepted soil tags; may contain `"any"` as a wildcard
    pub soil_types: Vec<String>,

    pub fertilizer: FertilizerNeed,

    /// Seed requirement (kg/acre)
    pub seed_rate: f64,

    /// Seed price (currency units per kg); may be fractional
    pub seed_price_per_kg: f64,
}

impl CropProfile {
    /// Whether this crop grows on the given (already normalised) soil tag
    pub fn accepts_soil(&self, soil_type: &str) -> bool {
        self.soil_types
            .iter()
            .any(|t| t == ANY_SOIL || t == soil_type)
    }
}

/// Lightweight metadata projection used for crop pickers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CropSummary {
    pub key: String,
    pub name: String,
    pub icon: String,
    pub season: String,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read crop catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse crop catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("crop catalog is empty")]
    Empty,

    #[error("duplicate crop key '{0}'")]
    DuplicateKey(String),

    #[error("crop '{key}': {field} range is invalid (min must be <= max, both finite)")]
    InvalidRange { key: String, field: &'static str },

    #[error("crop '{0}': soilTypes must not be empty")]
    NoSoilTypes(String),

    #[error("crop '{key}': {field} must be a finite non-negative number")]
    NegativeQuantity { key: String, field: &'static str },
}

// ============================================================================
// Catalog
// ============================================================================

/// Immutable crop table with O(1) key lookup
#[derive(Debug, Clone)]
pub struct CropCatalog {
    crops: Vec<CropProfile>,
    index: FxHashMap<String, usize>,
}

impl CropCatalog {
    /// Parse the catalog embedded in the binary
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Load a catalog from a JSON file (array of profiles)
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let crops: Vec<CropProfile> = serde_json::from_str(json)?;
        Self::from_profiles(crops)
    }

    /// Build a catalog, enforcing range, soil-type and quantity invariants
    pub fn from_profiles(crops: Vec<CropProfile>) -> Result<Self, CatalogError> {
        if crops.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = FxHashMap::default();
        for (i, crop) in crops.iter().enumerate() {
            validate_profile(crop)?;
            if index.insert(crop.key.clone(), i).is_some() {
                return Err(CatalogError::DuplicateKey(crop.key.clone()));
            }
        }

        tracing::debug!("Loaded crop catalog with {} entries", crops.len());
        Ok(Self { crops, index })
    }

    pub fn get(&self, key: &str) -> Option<&CropProfile> {
        self.index.get(key).map(|&i| &self.crops[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Profiles in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &CropProfile> {
        self.crops.iter()
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }

    /// `{key, name, icon, season}` for every crop, in catalog order
    pub fn list_crops(&self) -> Vec<CropSummary> {
        self.crops
            .iter()
            .map(|c| CropSummary {
                key: c.key.clone(),
                name: c.name.clone(),
                icon: c.icon.clone(),
                season: c.season.clone(),
            })
            .collect()
    }
}

fn validate_profile(crop: &CropProfile) -> Result<(), CatalogError> {
    let ranges = [
        ("pH", &crop.ph),
        ("N", &crop.nitrogen),
        ("P", &crop.phosphorus),
        ("K", &crop.potassium),
        ("tempRange", &crop.temp_range),
    ];
    for (field, range) in ranges {
        if !range.is_well_formed() {
            return Err(CatalogError::InvalidRange { key: crop.key.clone(), field });
        }
    }

    // Nutrient levels are non-negative quantities; pH and temperature are not
    for (field, range) in [("N", &crop.nitrogen), ("P", &crop.phosphorus), ("K", &crop.potassium)] {
        if range.min < 0.0 {
            return Err(CatalogError::NegativeQuantity { key: crop.key.clone(), field });
        }
    }

    if crop.soil_types.is_empty() {
        return Err(CatalogError::NoSoilTypes(crop.key.clone()));
    }

    let quantities = [
        ("fertilizer.urea", crop.fertilizer.urea),
        ("fertilizer.dap", crop.fertilizer.dap),
        ("fertilizer.mop", crop.fertilizer.mop),
        ("seedRate", crop.seed_rate),
        ("seedPricePerKg", crop.seed_price_per_kg),
    ];
    for (field, value) in quantities {
        if !value.is_finite() || value < 0.0 {
            return Err(CatalogError::NegativeQuantity { key: crop.key.clone(), field });
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// The wheat profile used throughout the scoring and budget tests
    pub(crate) fn wheat() -> CropProfile {
        CropProfile {
            key: "wheat".to_string(),
            name: "Wheat".to_string(),
            icon: "🌿".to_string(),
            season: "Rabi (Nov-Apr)".to_string(),
            duration: "110-130 days".to_string(),
            expected_yield: "16-20 quintal/acre".to_string(),
            notes: String::new(),
            ph: Range::new(6.0, 7.5),
            nitrogen: Range::new(20.0, 50.0),
            phosphorus: Range::new(10.0, 25.0),
            potassium: Range::new(15.0, 30.0),
            temp_range: Range::new(10.0, 25.0),
            rainfall: RainfallLevel::Low,
            soil_types: vec!["loamy".to_string(), "any".to_string()],
            fertilizer: FertilizerNeed { urea: 50.0, dap: 30.0, mop: 20.0 },
            seed_rate: 40.0,
            seed_price_per_kg: 25.0,
        }
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = CropCatalog::builtin().unwrap();
        assert!(catalog.len() >= 10);
        assert!(catalog.contains("wheat"));
        assert!(catalog.get("durian").is_none());
    }

    #[test]
    fn test_builtin_wheat_matches_reference_profile() {
        let catalog = CropCatalog::builtin().unwrap();
        let builtin = catalog.get("wheat").unwrap();
        let reference = wheat();
        assert_eq!(builtin.ph, reference.ph);
        assert_eq!(builtin.nitrogen, reference.nitrogen);
        assert_eq!(builtin.phosphorus, reference.phosphorus);
        assert_eq!(builtin.potassium, reference.potassium);
        assert_eq!(builtin.temp_range, reference.temp_range);
        assert_eq!(builtin.rainfall, reference.rainfall);
        assert_eq!(builtin.soil_types, reference.soil_types);
        assert_eq!(builtin.fertilizer, reference.fertilizer);
        assert_eq!(builtin.seed_rate, reference.seed_rate);
        assert_eq!(builtin.seed_price_per_kg, reference.seed_price_per_kg);
    }

    #[test]
    fn test_list_preserves_catalog_order() {
        let catalog = CropCatalog::builtin().unwrap();
        let keys: Vec<String> = catalog.list_crops().into_iter().map(|c| c.key).collect();
        let expected: Vec<String> = catalog.iter().map(|c| c.key.clone()).collect();
        assert_eq!(keys, expected);
        assert_eq!(keys[0], "rice");
    }

    #[test]
    fn test_summary_serializes_only_metadata() {
        let catalog = CropCatalog::builtin().unwrap();
        let json = serde_json::to_value(&catalog.list_crops()[0]).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert!(obj.contains_key("season"));
        assert!(!obj.contains_key("pH"));
    }

    #[test]
    fn test_profile_round_trips_wire_names() {
        let json = serde_json::to_value(wheat()).unwrap();
        assert_eq!(json["pH"], serde_json::json!([6.0, 7.5]));
        assert_eq!(json["tempRange"], serde_json::json!([10.0, 25.0]));
        assert_eq!(json["yield"], "16-20 quintal/acre");
        assert_eq!(json["seedPricePerKg"], 25.0);
        assert_eq!(json["rainfall"], "low");
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut crop = wheat();
        crop.ph = Range::new(8.0, 6.0);
        let err = CropCatalog::from_profiles(vec![crop]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRange { field: "pH", .. }));
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let err = CropCatalog::from_profiles(vec![wheat(), wheat()]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey(ref k) if k == "wheat"));
    }

    #[test]
    fn test_rejects_empty_soil_types() {
        let mut crop = wheat();
        crop.soil_types.clear();
        assert!(matches!(
            CropCatalog::from_profiles(vec![crop]),
            Err(CatalogError::NoSoilTypes(_))
        ));
    }

    #[test]
    fn test_rejects_negative_seed_rate() {
        let mut crop = wheat();
        crop.seed_rate = -1.0;
        assert!(matches!(
            CropCatalog::from_profiles(vec![crop]),
            Err(CatalogError::NegativeQuantity { field: "seedRate", .. })
        ));
    }

    #[test]
    fn test_loads_fractional_seed_price() {
        let mut profile = serde_json::to_value(wheat()).unwrap();
        profile["seedPricePerKg"] = serde_json::json!(12.5);
        let json = serde_json::json!([profile]).to_string();

        let catalog = CropCatalog::from_json(&json).unwrap();
        assert_eq!(catalog.get("wheat").unwrap().seed_price_per_kg, 12.5);
    }

    #[test]
    fn test_rejects_negative_seed_price() {
        let mut crop = wheat();
        crop.seed_price_per_kg = -0.5;
        assert!(matches!(
            CropCatalog::from_profiles(vec![crop]),
            Err(CatalogError::NegativeQuantity { field: "seedPricePerKg", .. })
        ));

        let mut crop = wheat();
        crop.seed_price_per_kg = f64::NAN;
        assert!(CropCatalog::from_profiles(vec![crop]).is_err());
    }

    #[test]
    fn test_allows_zero_nutrient_minimum() {
        let mut crop = wheat();
        crop.nitrogen = Range::new(0.0, 40.0);
        assert!(CropCatalog::from_profiles(vec![crop]).is_ok());
    }

    #[test]
    fn test_rainfall_buckets() {
        assert_eq!(RainfallLevel::from_average(0.5), RainfallLevel::Low);
        assert_eq!(RainfallLevel::from_average(1.0), RainfallLevel::Low);
        assert_eq!(RainfallLevel::from_average(1.01), RainfallLevel::Medium);
        assert_eq!(RainfallLevel::from_average(4.0), RainfallLevel::Medium);
        assert_eq!(RainfallLevel::from_average(4.5), RainfallLevel::High);
    }

    #[test]
    fn test_accepts_soil_wildcard() {
        let crop = wheat();
        assert!(crop.accepts_soil("loamy"));
        assert!(crop.accepts_soil("clay"));

        let mut picky = wheat();
        picky.soil_types = vec!["loamy".to_string()];
        assert!(!picky.accepts_soil("clay"));
    }
}
