//! Soil health classification
//!
//! Buckets N, P and K readings into Low / Medium / High and classifies pH
//! with a short amendment advisory. Boundary values belong to the higher
//! bucket (e.g. N = 30 is Medium, N = 70 is High).

use serde::Serialize;

/// N: Low below 30, High from 70
const N_THRESHOLDS: (f64, f64) = (30.0, 70.0);
/// P: Low below 15, High from 40
const P_THRESHOLDS: (f64, f64) = (15.0, 40.0);
/// K: Low below 20, High from 50
const K_THRESHOLDS: (f64, f64) = (20.0, 50.0);

const PH_ACIDIC_BELOW: f64 = 5.5;
const PH_ALKALINE_ABOVE: f64 = 7.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NutrientLevel {
    Low,
    Medium,
    High,
}

impl NutrientLevel {
    fn bucket(value: f64, (medium_from, high_from): (f64, f64)) -> Self {
        if value < medium_from {
            NutrientLevel::Low
        } else if value < high_from {
            NutrientLevel::Medium
        } else {
            NutrientLevel::High
        }
    }
}

/// Per-nutrient classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NpkClass {
    #[serde(rename = "N")]
    pub nitrogen: NutrientLevel,
    #[serde(rename = "P")]
    pub phosphorus: NutrientLevel,
    #[serde(rename = "K")]
    pub potassium: NutrientLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhLevel {
    Acidic,
    #[serde(rename = "Neutral (Ideal)")]
    Neutral,
    Alkaline,
}

impl PhLevel {
    pub fn label(&self) -> &'static str {
        match self {
            PhLevel::Acidic => "Acidic",
            PhLevel::Neutral => "Neutral (Ideal)",
            PhLevel::Alkaline => "Alkaline",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            PhLevel::Acidic => "Apply lime to raise pH before sowing.",
            PhLevel::Neutral => "pH is in optimal range for most crops.",
            PhLevel::Alkaline => "Apply gypsum or sulfur to lower pH.",
        }
    }
}

/// pH label plus amendment advice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhClass {
    pub label: PhLevel,
    pub advice: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilHealth {
    pub npk_class: NpkClass,
    pub ph_class: PhClass,
}

pub fn classify_npk(n: f64, p: f64, k: f64) -> NpkClass {
    NpkClass {
        nitrogen: NutrientLevel::bucket(n, N_THRESHOLDS),
        phosphorus: NutrientLevel::bucket(p, P_THRESHOLDS),
        potassium: NutrientLevel::bucket(k, K_THRESHOLDS),
    }
}

/// Acidic below 5.5, Neutral in [5.5, 7.5], Alkaline above 7.5
pub fn classify_ph(ph: f64) -> PhClass {
    let label = if ph < PH_ACIDIC_BELOW {
        PhLevel::Acidic
    } else if ph <= PH_ALKALINE_ABOVE {
        PhLevel::Neutral
    } else {
        PhLevel::Alkaline
    };
    PhClass { label, advice: label.advice() }
}

pub fn classify_soil(n: f64, p: f64, k: f64, ph: f64) -> SoilHealth {
    SoilHealth {
        npk_class: classify_npk(n, p, k),
        ph_class: classify_ph(ph),
    }
}
