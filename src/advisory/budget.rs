//! Fertilizer & Seed Budget
//!
//! Scales a crop's per-acre fertilizer requirement by field area, boosting
//! each nutrient's fertilizer when the soil sits below the crop's ideal
//! minimum for it, then prices fertilizer and seed at fixed unit rates.

use crate::catalog::{CropCatalog, CropProfile};
use serde::Serialize;

/// Extra fertilizer applied at a 100% deficit (soil level of zero)
const MAX_DEFICIT_BOOST: f64 = 0.3;

/// Unit prices (INR/kg)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FertilizerPrices {
    pub urea: u64,
    pub dap: u64,
    pub mop: u64,
}

pub const FERTILIZER_PRICES: FertilizerPrices = FertilizerPrices {
    urea: 6,
    dap: 27,
    mop: 17,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FertilizerLine {
    pub qty: i64,
    pub price: u64,
    pub total: i64,
}

impl FertilizerLine {
    fn new(qty: i64, price: u64) -> Self {
        Self { qty, price, total: qty * price as i64 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FertilizerBreakdown {
    pub urea: FertilizerLine,
    pub dap: FertilizerLine,
    pub mop: FertilizerLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedLine {
    pub qty: i64,
    pub price_per_kg: f64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetResult<'a> {
    /// Full profile of the budgeted crop, echoed for display
    pub crop: &'a CropProfile,
    pub area: f64,
    pub seed: SeedLine,
    pub fertilizer: FertilizerBreakdown,
    pub total_fert_cost: i64,
    pub seed_cost: i64,
    pub total_cost: i64,
    pub cost_per_acre: i64,
}

/// Multiplier for a nutrient's fertilizer: `1 + max(0, (min - level) / min) * 0.3`.
///
/// A crop minimum of zero (or less) has no deficit concept and yields exactly 1.
pub fn deficit_factor(soil_level: f64, crop_min: f64) -> f64 {
    if crop_min <= 0.0 {
        return 1.0;
    }
    let deficit = ((crop_min - soil_level) / crop_min).max(0.0);
    1.0 + deficit * MAX_DEFICIT_BOOST
}

fn round_qty(value: f64) -> i64 {
    value.round() as i64
}

/// Compute the fertilizer and seed budget for `crop_key` over `area` acres.
///
/// Returns `None` for a key that is not in the catalog. Numeric ranges are
/// the caller's responsibility.
pub fn compute_budget<'a>(
    catalog: &'a CropCatalog,
    crop_key: &str,
    area: f64,
    n: f64,
    p: f64,
    k: f64,
) -> Option<BudgetResult<'a>> {
    let crop = catalog.get(crop_key)?;
    let base = &crop.fertilizer;

    let urea_qty = round_qty(base.urea * area * deficit_factor(n, crop.nitrogen.min));
    let dap_qty = round_qty(base.dap * area * deficit_factor(p, crop.phosphorus.min));
    let mop_qty = round_qty(base.mop * area * deficit_factor(k, crop.potassium.min));
    let seed_qty = round_qty(crop.seed_rate * area);

    let fertilizer = FertilizerBreakdown {
        urea: FertilizerLine::new(urea_qty, FERTILIZER_PRICES.urea),
        dap: FertilizerLine::new(dap_qty, FERTILIZER_PRICES.dap),
        mop: FertilizerLine::new(mop_qty, FERTILIZER_PRICES.mop),
    };

    // Fractional seed prices round to whole currency units
    let seed_cost = round_qty(seed_qty as f64 * crop.seed_price_per_kg);
    let total_fert_cost = fertilizer.urea.total + fertilizer.dap.total + fertilizer.mop.total;
    let total_cost = total_fert_cost + seed_cost;

    tracing::debug!(
        "Budget for {} over {} acres: fertilizer {}, seed {}",
        crop_key, area, total_fert_cost, seed_cost
    );

    Some(BudgetResult {
        crop,
        area,
        seed: SeedLine {
            qty: seed_qty,
            price_per_kg: crop.seed_price_per_kg,
            total: seed_cost,
        },
        fertilizer,
        total_fert_cost,
        seed_cost,
        total_cost,
        cost_per_acre: (total_cost as f64 / area).round() as i64,
    })
}
