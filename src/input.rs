//! Request input merging and validation
//!
//! Recommendation requests may carry explicit fields (`n`, `p`, `ph`, ...), a
//! free-text `inputText` ("N 40, P 20, K 30, pH 6.5, clay loam soil"), or both.
//! Every field is resolved by one precedence rule: an explicit body value
//! wins unless it is null, missing or an empty string, in which case the
//! value parsed out of the text is used.
//!
//! Range checks live here rather than in the advisory engine, which trusts
//! its caller.

use crate::advisory::SoilReading;
use crate::catalog::ANY_SOIL;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

/// Soil tags accepted from requests; anything else is treated as "any"
pub const ALLOWED_SOIL_TYPES: [&str; 6] =
    ["any", "loamy", "clay", "sandy loam", "black cotton", "clay loam"];

pub const DEFAULT_AREA: f64 = 1.0;
pub const DEFAULT_AVG_TEMP: f64 = 28.0;
pub const DEFAULT_AVG_RAINFALL: f64 = 3.0;

const MAX_NUTRIENT: f64 = 400.0;
const MAX_AREA: f64 = 10_000.0;

/// User-facing validation failures; `Display` is the message returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("N, P, K, and pH are required (numbers only)")]
    MissingSoilValues,

    #[error("N, P, K values must be between 0 and 400")]
    NutrientOutOfRange,

    #[error("pH must be between 3 and 10")]
    PhOutOfRange,

    #[error("Area must be greater than 0")]
    AreaNotPositive,

    #[error("Temperature is out of valid range")]
    TemperatureOutOfRange,

    #[error("Rainfall is out of valid range")]
    RainfallOutOfRange,

    #[error("cropKey is required")]
    MissingCropKey,

    #[error("Area must be a number between 0 and 10000")]
    AreaOutOfRange,

    #[error("N, P, K values are required and must be numbers")]
    MissingNutrients,
}

// ============================================================================
// Coercion & Free-text Parsing
// ============================================================================

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?[0-9]+(?:\.[0-9]+)?").expect("valid number pattern"))
}

/// Field name, extraction pattern, and whether the capture is numeric
fn field_patterns() -> &'static [(&'static str, Regex, bool)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex, bool)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // ASCII digits only; other scripts' digits are not numbers here
        let num = r"\s*[:=\-]?\s*(-?[0-9]+(?:\.[0-9]+)?)";
        [
            ("n", format!(r"\b(?:n|nitrogen)\b{num}"), true),
            ("p", format!(r"\b(?:p|phosphorus)\b{num}"), true),
            ("k", format!(r"\b(?:k|potassium)\b{num}"), true),
            ("ph", format!(r"\bph\b{num}"), true),
            ("area", format!(r"\b(?:area|acre|acres)\b{num}"), true),
            ("avgTemp", format!(r"\b(?:temp|temperature)\b{num}"), true),
            ("avgRainfall", format!(r"\b(?:rain|rainfall)\b{num}"), true),
            (
                "soilType",
                r"\b(?:soil|soil\s*type)\b\s*[:=\-]?\s*(loamy|clay loam|sandy loam|black cotton|clay|any)\b"
                    .to_string(),
                false,
            ),
        ]
        .into_iter()
        .map(|(field, pattern, numeric)| {
            (field, Regex::new(&pattern).expect("valid field pattern"), numeric)
        })
        .collect()
    })
}

/// Coerce a JSON value to a finite number.
///
/// Numbers pass through; strings yield their first numeric substring
/// ("40 kg/ha" -> 40); everything else is absent.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => number_pattern()
            .find(s)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|v| v.is_finite()),
        _ => None,
    }
}

fn leading_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(?:Infinity|(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)")
            .expect("valid leading number pattern")
    })
}

/// Parse the longest numeric prefix of `text` after leading whitespace,
/// ignoring any trailing garbage ("12.5abc" -> 12.5). `Infinity` is accepted
/// so callers range-check it like any other value.
pub fn parse_leading_number(text: &str) -> Option<f64> {
    leading_number_pattern()
        .find(text.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Pull soil fields out of free text. Keys match the request body field names.
pub fn parse_input_text(text: &str) -> Map<String, Value> {
    let text = text.to_lowercase();
    let mut parsed = Map::new();
    if text.is_empty() {
        return parsed;
    }

    for (field, pattern, numeric) in field_patterns() {
        let Some(captured) = pattern.captures(&text).and_then(|c| c.get(1)) else {
            continue;
        };
        let value = if *numeric {
            match captured.as_str().parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                Some(n) => Value::Number(n),
                None => continue,
            }
        } else {
            Value::String(captured.as_str().to_string())
        };
        parsed.insert((*field).to_string(), value);
    }
    parsed
}

fn is_blank(value: &Value) -> bool {
    matches!(value, Value::Null) || matches!(value, Value::String(s) if s.is_empty())
}

/// The one precedence rule: explicit value unless blank, else the fallback
pub fn prefer<'a>(primary: Option<&'a Value>, fallback: Option<&'a Value>) -> Option<&'a Value> {
    match primary {
        Some(v) if !is_blank(v) => Some(v),
        _ => fallback,
    }
}

/// Restrict a soil tag to the allowed set, defaulting to "any"
pub fn normalize_soil_type(value: Option<&Value>) -> String {
    let Some(Value::String(raw)) = value else {
        return ANY_SOIL.to_string();
    };
    let tag = raw.trim().to_lowercase();
    if ALLOWED_SOIL_TYPES.contains(&tag.as_str()) {
        tag
    } else {
        ANY_SOIL.to_string()
    }
}

// ============================================================================
// Recommendation Input
// ============================================================================

/// Merged recommendation request. Soil values stay optional until validated.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationInput {
    pub n: Option<f64>,
    pub p: Option<f64>,
    pub k: Option<f64>,
    pub ph: Option<f64>,
    pub area: f64,
    pub avg_temp: f64,
    pub avg_rainfall: f64,
    pub soil_type: String,
}

impl RecommendationInput {
    /// Merge explicit body fields with values parsed from `inputText`
    pub fn from_body(body: &Value) -> Self {
        let parsed = body
            .get("inputText")
            .and_then(Value::as_str)
            .map(parse_input_text)
            .unwrap_or_default();

        let field = |name: &str| prefer(body.get(name), parsed.get(name));
        let number = |name: &str| field(name).and_then(coerce_number);

        Self {
            n: number("n"),
            p: number("p"),
            k: number("k"),
            ph: number("ph"),
            area: number("area").unwrap_or(DEFAULT_AREA),
            avg_temp: number("avgTemp").unwrap_or(DEFAULT_AVG_TEMP),
            avg_rainfall: number("avgRainfall").unwrap_or(DEFAULT_AVG_RAINFALL),
            soil_type: normalize_soil_type(field("soilType")),
        }
    }

    /// Check ranges and produce a complete reading for the scoring engine
    pub fn validate(&self) -> Result<SoilReading, InputError> {
        let (Some(n), Some(p), Some(k), Some(ph)) = (self.n, self.p, self.k, self.ph) else {
            return Err(InputError::MissingSoilValues);
        };

        if !nutrients_in_range(n, p, k) {
            return Err(InputError::NutrientOutOfRange);
        }
        if !(3.0..=10.0).contains(&ph) {
            return Err(InputError::PhOutOfRange);
        }
        if !(self.area > 0.0 && self.area <= MAX_AREA) {
            return Err(InputError::AreaNotPositive);
        }
        if !(-10.0..=60.0).contains(&self.avg_temp) {
            return Err(InputError::TemperatureOutOfRange);
        }
        if !(0.0..=50.0).contains(&self.avg_rainfall) {
            return Err(InputError::RainfallOutOfRange);
        }

        Ok(SoilReading {
            n,
            p,
            k,
            ph,
            area: self.area,
            avg_temp: self.avg_temp,
            avg_rainfall: self.avg_rainfall,
            soil_type: self.soil_type.clone(),
        })
    }
}

fn nutrients_in_range(n: f64, p: f64, k: f64) -> bool {
    [n, p, k].iter().all(|v| (0.0..=MAX_NUTRIENT).contains(v))
}

// ============================================================================
// Budget Input
// ============================================================================

/// Validated budget request
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetInput {
    pub crop_key: String,
    pub area: f64,
    pub n: f64,
    pub p: f64,
    pub k: f64,
}

impl BudgetInput {
    /// Coerce and range-check `{cropKey, area, n, p, k}` from a request body
    pub fn from_body(body: &Value) -> Result<Self, InputError> {
        let crop_key = match body.get("cropKey") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => return Err(InputError::MissingCropKey),
        };

        let number = |name: &str| body.get(name).and_then(coerce_number);

        let area = number("area")
            .filter(|a| *a > 0.0 && *a <= MAX_AREA)
            .ok_or(InputError::AreaOutOfRange)?;

        let (Some(n), Some(p), Some(k)) = (number("n"), number("p"), number("k")) else {
            return Err(InputError::MissingNutrients);
        };
        if !nutrients_in_range(n, p, k) {
            return Err(InputError::NutrientOutOfRange);
        }

        Ok(Self { crop_key, area, n, p, k })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(&json!(42)), Some(42.0));
        assert_eq!(coerce_number(&json!(6.5)), Some(6.5));
        assert_eq!(coerce_number(&json!("40 kg/ha")), Some(40.0));
        assert_eq!(coerce_number(&json!("pH -1.5")), Some(-1.5));
        assert_eq!(coerce_number(&json!("none")), None);
        assert_eq!(coerce_number(&json!(null)), None);
        assert_eq!(coerce_number(&json!(true)), None);
        assert_eq!(coerce_number(&json!([1])), None);
    }

    #[test]
    fn test_coerce_number_skips_non_ascii_digits() {
        assert_eq!(coerce_number(&json!("४ 40")), Some(40.0));
        assert_eq!(coerce_number(&json!("N: ४०, 25 kg")), Some(25.0));
        assert_eq!(coerce_number(&json!("४०")), None);
    }

    #[test]
    fn test_parse_input_text_ignores_non_ascii_digits() {
        let parsed = parse_input_text("N 40, P ३०, K 20");
        assert_eq!(parsed.get("n"), Some(&json!(40.0)));
        assert_eq!(parsed.get("k"), Some(&json!(20.0)));
        assert!(parsed.get("p").is_none());
    }

    #[test]
    fn test_parse_leading_number() {
        assert_eq!(parse_leading_number("19.99"), Some(19.99));
        assert_eq!(parse_leading_number("  12abc"), Some(12.0));
        assert_eq!(parse_leading_number("-73.5,north"), Some(-73.5));
        assert_eq!(parse_leading_number(".5"), Some(0.5));
        assert_eq!(parse_leading_number("1e2x"), Some(100.0));
        assert_eq!(parse_leading_number("7."), Some(7.0));
        assert_eq!(parse_leading_number("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_leading_number("abc12"), None);
        assert_eq!(parse_leading_number("-"), None);
        assert_eq!(parse_leading_number(""), None);
    }

    #[test]
    fn test_parse_input_text() {
        let parsed = parse_input_text("Nitrogen: 45, P=20 K - 30 pH 6.8 on 2.5 acres, temp 24 rain 3.5, soil clay loam");
        assert_eq!(parsed["n"], json!(45.0));
        assert_eq!(parsed["p"], json!(20.0));
        assert_eq!(parsed["k"], json!(30.0));
        assert_eq!(parsed["ph"], json!(6.8));
        assert_eq!(parsed["avgTemp"], json!(24.0));
        assert_eq!(parsed["avgRainfall"], json!(3.5));
        assert_eq!(parsed["soilType"], json!("clay loam"));
        // "2.5 acres" puts the number before the keyword, so area is not captured
        assert!(parsed.get("area").is_none());
    }

    #[test]
    fn test_parse_input_text_area_after_keyword() {
        let parsed = parse_input_text("area 3");
        assert_eq!(parsed["area"], json!(3.0));
    }

    #[test]
    fn test_parse_input_text_empty() {
        assert!(parse_input_text("").is_empty());
        assert!(parse_input_text("hello farmer").is_empty());
    }

    #[test]
    fn test_prefer_rule() {
        let explicit = json!(10);
        let blank = json!("");
        let null = json!(null);
        let parsed = json!(20);
        assert_eq!(prefer(Some(&explicit), Some(&parsed)), Some(&explicit));
        assert_eq!(prefer(Some(&blank), Some(&parsed)), Some(&parsed));
        assert_eq!(prefer(Some(&null), Some(&parsed)), Some(&parsed));
        assert_eq!(prefer(None, Some(&parsed)), Some(&parsed));
        assert_eq!(prefer(None, None), None);
    }

    #[test]
    fn test_normalize_soil_type() {
        assert_eq!(normalize_soil_type(Some(&json!(" Black Cotton "))), "black cotton");
        assert_eq!(normalize_soil_type(Some(&json!("peat"))), "any");
        assert_eq!(normalize_soil_type(None), "any");
        assert_eq!(normalize_soil_type(Some(&json!(""))), "any");
    }

    #[test]
    fn test_body_values_take_precedence_over_text() {
        let body = json!({
            "n": 50,
            "p": "",
            "k": null,
            "ph": "6.2",
            "inputText": "N 10 P 22 K 33 pH 7 soil sandy loam"
        });
        let input = RecommendationInput::from_body(&body);
        assert_eq!(input.n, Some(50.0));
        assert_eq!(input.p, Some(22.0));
        assert_eq!(input.k, Some(33.0));
        assert_eq!(input.ph, Some(6.2));
        assert_eq!(input.soil_type, "sandy loam");
    }

    #[test]
    fn test_recommendation_defaults() {
        let input = RecommendationInput::from_body(&json!({ "n": 1, "p": 2, "k": 3, "ph": 7 }));
        assert_eq!(input.area, DEFAULT_AREA);
        assert_eq!(input.avg_temp, DEFAULT_AVG_TEMP);
        assert_eq!(input.avg_rainfall, DEFAULT_AVG_RAINFALL);
        assert_eq!(input.soil_type, "any");
    }

    #[test]
    fn test_recommendation_validation() {
        let valid = json!({ "n": 40, "p": 20, "k": 30, "ph": 6.5 });
        let reading = RecommendationInput::from_body(&valid).validate().unwrap();
        assert_eq!(reading.n, 40.0);
        assert_eq!(reading.area, 1.0);

        let cases = [
            (json!({ "n": 40, "p": 20, "k": 30 }), InputError::MissingSoilValues),
            (json!({ "n": 401, "p": 20, "k": 30, "ph": 6.5 }), InputError::NutrientOutOfRange),
            (json!({ "n": 40, "p": -1, "k": 30, "ph": 6.5 }), InputError::NutrientOutOfRange),
            (json!({ "n": 40, "p": 20, "k": 30, "ph": 2.9 }), InputError::PhOutOfRange),
            (json!({ "n": 40, "p": 20, "k": 30, "ph": 6.5, "area": 0 }), InputError::AreaNotPositive),
            (json!({ "n": 40, "p": 20, "k": 30, "ph": 6.5, "avgTemp": 61 }), InputError::TemperatureOutOfRange),
            (json!({ "n": 40, "p": 20, "k": 30, "ph": 6.5, "avgRainfall": 51 }), InputError::RainfallOutOfRange),
        ];
        for (body, expected) in cases {
            assert_eq!(RecommendationInput::from_body(&body).validate(), Err(expected));
        }
    }

    #[test]
    fn test_recommendation_error_messages() {
        assert_eq!(
            InputError::MissingSoilValues.to_string(),
            "N, P, K, and pH are required (numbers only)"
        );
        assert_eq!(InputError::PhOutOfRange.to_string(), "pH must be between 3 and 10");
    }

    #[test]
    fn test_budget_input() {
        let input = BudgetInput::from_body(&json!({
            "cropKey": "wheat", "area": "2", "n": 10, "p": 30, "k": 40
        }))
        .unwrap();
        assert_eq!(input.crop_key, "wheat");
        assert_eq!(input.area, 2.0);

        let cases = [
            (json!({ "area": 2, "n": 1, "p": 1, "k": 1 }), InputError::MissingCropKey),
            (json!({ "cropKey": "", "area": 2, "n": 1, "p": 1, "k": 1 }), InputError::MissingCropKey),
            (json!({ "cropKey": "wheat", "area": 0, "n": 1, "p": 1, "k": 1 }), InputError::AreaOutOfRange),
            (json!({ "cropKey": "wheat", "area": 10001, "n": 1, "p": 1, "k": 1 }), InputError::AreaOutOfRange),
            (json!({ "cropKey": "wheat", "area": 2, "n": 1, "k": 1 }), InputError::MissingNutrients),
            (json!({ "cropKey": "wheat", "area": 2, "n": 1, "p": 500, "k": 1 }), InputError::NutrientOutOfRange),
        ];
        for (body, expected) in cases {
            assert_eq!(BudgetInput::from_body(&body), Err(expected));
        }
    }
}
