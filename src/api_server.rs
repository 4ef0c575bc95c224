// Axum API Server Module
//
// Purpose: REST surface over the advisory engine (crop recommendation,
// fertilizer budget, crop list) plus the Nominatim geocoding relay and the
// static frontend.

use axum::{
    extract::{DefaultBodyLimit, Query, State},
    handler::HandlerWithoutStateExt,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::{Arc, OnceLock};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::advisory::{classify_soil, compute_budget, score_crops, ScoredCrop};
use crate::catalog::CropCatalog;
use crate::config::ServerConfig;
use crate::geocoding::GeocodingClient;
use crate::input::{parse_leading_number, BudgetInput, InputError, RecommendationInput};

/// Request bodies above this are rejected
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CropCatalog>,
    pub geocoder: Arc<GeocodingClient>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => {
                tracing::info!("Loading crop catalog from {}", path.display());
                CropCatalog::load(path)?
            }
            None => {
                tracing::info!("Loading built-in crop catalog");
                CropCatalog::builtin()?
            }
        };
        tracing::info!("Crop catalog ready ({} crops)", catalog.len());

        let geocoder = GeocodingClient::new(
            &config.nominatim_url,
            &config.user_agent,
            &config.country_codes,
        )?;

        Ok(Self::from_parts(catalog, geocoder, config))
    }

    pub fn from_parts(catalog: CropCatalog, geocoder: GeocodingClient, config: ServerConfig) -> Self {
        Self {
            catalog: Arc::new(catalog),
            geocoder: Arc::new(geocoder),
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    // Unknown paths fall through to the frontend directory, then to a JSON 404
    let static_files = ServeDir::new(&state.config.static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(endpoint_not_found.into_service());

    let cors = cors_layer(state.config.frontend_url.clone());

    Router::new()
        .route("/health", get(health_check))

        // Crop endpoints
        .route("/api/crops/recommend", post(recommend_crops))
        .route("/api/crops/budget", post(calculate_budget))
        .route("/api/crops/list", get(list_crops))

        // Location endpoints
        .route("/api/location/geocode", get(geocode))
        .route("/api/location/reverse", get(reverse_geocode))

        .fallback_service(static_files)

        // Middleware (applied in reverse order)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn localhost_origin() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https?://(localhost|127\.0\.0\.1)(:\d+)?$").expect("valid origin pattern")
    })
}

/// The configured frontend origin plus any localhost / 127.0.0.1 origin
pub fn is_allowed_origin(origin: &str, frontend_url: &str) -> bool {
    origin == frontend_url || localhost_origin().is_match(origin)
}

fn cors_layer(frontend_url: String) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| is_allowed_origin(o, &frontend_url))
                .unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Recommendation card: the display fields of a scored crop
#[derive(Serialize)]
struct Recommendation<'a> {
    key: &'a str,
    name: &'a str,
    icon: &'a str,
    season: &'a str,
    score: i32,
    reasons: &'a [String],
    duration: &'a str,
    #[serde(rename = "yield")]
    expected_yield: &'a str,
    notes: &'a str,
}

impl<'a> From<&'a ScoredCrop<'a>> for Recommendation<'a> {
    fn from(scored: &'a ScoredCrop<'a>) -> Self {
        let crop = scored.crop;
        Self {
            key: &crop.key,
            name: &crop.name,
            icon: &crop.icon,
            season: &crop.season,
            score: scored.score,
            reasons: &scored.reasons,
            duration: &crop.duration,
            expected_yield: &crop.expected_yield,
            notes: &crop.notes,
        }
    }
}

/// POST /api/crops/recommend
///
/// Body: `{n, p, k, ph, area, avgTemp, avgRainfall, soilType}` and/or `{inputText}`
async fn recommend_crops(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Response, AppError> {
    let body = body.map(|Json(v)| v).unwrap_or_else(|| Value::Object(Map::new()));
    let input = RecommendationInput::from_body(&body);
    let reading = input.validate()?;

    let soil_health = classify_soil(reading.n, reading.p, reading.k, reading.ph);
    let scored = score_crops(&state.catalog, &reading);
    let recommendations: Vec<Recommendation> = scored.iter().map(Recommendation::from).collect();

    tracing::info!(
        "Recommended {} crops (top: {})",
        recommendations.len(),
        recommendations.first().map(|r| r.key).unwrap_or("none")
    );

    Ok(Json(serde_json::json!({
        "inputs": input,
        "soilHealth": soil_health,
        "recommendations": recommendations,
    }))
    .into_response())
}

/// POST /api/crops/budget
///
/// Body: `{cropKey, area, n, p, k}`
async fn calculate_budget(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Response, AppError> {
    let body = body.map(|Json(v)| v).unwrap_or_else(|| Value::Object(Map::new()));
    let input = BudgetInput::from_body(&body)?;

    let budget = compute_budget(&state.catalog, &input.crop_key, input.area, input.n, input.p, input.k)
        .ok_or_else(|| AppError::NotFound("Crop not found".to_string()))?;

    tracing::info!(
        "Budget for {} ({} acres): total {}",
        input.crop_key, input.area, budget.total_cost
    );

    Ok(Json(budget).into_response())
}

/// GET /api/crops/list
async fn list_crops(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.catalog.list_crops())
}

#[derive(serde::Deserialize, Debug)]
struct GeocodeQuery {
    q: Option<String>,
}

/// GET /api/location/geocode?q=query
async fn geocode(
    State(state): State<AppState>,
    Query(params): Query<GeocodeQuery>,
) -> Result<Response, AppError> {
    let query = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Provide location query".to_string()))?;

    let places = state.geocoder.search(&query).await.map_err(|e| {
        tracing::error!("Geocode error: {}", e);
        AppError::Internal("Geocoding failed".to_string())
    })?;

    if places.is_empty() {
        return Err(AppError::NotFound("Location not found".to_string()));
    }

    Ok(Json(places).into_response())
}

#[derive(serde::Deserialize, Debug)]
struct ReverseQuery {
    lat: Option<String>,
    lon: Option<String>,
}

/// Parse and range-check reverse geocoding coordinates. Trailing text after
/// a numeric prefix is ignored.
fn parse_coordinates(params: &ReverseQuery) -> Result<(f64, f64), AppError> {
    let (Some(lat), Some(lon)) = (
        params.lat.as_deref().filter(|s| !s.is_empty()),
        params.lon.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return Err(AppError::BadRequest("lat and lon are required".to_string()));
    };

    let (Some(lat), Some(lon)) = (parse_leading_number(lat), parse_leading_number(lon)) else {
        return Err(AppError::BadRequest("lat and lon must be valid numbers".to_string()));
    };

    if !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::BadRequest("Latitude must be between -90 and 90".to_string()));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(AppError::BadRequest("Longitude must be between -180 and 180".to_string()));
    }

    Ok((lat, lon))
}

/// GET /api/location/reverse?lat=latitude&lon=longitude
async fn reverse_geocode(
    State(state): State<AppState>,
    Query(params): Query<ReverseQuery>,
) -> Result<Response, AppError> {
    let (lat, lon) = parse_coordinates(&params)?;

    let location = state.geocoder.reverse(lat, lon).await.map_err(|e| {
        tracing::error!("Reverse geocode error: {}", e);
        AppError::Internal("Reverse geocoding failed".to_string())
    })?;

    Ok(Json(location).into_response())
}

async fn endpoint_not_found(method: Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Endpoint not found",
            "path": uri.path(),
            "method": method.as_str(),
        })),
    )
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<InputError> for AppError {
    fn from(err: InputError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_origins() {
        let frontend = "https://krishi.example";
        assert!(is_allowed_origin("https://krishi.example", frontend));
        assert!(is_allowed_origin("http://localhost:5500", frontend));
        assert!(is_allowed_origin("http://127.0.0.1", frontend));
        assert!(is_allowed_origin("https://localhost:8443", frontend));
        assert!(!is_allowed_origin("http://localhost.evil.com", frontend));
        assert!(!is_allowed_origin("https://other.example", frontend));
    }

    fn reverse_query(lat: Option<&str>, lon: Option<&str>) -> ReverseQuery {
        ReverseQuery {
            lat: lat.map(str::to_string),
            lon: lon.map(str::to_string),
        }
    }

    fn bad_request_message(result: Result<(f64, f64), AppError>) -> String {
        match result {
            Err(AppError::BadRequest(msg)) => msg,
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_coordinates() {
        assert_eq!(
            parse_coordinates(&reverse_query(Some("19.99"), Some("73.79"))).unwrap(),
            (19.99, 73.79)
        );
        assert_eq!(
            bad_request_message(parse_coordinates(&reverse_query(Some("19.99"), None))),
            "lat and lon are required"
        );
        assert_eq!(
            bad_request_message(parse_coordinates(&reverse_query(Some("north"), Some("73")))),
            "lat and lon must be valid numbers"
        );
        assert_eq!(
            parse_coordinates(&reverse_query(Some("12abc"), Some(" 73.5 E"))).unwrap(),
            (12.0, 73.5)
        );
        assert_eq!(
            bad_request_message(parse_coordinates(&reverse_query(Some("Infinity"), Some("73")))),
            "Latitude must be between -90 and 90"
        );
        assert_eq!(
            bad_request_message(parse_coordinates(&reverse_query(Some("91"), Some("73")))),
            "Latitude must be between -90 and 90"
        );
        assert_eq!(
            bad_request_message(parse_coordinates(&reverse_query(Some("19"), Some("-181")))),
            "Longitude must be between -180 and 180"
        );
    }
}
