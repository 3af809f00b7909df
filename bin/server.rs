// Showroom - Admin/Storefront REST API
// CRUD for the three record collections plus financing quotes.
// Every write validates first; a record that fails validation never
// reaches the gateway.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use showroom::{
    compute_monthly_payment, validate_member, validate_provider_link, validate_vehicle, Amount,
    FinancingOptions, FuelType, MembershipDuration, MembershipRecord, ProviderLink, SortDirection,
    StorageError, Store, Transmission, ValidationError, Vehicle, DEFAULT_ANNUAL_RATE,
    DEFAULT_TERM_MONTHS,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<Store>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message),
        }
    }
}

/// Map a validation failure to a 422 with per-field messages
fn validation_failure(errors: Vec<ValidationError>) -> axum::response::Response {
    let message = errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::err(message)),
    )
        .into_response()
}

/// Map a storage failure to 404/500; no automatic retry - the client
/// re-triggers the action
fn storage_failure(error: StorageError) -> axum::response::Response {
    let status = match &error {
        StorageError::NotFound { .. } => StatusCode::NOT_FOUND,
        StorageError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    eprintln!("Storage error: {}", error);
    (status, Json(ApiResponse::err(error.to_string()))).into_response()
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Deserialize)]
struct VehiclePayload {
    make: String,
    model: String,
    year: i32,
    price: Amount,
    /// Explicit monthly-payment override; omitted = derive from price
    monthly_payment: Option<Amount>,
    image_url: String,
    mileage: Option<i64>,
    transmission: String,
    fuel_type: String,
}

#[derive(Deserialize)]
struct MemberPayload {
    name: String,
    email: String,
    phone: Option<String>,
    membership_type: Option<String>,
    membership_duration: Option<String>,
}

#[derive(Deserialize)]
struct LinkPayload {
    name: String,
    url: String,
}

fn parse_transmission(value: &str) -> Result<Transmission, Vec<ValidationError>> {
    Transmission::parse(value).ok_or_else(|| {
        vec![ValidationError::new(
            "Vehicle",
            "transmission",
            "Expected automatic, manual, or cvt",
        )]
    })
}

fn parse_fuel_type(value: &str) -> Result<FuelType, Vec<ValidationError>> {
    FuelType::parse(value).ok_or_else(|| {
        vec![ValidationError::new(
            "Vehicle",
            "fuel_type",
            "Expected gasoline, diesel, hybrid, or electric",
        )]
    })
}

fn parse_duration(
    value: &Option<String>,
) -> Result<Option<MembershipDuration>, Vec<ValidationError>> {
    match value.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => MembershipDuration::parse(raw).map(Some).ok_or_else(|| {
            vec![ValidationError::new(
                "MembershipRecord",
                "membership_duration",
                "Expected monthly, quarterly, or yearly",
            )]
        }),
    }
}

// ============================================================================
// API Handlers - health & quotes
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

#[derive(Deserialize)]
struct QuoteParams {
    price: Amount,
    term: Option<u32>,
    rate: Option<f64>,
}

#[derive(Serialize)]
struct QuoteResponse {
    price: Amount,
    principal: Amount,
    term_months: u32,
    annual_rate_percent: f64,
    monthly_payment: Amount,
    options: FinancingOptions,
}

/// GET /api/quote?price=&term=&rate= - Financing quote
async fn get_quote(Query(params): Query<QuoteParams>) -> impl IntoResponse {
    let term = params.term.unwrap_or(DEFAULT_TERM_MONTHS);
    let rate = params.rate.unwrap_or(DEFAULT_ANNUAL_RATE);

    if params.price <= 0 {
        return validation_failure(vec![ValidationError::new(
            "Financing",
            "price",
            "Price must be greater than zero",
        )]);
    }

    let options = FinancingOptions::for_price(params.price);
    let principal = params.price - options.down_payment_min;

    match compute_monthly_payment(principal, rate, term) {
        Ok(monthly_payment) => Json(ApiResponse::ok(QuoteResponse {
            price: params.price,
            principal,
            term_months: term,
            annual_rate_percent: rate,
            monthly_payment,
            options,
        }))
        .into_response(),
        Err(e) => validation_failure(vec![e]),
    }
}

// ============================================================================
// API Handlers - vehicles
// ============================================================================

/// GET /api/vehicles - Catalog, newest first
async fn list_vehicles(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.lock().unwrap();
    match store.list_vehicles(SortDirection::Descending) {
        Ok(vehicles) => Json(ApiResponse::ok(vehicles)).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// POST /api/vehicles - Create a listing
async fn create_vehicle(
    State(state): State<AppState>,
    Json(payload): Json<VehiclePayload>,
) -> impl IntoResponse {
    let transmission = match parse_transmission(&payload.transmission) {
        Ok(t) => t,
        Err(errors) => return validation_failure(errors),
    };
    let fuel_type = match parse_fuel_type(&payload.fuel_type) {
        Ok(f) => f,
        Err(errors) => return validation_failure(errors),
    };

    let mut vehicle = match Vehicle::new(
        &payload.make,
        &payload.model,
        payload.year,
        payload.price,
        &payload.image_url,
        payload.mileage,
        transmission,
        fuel_type,
    ) {
        Ok(vehicle) => vehicle,
        Err(e) => return validation_failure(vec![e]),
    };

    if let Some(monthly_payment) = payload.monthly_payment {
        vehicle.override_monthly_payment(monthly_payment);
    }

    if let Err(errors) = validate_vehicle(&vehicle) {
        return validation_failure(errors);
    }

    let store = state.store.lock().unwrap();
    match store.insert_vehicle(&vehicle) {
        Ok(()) => (StatusCode::CREATED, Json(ApiResponse::ok(vehicle))).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// PUT /api/vehicles/:id - Update a listing.
/// A price change recomputes the monthly payment; an explicit
/// monthly_payment in the payload overrides it afterwards and wins until
/// the next price edit.
async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<VehiclePayload>,
) -> impl IntoResponse {
    let transmission = match parse_transmission(&payload.transmission) {
        Ok(t) => t,
        Err(errors) => return validation_failure(errors),
    };
    let fuel_type = match parse_fuel_type(&payload.fuel_type) {
        Ok(f) => f,
        Err(errors) => return validation_failure(errors),
    };

    let store = state.store.lock().unwrap();
    let mut vehicle = match store.get_vehicle(&id) {
        Ok(vehicle) => vehicle,
        Err(e) => return storage_failure(e),
    };

    vehicle.make = payload.make;
    vehicle.model = payload.model;
    vehicle.year = payload.year;
    vehicle.image_url = payload.image_url;
    vehicle.mileage = payload.mileage;
    vehicle.transmission = transmission;
    vehicle.fuel_type = fuel_type;
    vehicle.touch();

    if payload.price != vehicle.price {
        if let Err(e) = vehicle.set_price(payload.price) {
            return validation_failure(vec![e]);
        }
    }
    if let Some(monthly_payment) = payload.monthly_payment {
        if monthly_payment != vehicle.monthly_payment {
            vehicle.override_monthly_payment(monthly_payment);
        }
    }

    if let Err(errors) = validate_vehicle(&vehicle) {
        return validation_failure(errors);
    }

    match store.update_vehicle(&vehicle) {
        Ok(()) => Json(ApiResponse::ok(vehicle)).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// DELETE /api/vehicles/:id - Remove a listing
async fn delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.lock().unwrap();
    match store.delete_vehicle(&id) {
        Ok(()) => Json(ApiResponse::ok(id)).into_response(),
        Err(e) => storage_failure(e),
    }
}

// ============================================================================
// API Handlers - membership records
// ============================================================================

/// GET /api/membership-records - Newest first
async fn list_members(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.lock().unwrap();
    match store.list_members(SortDirection::Descending) {
        Ok(members) => Json(ApiResponse::ok(members)).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// POST /api/membership-records
async fn create_member(
    State(state): State<AppState>,
    Json(payload): Json<MemberPayload>,
) -> impl IntoResponse {
    let duration = match parse_duration(&payload.membership_duration) {
        Ok(d) => d,
        Err(errors) => return validation_failure(errors),
    };

    let member = MembershipRecord::new(
        &payload.name,
        &payload.email,
        payload.phone.as_deref().unwrap_or(""),
        payload.membership_type.as_deref().unwrap_or(""),
        duration,
    );

    if let Err(errors) = validate_member(&member) {
        return validation_failure(errors);
    }

    let store = state.store.lock().unwrap();
    match store.insert_member(&member) {
        Ok(()) => (StatusCode::CREATED, Json(ApiResponse::ok(member))).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// PUT /api/membership-records/:id
async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<MemberPayload>,
) -> impl IntoResponse {
    let duration = match parse_duration(&payload.membership_duration) {
        Ok(d) => d,
        Err(errors) => return validation_failure(errors),
    };

    let store = state.store.lock().unwrap();
    let mut member = match store.get_member(&id) {
        Ok(member) => member,
        Err(e) => return storage_failure(e),
    };

    member.name = payload.name;
    member.email = payload.email;
    member.phone = payload.phone.unwrap_or_default();
    member.membership_type = payload.membership_type.unwrap_or_default();
    member.set_duration(duration);

    if let Err(errors) = validate_member(&member) {
        return validation_failure(errors);
    }

    match store.update_member(&member) {
        Ok(()) => Json(ApiResponse::ok(member)).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// DELETE /api/membership-records/:id
async fn delete_member(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let store = state.store.lock().unwrap();
    match store.delete_member(&id) {
        Ok(()) => Json(ApiResponse::ok(id)).into_response(),
        Err(e) => storage_failure(e),
    }
}

// ============================================================================
// API Handlers - provider links
// ============================================================================

/// GET /api/provider-links - Alphabetical
async fn list_links(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.lock().unwrap();
    match store.list_provider_links(SortDirection::Ascending) {
        Ok(links) => Json(ApiResponse::ok(links)).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// POST /api/provider-links
async fn create_link(
    State(state): State<AppState>,
    Json(payload): Json<LinkPayload>,
) -> impl IntoResponse {
    let link = ProviderLink::new(&payload.name, &payload.url);

    if let Err(errors) = validate_provider_link(&link) {
        return validation_failure(errors);
    }

    let store = state.store.lock().unwrap();
    match store.insert_provider_link(&link) {
        Ok(()) => (StatusCode::CREATED, Json(ApiResponse::ok(link))).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// PUT /api/provider-links/:id
async fn update_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<LinkPayload>,
) -> impl IntoResponse {
    let store = state.store.lock().unwrap();
    let mut link = match store.get_provider_link(&id) {
        Ok(link) => link,
        Err(e) => return storage_failure(e),
    };

    link.name = payload.name;
    link.url = payload.url;
    link.touch();

    if let Err(errors) = validate_provider_link(&link) {
        return validation_failure(errors);
    }

    match store.update_provider_link(&link) {
        Ok(()) => Json(ApiResponse::ok(link)).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// DELETE /api/provider-links/:id
async fn delete_link(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let store = state.store.lock().unwrap();
    match store.delete_provider_link(&id) {
        Ok(()) => Json(ApiResponse::ok(id)).into_response(),
        Err(e) => storage_failure(e),
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🌐 Showroom - API Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━");

    let db_path = std::env::var("SHOWROOM_DB").unwrap_or_else(|_| "showroom.db".to_string());
    let store = Store::open(std::path::Path::new(&db_path)).expect("Failed to open database");
    println!("✓ Database opened: {}", db_path);

    let state = AppState {
        store: Arc::new(Mutex::new(store)),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/quote", get(get_quote))
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route("/vehicles/:id", axum::routing::put(update_vehicle).delete(delete_vehicle))
        .route("/membership-records", get(list_members).post(create_member))
        .route(
            "/membership-records/:id",
            axum::routing::put(update_member).delete(delete_member),
        )
        .route("/provider-links", get(list_links).post(create_link))
        .route(
            "/provider-links/:id",
            axum::routing::put(update_link).delete(delete_link),
        )
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   Catalog: http://localhost:3000/api/vehicles");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
