use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, AppointmentStatus, Service, Slot, Tenant};
use crate::services::{catalog, ledger, risk};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

fn load_tenant(
    db: &rusqlite::Connection,
    slug: &str,
) -> Result<Tenant, AppError> {
    queries::get_tenant_by_slug(db, slug)
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound(format!("tenant {slug}")))
}

// ── Tenants ──

#[derive(Deserialize)]
pub struct CreateTenantRequest {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub require_deposit: bool,
    #[serde(default)]
    pub deposit_link: Option<String>,
}

// POST /api/tenants
pub async fn create_tenant(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateTenantRequest>,
) -> Result<Json<Tenant>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let slug = payload.slug.trim().to_lowercase();
    if slug.is_empty() || payload.name.trim().is_empty() {
        return Err(AppError::Validation("slug and name are required".to_string()));
    }

    let tenant = Tenant {
        id: uuid::Uuid::new_v4().to_string(),
        slug: slug.clone(),
        name: payload.name.trim().to_string(),
        require_deposit: payload.require_deposit,
        deposit_link: payload.deposit_link,
    };

    {
        let db = state.db.lock().unwrap();
        if queries::get_tenant_by_slug(&db, &slug)
            .map_err(AppError::Internal)?
            .is_some()
        {
            return Err(AppError::Validation(format!("tenant '{slug}' already exists")));
        }
        queries::create_tenant(&db, &tenant).map_err(AppError::Internal)?;
        queries::seed_default_slots(&db, &tenant.id, Utc::now().date_naive())
            .map_err(AppError::Internal)?;
    }

    tracing::info!(tenant = %slug, "tenant created");
    Ok(Json(tenant))
}

// ── Services (settings surface) ──

#[derive(Deserialize)]
pub struct AddServiceRequest {
    pub name: String,
    pub price_cents: i64,
    #[serde(default = "default_duration")]
    pub duration_min: i32,
}

fn default_duration() -> i32 {
    30
}

// POST /api/t/:tenant/services
pub async fn add_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(tenant_slug): Path<String>,
    Json(payload): Json<AddServiceRequest>,
) -> Result<Json<Service>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let tenant = load_tenant(&db, &tenant_slug)?;
    let service = catalog::add_service(
        &db,
        &tenant.id,
        &payload.name,
        payload.price_cents,
        payload.duration_min,
    )?;
    Ok(Json(service))
}

// GET /api/t/:tenant/services
pub async fn get_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(tenant_slug): Path<String>,
) -> Result<Json<Vec<Service>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let tenant = load_tenant(&db, &tenant_slug)?;
    Ok(Json(catalog::get_services(&db, &tenant.id)?))
}

// ── Slots ──

// GET /api/t/:tenant/slots
pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(tenant_slug): Path<String>,
) -> Result<Json<Vec<Slot>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let tenant = load_tenant(&db, &tenant_slug)?;
    let slots = queries::get_open_slots(&db, &tenant.id).map_err(AppError::Internal)?;
    Ok(Json(slots))
}

// ── Appointments (agenda surface) ──

#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub date: Option<String>,
}

// GET /api/t/:tenant/appointments
pub async fn get_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(tenant_slug): Path<String>,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let tenant = load_tenant(&db, &tenant_slug)?;
    let appointments = queries::get_appointments(&db, &tenant.id, query.date.as_deref())
        .map_err(AppError::Internal)?;
    Ok(Json(appointments))
}

#[derive(Deserialize)]
pub struct ManualAppointmentRequest {
    pub patient_id: String,
    pub service_id: String,
    pub slot_id: String,
}

// POST /api/t/:tenant/appointments
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(tenant_slug): Path<String>,
    Json(payload): Json<ManualAppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let tenant = load_tenant(&db, &tenant_slug)?;
    let service = catalog::get_services(&db, &tenant.id)?
        .into_iter()
        .find(|s| s.id == payload.service_id)
        .ok_or_else(|| AppError::NotFound(format!("service {}", payload.service_id)))?;

    let appointment = ledger::manual_entry(
        &db,
        &state.booking_tx,
        &tenant,
        payload.patient_id.trim(),
        &service,
        &payload.slot_id,
    )?;
    Ok(Json(appointment))
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

// POST /api/t/:tenant/appointments/:id/status
pub async fn update_appointment_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((tenant_slug, appointment_id)): Path<(String, String)>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<Appointment>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status = AppointmentStatus::parse(&payload.status)
        .ok_or_else(|| AppError::Validation(format!("unknown status '{}'", payload.status)))?;

    let db = state.db.lock().unwrap();
    let tenant = load_tenant(&db, &tenant_slug)?;
    let appt = queries::get_appointment_by_id(&db, &appointment_id)
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id}")))?;
    if appt.tenant_id != tenant.id {
        return Err(AppError::NotFound(format!("appointment {appointment_id}")));
    }

    Ok(Json(ledger::update_status(&db, &appointment_id, status)?))
}

// ── Patients (risk surface) ──

#[derive(Serialize)]
pub struct RiskResponse {
    pub patient_id: String,
    pub classification: String,
    pub cancellation_rate_pct: i64,
    pub scheduled: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub no_show: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<&'static str>,
}

// GET /api/t/:tenant/patients/:patient_id/risk
pub async fn get_risk_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((tenant_slug, patient_id)): Path<(String, String)>,
) -> Result<Json<RiskResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let history = {
        let db = state.db.lock().unwrap();
        let tenant = load_tenant(&db, &tenant_slug)?;
        queries::get_attendance_history(&db, &tenant.id, &patient_id)
            .map_err(AppError::Internal)?
    };

    let profile = risk::classify(&history);
    Ok(Json(RiskResponse {
        patient_id,
        classification: profile.classification.as_str().to_string(),
        cancellation_rate_pct: profile.cancellation_rate_pct,
        scheduled: profile.history.scheduled,
        completed: profile.history.completed,
        cancelled: profile.history.cancelled,
        no_show: profile.history.no_show,
        indicator: profile.indicator(),
        suggested_action: profile.suggested_action(),
    }))
}
