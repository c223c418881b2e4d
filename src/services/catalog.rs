use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Service;

/// Append a service to the tenant's ordered catalog. Names are unique per
/// tenant, case-insensitively.
pub fn add_service(
    conn: &Connection,
    tenant_id: &str,
    name: &str,
    price_cents: i64,
    duration_min: i32,
) -> Result<Service, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("service name is required".to_string()));
    }
    if queries::service_name_exists(conn, tenant_id, name).map_err(AppError::Internal)? {
        return Err(AppError::Validation(format!(
            "service '{name}' already exists"
        )));
    }

    let position = queries::next_service_position(conn, tenant_id).map_err(AppError::Internal)?;
    let service = Service {
        id: uuid::Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        name: name.to_string(),
        price_cents,
        duration_min,
        position,
    };
    queries::insert_service(conn, &service).map_err(AppError::Internal)?;

    tracing::info!(tenant = tenant_id, service = name, "service added to catalog");
    Ok(service)
}

pub fn get_services(conn: &Connection, tenant_id: &str) -> Result<Vec<Service>, AppError> {
    queries::get_services(conn, tenant_id).map_err(AppError::Internal)
}
