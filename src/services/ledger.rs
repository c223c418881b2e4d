use chrono::Utc;
use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    Appointment, AppointmentOrigin, AppointmentStatus, BookingEvent, Service, Tenant,
};

/// Commit a bot booking. Availability is re-checked here, under the same
/// db lock the caller already holds; of two conversations racing for one
/// slot, exactly one take succeeds.
pub fn commit(
    conn: &Connection,
    booking_tx: &broadcast::Sender<BookingEvent>,
    tenant: &Tenant,
    conversation_id: &str,
    patient_id: &str,
    service: &Service,
    slot_id: &str,
) -> Result<Appointment, AppError> {
    book(
        conn,
        booking_tx,
        tenant,
        patient_id,
        service,
        slot_id,
        AppointmentOrigin::Bot,
    )
    .inspect(|appt| {
        tracing::info!(
            tenant = %tenant.slug,
            conversation = conversation_id,
            appointment = %appt.id,
            slot = slot_id,
            "booking committed"
        );
    })
}

/// Staff-entered appointment from the agenda surface. Same slot rules.
pub fn manual_entry(
    conn: &Connection,
    booking_tx: &broadcast::Sender<BookingEvent>,
    tenant: &Tenant,
    patient_id: &str,
    service: &Service,
    slot_id: &str,
) -> Result<Appointment, AppError> {
    book(
        conn,
        booking_tx,
        tenant,
        patient_id,
        service,
        slot_id,
        AppointmentOrigin::Manual,
    )
}

fn book(
    conn: &Connection,
    booking_tx: &broadcast::Sender<BookingEvent>,
    tenant: &Tenant,
    patient_id: &str,
    service: &Service,
    slot_id: &str,
    origin: AppointmentOrigin,
) -> Result<Appointment, AppError> {
    let slot = queries::get_slot(conn, slot_id)
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound(format!("slot {slot_id}")))?;

    if slot.tenant_id != tenant.id {
        return Err(AppError::NotFound(format!("slot {slot_id}")));
    }

    if !queries::take_slot(conn, slot_id).map_err(AppError::Internal)? {
        return Err(AppError::Conflict(format!(
            "slot {} is no longer available",
            slot.label()
        )));
    }

    let now = Utc::now().naive_utc();
    let appointment = Appointment {
        id: uuid::Uuid::new_v4().to_string(),
        tenant_id: tenant.id.clone(),
        patient_id: patient_id.to_string(),
        service_id: service.id.clone(),
        service_name: service.name.clone(),
        price_cents: service.price_cents,
        slot_id: slot.id.clone(),
        slot_day: slot.day.clone(),
        slot_time: slot.time.clone(),
        status: AppointmentStatus::Scheduled,
        origin,
        created_at: now,
        updated_at: now,
    };
    queries::create_appointment(conn, &appointment).map_err(AppError::Internal)?;

    // Readers may come and go; a send with no receivers is fine.
    let _ = booking_tx.send(BookingEvent {
        tenant_id: tenant.id.clone(),
        appointment_id: appointment.id.clone(),
        patient_id: appointment.patient_id.clone(),
        service: appointment.service_name.clone(),
        slot: slot.label(),
        price: appointment.price_cents,
        created_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
    });

    Ok(appointment)
}

/// External status edit from the agenda surface. Cancelling frees the
/// slot for rebooking.
pub fn update_status(
    conn: &Connection,
    appointment_id: &str,
    status: AppointmentStatus,
) -> Result<Appointment, AppError> {
    let appt = queries::get_appointment_by_id(conn, appointment_id)
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id}")))?;

    queries::update_appointment_status(conn, appointment_id, status)
        .map_err(AppError::Internal)?;

    if status == AppointmentStatus::Cancelled && appt.status != AppointmentStatus::Cancelled {
        queries::reopen_slot(conn, &appt.slot_id).map_err(AppError::Internal)?;
    }

    queries::get_appointment_by_id(conn, appointment_id)
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::Slot;

    fn setup() -> (Connection, broadcast::Sender<BookingEvent>, Tenant, Service) {
        let conn = db::init_db(":memory:").unwrap();
        let tenant = Tenant {
            id: "t1".to_string(),
            slug: "clinica".to_string(),
            name: "Clínica Demo".to_string(),
            require_deposit: false,
            deposit_link: None,
        };
        queries::create_tenant(&conn, &tenant).unwrap();
        let service =
            crate::services::catalog::add_service(&conn, "t1", "Consulta General", 50_000, 30)
                .unwrap();
        queries::insert_slot(
            &conn,
            &Slot {
                id: "slot-1".to_string(),
                tenant_id: "t1".to_string(),
                day: "2025-06-16".to_string(),
                time: "10:00".to_string(),
                available: true,
            },
        )
        .unwrap();
        let (tx, _) = broadcast::channel(16);
        (conn, tx, tenant, service)
    }

    #[test]
    fn test_commit_creates_scheduled_bot_appointment() {
        let (conn, tx, tenant, service) = setup();

        let appt = commit(&conn, &tx, &tenant, "conv-1", "patient-1", &service, "slot-1").unwrap();
        assert_eq!(appt.status, AppointmentStatus::Scheduled);
        assert_eq!(appt.origin, AppointmentOrigin::Bot);

        // Slot is now taken.
        let slot = queries::get_slot(&conn, "slot-1").unwrap().unwrap();
        assert!(!slot.available);

        // Immediately visible to agenda readers.
        let agenda = queries::get_appointments(&conn, "t1", None).unwrap();
        assert_eq!(agenda.len(), 1);
        assert_eq!(agenda[0].id, appt.id);
    }

    #[test]
    fn test_second_commit_on_same_slot_conflicts() {
        let (conn, tx, tenant, service) = setup();

        commit(&conn, &tx, &tenant, "conv-1", "patient-1", &service, "slot-1").unwrap();
        let result = commit(&conn, &tx, &tenant, "conv-2", "patient-2", &service, "slot-1");

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(queries::get_appointments(&conn, "t1", None).unwrap().len(), 1);
    }

    #[test]
    fn test_commit_emits_booking_event() {
        let (conn, tx, tenant, service) = setup();
        let mut rx = tx.subscribe();

        commit(&conn, &tx, &tenant, "conv-1", "patient-1", &service, "slot-1").unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.tenant_id, "t1");
        assert_eq!(event.service, "Consulta General");
        assert_eq!(event.slot, "2025-06-16 10:00");
    }

    #[test]
    fn test_cancel_reopens_slot() {
        let (conn, tx, tenant, service) = setup();

        let appt = commit(&conn, &tx, &tenant, "conv-1", "patient-1", &service, "slot-1").unwrap();
        update_status(&conn, &appt.id, AppointmentStatus::Cancelled).unwrap();

        let slot = queries::get_slot(&conn, "slot-1").unwrap().unwrap();
        assert!(slot.available);

        // The freed slot can be taken again.
        commit(&conn, &tx, &tenant, "conv-2", "patient-2", &service, "slot-1").unwrap();
    }

    #[test]
    fn test_foreign_tenant_slot_rejected() {
        let (conn, tx, _tenant, service) = setup();
        let other = Tenant {
            id: "t2".to_string(),
            slug: "otra".to_string(),
            name: "Otra".to_string(),
            require_deposit: false,
            deposit_link: None,
        };
        queries::create_tenant(&conn, &other).unwrap();

        let result = commit(&conn, &tx, &other, "conv-1", "patient-1", &service, "slot-1");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
