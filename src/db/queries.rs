use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Appointment, AppointmentOrigin, AppointmentStatus, AttendanceHistory, CollectedSlots,
    Conversation, DialogState, Service, Slot, Tenant,
};

const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn now_string() -> String {
    Utc::now().naive_utc().format(DT_FORMAT).to_string()
}

fn parse_dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DT_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Tenants ──

pub fn create_tenant(conn: &Connection, tenant: &Tenant) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO tenants (id, slug, name, require_deposit, deposit_link)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            tenant.id,
            tenant.slug,
            tenant.name,
            tenant.require_deposit as i32,
            tenant.deposit_link,
        ],
    )?;
    Ok(())
}

pub fn get_tenant_by_slug(conn: &Connection, slug: &str) -> anyhow::Result<Option<Tenant>> {
    let result = conn.query_row(
        "SELECT id, slug, name, require_deposit, deposit_link FROM tenants WHERE slug = ?1",
        params![slug],
        |row| {
            Ok(Tenant {
                id: row.get(0)?,
                slug: row.get(1)?,
                name: row.get(2)?,
                require_deposit: row.get::<_, i32>(3)? != 0,
                deposit_link: row.get(4)?,
            })
        },
    );

    match result {
        Ok(tenant) => Ok(Some(tenant)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Services ──

pub fn insert_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, tenant_id, name, price_cents, duration_min, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            service.id,
            service.tenant_id,
            service.name,
            service.price_cents,
            service.duration_min,
            service.position,
        ],
    )?;
    Ok(())
}

pub fn get_services(conn: &Connection, tenant_id: &str) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, tenant_id, name, price_cents, duration_min, position
         FROM services WHERE tenant_id = ?1 ORDER BY position ASC",
    )?;

    let rows = stmt.query_map(params![tenant_id], |row| {
        Ok(Service {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            name: row.get(2)?,
            price_cents: row.get(3)?,
            duration_min: row.get(4)?,
            position: row.get(5)?,
        })
    })?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

pub fn service_name_exists(conn: &Connection, tenant_id: &str, name: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM services WHERE tenant_id = ?1 AND lower(name) = lower(?2)",
        params![tenant_id, name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn next_service_position(conn: &Connection, tenant_id: &str) -> anyhow::Result<i32> {
    let max: Option<i32> = conn.query_row(
        "SELECT MAX(position) FROM services WHERE tenant_id = ?1",
        params![tenant_id],
        |row| row.get(0),
    )?;
    Ok(max.unwrap_or(0) + 1)
}

// ── Slots ──

pub fn insert_slot(conn: &Connection, slot: &Slot) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO slots (id, tenant_id, day, time, available)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            slot.id,
            slot.tenant_id,
            slot.day,
            slot.time,
            slot.available as i32,
        ],
    )?;
    Ok(())
}

/// Default slot grid for a fresh tenant: next three days at the usual
/// morning and afternoon hours.
pub fn seed_default_slots(
    conn: &Connection,
    tenant_id: &str,
    from: NaiveDate,
) -> anyhow::Result<usize> {
    let mut count = 0;
    for day_offset in 1..=3 {
        let day = from + chrono::Duration::days(day_offset);
        let day_str = day.format("%Y-%m-%d").to_string();
        for hour in [10, 11, 14, 16] {
            let slot = Slot {
                id: format!("{tenant_id}-{day_str}-{hour:02}00"),
                tenant_id: tenant_id.to_string(),
                day: day_str.clone(),
                time: format!("{hour:02}:00"),
                available: true,
            };
            insert_slot(conn, &slot)?;
            count += 1;
        }
    }
    Ok(count)
}

pub fn get_open_slots(conn: &Connection, tenant_id: &str) -> anyhow::Result<Vec<Slot>> {
    let mut stmt = conn.prepare(
        "SELECT id, tenant_id, day, time, available
         FROM slots WHERE tenant_id = ?1 AND available = 1 ORDER BY day ASC, time ASC",
    )?;

    let rows = stmt.query_map(params![tenant_id], |row| Ok(parse_slot_row(row)))?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row??);
    }
    Ok(slots)
}

pub fn get_slot(conn: &Connection, id: &str) -> anyhow::Result<Option<Slot>> {
    let result = conn.query_row(
        "SELECT id, tenant_id, day, time, available FROM slots WHERE id = ?1",
        params![id],
        |row| Ok(parse_slot_row(row)),
    );

    match result {
        Ok(slot) => Ok(Some(slot?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Conditional take: succeeds for exactly one caller when two commits race
/// on the same slot.
pub fn take_slot(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE slots SET available = 0 WHERE id = ?1 AND available = 1",
        params![id],
    )?;
    Ok(count > 0)
}

pub fn reopen_slot(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE slots SET available = 1 WHERE id = ?1 AND available = 0",
        params![id],
    )?;
    Ok(count > 0)
}

fn parse_slot_row(row: &rusqlite::Row) -> anyhow::Result<Slot> {
    Ok(Slot {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        day: row.get(2)?,
        time: row.get(3)?,
        available: row.get::<_, i32>(4)? != 0,
    })
}

// ── Conversations ──

pub fn get_conversation(
    conn: &Connection,
    tenant_id: &str,
    session_id: &str,
) -> anyhow::Result<Option<Conversation>> {
    let now = now_string();
    let result = conn.query_row(
        "SELECT state, collected, last_activity, expires_at
         FROM conversations
         WHERE tenant_id = ?1 AND session_id = ?2 AND expires_at > ?3",
        params![tenant_id, session_id, now],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    );

    match result {
        Ok((state_str, collected_json, last_activity_str, expires_at_str)) => {
            let collected: CollectedSlots =
                serde_json::from_str(&collected_json).unwrap_or_default();
            Ok(Some(Conversation {
                tenant_id: tenant_id.to_string(),
                session_id: session_id.to_string(),
                state: DialogState::parse(&state_str),
                collected,
                last_activity: parse_dt(&last_activity_str),
                expires_at: parse_dt(&expires_at_str),
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_conversation(conn: &Connection, conv: &Conversation) -> anyhow::Result<()> {
    let collected_json = serde_json::to_string(&conv.collected)?;
    conn.execute(
        "INSERT INTO conversations (tenant_id, session_id, state, collected, last_activity, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(tenant_id, session_id) DO UPDATE SET
           state = excluded.state,
           collected = excluded.collected,
           last_activity = excluded.last_activity,
           expires_at = excluded.expires_at",
        params![
            conv.tenant_id,
            conv.session_id,
            conv.state.as_str(),
            collected_json,
            conv.last_activity.format(DT_FORMAT).to_string(),
            conv.expires_at.format(DT_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn expire_old_conversations(conn: &Connection) -> anyhow::Result<usize> {
    let now = now_string();
    let count = conn.execute(
        "DELETE FROM conversations WHERE expires_at <= ?1",
        params![now],
    )?;
    Ok(count)
}

// ── Appointments ──

pub fn create_appointment(conn: &Connection, appt: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments (id, tenant_id, patient_id, service_id, service_name, price_cents,
                                   slot_id, slot_day, slot_time, status, origin, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            appt.id,
            appt.tenant_id,
            appt.patient_id,
            appt.service_id,
            appt.service_name,
            appt.price_cents,
            appt.slot_id,
            appt.slot_day,
            appt.slot_time,
            appt.status.as_str(),
            appt.origin.as_str(),
            appt.created_at.format(DT_FORMAT).to_string(),
            appt.updated_at.format(DT_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

/// Tenant-scoped agenda read. Unfiltered unless the reader passes an
/// explicit day window.
pub fn get_appointments(
    conn: &Connection,
    tenant_id: &str,
    day: Option<&str>,
) -> anyhow::Result<Vec<Appointment>> {
    let (sql, params_vec): (&str, Vec<Box<dyn rusqlite::types::ToSql>>) = match day {
        Some(day) => (
            "SELECT id, tenant_id, patient_id, service_id, service_name, price_cents,
                    slot_id, slot_day, slot_time, status, origin, created_at, updated_at
             FROM appointments WHERE tenant_id = ?1 AND slot_day = ?2
             ORDER BY slot_day ASC, slot_time ASC",
            vec![
                Box::new(tenant_id.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(day.to_string()),
            ],
        ),
        None => (
            "SELECT id, tenant_id, patient_id, service_id, service_name, price_cents,
                    slot_id, slot_day, slot_time, status, origin, created_at, updated_at
             FROM appointments WHERE tenant_id = ?1
             ORDER BY slot_day ASC, slot_time ASC",
            vec![Box::new(tenant_id.to_string()) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn get_appointment_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Appointment>> {
    let result = conn.query_row(
        "SELECT id, tenant_id, patient_id, service_id, service_name, price_cents,
                slot_id, slot_day, slot_time, status, origin, created_at, updated_at
         FROM appointments WHERE id = ?1",
        params![id],
        |row| Ok(parse_appointment_row(row)),
    );

    match result {
        Ok(appt) => Ok(Some(appt?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &str,
    status: AppointmentStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now_string(), id],
    )?;
    Ok(count > 0)
}

pub fn get_attendance_history(
    conn: &Connection,
    tenant_id: &str,
    patient_id: &str,
) -> anyhow::Result<AttendanceHistory> {
    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*) FROM appointments
         WHERE tenant_id = ?1 AND patient_id = ?2 GROUP BY status",
    )?;

    let rows = stmt.query_map(params![tenant_id, patient_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut history = AttendanceHistory::default();
    for row in rows {
        let (status, count) = row?;
        match AppointmentStatus::parse(&status) {
            Some(AppointmentStatus::Scheduled) => history.scheduled = count,
            Some(AppointmentStatus::Completed) => history.completed = count,
            Some(AppointmentStatus::Cancelled) => history.cancelled = count,
            Some(AppointmentStatus::NoShow) => history.no_show = count,
            None => {}
        }
    }
    Ok(history)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let status_str: String = row.get(9)?;
    let origin_str: String = row.get(10)?;
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    Ok(Appointment {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        patient_id: row.get(2)?,
        service_id: row.get(3)?,
        service_name: row.get(4)?,
        price_cents: row.get(5)?,
        slot_id: row.get(6)?,
        slot_day: row.get(7)?,
        slot_time: row.get(8)?,
        status: AppointmentStatus::parse(&status_str).unwrap_or(AppointmentStatus::Scheduled),
        origin: AppointmentOrigin::parse(&origin_str),
        created_at: parse_dt(&created_at_str),
        updated_at: parse_dt(&updated_at_str),
    })
}
