use anyhow::Context;
use rusqlite::Connection;

// Embedded so that `:memory:` databases in tests get the full schema.
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_init",
    "CREATE TABLE IF NOT EXISTS tenants (
        id TEXT PRIMARY KEY,
        slug TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        require_deposit INTEGER NOT NULL DEFAULT 0,
        deposit_link TEXT
    );

    CREATE TABLE IF NOT EXISTS services (
        id TEXT PRIMARY KEY,
        tenant_id TEXT NOT NULL,
        name TEXT NOT NULL,
        price_cents INTEGER NOT NULL,
        duration_min INTEGER NOT NULL,
        position INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_services_tenant ON services(tenant_id, position);

    CREATE TABLE IF NOT EXISTS slots (
        id TEXT PRIMARY KEY,
        tenant_id TEXT NOT NULL,
        day TEXT NOT NULL,
        time TEXT NOT NULL,
        available INTEGER NOT NULL DEFAULT 1
    );
    CREATE INDEX IF NOT EXISTS idx_slots_tenant ON slots(tenant_id, day, time);

    CREATE TABLE IF NOT EXISTS conversations (
        tenant_id TEXT NOT NULL,
        session_id TEXT NOT NULL,
        state TEXT NOT NULL,
        collected TEXT NOT NULL,
        last_activity TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        PRIMARY KEY (tenant_id, session_id)
    );

    CREATE TABLE IF NOT EXISTS appointments (
        id TEXT PRIMARY KEY,
        tenant_id TEXT NOT NULL,
        patient_id TEXT NOT NULL,
        service_id TEXT NOT NULL,
        service_name TEXT NOT NULL,
        price_cents INTEGER NOT NULL,
        slot_id TEXT NOT NULL,
        slot_day TEXT NOT NULL,
        slot_time TEXT NOT NULL,
        status TEXT NOT NULL,
        origin TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_appointments_tenant ON appointments(tenant_id, slot_day);
    CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(tenant_id, patient_id);",
)];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;

        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}
