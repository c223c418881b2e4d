use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::broadcast;
use tower::ServiceExt;

use turnero::config::AppConfig;
use turnero::db;
use turnero::db::queries;
use turnero::handlers;
use turnero::models::{Reply, ReplyAction, Slot, Tenant};
use turnero::services::ai::LlmProvider;
use turnero::services::assistant;
use turnero::state::AppState;

// ── Mock Providers ──

/// Deterministic classifier: recognizes a few phrasings, knows one service
/// that is not in any test catalog.
struct MockLlm;

#[async_trait]
impl LlmProvider for MockLlm {
    async fn complete(&self, _system: &str, user: &str) -> anyhow::Result<String> {
        if user.contains("teeth") {
            Ok(r#"{"intent":"service","service":"Limpieza Dental","confidence":0.91}"#.to_string())
        } else if user.contains("massage") {
            Ok(r#"{"intent":"service","service":"Masaje Relajante","confidence":0.88}"#.to_string())
        } else if user.contains("schedule") {
            Ok(r#"{"intent":"book","service":null,"confidence":0.85}"#.to_string())
        } else {
            Ok(r#"{"intent":"unknown","service":null,"confidence":0.2}"#.to_string())
        }
    }
}

/// Never returns; the resolver must time out and fall back.
struct StallingLlm;

#[async_trait]
impl LlmProvider for StallingLlm {
    async fn complete(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
        tokio::time::sleep(std::time::Duration::from_secs(600)).await;
        Ok(String::new())
    }
}

/// Always errors; exercises the heuristic path without waiting.
struct FailingLlm;

#[async_trait]
impl LlmProvider for FailingLlm {
    async fn complete(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
        anyhow::bail!("provider unavailable")
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        llm_provider: "ollama".to_string(),
        groq_api_key: "".to_string(),
        groq_model: "llama-3.1-8b-instant".to_string(),
        ollama_url: "http://localhost:11434".to_string(),
        ollama_model: "llama3.2".to_string(),
        intent_timeout_secs: 1,
    }
}

fn test_state(llm: Box<dyn LlmProvider>) -> Arc<AppState> {
    let config = test_config();
    let conn = db::init_db(":memory:").unwrap();
    let (booking_tx, _) = broadcast::channel(256);
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config,
        llm,
        booking_tx,
    })
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/tenants", post(handlers::admin::create_tenant))
        .route(
            "/api/t/:tenant/services",
            get(handlers::admin::get_services).post(handlers::admin::add_service),
        )
        .route("/api/t/:tenant/slots", get(handlers::admin::get_slots))
        .route(
            "/api/t/:tenant/appointments",
            get(handlers::admin::get_appointments).post(handlers::admin::create_appointment),
        )
        .route(
            "/api/t/:tenant/appointments/:id/status",
            post(handlers::admin::update_appointment_status),
        )
        .route(
            "/api/t/:tenant/patients/:patient_id/risk",
            get(handlers::admin::get_risk_profile),
        )
        .with_state(state)
}

/// Tenant with two services and three fixed slots.
fn seed_tenant(state: &Arc<AppState>, slug: &str) -> Tenant {
    let tenant = Tenant {
        id: format!("{slug}-id"),
        slug: slug.to_string(),
        name: "Clínica Demo".to_string(),
        require_deposit: false,
        deposit_link: None,
    };
    let db = state.db.lock().unwrap();
    queries::create_tenant(&db, &tenant).unwrap();
    turnero::services::catalog::add_service(&db, &tenant.id, "Consulta General", 50_000, 30)
        .unwrap();
    turnero::services::catalog::add_service(&db, &tenant.id, "Limpieza Dental", 35_000, 30)
        .unwrap();
    for (i, time) in ["10:00", "11:00", "14:00"].iter().enumerate() {
        queries::insert_slot(
            &db,
            &Slot {
                id: format!("{slug}-slot-{}", i + 1),
                tenant_id: tenant.id.clone(),
                day: "2025-09-01".to_string(),
                time: time.to_string(),
                available: true,
            },
        )
        .unwrap();
    }
    tenant
}

async fn chat_turn(state: &Arc<AppState>, tenant: &str, session: &str, text: &str) -> Reply {
    let app = test_app(state.clone());
    let body = serde_json::json!({
        "tenant": tenant,
        "session_id": session,
        "text": text,
    });
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK, "chat turn failed");
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn admin_get(state: &Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
    let app = test_app(state.clone());
    let res = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn admin_post(
    state: &Arc<AppState>,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let app = test_app(state.clone());
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Authorization", "Bearer test-token")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let state = test_state(Box::new(MockLlm));
    let app = test_app(state);

    let res = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Catalog ──

#[tokio::test]
async fn test_add_service_rejects_duplicate() {
    let state = test_state(Box::new(MockLlm));
    seed_tenant(&state, "clinica");

    let (status, _) = admin_post(
        &state,
        "/api/t/clinica/services",
        serde_json::json!({"name": "Ortodoncia", "price_cents": 100_00}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = admin_post(
        &state,
        "/api/t/clinica/services",
        serde_json::json!({"name": "ortodoncia", "price_cents": 200_00}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    // Catalog holds exactly one "Ortodoncia".
    let (_, services) = admin_get(&state, "/api/t/clinica/services").await;
    let count = services
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["name"].as_str().unwrap().eq_ignore_ascii_case("ortodoncia"))
        .count();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_add_service_requires_auth() {
    let state = test_state(Box::new(MockLlm));
    seed_tenant(&state, "clinica");

    let app = test_app(state);
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/t/clinica/services")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"name":"X","price_cents":100}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

// ── Menu-driven booking flow ──

#[tokio::test]
async fn test_full_menu_scenario_creates_bot_appointment() {
    let state = test_state(Box::new(MockLlm));
    seed_tenant(&state, "clinica");

    // Turn 1: any digit from idle lists the services.
    let reply = chat_turn(&state, "clinica", "patient-7", "1").await;
    assert!(reply.text.contains("Consulta General"));
    assert!(reply.text.contains("Limpieza Dental"));

    // Turn 2: pick service 1, get slot list.
    let reply = chat_turn(&state, "clinica", "patient-7", "1").await;
    assert!(reply.text.contains("Consulta General"));
    assert!(reply.text.contains("2025-09-01 10:00"));

    // Turn 3: pick slot 1, get the confirmation summary.
    let reply = chat_turn(&state, "clinica", "patient-7", "1").await;
    assert!(reply.text.contains("Service: Consulta General"));
    assert!(reply.text.contains("Slot: 2025-09-01 10:00"));

    // Nothing booked before the confirmation.
    let (_, appointments) = admin_get(&state, "/api/t/clinica/appointments").await;
    assert_eq!(appointments.as_array().unwrap().len(), 0);

    // Turn 4: confirm.
    let reply = chat_turn(&state, "clinica", "patient-7", "1").await;
    assert!(reply.text.contains("confirmed"));
    match reply.action {
        Some(ReplyAction::AppointmentCreated { service, slot, price, .. }) => {
            assert_eq!(service, "Consulta General");
            assert_eq!(slot, "2025-09-01 10:00");
            assert_eq!(price, 50_000);
        }
        other => panic!("expected appointment_created action, got {other:?}"),
    }

    // The appointment is visible to the agenda reader, origin bot.
    let (_, appointments) = admin_get(&state, "/api/t/clinica/appointments").await;
    let appointments = appointments.as_array().unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0]["origin"], "bot");
    assert_eq!(appointments[0]["status"], "scheduled");
    assert_eq!(appointments[0]["patient_id"], "patient-7");
}

#[tokio::test]
async fn test_repeated_confirm_is_idempotent() {
    let state = test_state(Box::new(MockLlm));
    seed_tenant(&state, "clinica");

    for _ in 0..4 {
        chat_turn(&state, "clinica", "patient-7", "1").await;
    }

    // Confirm again after commit: friendly no-op, no second appointment.
    let reply = chat_turn(&state, "clinica", "patient-7", "1").await;
    assert!(reply.text.contains("already confirmed"));
    assert!(reply.action.is_none());

    let reply = chat_turn(&state, "clinica", "patient-7", "si").await;
    assert!(reply.action.is_none());

    let (_, appointments) = admin_get(&state, "/api/t/clinica/appointments").await;
    assert_eq!(appointments.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unrecognized_input_reprompts_without_losing_progress() {
    let state = test_state(Box::new(MockLlm));
    seed_tenant(&state, "clinica");

    chat_turn(&state, "clinica", "s1", "1").await;

    // Gibberish mid-flow re-prompts the service menu.
    let reply = chat_turn(&state, "clinica", "s1", "qwerty zxcvb").await;
    assert!(reply.text.contains("didn't catch that"));

    // The flow continues where it left off.
    let reply = chat_turn(&state, "clinica", "s1", "2").await;
    assert!(reply.text.contains("Limpieza Dental"));
    assert!(reply.text.contains("2025-09-01"));
}

#[tokio::test]
async fn test_reset_discards_selections() {
    let state = test_state(Box::new(MockLlm));
    seed_tenant(&state, "clinica");

    chat_turn(&state, "clinica", "s1", "1").await;
    chat_turn(&state, "clinica", "s1", "1").await;
    chat_turn(&state, "clinica", "s1", "1").await;

    // Back out of the confirmation.
    let reply = chat_turn(&state, "clinica", "s1", "0").await;
    assert!(reply.text.contains("Which service"));

    // Confirm no longer books anything.
    let reply = chat_turn(&state, "clinica", "s1", "si").await;
    assert!(reply.action.is_none());
    let (_, appointments) = admin_get(&state, "/api/t/clinica/appointments").await;
    assert_eq!(appointments.as_array().unwrap().len(), 0);
}

// ── Intent resolution ──

#[tokio::test]
async fn test_ai_service_recognition_skips_ahead() {
    let state = test_state(Box::new(MockLlm));
    seed_tenant(&state, "clinica");

    // Free text from idle; the mock classifier maps it to Limpieza Dental.
    let reply = chat_turn(&state, "clinica", "s1", "I need my teeth cleaned").await;
    assert!(reply.text.contains("Limpieza Dental"));
    assert!(reply.text.contains("2025-09-01 10:00"));
}

#[tokio::test]
async fn test_ai_service_outside_catalog_reprompts() {
    let state = test_state(Box::new(MockLlm));
    seed_tenant(&state, "clinica");

    // The classifier confidently names a service this tenant doesn't offer.
    let reply = chat_turn(&state, "clinica", "s1", "I'd love a massage").await;
    assert!(reply.action.is_none());
    assert!(!reply.text.contains("Masaje"));

    let (_, appointments) = admin_get(&state, "/api/t/clinica/appointments").await;
    assert_eq!(appointments.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_stalled_ai_falls_back_to_heuristic() {
    let state = test_state(Box::new(StallingLlm));
    seed_tenant(&state, "clinica");

    let started = std::time::Instant::now();
    let reply = chat_turn(&state, "clinica", "s1", "quiero una limpieza dental").await;
    // Turn completed despite the stalled provider, via substring match.
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
    assert!(reply.text.contains("Limpieza Dental"));
    assert!(reply.text.contains("2025-09-01"));
}

#[tokio::test]
async fn test_heuristic_matches_service_added_at_runtime() {
    let state = test_state(Box::new(FailingLlm));
    seed_tenant(&state, "clinica");

    let (status, _) = admin_post(
        &state,
        "/api/t/clinica/services",
        serde_json::json!({"name": "Blanqueamiento", "price_cents": 120_000}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The new service shows up in the menu...
    let reply = chat_turn(&state, "clinica", "s1", "hola").await;
    assert!(reply.text.contains("Blanqueamiento"));
    assert_eq!(reply.options.len(), 3);

    // ...and the heuristic matcher sees it too, accents folded.
    let reply = chat_turn(&state, "clinica", "s2", "me interesa un blanqueamiénto").await;
    assert!(reply.text.contains("Blanqueamiento"));
    assert!(reply.text.contains("2025-09-01"));
}

// ── Conflicts ──

#[tokio::test]
async fn test_racing_commits_have_one_winner() {
    let state = test_state(Box::new(MockLlm));
    seed_tenant(&state, "clinica");

    // Two independent conversations, both at confirmation for slot 1.
    for session in ["alice", "bob"] {
        chat_turn(&state, "clinica", session, "1").await;
        chat_turn(&state, "clinica", session, "1").await;
        chat_turn(&state, "clinica", session, "1").await;
    }

    // Fire both confirms concurrently.
    let (a, b) = tokio::join!(
        assistant::process_message(&state, "clinica", "alice", "1"),
        assistant::process_message(&state, "clinica", "bob", "1"),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let winners = [&a, &b]
        .iter()
        .filter(|r| matches!(r.action, Some(ReplyAction::AppointmentCreated { .. })))
        .count();
    assert_eq!(winners, 1, "exactly one commit must win the slot");

    let loser = if a.action.is_some() { &b } else { &a };
    assert!(loser.text.contains("booked by someone else"));
    // The loser is re-prompted with refreshed availability.
    assert!(loser.text.contains("updated list"));
    assert!(!loser.text.contains("10:00"));

    let (_, appointments) = admin_get(&state, "/api/t/clinica/appointments").await;
    assert_eq!(appointments.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_conflict_loser_can_rebook_another_slot() {
    let state = test_state(Box::new(MockLlm));
    seed_tenant(&state, "clinica");

    for session in ["alice", "bob"] {
        chat_turn(&state, "clinica", session, "1").await;
        chat_turn(&state, "clinica", session, "1").await;
        chat_turn(&state, "clinica", session, "1").await;
    }

    chat_turn(&state, "clinica", "alice", "1").await;
    let reply = chat_turn(&state, "clinica", "bob", "1").await;
    assert!(reply.text.contains("booked by someone else"));

    // Bob picks the first slot of the refreshed list and confirms.
    chat_turn(&state, "clinica", "bob", "1").await;
    let reply = chat_turn(&state, "clinica", "bob", "1").await;
    match reply.action {
        Some(ReplyAction::AppointmentCreated { slot, .. }) => {
            assert_eq!(slot, "2025-09-01 11:00");
        }
        other => panic!("expected appointment_created action, got {other:?}"),
    }

    let (_, appointments) = admin_get(&state, "/api/t/clinica/appointments").await;
    assert_eq!(appointments.as_array().unwrap().len(), 2);
}

// ── Agenda surface ──

#[tokio::test]
async fn test_appointments_date_window() {
    let state = test_state(Box::new(MockLlm));
    seed_tenant(&state, "clinica");

    for _ in 0..4 {
        chat_turn(&state, "clinica", "s1", "1").await;
    }

    let (_, all) = admin_get(&state, "/api/t/clinica/appointments").await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (_, on_day) = admin_get(&state, "/api/t/clinica/appointments?date=2025-09-01").await;
    assert_eq!(on_day.as_array().unwrap().len(), 1);

    let (_, off_day) = admin_get(&state, "/api/t/clinica/appointments?date=2025-09-02").await;
    assert_eq!(off_day.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_manual_cancellation_reopens_slot() {
    let state = test_state(Box::new(MockLlm));
    seed_tenant(&state, "clinica");

    for _ in 0..4 {
        chat_turn(&state, "clinica", "s1", "1").await;
    }

    let (_, appointments) = admin_get(&state, "/api/t/clinica/appointments").await;
    let id = appointments[0]["id"].as_str().unwrap().to_string();

    let (_, open_before) = admin_get(&state, "/api/t/clinica/slots").await;
    assert_eq!(open_before.as_array().unwrap().len(), 2);

    let (status, updated) = admin_post(
        &state,
        &format!("/api/t/clinica/appointments/{id}/status"),
        serde_json::json!({"status": "cancelled"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "cancelled");

    let (_, open_after) = admin_get(&state, "/api/t/clinica/slots").await;
    assert_eq!(open_after.as_array().unwrap().len(), 3);
}

// ── Risk profiles ──

#[tokio::test]
async fn test_risk_profile_high_risk_patient() {
    let state = test_state(Box::new(MockLlm));
    seed_tenant(&state, "clinica");

    // Three bookings for the same patient; staff cancels two of them.
    let mut ids = vec![];
    for slot in ["clinica-slot-1", "clinica-slot-2", "clinica-slot-3"] {
        let (status, appt) = admin_post(
            &state,
            "/api/t/clinica/appointments",
            serde_json::json!({
                "patient_id": "carlos",
                "service_id": service_id(&state, "clinica-id", "Consulta General"),
                "slot_id": slot,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        ids.push(appt["id"].as_str().unwrap().to_string());
    }
    for id in &ids[..2] {
        admin_post(
            &state,
            &format!("/api/t/clinica/appointments/{id}/status"),
            serde_json::json!({"status": "cancelled"}),
        )
        .await;
    }

    let (status, profile) = admin_get(&state, "/api/t/clinica/patients/carlos/risk").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["cancellation_rate_pct"], 66);
    assert_eq!(profile["classification"], "high-risk");
    assert_eq!(profile["suggested_action"], "request_deposit");
    assert_eq!(profile["indicator"], "risk_alert");
}

#[tokio::test]
async fn test_risk_profile_trusted_patient() {
    let state = test_state(Box::new(MockLlm));
    seed_tenant(&state, "clinica");

    let (_, appt) = admin_post(
        &state,
        "/api/t/clinica/appointments",
        serde_json::json!({
            "patient_id": "juan",
            "service_id": service_id(&state, "clinica-id", "Consulta General"),
            "slot_id": "clinica-slot-1",
        }),
    )
    .await;
    admin_post(
        &state,
        &format!(
            "/api/t/clinica/appointments/{}/status",
            appt["id"].as_str().unwrap()
        ),
        serde_json::json!({"status": "completed"}),
    )
    .await;

    let (_, profile) = admin_get(&state, "/api/t/clinica/patients/juan/risk").await;
    assert_eq!(profile["classification"], "trusted");
    assert_eq!(profile["cancellation_rate_pct"], 0);
    assert_eq!(profile["indicator"], "reliable");
}

// ── Degraded modes ──

#[tokio::test]
async fn test_empty_catalog_degrades_gracefully() {
    let state = test_state(Box::new(MockLlm));
    {
        let db = state.db.lock().unwrap();
        queries::create_tenant(
            &db,
            &Tenant {
                id: "bare-id".to_string(),
                slug: "bare".to_string(),
                name: "Bare".to_string(),
                require_deposit: false,
                deposit_link: None,
            },
        )
        .unwrap();
    }

    let reply = chat_turn(&state, "bare", "s1", "hola").await;
    assert!(reply.text.contains("no services available"));
    assert!(reply.options.is_empty());
}

#[tokio::test]
async fn test_unknown_tenant_is_not_found() {
    let state = test_state(Box::new(MockLlm));
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"tenant":"ghost","session_id":"s1","text":"hola"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// ── Deposit flow ──

#[tokio::test]
async fn test_deposit_tenant_reply_carries_payment_link() {
    let state = test_state(Box::new(MockLlm));
    {
        let db = state.db.lock().unwrap();
        let tenant = Tenant {
            id: "spa-id".to_string(),
            slug: "spa".to_string(),
            name: "Spa".to_string(),
            require_deposit: true,
            deposit_link: Some("https://mpago.la/demo".to_string()),
        };
        queries::create_tenant(&db, &tenant).unwrap();
        turnero::services::catalog::add_service(&db, "spa-id", "Masaje", 80_000, 60).unwrap();
        queries::insert_slot(
            &db,
            &Slot {
                id: "spa-slot-1".to_string(),
                tenant_id: "spa-id".to_string(),
                day: "2025-09-01".to_string(),
                time: "10:00".to_string(),
                available: true,
            },
        )
        .unwrap();
    }

    for _ in 0..3 {
        chat_turn(&state, "spa", "s1", "1").await;
    }
    let reply = chat_turn(&state, "spa", "s1", "1").await;

    assert!(reply.text.contains("https://mpago.la/demo"));
    match reply.action {
        Some(ReplyAction::AppointmentCreated { link, .. }) => {
            assert_eq!(link.as_deref(), Some("https://mpago.la/demo"));
        }
        other => panic!("expected appointment_created action, got {other:?}"),
    }
}

// ── Tenant creation via API ──

#[tokio::test]
async fn test_create_tenant_seeds_slot_grid() {
    let state = test_state(Box::new(MockLlm));

    let (status, _) = admin_post(
        &state,
        "/api/tenants",
        serde_json::json!({"slug": "nueva", "name": "Nueva Clínica"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // 3 days x 4 hours.
    let (_, slots) = admin_get(&state, "/api/t/nueva/slots").await;
    assert_eq!(slots.as_array().unwrap().len(), 12);

    let (status, _) = admin_post(
        &state,
        "/api/tenants",
        serde_json::json!({"slug": "nueva", "name": "Duplicada"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn service_id(state: &Arc<AppState>, tenant_id: &str, name: &str) -> String {
    let db = state.db.lock().unwrap();
    queries::get_services(&db, tenant_id)
        .unwrap()
        .into_iter()
        .find(|s| s.name == name)
        .map(|s| s.id)
        .unwrap()
}
