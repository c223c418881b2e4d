use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::{Stream, StreamExt};

use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

const KEEPALIVE_SECS: u64 = 30;

#[derive(Deserialize)]
pub struct SseQuery {
    pub token: Option<String>,
}

// GET /api/t/:tenant/events — live booking commits for agenda readers.
// EventSource cannot set headers, so the staff token rides the query
// string. Commits are durable in the agenda; a reconnecting reader
// re-reads it instead of replaying missed events.
pub async fn booking_events(
    State(state): State<Arc<AppState>>,
    Path(tenant_slug): Path<String>,
    Query(query): Query<SseQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Response> {
    if query.token.as_deref() != Some(state.config.admin_token.as_str()) {
        return Err(AppError::Unauthorized.into_response());
    }

    let tenant_id = {
        let db = state.db.lock().unwrap();
        match queries::get_tenant_by_slug(&db, &tenant_slug) {
            Ok(Some(tenant)) => tenant.id,
            Ok(None) => {
                return Err(AppError::NotFound(format!("tenant {tenant_slug}")).into_response())
            }
            Err(e) => return Err(AppError::Internal(e).into_response()),
        }
    };

    let commits = BroadcastStream::new(state.booking_tx.subscribe()).filter_map(move |item| {
        match item {
            Ok(event) if event.tenant_id == tenant_id => {
                let data = serde_json::to_string(&event).unwrap_or_default();
                Some(Ok(Event::default().event("booking").data(data)))
            }
            // Other tenants' commits and lagged drops are both silent.
            Ok(_) | Err(BroadcastStreamRecvError::Lagged(_)) => None,
        }
    });

    let keepalive =
        IntervalStream::new(tokio::time::interval(Duration::from_secs(KEEPALIVE_SECS)))
            .map(|_| Ok(Event::default().comment("ping")));

    Ok(Sse::new(commits.merge(keepalive)))
}
