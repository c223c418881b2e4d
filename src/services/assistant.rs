use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    CollectedSlots, Command, Conversation, DialogState, QuickReply, Reply, ReplyAction,
    Resolution, Service, Slot, Tenant,
};
use crate::services::{ledger, resolver};
use crate::state::AppState;

const IDLE_TIMEOUT_MINUTES: i64 = 30;

/// One turn: resolve the inbound message, transition the conversation,
/// reply. A turn always completes; every failure short of a lost slot
/// race degrades to a re-prompt of the current menu.
pub async fn process_message(
    state: &Arc<AppState>,
    tenant_slug: &str,
    session_id: &str,
    message: &str,
) -> Result<Reply, AppError> {
    let (tenant, mut conv, catalog) = {
        let db = state.db.lock().unwrap();
        let tenant = queries::get_tenant_by_slug(&db, tenant_slug)
            .map_err(AppError::Internal)?
            .ok_or_else(|| AppError::NotFound(format!("tenant {tenant_slug}")))?;
        let conv = queries::get_conversation(&db, &tenant.id, session_id)
            .map_err(AppError::Internal)?
            .unwrap_or_else(|| new_conversation(&tenant.id, session_id));
        let catalog = queries::get_services(&db, &tenant.id).map_err(AppError::Internal)?;
        (tenant, conv, catalog)
    };

    // Resolution happens outside the db lock; the AI call may take up to
    // the configured timeout.
    let timeout = Duration::from_secs(state.config.intent_timeout_secs);
    let resolution = resolver::resolve(
        state.llm.as_ref(),
        message,
        &conv.state,
        &catalog,
        timeout,
    )
    .await;

    tracing::info!(
        tenant = tenant_slug,
        session = session_id,
        state = conv.state.as_str(),
        resolution = ?resolution,
        "processing turn"
    );

    let reply = transition(state, &tenant, &mut conv, &catalog, resolution)?;

    let now = Utc::now().naive_utc();
    conv.last_activity = now;
    conv.expires_at = now + chrono::Duration::minutes(IDLE_TIMEOUT_MINUTES);

    {
        let db = state.db.lock().unwrap();
        queries::save_conversation(&db, &conv).map_err(AppError::Internal)?;
        let _ = queries::expire_old_conversations(&db);
    }

    Ok(reply)
}

fn transition(
    state: &Arc<AppState>,
    tenant: &Tenant,
    conv: &mut Conversation,
    catalog: &[Service],
    resolution: Resolution,
) -> Result<Reply, AppError> {
    use DialogState::*;

    match (conv.state, resolution) {
        // Commit is idempotent per conversation: confirming again changes
        // nothing and books nothing.
        (Committed, Resolution::Command(Command::Confirm))
        | (Committed, Resolution::MenuDigit(1)) => Ok(already_committed_reply(conv)),

        // Reset always routes home and drops collected selections.
        (_, Resolution::Command(Command::Reset)) => {
            conv.state = MenuRoot;
            conv.collected = CollectedSlots::default();
            Ok(menu_reply(tenant, catalog))
        }

        // A recognized service name jumps straight to slot selection from
        // any pre-confirmation state.
        (s, Resolution::Service(service_id)) if s.allows_service_shortcut() => {
            select_service(state, conv, catalog, &service_id)
        }

        (Idle, Resolution::Command(Command::Book)) | (Idle, Resolution::MenuDigit(_)) => {
            conv.state = MenuRoot;
            conv.collected = CollectedSlots::default();
            Ok(menu_reply(tenant, catalog))
        }

        (MenuRoot, Resolution::MenuDigit(n)) | (ServiceSelection, Resolution::MenuDigit(n)) => {
            match catalog.get(n.wrapping_sub(1)) {
                Some(service) => {
                    let service_id = service.id.clone();
                    select_service(state, conv, catalog, &service_id)
                }
                None => Ok(service_list_reply(catalog, true)),
            }
        }

        // An explicit booking request re-lists the catalog.
        (MenuRoot, Resolution::Command(Command::Book))
        | (ServiceSelection, Resolution::Command(Command::Book))
        | (SlotSelection, Resolution::Command(Command::Book)) => {
            conv.state = ServiceSelection;
            conv.collected = CollectedSlots::default();
            Ok(service_list_reply(catalog, false))
        }

        (SlotSelection, Resolution::MenuDigit(n)) => {
            match conv.collected.offered_slots.get(n.wrapping_sub(1)) {
                Some(slot_id) => {
                    let slot_id = slot_id.clone();
                    choose_slot(state, conv, catalog, &slot_id)
                }
                None => refreshed_slot_reply(state, conv, "That slot number is not on the list."),
            }
        }

        (Confirmation, Resolution::Command(Command::Confirm))
        | (Confirmation, Resolution::MenuDigit(1)) => commit(state, tenant, conv, catalog),

        // Everything unrecognized re-prompts the current menu, without a
        // state change.
        (Idle, _) => Ok(menu_reply(tenant, catalog)),
        (MenuRoot, _) | (ServiceSelection, _) => Ok(service_list_reply(catalog, true)),
        (SlotSelection, _) => {
            refreshed_slot_reply(state, conv, "Please reply with one of the slot numbers.")
        }
        (Confirmation, _) => reprompt_confirmation(state, conv, catalog),
        (Committed, _) => Ok(already_committed_reply(conv)),
    }
}

fn select_service(
    state: &Arc<AppState>,
    conv: &mut Conversation,
    catalog: &[Service],
    service_id: &str,
) -> Result<Reply, AppError> {
    let service = catalog
        .iter()
        .find(|s| s.id == service_id)
        .ok_or_else(|| AppError::NotFound(format!("service {service_id}")))?;

    conv.collected.service_id = Some(service.id.clone());
    conv.collected.slot_id = None;
    conv.state = DialogState::SlotSelection;

    let open = open_slots(state, &conv.tenant_id)?;
    if open.is_empty() {
        conv.state = DialogState::MenuRoot;
        return Ok(Reply::text(format!(
            "You picked {}, but there are no open slots right now. Please check back later.",
            service.name
        )));
    }

    conv.collected.offered_slots = open.iter().map(|s| s.id.clone()).collect();
    Ok(slot_list_reply(&service.name, &open))
}

fn choose_slot(
    state: &Arc<AppState>,
    conv: &mut Conversation,
    catalog: &[Service],
    slot_id: &str,
) -> Result<Reply, AppError> {
    let slot = {
        let db = state.db.lock().unwrap();
        queries::get_slot(&db, slot_id).map_err(AppError::Internal)?
    };

    match slot {
        Some(slot) if slot.available => {
            conv.collected.slot_id = Some(slot.id.clone());
            conv.state = DialogState::Confirmation;
            Ok(confirmation_reply(
                service_name(conv, catalog),
                slot.label(),
                false,
            ))
        }
        // Taken or gone since it was offered: refresh the list.
        _ => refreshed_slot_reply(state, conv, "That slot was just taken."),
    }
}

fn commit(
    state: &Arc<AppState>,
    tenant: &Tenant,
    conv: &mut Conversation,
    catalog: &[Service],
) -> Result<Reply, AppError> {
    let service_id = conv.collected.service_id.clone();
    let slot_id = conv.collected.slot_id.clone();
    let (Some(service_id), Some(slot_id)) = (service_id, slot_id) else {
        // Selections went missing (expired and restarted mid-flow).
        conv.state = DialogState::MenuRoot;
        conv.collected = CollectedSlots::default();
        return Ok(menu_reply(tenant, catalog));
    };

    let service = catalog
        .iter()
        .find(|s| s.id == service_id)
        .ok_or_else(|| AppError::NotFound(format!("service {service_id}")))?;

    let committed = {
        let db = state.db.lock().unwrap();
        ledger::commit(
            &db,
            &state.booking_tx,
            tenant,
            &conv.session_id,
            &conv.session_id,
            service,
            &slot_id,
        )
    };

    match committed {
        Ok(appointment) => {
            conv.state = DialogState::Committed;
            conv.collected.confirmed = true;
            conv.collected.appointment_id = Some(appointment.id.clone());

            let slot_label = format!("{} {}", appointment.slot_day, appointment.slot_time);
            let link = tenant
                .require_deposit
                .then(|| deposit_link(tenant, &appointment.id));

            let mut text = format!(
                "Your appointment is confirmed: {} on {}.",
                appointment.service_name, slot_label
            );
            if let Some(link) = &link {
                text.push_str(&format!(" To finish, please pay the deposit: {link}"));
            }

            Ok(Reply {
                text,
                options: vec![QuickReply::new("Back to menu", "0")],
                action: Some(ReplyAction::AppointmentCreated {
                    service: appointment.service_name.clone(),
                    slot: slot_label,
                    price: appointment.price_cents,
                    link,
                }),
            })
        }
        // Lost the race: back to slot selection with fresh availability.
        Err(AppError::Conflict(_)) => {
            conv.collected.slot_id = None;
            refreshed_slot_reply(
                state,
                conv,
                "Sorry, that slot was booked by someone else a moment ago.",
            )
        }
        Err(e) => Err(e),
    }
}

// ── Replies ──

fn new_conversation(tenant_id: &str, session_id: &str) -> Conversation {
    let now = Utc::now().naive_utc();
    Conversation {
        tenant_id: tenant_id.to_string(),
        session_id: session_id.to_string(),
        state: DialogState::Idle,
        collected: CollectedSlots::default(),
        last_activity: now,
        expires_at: now + chrono::Duration::minutes(IDLE_TIMEOUT_MINUTES),
    }
}

fn service_options(catalog: &[Service]) -> Vec<QuickReply> {
    catalog
        .iter()
        .enumerate()
        .map(|(i, s)| {
            QuickReply::new(
                format!("{} ({})", s.name, s.price_display()),
                (i + 1).to_string(),
            )
        })
        .collect()
}

fn format_services(catalog: &[Service]) -> String {
    catalog
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}) {} ({})", i + 1, s.name, s.price_display()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn menu_reply(tenant: &Tenant, catalog: &[Service]) -> Reply {
    if catalog.is_empty() {
        return Reply::text(format!(
            "Hi! This is the {} booking assistant. There are no services available yet.",
            tenant.name
        ));
    }
    Reply::with_options(
        format!(
            "Hi! This is the {} booking assistant. Which service would you like?\n{}\n\nReply with a number. (0 for this menu)",
            tenant.name,
            format_services(catalog)
        ),
        service_options(catalog),
    )
}

fn service_list_reply(catalog: &[Service], reprompt: bool) -> Reply {
    if catalog.is_empty() {
        return Reply::text("There are no services available yet.");
    }
    let lead = if reprompt {
        "I didn't catch that. Which service would you like?"
    } else {
        "Which service would you like?"
    };
    Reply::with_options(
        format!("{lead}\n{}\n\nReply with a number.", format_services(catalog)),
        service_options(catalog),
    )
}

fn slot_list_reply(service_name: &str, open: &[Slot]) -> Reply {
    let lines = open
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}) {}", i + 1, s.label()))
        .collect::<Vec<_>>()
        .join("\n");
    let options = open
        .iter()
        .enumerate()
        .map(|(i, s)| QuickReply::new(s.label(), (i + 1).to_string()))
        .collect();
    Reply::with_options(
        format!("You picked {service_name}. Available slots:\n{lines}\n\nReply with a number."),
        options,
    )
}

fn service_name(conv: &Conversation, catalog: &[Service]) -> String {
    conv.collected
        .service_id
        .as_deref()
        .and_then(|id| catalog.iter().find(|s| s.id == id))
        .map(|s| s.name.clone())
        .unwrap_or_else(|| "your service".to_string())
}

fn reprompt_confirmation(
    state: &Arc<AppState>,
    conv: &mut Conversation,
    catalog: &[Service],
) -> Result<Reply, AppError> {
    let slot_label = match conv.collected.slot_id.as_deref() {
        Some(slot_id) => {
            let db = state.db.lock().unwrap();
            queries::get_slot(&db, slot_id)
                .map_err(AppError::Internal)?
                .map(|s| s.label())
                .unwrap_or_else(|| "the chosen slot".to_string())
        }
        None => "the chosen slot".to_string(),
    };
    Ok(confirmation_reply(
        service_name(conv, catalog),
        slot_label,
        true,
    ))
}

fn confirmation_reply(service_name: String, slot_label: String, reprompt: bool) -> Reply {
    let lead = if reprompt {
        "Please reply 1 to confirm or 0 to go back."
    } else {
        "Almost done!"
    };
    Reply::with_options(
        format!(
            "{lead}\nYou are about to book:\n- Service: {service_name}\n- Slot: {slot_label}\n\n1) Confirm\n0) Back to menu"
        ),
        vec![
            QuickReply::new("Confirm", "1"),
            QuickReply::new("Back to menu", "0"),
        ],
    )
}

fn already_committed_reply(conv: &Conversation) -> Reply {
    let id = conv.collected.appointment_id.as_deref().unwrap_or("?");
    Reply::with_options(
        format!("Your appointment is already confirmed (ref {id}). Send 0 for the menu."),
        vec![QuickReply::new("Back to menu", "0")],
    )
}

fn refreshed_slot_reply(
    state: &Arc<AppState>,
    conv: &mut Conversation,
    lead: &str,
) -> Result<Reply, AppError> {
    let open = open_slots(state, &conv.tenant_id)?;
    conv.state = DialogState::SlotSelection;

    if open.is_empty() {
        conv.state = DialogState::MenuRoot;
        conv.collected.offered_slots.clear();
        return Ok(Reply::text(format!(
            "{lead} There are no open slots left right now. Please check back later."
        )));
    }

    conv.collected.offered_slots = open.iter().map(|s| s.id.clone()).collect();
    let lines = open
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}) {}", i + 1, s.label()))
        .collect::<Vec<_>>()
        .join("\n");
    let options = open
        .iter()
        .enumerate()
        .map(|(i, s)| QuickReply::new(s.label(), (i + 1).to_string()))
        .collect();
    Ok(Reply::with_options(
        format!("{lead} Here is the updated list:\n{lines}\n\nReply with a number."),
        options,
    ))
}

fn open_slots(state: &Arc<AppState>, tenant_id: &str) -> Result<Vec<Slot>, AppError> {
    let db = state.db.lock().unwrap();
    queries::get_open_slots(&db, tenant_id).map_err(AppError::Internal)
}

fn deposit_link(tenant: &Tenant, appointment_id: &str) -> String {
    match &tenant.deposit_link {
        Some(link) => link.clone(),
        None => format!("https://pay.turnero.app/{appointment_id}"),
    }
}
