//! Interactive flows: document photos, reservation selection, invoicing.
//!
//! Photos are processed in memory and the source message is deleted right
//! after OCR; only extracted fields and raw text are retained.

use std::sync::Arc;

use chrono::{Duration, Local};
use serde_json::Value;
use teloxide::net::Download;
use teloxide::payloads::{EditMessageTextSetters, SendMessageSetters};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode};
use tracing::{error, info, warn};

use innkeep_core::time::{epoch_to_local_date, format_epoch_date, format_short};
use innkeep_core::Reservation;
use innkeep_pms::schedule::confirmed;
use innkeep_pms::{
    CountryMapper, DocumentTypeCatalog, InvoiceItemDraft, NewGuest, ReservationQuery,
};

use crate::checkin::{callback, CheckinSession, SessionState};
use crate::telegram::{authorized, reply_md, ChannelDeps, HandlerResult};
use crate::{format, telegram};

// ---------------------------------------------------------------------------
// Check-in: photos
// ---------------------------------------------------------------------------

pub async fn start_checkin(bot: &Bot, chat: ChatId, deps: &ChannelDeps) -> HandlerResult {
    if deps.ocr.is_none() {
        reply_md(bot, chat, "⚠️ Document scanning is not configured (VISION_API_KEY).").await?;
        return Ok(());
    }
    deps.sessions.lock().await.insert(chat.0, CheckinSession::default());

    bot.send_message(
        chat,
        "🛎️ *Check-in*\n\n📷 Send photos of guest ID documents.\n\n\
         Supported:\n• 🇭🇷 national ID cards\n• 🌍 passports with an MRZ\n• 🪪 EU ID cards\n\n\
         Send one photo per guest. When done, tap *Continue* 👇",
    )
    .parse_mode(ParseMode::Markdown)
    .reply_markup(collect_keyboard(0))
    .await?;
    Ok(())
}

fn collect_keyboard(guest_count: usize) -> InlineKeyboardMarkup {
    let continue_label = if guest_count > 0 {
        format!("✅ Continue ({guest_count} guest(s))")
    } else {
        "✅ Continue to reservation".to_string()
    };
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(continue_label, callback::CONTINUE)],
        vec![InlineKeyboardButton::callback("❌ Cancel", callback::CANCEL)],
    ])
}

pub async fn handle_photo(bot: Bot, msg: Message, deps: Arc<ChannelDeps>) -> HandlerResult {
    if !authorized(&bot, &msg, &deps).await {
        return Ok(());
    }
    let chat = msg.chat.id;
    let Some(ocr) = &deps.ocr else {
        reply_md(&bot, chat, "⚠️ Document scanning is not configured (VISION_API_KEY).").await?;
        return Ok(());
    };
    let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
        return Ok(());
    };

    bot.send_message(chat, "🔍 Reading the document...").await?;

    let file = bot.get_file(photo.file.id.clone()).await?;
    let mut image: Vec<u8> = Vec::new();
    bot.download_file(&file.path, &mut image).await?;

    let outcome = match ocr.scan(&image).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "OCR failed");
            reply_md(&bot, chat, &format!("❌ OCR failed: {e}")).await?;
            return Ok(());
        }
    };

    // The ID photo stays in the chat history otherwise.
    match bot.delete_message(chat, msg.id).await {
        Ok(_) => {
            bot.send_message(chat, "🗑️ _Photo deleted for privacy_")
                .parse_mode(ParseMode::Markdown)
                .await?;
        }
        Err(e) => warn!(error = %e, "Could not delete photo message"),
    }

    if !outcome.is_valid() {
        let preview: String = outcome.raw_text.chars().take(300).collect();
        reply_md(
            &bot,
            chat,
            &format!(
                "❌ *Could not extract identity data*\n\nTry a sharper, better-lit photo.\n\n\
                 Recognized text:\n```\n{preview}\n```"
            ),
        )
        .await?;
        return Ok(());
    }

    let mut sessions = deps.sessions.lock().await;
    let session = sessions.entry(chat.0).or_default();
    let summary = format::scan_summary(&outcome);
    let count = session.add_guest(outcome);
    drop(sessions);

    bot.send_message(
        chat,
        format!("{summary}\n\n✅ *Guest {count} added!*\n\n📷 Send more photos or tap *Continue* 👇"),
    )
    .parse_mode(ParseMode::Markdown)
    .reply_markup(collect_keyboard(count))
    .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Check-in: reservation selection & execution
// ---------------------------------------------------------------------------

async fn show_reservation_selection(
    bot: &Bot,
    chat: ChatId,
    message_id: MessageId,
    deps: &ChannelDeps,
) -> HandlerResult {
    let guest_summary = {
        let sessions = deps.sessions.lock().await;
        let Some(session) = sessions.get(&chat.0) else {
            bot.edit_message_text(chat, message_id, "⚠️ No check-in in progress. Use /checkin.")
                .await?;
            return Ok(());
        };
        if session.guests.is_empty() {
            bot.edit_message_text(
                chat,
                message_id,
                "⚠️ No guests scanned yet.\n\nSend ID photos first, then continue.",
            )
            .await?;
            return Ok(());
        }
        session
            .guests
            .iter()
            .enumerate()
            .map(|(i, outcome)| {
                let name = outcome.profile.display_name().unwrap_or_else(|| "?".into());
                let nationality = outcome
                    .profile
                    .nationality
                    .as_deref()
                    .map(|n| format!(" ({n})"))
                    .unwrap_or_default();
                format!("\n👤 Guest {}: *{name}*{nationality}", i + 1)
            })
            .collect::<String>()
    };

    bot.edit_message_text(chat, message_id, "⏳ Fetching upcoming reservations...")
        .await?;

    let today = Local::now().date_naive();
    let reservations = match deps
        .pms
        .reservations(&ReservationQuery::window(today, today + Duration::days(5), 20))
        .await
    {
        Ok(all) => {
            let mut list: Vec<Reservation> = confirmed(&all).into_iter().cloned().collect();
            list.sort_by_key(|r| r.arrival);
            list
        }
        Err(e) => {
            bot.edit_message_text(chat, message_id, format!("❌ PMS error: {e}")).await?;
            deps.sessions.lock().await.remove(&chat.0);
            return Ok(());
        }
    };

    if reservations.is_empty() {
        bot.edit_message_text(
            chat,
            message_id,
            "📭 No reservations in the next 5 days.\nCheck the dates in the PMS.",
        )
        .await?;
        deps.sessions.lock().await.remove(&chat.0);
        return Ok(());
    }

    let mut rows = Vec::new();
    for res in reservations.iter().take(6) {
        let status = if res.checked_in { "✅" } else { "⏳" };
        let guest: String = res.guest_name.chars().take(15).collect();
        let unit: String = res.unit_name.chars().take(10).collect();
        let label = format!("{status} {guest} | {unit} | {}", format_epoch_date(res.arrival));
        rows.push(vec![InlineKeyboardButton::callback(
            label,
            format!("{}{}", callback::RESERVATION_PREFIX, res.id),
        )]);
    }
    rows.push(vec![InlineKeyboardButton::callback("❌ Cancel", callback::CANCEL)]);

    {
        let mut sessions = deps.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&chat.0) {
            session.candidates = reservations.iter().map(|r| (r.id.clone(), r.clone())).collect();
            session.state = SessionState::SelectingReservation;
        }
    }

    bot.edit_message_text(
        chat,
        message_id,
        format!(
            "🛎️ *Check-in*\n\n*Guests to register:*{guest_summary}\n\n\
             *Pick a reservation:*\n_(next 5 days)_"
        ),
    )
    .parse_mode(ParseMode::Markdown)
    .reply_markup(InlineKeyboardMarkup::new(rows))
    .await?;
    Ok(())
}

async fn load_country_mapper(deps: &ChannelDeps) -> Option<&CountryMapper> {
    deps.countries
        .get_or_try_init(|| async {
            let entries = deps.pms.countries().await?;
            info!(count = entries.len(), "Loaded PMS country list");
            Ok::<_, innkeep_pms::PmsError>(CountryMapper::from_entries(&entries))
        })
        .await
        .map_err(|e| warn!(error = %e, "Could not load countries"))
        .ok()
}

async fn load_document_catalog(deps: &ChannelDeps) -> Option<&DocumentTypeCatalog> {
    deps.documents
        .get_or_try_init(|| async {
            let entries = deps.pms.document_types().await?;
            info!(count = entries.len(), "Loaded PMS document types");
            Ok::<_, innkeep_pms::PmsError>(DocumentTypeCatalog::from_entries(entries))
        })
        .await
        .map_err(|e| warn!(error = %e, "Could not load document types"))
        .ok()
}

async fn perform_checkin(
    bot: &Bot,
    chat: ChatId,
    message_id: MessageId,
    deps: &ChannelDeps,
    reservation_id: &str,
) -> HandlerResult {
    let (guests, reservation) = {
        let sessions = deps.sessions.lock().await;
        let Some(session) = sessions.get(&chat.0) else {
            bot.edit_message_text(chat, message_id, "⚠️ No check-in in progress.").await?;
            return Ok(());
        };
        (session.guests.clone(), session.candidates.get(reservation_id).cloned())
    };

    if guests.is_empty() {
        bot.edit_message_text(chat, message_id, "⚠️ No guests to register.").await?;
        deps.sessions.lock().await.remove(&chat.0);
        return Ok(());
    }

    bot.edit_message_text(
        chat,
        message_id,
        format!("⏳ Registering {} guest(s) on reservation #{reservation_id}...", guests.len()),
    )
    .await?;

    let mapper = load_country_mapper(deps).await;
    let catalog = load_document_catalog(deps).await;

    let payload: Vec<NewGuest> = guests
        .iter()
        .enumerate()
        .map(|(i, outcome)| {
            let profile = &outcome.profile;
            let country_id = profile
                .nationality
                .as_deref()
                .and_then(|n| mapper.and_then(|m| m.resolve(n)));
            let document_type_id = profile
                .document_kind
                .and_then(|kind| catalog.and_then(|c| c.resolve(kind)));
            NewGuest::from_profile(
                profile,
                i == 0,
                &format!("Guest {}", i + 1),
                country_id,
                document_type_id,
            )
        })
        .collect();

    let outcome = match deps.pms.add_reservation_guests(reservation_id, &payload).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Guest registration failed");
            bot.edit_message_text(
                chat,
                message_id,
                format!("❌ *PMS error*\n\n{e}\n\nTry again or enter the guests manually."),
            )
            .parse_mode(ParseMode::Markdown)
            .await?;
            deps.sessions.lock().await.remove(&chat.0);
            return Ok(());
        }
    };

    // Even when some guests already existed, flip the reservation state.
    let mut checkin_note = String::new();
    if !outcome.added.is_empty() || !outcome.messages.is_empty() {
        match deps.pms.check_in(reservation_id).await {
            Ok(_) => {
                checkin_note = "\n✅ Reservation marked as checked-in".to_string();
                deps.store.mark_checked_in(reservation_id).await.ok();
            }
            Err(e) => {
                warn!(error = %e, "Check-in status update failed");
                checkin_note = format!("\n⚠️ Guests added, but check-in status: {e}");
            }
        }
    }

    // Cache what was registered.
    if let Some(res) = &reservation {
        deps.store.upsert_reservation(res).await.ok();
    }
    for outcome_guest in &guests {
        deps.store
            .add_scanned_guest(Some(reservation_id), &outcome_guest.profile, &outcome_guest.raw_text)
            .await
            .ok();
    }

    let mut guest_lines = String::new();
    for (i, scanned) in guests.iter().enumerate() {
        let name = scanned.profile.display_name().unwrap_or_else(|| format!("Guest {}", i + 1));
        let country = scanned.profile.nationality.as_deref().unwrap_or("N/A");
        let mark = if i < outcome.added.len() { "✅" } else { "⚠️" };
        guest_lines.push_str(&format!("\n{mark} {name} ({country})"));
    }

    let status_line = if outcome.added.len() == guests.len() {
        "✅ *Check-in complete!*"
    } else if !outcome.added.is_empty() {
        "⚠️ *Partially complete*"
    } else {
        "❌ *Check-in failed*"
    };

    let mut api_notes = String::new();
    if !outcome.messages.is_empty() {
        api_notes.push_str("\n\n📝 PMS messages:\n");
        for message in outcome.messages.iter().take(3) {
            let trimmed: String = message.chars().take(100).collect();
            api_notes.push_str(&format!("• {trimmed}\n"));
        }
    }

    let header = match &reservation {
        Some(res) => format!(
            "📋 Reservation: #{reservation_id}\n👤 Booker: {}\n🏠 {}\n📅 {} → {}",
            res.guest_name,
            res.unit_name,
            format_epoch_date(res.arrival),
            format_epoch_date(res.departure),
        ),
        None => format!("📋 Reservation: #{reservation_id}"),
    };

    bot.edit_message_text(
        chat,
        message_id,
        format!("{status_line}\n\n{header}\n\n*Registered guests:*{guest_lines}{checkin_note}{api_notes}"),
    )
    .parse_mode(ParseMode::Markdown)
    .reply_markup(InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "🧾 Draft invoice",
            format!("{}{}", callback::CHECKIN_INVOICE_PREFIX, reservation_id),
        )],
        vec![InlineKeyboardButton::callback("✅ Done", callback::DONE)],
    ]))
    .await?;

    let mut sessions = deps.sessions.lock().await;
    if let Some(session) = sessions.get_mut(&chat.0) {
        session.completed = reservation;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

pub async fn invoice_command(
    bot: &Bot,
    chat: ChatId,
    deps: &ChannelDeps,
    arg: &str,
) -> HandlerResult {
    let reservation_id = arg.trim();
    if reservation_id.is_empty() {
        reply_md(
            bot,
            chat,
            "📋 *Invoices*\n\nUsage: `/invoice <reservation id>`\n\n\
             The id is shown in reservation details and /search results.",
        )
        .await?;
        return Ok(());
    }

    bot.send_message(chat, format!("⏳ Fetching invoices for reservation {reservation_id}..."))
        .await?;

    let details = match deps.pms.reservation_details(reservation_id).await {
        Ok(details) => details,
        Err(e) => {
            reply_md(bot, chat, &format!("❌ PMS error: {e}")).await?;
            return Ok(());
        }
    };
    let guest_name = details
        .get("holder")
        .and_then(|h| h.get("name"))
        .or_else(|| details.get("guestName"))
        .and_then(Value::as_str)
        .unwrap_or("N/A");
    let unit_name = details.get("unitName").and_then(Value::as_str).unwrap_or("N/A");

    let invoices = match deps.pms.invoices_for_reservation(reservation_id).await {
        Ok(invoices) => invoices,
        Err(e) => {
            reply_md(bot, chat, &format!("❌ PMS error: {e}")).await?;
            return Ok(());
        }
    };

    if invoices.is_empty() {
        bot.send_message(
            chat,
            format!(
                "🧾 *Reservation #{reservation_id}*\n👤 {guest_name}\n🏠 {unit_name}\n\n\
                 📭 No invoices yet.\n\nAdd a line item below (a draft invoice is created automatically)."
            ),
        )
        .parse_mode(ParseMode::Markdown)
        .reply_markup(InlineKeyboardMarkup::new(vec![vec![
            InlineKeyboardButton::callback(
                "➕ Add item",
                format!("{}{}", callback::INVOICE_ADD_PREFIX, reservation_id),
            ),
        ]]))
        .await?;
        return Ok(());
    }

    let mut text = format!(
        "🧾 *Invoices for reservation #{reservation_id}*\n👤 {guest_name} | 🏠 {unit_name}\n\n"
    );
    for invoice in &invoices {
        let id = invoice.get("id").map(render_id).unwrap_or_else(|| "N/A".into());
        let date = invoice.get("date").and_then(Value::as_i64).map(format_epoch_date);
        let status = invoice_status(invoice);
        let total = invoice.get("totalValue").and_then(Value::as_f64).unwrap_or(0.0);
        text.push_str(&format!(
            "{} *Invoice #{id}*\n   📅 {} | {status}\n   💰 {total:.2} EUR\n\n",
            status_glyph(&status),
            date.unwrap_or_else(|| "N/A".into()),
        ));
    }

    let first_id = invoices[0].get("id").map(render_id).unwrap_or_default();
    bot.send_message(chat, text)
        .parse_mode(ParseMode::Markdown)
        .reply_markup(InlineKeyboardMarkup::new(vec![
            vec![InlineKeyboardButton::callback(
                "➕ Add item",
                format!("{}{}", callback::INVOICE_ADD_PREFIX, reservation_id),
            )],
            vec![InlineKeyboardButton::callback(
                "📋 Invoice details",
                format!("{}{}", callback::INVOICE_DETAILS_PREFIX, first_id),
            )],
        ]))
        .await?;
    Ok(())
}

fn render_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn invoice_status(invoice: &Value) -> String {
    match invoice.get("status") {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(1) => "Draft".to_string(),
            Some(2) => "Issued".to_string(),
            Some(3) => "Fiscalised".to_string(),
            _ => "Unknown".to_string(),
        },
        Some(Value::Object(map)) => map
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Draft")
            .to_string(),
        _ => "Draft".to_string(),
    }
}

fn status_glyph(status: &str) -> &'static str {
    match status {
        "Draft" => "📝",
        "Issued" => "📄",
        "Fiscalised" => "✅",
        _ => "📋",
    }
}

async fn show_invoice_details(
    bot: &Bot,
    chat: ChatId,
    message_id: MessageId,
    deps: &ChannelDeps,
    invoice_id: &str,
) -> HandlerResult {
    let invoice = match deps.pms.invoice_details(invoice_id).await {
        Ok(invoice) => invoice,
        Err(e) => {
            bot.edit_message_text(chat, message_id, format!("❌ PMS error: {e}")).await?;
            return Ok(());
        }
    };

    let status = invoice_status(&invoice);
    let mut text = format!("📋 *Invoice #{invoice_id}*\n━━━━━━━━━━━━━━━━━━━━\n\n");
    text.push_str(&format!("Status: {} {status}\n", status_glyph(&status)));
    if let Some(date) = invoice.get("date").and_then(Value::as_i64) {
        text.push_str(&format!("Date: {}\n", format_epoch_date(date)));
    }
    text.push('\n');

    if let Some(items) = invoice.get("items").and_then(Value::as_array) {
        if !items.is_empty() {
            text.push_str("*Items:*\n");
            for item in items {
                let desc = item.get("description").and_then(Value::as_str).unwrap_or("N/A");
                let price = item.get("price").and_then(Value::as_f64).unwrap_or(0.0);
                let qty = item.get("quantity").and_then(Value::as_f64).unwrap_or(1.0);
                let total = item
                    .get("totalPrice")
                    .and_then(Value::as_f64)
                    .unwrap_or(price * qty);
                text.push_str(&format!("• {desc}\n  {price:.2} x {qty} = {total:.2} EUR\n"));
            }
        }
    }

    let total = invoice.get("totalValue").and_then(Value::as_f64).unwrap_or(0.0);
    text.push_str(&format!("\n━━━━━━━━━━━━━━━━━━━━\n*Total: {total:.2} EUR*\n"));

    if let Some(taxes) = invoice.get("taxes").and_then(Value::as_array) {
        if !taxes.is_empty() {
            text.push_str("\nTaxes:\n");
            for tax in taxes {
                let label = tax.get("label").and_then(Value::as_str).unwrap_or("VAT");
                let rate = tax.get("rate").and_then(Value::as_f64).unwrap_or(0.0);
                let value = tax.get("value").and_then(Value::as_f64).unwrap_or(0.0);
                text.push_str(&format!("• {label} ({rate:.0}%): {value:.2} EUR\n"));
            }
        }
    }

    bot.edit_message_text(chat, message_id, text)
        .parse_mode(ParseMode::Markdown)
        .await?;
    Ok(())
}

/// Accommodation invoice for a just-completed check-in.
async fn draft_checkin_invoice(
    bot: &Bot,
    chat: ChatId,
    message_id: MessageId,
    deps: &ChannelDeps,
    reservation_id: &str,
) -> HandlerResult {
    let (reservation, guest) = {
        let sessions = deps.sessions.lock().await;
        let session = sessions.get(&chat.0);
        (
            session.and_then(|s| s.completed.clone()),
            session.and_then(|s| s.guests.first().map(|g| g.profile.clone())),
        )
    };

    let Some(res) = reservation else {
        bot.edit_message_text(chat, message_id, "⚠️ No completed check-in to invoice.").await?;
        deps.sessions.lock().await.remove(&chat.0);
        return Ok(());
    };

    bot.edit_message_text(chat, message_id, format!("⏳ Drafting invoice for #{reservation_id}..."))
        .await?;

    let nights = res.total_nights.max(1);
    let price_per_night = res
        .raw
        .get("pricePerNight")
        .and_then(Value::as_f64)
        .unwrap_or(res.total_price / nights as f64);

    let range = match (epoch_to_local_date(res.arrival), epoch_to_local_date(res.departure)) {
        (Some(a), Some(d)) => format!("{}. - {}.", format_short(a), format_short(d)),
        _ => String::new(),
    };
    let description = format!("Accommodation {} ({range})", res.unit_name);

    // OTA bookings are settled through the channel, direct ones in cash.
    let channel = res.channel.as_deref().unwrap_or("").to_lowercase();
    let payment = if channel.contains("booking") || channel.contains("airbnb") {
        "Bank transfer"
    } else {
        "Cash"
    };

    let item = InvoiceItemDraft::accommodation(description.clone(), price_per_night, nights);
    match deps.pms.add_invoice_item(reservation_id, &item).await {
        Ok(_) => {
            let guest_name = guest
                .and_then(|g| g.display_name())
                .unwrap_or_else(|| res.guest_name.clone());
            let total = price_per_night * nights as f64;
            bot.edit_message_text(
                chat,
                message_id,
                format!(
                    "✅ *Invoice drafted!*\n\n📋 Reservation: #{reservation_id}\n\
                     👤 Guest: *{guest_name}*\n🏠 {description}\n\
                     💰 {price_per_night:.2}€ x {nights} = *{total:.2}€*\n💳 Payment: {payment}\n\n\
                     ⚠️ _The invoice is a DRAFT._\n_Issue it manually in the PMS._"
                ),
            )
            .parse_mode(ParseMode::Markdown)
            .await?;
        }
        Err(e) => {
            error!(error = %e, "Invoice draft failed");
            bot.edit_message_text(chat, message_id, format!("❌ PMS error: {e}")).await?;
        }
    }

    deps.sessions.lock().await.remove(&chat.0);
    Ok(())
}

// ---------------------------------------------------------------------------
// Callback queries
// ---------------------------------------------------------------------------

pub async fn handle_callback(bot: Bot, q: CallbackQuery, deps: Arc<ChannelDeps>) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let user_id = q.from.id.0 as i64;
    if !deps.allowed_users.contains(&user_id) {
        info!(user_id, "Ignoring callback from unauthorized user");
        return Ok(());
    }

    let Some(data) = q.data.as_deref() else { return Ok(()) };
    let Some(message) = q.message.as_ref() else { return Ok(()) };
    let chat = message.chat().id;
    let message_id = message.id();

    match data {
        callback::CANCEL => {
            deps.sessions.lock().await.remove(&chat.0);
            bot.edit_message_text(chat, message_id, "❌ Check-in cancelled.").await?;
        }
        callback::CONTINUE => {
            show_reservation_selection(&bot, chat, message_id, &deps).await?;
        }
        callback::DONE => {
            deps.sessions.lock().await.remove(&chat.0);
            bot.edit_message_text(
                chat,
                message_id,
                "✅ *Check-in finished!*\n\nGuests are registered in the PMS — verify the details there.",
            )
            .parse_mode(ParseMode::Markdown)
            .await?;
        }
        callback::INVOICE_DONE => {
            deps.sessions.lock().await.remove(&chat.0);
            bot.edit_message_text(
                chat,
                message_id,
                "✅ *Invoice saved!*\n\nIt is in draft status — review and issue it in the PMS.",
            )
            .parse_mode(ParseMode::Markdown)
            .await?;
        }
        _ => {
            if let Some(reservation_id) = data.strip_prefix(callback::RESERVATION_PREFIX) {
                perform_checkin(&bot, chat, message_id, &deps, reservation_id).await?;
            } else if let Some(reservation_id) = data.strip_prefix(callback::CHECKIN_INVOICE_PREFIX)
            {
                draft_checkin_invoice(&bot, chat, message_id, &deps, reservation_id).await?;
            } else if let Some(reservation_id) = data.strip_prefix(callback::INVOICE_ADD_PREFIX) {
                let mut sessions = deps.sessions.lock().await;
                let session = sessions.entry(chat.0).or_default();
                session.state = SessionState::AwaitingInvoiceItem {
                    reservation_id: reservation_id.to_string(),
                };
                drop(sessions);
                bot.edit_message_text(
                    chat,
                    message_id,
                    format!(
                        "➕ *Add invoice item*\n\nReservation: #{reservation_id}\n\n\
                         Type the item as:\n`description, price, quantity`\n\n\
                         Examples:\n• `Tourist tax, 1.35, 4`\n• `Parking, 10, 3`\n\n\
                         Or /cancel to stop."
                    ),
                )
                .parse_mode(ParseMode::Markdown)
                .await?;
            } else if let Some(invoice_id) = data.strip_prefix(callback::INVOICE_DETAILS_PREFIX) {
                show_invoice_details(&bot, chat, message_id, &deps, invoice_id).await?;
            } else {
                warn!(data, "Unknown callback data");
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Free text: invoice items and menu buttons
// ---------------------------------------------------------------------------

pub async fn handle_text(bot: Bot, msg: Message, deps: Arc<ChannelDeps>) -> HandlerResult {
    if !authorized(&bot, &msg, &deps).await {
        return Ok(());
    }
    let chat = msg.chat.id;
    let Some(text) = msg.text() else { return Ok(()) };

    let awaiting = {
        let sessions = deps.sessions.lock().await;
        match sessions.get(&chat.0).map(|s| &s.state) {
            Some(SessionState::AwaitingInvoiceItem { reservation_id }) => {
                Some(reservation_id.clone())
            }
            _ => None,
        }
    };

    if let Some(reservation_id) = awaiting {
        return add_invoice_item_from_text(&bot, chat, &deps, &reservation_id, text).await;
    }

    // Pasted check-in URL: fill the online form with the scanned guest.
    if text.contains("book.rentl.io") {
        return fill_checkin_form(&bot, chat, &deps, text.trim()).await;
    }

    // Menu keyboard buttons.
    let today = Local::now().date_naive();
    if text.contains("Upcoming") {
        telegram::upcoming_command(&bot, chat, &deps, today).await?;
    } else if text.contains("Today") {
        telegram::arrivals_command(&bot, chat, &deps, today, "Arrivals today").await?;
    } else if text.contains("Tomorrow") {
        telegram::arrivals_command(
            &bot,
            chat,
            &deps,
            today + Duration::days(1),
            "Arrivals tomorrow",
        )
        .await?;
    } else if text.contains("Search") {
        reply_md(&bot, chat, "🔍 Use:\n/search <guest name>\n\nExample: /search Marko").await?;
    } else if text.contains("Help") {
        reply_md(&bot, chat, telegram::HELP).await?;
    }
    // Anything else is ignored to avoid chat noise.
    Ok(())
}

/// Drive the browser-based online check-in form for the first scanned
/// guest. Fallback for reservations the guest-registration API rejects.
async fn fill_checkin_form(
    bot: &Bot,
    chat: ChatId,
    deps: &ChannelDeps,
    url: &str,
) -> HandlerResult {
    let guest = {
        let sessions = deps.sessions.lock().await;
        sessions
            .get(&chat.0)
            .and_then(|s| s.guests.first())
            .map(|g| g.profile.clone())
    };
    let Some(guest) = guest else {
        reply_md(
            bot,
            chat,
            "⚠️ No scanned guest to fill the form with.\n\nUse /checkin and send an ID photo first.",
        )
        .await?;
        return Ok(());
    };

    bot.send_message(chat, "🌐 Filling the online check-in form...").await?;
    match deps.form_filler.fill(url, &guest).await {
        Ok(report) => {
            let status = if report.submitted {
                "✅ *Form submitted*"
            } else {
                "⚠️ *Form filled, but submission not confirmed*"
            };
            reply_md(bot, chat, &format!("{status}\n📝 {} fields filled", report.fields_filled))
                .await?;
            if let Some(screenshot) = report.screenshot {
                bot.send_photo(chat, InputFile::memory(screenshot)).await?;
            }
        }
        Err(e) => {
            error!(error = %e, "Form filling failed");
            reply_md(bot, chat, &format!("❌ Form filling failed: {e}")).await?;
        }
    }
    Ok(())
}

async fn add_invoice_item_from_text(
    bot: &Bot,
    chat: ChatId,
    deps: &ChannelDeps,
    reservation_id: &str,
    text: &str,
) -> HandlerResult {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() < 2 {
        reply_md(
            bot,
            chat,
            "⚠️ Format: `description, price, quantity`\n\nExample: `Parking, 10, 3`\n\nOr /cancel to stop.",
        )
        .await?;
        return Ok(());
    }

    let description = parts[0].to_string();
    let Ok(price) = parts[1].parse::<f64>() else {
        reply_md(bot, chat, "⚠️ The price must be a number.\n\nExample: `Parking, 10, 3`").await?;
        return Ok(());
    };
    let quantity = parts
        .get(2)
        .and_then(|q| q.parse::<f64>().ok())
        .unwrap_or(1.0);

    bot.send_message(chat, "⏳ Adding the item...").await?;

    let item = InvoiceItemDraft::extra(description.clone(), price, quantity);
    match deps.pms.add_invoice_item(reservation_id, &item).await {
        Ok(result) => {
            let total = result
                .get("totalPrice")
                .and_then(Value::as_f64)
                .unwrap_or(price * quantity);
            {
                let mut sessions = deps.sessions.lock().await;
                if let Some(session) = sessions.get_mut(&chat.0) {
                    session.state = SessionState::CollectingDocuments;
                }
            }
            bot.send_message(
                chat,
                format!(
                    "✅ *Item added!*\n\n📦 {description}\n💰 {price:.2} x {quantity} = {total:.2} EUR\n\nAdd more or finish:"
                ),
            )
            .parse_mode(ParseMode::Markdown)
            .reply_markup(InlineKeyboardMarkup::new(vec![
                vec![InlineKeyboardButton::callback(
                    "➕ Add another",
                    format!("{}{}", callback::INVOICE_ADD_PREFIX, reservation_id),
                )],
                vec![InlineKeyboardButton::callback("✅ Done", callback::INVOICE_DONE)],
            ]))
            .await?;
        }
        Err(e) => {
            reply_md(bot, chat, &format!("❌ PMS error: {e}")).await?;
            deps.sessions.lock().await.remove(&chat.0);
        }
    }
    Ok(())
}
