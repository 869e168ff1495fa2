//! Telegram operator channel.
//!
//! One dispatcher serves commands, document photos, inline-button callbacks,
//! and free-text input. Only configured operator accounts are served; every
//! other update is logged and dropped.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDate};
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, ParseMode};
use teloxide::utils::command::BotCommands;
use tokio::sync::{mpsc, Mutex, OnceCell};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use innkeep_browser::FormFiller;
use innkeep_core::time::format_date;
use innkeep_docscan::VisionOcr;
use innkeep_pms::schedule::{arrivals_on, confirmed, departures_on, staying_on, week_stats};
use innkeep_pms::{CountryMapper, DocumentTypeCatalog, PmsClient, ReservationQuery};
use innkeep_scheduler::DigestRequest;
use innkeep_store::CacheStore;

use crate::checkin::CheckinSession;
use crate::commands::Command;
use crate::flows;
use crate::format;
use crate::rate_limiter::{MessageThrottle, ThrottlePolicy};

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Everything the handlers need, shared behind an Arc.
pub struct ChannelDeps {
    pub pms: PmsClient,
    pub store: Arc<CacheStore>,
    pub ocr: Option<VisionOcr>,
    pub form_filler: FormFiller,
    pub allowed_users: Vec<i64>,
    pub throttle: MessageThrottle,
    pub sessions: Mutex<HashMap<i64, CheckinSession>>,
    pub countries: OnceCell<CountryMapper>,
    pub documents: OnceCell<DocumentTypeCatalog>,
}

impl ChannelDeps {
    pub fn new(
        pms: PmsClient,
        store: Arc<CacheStore>,
        ocr: Option<VisionOcr>,
        allowed_users: Vec<i64>,
        property_slug: &str,
    ) -> Self {
        Self {
            pms,
            store,
            ocr,
            form_filler: FormFiller::new(property_slug),
            allowed_users,
            throttle: MessageThrottle::new(ThrottlePolicy::default()),
            sessions: Mutex::new(HashMap::new()),
            countries: OnceCell::new(),
            documents: OnceCell::new(),
        }
    }
}

pub struct TelegramChannel {
    bot: Bot,
    deps: Arc<ChannelDeps>,
}

impl TelegramChannel {
    pub fn new(token: &str, deps: Arc<ChannelDeps>) -> Self {
        Self { bot: Bot::new(token), deps }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    /// Register the command menu and run the dispatcher until shutdown.
    pub async fn run(self) -> anyhow::Result<()> {
        info!("Starting Telegram channel");
        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!(error = %e, "Could not register command menu");
        }

        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(handle_command),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| msg.photo().is_some())
                    .endpoint(flows::handle_photo),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| msg.text().is_some())
                    .endpoint(flows::handle_text),
            )
            .branch(Update::filter_callback_query().endpoint(flows::handle_callback));

        Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.deps])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }

    /// Deliver gateway notices (new reservations) to all operators.
    pub fn spawn_notice_loop(
        bot: Bot,
        allowed_users: Vec<i64>,
        mut rx: mpsc::Receiver<String>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                for user_id in &allowed_users {
                    if let Err(e) = reply_md(&bot, ChatId(*user_id), &text).await {
                        error!(user_id, error = %e, "Could not deliver notice");
                    }
                }
            }
        })
    }

    /// Consume digest triggers and fan the summary out to all operators.
    pub fn spawn_digest_loop(
        bot: Bot,
        deps: Arc<ChannelDeps>,
        mut rx: mpsc::Receiver<DigestRequest>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                info!(fired_at = %request.fired_at, "Building daily digest");
                if let Err(e) = send_daily_digest(&bot, &deps).await {
                    error!(error = %e, "Daily digest failed");
                }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Shared handler helpers
// ---------------------------------------------------------------------------

/// Allow-list plus throttle gate. Unauthorized chatter is dropped silently;
/// throttled operators get a short notice.
pub async fn authorized(bot: &Bot, msg: &Message, deps: &ChannelDeps) -> bool {
    let Some(user) = &msg.from else {
        return false;
    };
    let user_id = user.id.0 as i64;
    if !deps.allowed_users.contains(&user_id) {
        info!(user_id, "Ignoring message from unauthorized user");
        return false;
    }
    if !deps.throttle.allow(user_id).await {
        let _ = bot
            .send_message(msg.chat.id, "⏳ Too many requests, give it a minute.")
            .await;
        return false;
    }
    true
}

/// Send Markdown text, chunked under the Telegram message size cap.
pub async fn reply_md(bot: &Bot, chat: ChatId, text: &str) -> HandlerResult {
    for chunk in format::chunk_message(text) {
        bot.send_message(chat, chunk)
            .parse_mode(ParseMode::Markdown)
            .await?;
    }
    Ok(())
}

fn menu_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new("📅 Upcoming"), KeyboardButton::new("🌅 Today")],
        vec![KeyboardButton::new("🌄 Tomorrow"), KeyboardButton::new("🔍 Search")],
        vec![KeyboardButton::new("❓ Help")],
    ])
}

const WELCOME: &str = "🏠 *Property assistant*\n\n\
    Pick an option from the menu below 👇\n\n\
    *📷 Check-in:*\n\
    Just send photos of guest ID documents — the bot reads them and offers\n\
    check-in against an upcoming reservation.\n\n\
    *Commands:*\n\
    /upcoming — arrivals in the next 7 days\n\
    /today — today's arrivals\n\
    /tomorrow — tomorrow's arrivals\n\
    /search <name> — find a guest";

pub(crate) const HELP: &str = "📖 *Help*\n\n\
    *📷 Check-in:*\n\
    1️⃣ Send photos of guest IDs\n\
    2️⃣ Pick the reservation\n\
    3️⃣ Guests are registered in the PMS\n\n\
    *Reservations:*\n\
    📅 Upcoming — next 7 days\n\
    🌅 Today — today's arrivals\n\
    🌄 Tomorrow — tomorrow's arrivals\n\
    🔍 Search — find a guest\n\n\
    *Invoices:*\n\
    /invoice <id> — manage a reservation's invoices";

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    deps: Arc<ChannelDeps>,
) -> HandlerResult {
    if !authorized(&bot, &msg, &deps).await {
        return Ok(());
    }
    let chat = msg.chat.id;
    let today = Local::now().date_naive();

    match cmd {
        Command::Start => {
            bot.send_message(chat, WELCOME)
                .parse_mode(ParseMode::Markdown)
                .reply_markup(menu_keyboard())
                .await?;
        }
        Command::Help => reply_md(&bot, chat, HELP).await?,
        Command::Today => arrivals_command(&bot, chat, &deps, today, "Arrivals today").await?,
        Command::Tomorrow => {
            arrivals_command(&bot, chat, &deps, today + Duration::days(1), "Arrivals tomorrow")
                .await?
        }
        Command::Upcoming => upcoming_command(&bot, chat, &deps, today).await?,
        Command::Checkouts => checkouts_command(&bot, chat, &deps, today).await?,
        Command::Cleaning => cleaning_command(&bot, chat, &deps, today).await?,
        Command::Current => current_command(&bot, chat, &deps, today).await?,
        Command::Week => week_command(&bot, chat, &deps, today).await?,
        Command::Search(query) => search_command(&bot, chat, &deps, today, &query).await?,
        Command::Invoice(arg) => flows::invoice_command(&bot, chat, &deps, &arg).await?,
        Command::Checkin => flows::start_checkin(&bot, chat, &deps).await?,
        Command::Notifications => notifications_command(&bot, &msg, &deps).await?,
        Command::Cancel => {
            deps.sessions.lock().await.remove(&chat.0);
            bot.send_message(chat, "❌ Cancelled.").await?;
        }
    }
    Ok(())
}

pub(crate) async fn arrivals_command(
    bot: &Bot,
    chat: ChatId,
    deps: &ChannelDeps,
    day: NaiveDate,
    title: &str,
) -> HandlerResult {
    bot.send_message(chat, "🔍 Fetching arrivals...").await?;
    match deps.pms.reservations(&ReservationQuery::window(day, day, 50)).await {
        Ok(all) => {
            let confirmed = confirmed(&all);
            let arrivals = arrivals_on(&confirmed, day);
            let title = format!("{title} — {}", format_date(day));
            reply_md(bot, chat, &format::arrival_list(&title, &arrivals)).await?;
        }
        Err(e) => reply_md(bot, chat, &format!("❌ PMS error: {e}")).await?,
    }
    Ok(())
}

pub(crate) async fn upcoming_command(
    bot: &Bot,
    chat: ChatId,
    deps: &ChannelDeps,
    today: NaiveDate,
) -> HandlerResult {
    bot.send_message(chat, "🔍 Fetching arrivals for the next 7 days...")
        .await?;
    let week_later = today + Duration::days(7);
    match deps
        .pms
        .reservations(&ReservationQuery::window(today, week_later, 50))
        .await
    {
        Ok(all) => {
            let confirmed = confirmed(&all);
            let arrivals: Vec<_> = confirmed
                .iter()
                .filter(|r| {
                    innkeep_core::time::epoch_to_local_date(r.arrival)
                        .map(|d| today <= d && d <= week_later)
                        .unwrap_or(false)
                })
                .copied()
                .collect();
            reply_md(bot, chat, &format::arrival_list("Arrivals — next 7 days", &arrivals))
                .await?;
        }
        Err(e) => reply_md(bot, chat, &format!("❌ PMS error: {e}")).await?,
    }
    Ok(())
}

async fn checkouts_command(
    bot: &Bot,
    chat: ChatId,
    deps: &ChannelDeps,
    today: NaiveDate,
) -> HandlerResult {
    bot.send_message(chat, "🔍 Fetching departures...").await?;
    let tomorrow = today + Duration::days(1);
    match deps
        .pms
        .reservations(&ReservationQuery::window(today, tomorrow, 50))
        .await
    {
        Ok(all) => {
            let confirmed = confirmed(&all);
            let text = format::checkout_list(
                today,
                tomorrow,
                &departures_on(&confirmed, today),
                &departures_on(&confirmed, tomorrow),
            );
            reply_md(bot, chat, &text).await?;
        }
        Err(e) => reply_md(bot, chat, &format!("❌ PMS error: {e}")).await?,
    }
    Ok(())
}

async fn cleaning_command(
    bot: &Bot,
    chat: ChatId,
    deps: &ChannelDeps,
    today: NaiveDate,
) -> HandlerResult {
    bot.send_message(chat, "🧹 Building the cleaning schedule...").await?;
    let week_later = today + Duration::days(7);
    match deps
        .pms
        .reservations(&ReservationQuery::window(today, week_later, 100))
        .await
    {
        Ok(all) => {
            let confirmed = confirmed(&all);
            let departures: Vec<_> = confirmed
                .iter()
                .filter(|r| {
                    innkeep_core::time::epoch_to_local_date(r.departure)
                        .map(|d| today <= d && d <= week_later)
                        .unwrap_or(false)
                })
                .copied()
                .collect();
            reply_md(bot, chat, &format::cleaning_schedule(&departures)).await?;
        }
        Err(e) => reply_md(bot, chat, &format!("❌ PMS error: {e}")).await?,
    }
    Ok(())
}

async fn current_command(
    bot: &Bot,
    chat: ChatId,
    deps: &ChannelDeps,
    today: NaiveDate,
) -> HandlerResult {
    bot.send_message(chat, "🔍 Fetching guests in house...").await?;
    // Window wide enough to catch long stays overlapping today.
    match deps
        .pms
        .reservations(&ReservationQuery::window(
            today - Duration::days(7),
            today + Duration::days(7),
            50,
        ))
        .await
    {
        Ok(all) => {
            let confirmed = confirmed(&all);
            let staying = staying_on(&confirmed, today);
            reply_md(bot, chat, &format::current_guests(today, &staying)).await?;
        }
        Err(e) => reply_md(bot, chat, &format!("❌ PMS error: {e}")).await?,
    }
    Ok(())
}

async fn week_command(
    bot: &Bot,
    chat: ChatId,
    deps: &ChannelDeps,
    today: NaiveDate,
) -> HandlerResult {
    bot.send_message(chat, "📊 Crunching the week...").await?;
    let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    let week_end = week_start + Duration::days(6);
    match deps
        .pms
        .reservations(&ReservationQuery::window(week_start, week_end, 100))
        .await
    {
        Ok(all) => {
            let confirmed = confirmed(&all);
            let stats = week_stats(&confirmed, week_start);
            reply_md(bot, chat, &format::week_overview(week_start, &stats)).await?;
        }
        Err(e) => reply_md(bot, chat, &format!("❌ PMS error: {e}")).await?,
    }
    Ok(())
}

async fn search_command(
    bot: &Bot,
    chat: ChatId,
    deps: &ChannelDeps,
    today: NaiveDate,
    query: &str,
) -> HandlerResult {
    let query = query.trim();
    if query.is_empty() {
        reply_md(bot, chat, "❓ Usage: /search <guest name>").await?;
        return Ok(());
    }
    bot.send_message(chat, format!("🔍 Searching for '{query}'..."))
        .await?;

    match deps
        .pms
        .reservations(&ReservationQuery::window(today, today + Duration::days(30), 100))
        .await
    {
        Ok(all) => {
            let needle = query.to_lowercase();
            let matches: Vec<_> = confirmed(&all)
                .into_iter()
                .filter(|r| r.guest_name.to_lowercase().contains(&needle))
                .collect();
            if matches.is_empty() {
                reply_md(bot, chat, &format!("📭 No results for '{query}'")).await?;
            } else {
                let mut text = format!("🔍 *Results for '{query}'*\nFound: {}\n", matches.len());
                for res in matches {
                    text.push_str("\n");
                    text.push_str(&format::reservation_block(res, true));
                    text.push('\n');
                }
                reply_md(bot, chat, &text).await?;
            }
        }
        Err(e) => reply_md(bot, chat, &format!("❌ PMS error: {e}")).await?,
    }
    Ok(())
}

async fn notifications_command(bot: &Bot, msg: &Message, deps: &ChannelDeps) -> HandlerResult {
    let Some(user) = &msg.from else { return Ok(()) };
    let user_id = user.id.0 as i64;
    let enabled = deps.allowed_users.contains(&user_id);

    let mut text = format!("🔔 *Daily digest*\n\nYour user id: `{user_id}`\n\n");
    if enabled {
        text.push_str("✅ Digest is ON for this account.\n_To turn it off, remove your id from TELEGRAM_ALLOWED_USERS._");
    } else {
        text.push_str("❌ Digest is OFF for this account.\n_Add your id to TELEGRAM_ALLOWED_USERS to enable it._");
    }
    reply_md(bot, msg.chat.id, &text).await
}

// ---------------------------------------------------------------------------
// Daily digest
// ---------------------------------------------------------------------------

async fn send_daily_digest(bot: &Bot, deps: &ChannelDeps) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let tomorrow = today + Duration::days(1);

    let all = deps
        .pms
        .reservations(&ReservationQuery::window(today, tomorrow, 100))
        .await?;
    let confirmed = confirmed(&all);
    let arrivals = arrivals_on(&confirmed, today);
    let departures = departures_on(&confirmed, today);
    let tomorrow_arrivals = arrivals_on(&confirmed, tomorrow);

    if arrivals.is_empty() && departures.is_empty() && tomorrow_arrivals.is_empty() {
        info!("Nothing happening today or tomorrow, skipping digest");
        return Ok(());
    }

    let text =
        format::daily_digest(today, tomorrow, &arrivals, &departures, &tomorrow_arrivals);
    for user_id in &deps.allowed_users {
        match reply_md(bot, ChatId(*user_id), &text).await {
            Ok(()) => info!(user_id, "Daily digest sent"),
            Err(e) => error!(user_id, error = %e, "Could not deliver digest"),
        }
    }
    Ok(())
}
