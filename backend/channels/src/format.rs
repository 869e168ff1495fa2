//! Message formatting for the operator channel.
//!
//! Pure functions from reservation data to Markdown strings; the Telegram
//! adapter only decides what to fetch and where to send it.

use chrono::NaiveDate;

use innkeep_core::time::{epoch_to_local_date, format_date, format_epoch_date, format_short};
use innkeep_core::Reservation;
use innkeep_docscan::{ExtractionMethod, ScanOutcome};
use innkeep_pms::schedule::{by_unit, UnitWeekStats};

/// Telegram caps messages at 4096 chars; stay under with margin.
pub const MAX_MESSAGE_LEN: usize = 4000;

fn night_word(nights: u32) -> &'static str {
    if nights == 1 { "night" } else { "nights" }
}

/// One reservation as a display block.
pub fn reservation_block(res: &Reservation, detailed: bool) -> String {
    let status = if res.checked_in { "✅" } else { "⏳" };
    let mut text = format!(
        "{status} *{}*\n🏠 {}\n📅 {} → {} ({} {})\n👥 {} adults{}\n💰 {:.0} {}\n📱 {}",
        res.guest_name,
        res.unit_name,
        format_epoch_date(res.arrival),
        format_epoch_date(res.departure),
        res.total_nights,
        night_word(res.total_nights),
        res.adults,
        if res.children > 0 {
            format!(" + {} kids", res.children)
        } else {
            String::new()
        },
        res.total_price,
        res.currency,
        res.channel.as_deref().unwrap_or("Direct"),
    );

    if detailed {
        text.push_str(&format!(
            "\n📞 {}\n✉️ {}\n🔑 ID: `{}`",
            res.guest_phone.as_deref().unwrap_or("N/A"),
            res.guest_email.as_deref().unwrap_or("N/A"),
            res.id,
        ));
        if let Some(note) = &res.note {
            let note = if note.len() > 200 { format!("{}...", &note[..200]) } else { note.clone() };
            text.push_str(&format!("\n📝 Note: _{note}_"));
        }
    }

    text
}

/// Arrivals list grouped by unit, with contact numbers.
pub fn arrival_list(title: &str, arrivals: &[&Reservation]) -> String {
    if arrivals.is_empty() {
        return format!("📭 {title}: nothing scheduled.");
    }

    let mut text = format!("📅 *{title}*\nTotal: {}\n\n", arrivals.len());
    for (unit, list) in by_unit(arrivals) {
        text.push_str(&format!("🏠 *{unit}*\n"));
        for res in list {
            text.push_str(&format!(
                "  • {}: {} ({} {}, {} pax, {:.0}€)\n",
                epoch_to_local_date(res.arrival).map(format_short).unwrap_or_default(),
                res.guest_name,
                res.total_nights,
                night_word(res.total_nights),
                res.adults,
                res.total_price,
            ));
            if let Some(phone) = &res.guest_phone {
                text.push_str(&format!("    📞 {phone}\n"));
            }
        }
        text.push('\n');
    }
    text.trim_end().to_string()
}

/// Departures for today and tomorrow.
pub fn checkout_list(
    today: NaiveDate,
    tomorrow: NaiveDate,
    today_departures: &[&Reservation],
    tomorrow_departures: &[&Reservation],
) -> String {
    if today_departures.is_empty() && tomorrow_departures.is_empty() {
        return "📭 No departures today or tomorrow.".to_string();
    }

    let mut text = String::from("🔴 *Departures*\n\n");
    for (label, date, list) in [
        ("Today", today, today_departures),
        ("Tomorrow", tomorrow, tomorrow_departures),
    ] {
        if list.is_empty() {
            continue;
        }
        text.push_str(&format!("*{label} — {}*\n", format_date(date)));
        for res in list {
            text.push_str(&format!("  • {} ← {}\n", res.guest_name, res.unit_name));
        }
        text.push('\n');
    }
    text.trim_end().to_string()
}

/// Seven-day departure schedule grouped by date then unit, for cleaning.
pub fn cleaning_schedule(departures: &[&Reservation]) -> String {
    if departures.is_empty() {
        return "📭 No departures in the next 7 days.".to_string();
    }

    let mut by_date: Vec<(NaiveDate, Vec<&Reservation>)> = Vec::new();
    let mut sorted: Vec<&Reservation> = departures.to_vec();
    sorted.sort_by_key(|r| r.departure);
    for res in sorted {
        let Some(date) = epoch_to_local_date(res.departure) else { continue };
        match by_date.last_mut() {
            Some((last, list)) if *last == date => list.push(res),
            _ => by_date.push((date, vec![res])),
        }
    }

    let mut text = String::from("🧹 *Cleaning schedule — next 7 days*\n\n");
    let mut total = 0;
    for (date, list) in &by_date {
        text.push_str(&format!("📅 *{} ({})*\n", format_short(*date), date.format("%a")));
        for (unit, unit_list) in by_unit(list) {
            text.push_str(&format!("  🏠 {unit}\n"));
            for res in unit_list {
                text.push_str(&format!("    • {}\n", res.guest_name));
                total += 1;
            }
        }
        text.push('\n');
    }
    text.push_str(&format!("📊 Total: {total} departures"));
    text
}

/// Guests currently in house, with how long they are staying.
pub fn current_guests(today: NaiveDate, staying: &[&Reservation]) -> String {
    if staying.is_empty() {
        return "📭 No guests in house right now.".to_string();
    }

    let mut text = format!("🏠 *Guests in house* ({})\n\n", format_date(today));
    for (unit, list) in by_unit(staying) {
        text.push_str(&format!("🏠 *{unit}*\n"));
        for res in list {
            let leaving = epoch_to_local_date(res.departure);
            let marker = match leaving.map(|d| (d - today).num_days()) {
                Some(0) => "🔴 leaves today".to_string(),
                Some(1) => "🟡 leaves tomorrow".to_string(),
                Some(_) => format!(
                    "leaves {}",
                    leaving.map(format_short).unwrap_or_default()
                ),
                None => String::new(),
            };
            text.push_str(&format!("  • {} ({marker})\n", res.guest_name));
            if let Some(phone) = &res.guest_phone {
                text.push_str(&format!("    📞 {phone}\n"));
            }
        }
        text.push('\n');
    }
    text.trim_end().to_string()
}

/// Ten-segment occupancy bar for a 0–100 percentage.
pub fn occupancy_bar(percent: f64) -> String {
    let filled = ((percent / 10.0) as usize).min(10);
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Weekly per-unit statistics with an overall summary.
pub fn week_overview(week_start: NaiveDate, stats: &[UnitWeekStats]) -> String {
    let week_end = week_start + chrono::Duration::days(6);
    let mut text = format!(
        "📊 *Week overview*\n📅 {} - {}\n\n",
        format_short(week_start),
        format_short(week_end)
    );

    let mut total_revenue = 0.0;
    let mut total_nights = 0u32;
    for unit in stats {
        let occupancy = unit.nights as f64 / 7.0 * 100.0;
        total_revenue += unit.revenue;
        total_nights += unit.nights;

        text.push_str(&format!("🏠 *{}*\n", unit.unit));
        text.push_str(&format!("  {} {:.0}%\n", occupancy_bar(occupancy), occupancy));
        text.push_str(&format!("  📅 {}/7 {}\n", unit.nights, night_word(unit.nights)));
        text.push_str(&format!("  💰 {:.0}€\n", unit.revenue));
        if !unit.guests.is_empty() {
            let names: Vec<&str> = unit.guests.iter().take(3).map(String::as_str).collect();
            text.push_str(&format!("  👥 {}\n", names.join(", ")));
        }
        text.push('\n');
    }

    let possible = (stats.len() * 7) as f64;
    let total_occupancy = if possible > 0.0 {
        total_nights as f64 / possible * 100.0
    } else {
        0.0
    };
    text.push_str(&format!(
        "────────────────────\n*TOTAL* ({} units)\n💰 Revenue: *{total_revenue:.0}€*\n📈 Occupancy: *{total_occupancy:.0}%*\n🛏️ {total_nights} {}",
        stats.len(),
        night_word(total_nights),
    ));
    text
}

/// Morning digest: departures first (they free up units), then today's and
/// tomorrow's arrivals with contact details for sending instructions.
pub fn daily_digest(
    today: NaiveDate,
    tomorrow: NaiveDate,
    arrivals: &[&Reservation],
    departures: &[&Reservation],
    tomorrow_arrivals: &[&Reservation],
) -> String {
    let mut text = format!("🌅 *Daily overview — {}*\n\n", format_date(today));

    if !departures.is_empty() {
        text.push_str(&format!("🔴 *DEPARTURES TODAY ({})*\n", departures.len()));
        for (unit, list) in by_unit(departures) {
            for res in list {
                text.push_str(&format!("• {} ← {unit}\n", res.guest_name));
            }
        }
        text.push('\n');
    }

    if !arrivals.is_empty() {
        text.push_str(&format!("🟢 *ARRIVALS TODAY ({})*\n", arrivals.len()));
        for (unit, list) in by_unit(arrivals) {
            text.push_str(&format!("  🏠 _{unit}_\n"));
            for res in list {
                text.push_str(&format!(
                    "  • {} ({} {})\n",
                    res.guest_name,
                    res.total_nights,
                    night_word(res.total_nights)
                ));
                if let Some(phone) = &res.guest_phone {
                    text.push_str(&format!("    📞 {phone}\n"));
                }
            }
        }
        text.push('\n');
    }

    if !tomorrow_arrivals.is_empty() {
        text.push_str(&format!(
            "📅 *ARRIVING TOMORROW ({}) — {}*\n⚠️ _Send arrival instructions!_\n\n",
            tomorrow_arrivals.len(),
            format_date(tomorrow)
        ));
        for (unit, list) in by_unit(tomorrow_arrivals) {
            text.push_str(&format!("  🏠 _{unit}_\n"));
            for res in list {
                text.push_str(&format!(
                    "  • *{}* ({} {})\n",
                    res.guest_name,
                    res.total_nights,
                    night_word(res.total_nights)
                ));
                if let Some(phone) = &res.guest_phone {
                    text.push_str(&format!("    📞 {phone}\n"));
                }
                if let Some(email) = &res.guest_email {
                    text.push_str(&format!("    ✉️ {email}\n"));
                }
            }
        }
    }

    text.trim_end().to_string()
}

/// Summary of one scanned document, shown back to the operator.
pub fn scan_summary(outcome: &ScanOutcome) -> String {
    let profile = &outcome.profile;
    let mut lines = vec!["📋 *Extracted data:*".to_string()];

    if let Some(name) = profile.display_name() {
        lines.push(format!("👤 Name: *{name}*"));
    }
    if let Some(birth) = profile.birth_date {
        lines.push(format!("🎂 Date of birth: {}", format_date(birth)));
    }
    if let Some(number) = &profile.document_number {
        let kind = profile
            .document_kind
            .map(|k| format!(" ({})", k.label()))
            .unwrap_or_default();
        lines.push(format!("🪪 Document number: {number}{kind}"));
    }
    if let Some(gender) = profile.gender {
        lines.push(format!("⚧ Gender: {}", match gender {
            innkeep_core::Gender::Male => "Male",
            innkeep_core::Gender::Female => "Female",
        }));
    }
    if let Some(nationality) = &profile.nationality {
        lines.push(format!("🌍 Nationality: {nationality}"));
    }
    if let Some(city) = &profile.city_of_residence {
        lines.push(format!("🏠 Residence: {city}"));
    }
    let method = match outcome.method {
        ExtractionMethod::Mrz => "MRZ",
        ExtractionMethod::LabeledFields => "card labels",
        ExtractionMethod::Generic => "best effort",
    };
    lines.push(format!("_read via {method}_"));

    lines.join("\n")
}

/// Split a long message into sendable chunks on line boundaries.
pub fn chunk_message(text: &str) -> Vec<String> {
    if text.len() <= MAX_MESSAGE_LEN {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if current.len() + line.len() + 1 > MAX_MESSAGE_LEN && !current.is_empty() {
            chunks.push(current.trim_end().to_string());
            current = String::new();
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        chunks.push(current.trim_end().to_string());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use innkeep_core::time::day_bounds;
    use innkeep_core::ReservationStatus;

    fn res(id: &str, name: &str, unit: &str, arrival: NaiveDate, nights: i64) -> Reservation {
        Reservation {
            id: id.into(),
            guest_name: name.into(),
            guest_email: Some("guest@example.com".into()),
            guest_phone: Some("+385 91 123 456".into()),
            unit_id: None,
            unit_name: unit.into(),
            arrival: day_bounds(arrival).0,
            departure: day_bounds(arrival + Duration::days(nights)).0,
            adults: 2,
            children: 1,
            total_nights: nights as u32,
            total_price: 240.0,
            currency: "EUR".into(),
            channel: Some("Booking.com".into()),
            note: Some("late arrival".into()),
            status: ReservationStatus::Confirmed,
            checked_in: false,
            checkin_url: None,
            checkin_token: None,
            raw: serde_json::Value::Null,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn block_contains_core_fields() {
        let r = res("R-1", "Ana Horvat", "Sunset", day(2024, 6, 1), 3);
        let text = reservation_block(&r, false);
        assert!(text.contains("Ana Horvat"));
        assert!(text.contains("Sunset"));
        assert!(text.contains("3 nights"));
        assert!(text.contains("+ 1 kids"));
        assert!(!text.contains("R-1"));

        let detailed = reservation_block(&r, true);
        assert!(detailed.contains("R-1"));
        assert!(detailed.contains("late arrival"));
    }

    #[test]
    fn arrival_list_groups_by_unit() {
        let a = res("1", "Ana", "B-unit", day(2024, 6, 1), 2);
        let b = res("2", "Ivan", "A-unit", day(2024, 6, 1), 1);
        let text = arrival_list("Arrivals today", &[&a, &b]);
        let a_pos = text.find("A-unit").unwrap();
        let b_pos = text.find("B-unit").unwrap();
        assert!(a_pos < b_pos);
        assert!(text.contains("1 night,"));
        assert!(text.contains("Total: 2"));
    }

    #[test]
    fn empty_lists_render_placeholders() {
        assert!(arrival_list("Arrivals today", &[]).contains("nothing scheduled"));
        assert!(cleaning_schedule(&[]).contains("No departures"));
        assert!(current_guests(day(2024, 6, 1), &[]).contains("No guests"));
    }

    #[test]
    fn occupancy_bar_bounds() {
        assert_eq!(occupancy_bar(0.0), "░░░░░░░░░░");
        assert_eq!(occupancy_bar(100.0), "██████████");
        assert_eq!(occupancy_bar(50.0), "█████░░░░░");
    }

    #[test]
    fn digest_orders_departures_first() {
        let today = day(2024, 6, 2);
        let arr = res("1", "Ana", "U1", today, 2);
        let dep = res("2", "Ivan", "U2", today - Duration::days(2), 2);
        let tom = res("3", "Maria", "U3", today + Duration::days(1), 2);
        let text = daily_digest(today, today + Duration::days(1), &[&arr], &[&dep], &[&tom]);
        let dep_pos = text.find("DEPARTURES").unwrap();
        let arr_pos = text.find("ARRIVALS TODAY").unwrap();
        let tom_pos = text.find("ARRIVING TOMORROW").unwrap();
        assert!(dep_pos < arr_pos && arr_pos < tom_pos);
        assert!(text.contains("✉️ guest@example.com"));
    }

    #[test]
    fn current_guests_marks_departure_day() {
        let today = day(2024, 6, 3);
        let leaving = res("1", "Ana", "U1", today - Duration::days(2), 2);
        let staying = res("2", "Ivan", "U2", today - Duration::days(1), 3);
        let text = current_guests(today, &[&leaving, &staying]);
        assert!(text.contains("leaves today"));
        assert!(text.contains("leaves 05.06"));
    }

    #[test]
    fn chunking_respects_line_boundaries() {
        let line = "x".repeat(100);
        let long: String = (0..60).map(|_| line.clone() + "\n").collect();
        let chunks = chunk_message(&long);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= MAX_MESSAGE_LEN));
        let total: usize = chunks.iter().map(|c| c.lines().count()).sum();
        assert_eq!(total, 60);
    }

    #[test]
    fn week_overview_totals() {
        let stats = vec![
            UnitWeekStats { unit: "U1".into(), nights: 7, revenue: 700.0, guests: vec!["Ana".into()] },
            UnitWeekStats { unit: "U2".into(), nights: 3, revenue: 240.0, guests: vec![] },
        ];
        let text = week_overview(day(2024, 6, 3), &stats);
        assert!(text.contains("Revenue: *940€*"));
        assert!(text.contains("Occupancy: *71%*"));
        assert!(text.contains("██████████ 100%"));
    }
}
