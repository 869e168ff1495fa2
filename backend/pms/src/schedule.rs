//! Day-bucketing over reservation lists.
//!
//! The list API returns every reservation overlapping a query window, so
//! arrival/departure/in-house views are cut client-side. All comparisons are
//! date-granular: the PMS pins both stamps to midnight, which makes
//! timestamp comparison break on the boundary days themselves.

use std::collections::{BTreeMap, HashSet};

use chrono::{Duration, NaiveDate};

use innkeep_core::time::epoch_to_local_date;
use innkeep_core::{Reservation, ReservationStatus};

/// Confirmed reservations only, deduplicated by id (overlapping window
/// queries can return the same reservation twice).
pub fn confirmed(reservations: &[Reservation]) -> Vec<&Reservation> {
    let mut seen = HashSet::new();
    reservations
        .iter()
        .filter(|r| r.status == ReservationStatus::Confirmed)
        .filter(|r| seen.insert(r.id.clone()))
        .collect()
}

pub fn arrivals_on<'a>(reservations: &[&'a Reservation], day: NaiveDate) -> Vec<&'a Reservation> {
    reservations
        .iter()
        .filter(|r| epoch_to_local_date(r.arrival) == Some(day))
        .copied()
        .collect()
}

pub fn departures_on<'a>(reservations: &[&'a Reservation], day: NaiveDate) -> Vec<&'a Reservation> {
    reservations
        .iter()
        .filter(|r| epoch_to_local_date(r.departure) == Some(day))
        .copied()
        .collect()
}

/// Guests in house on `day`: arrived on or before it, departing on or after
/// it. The departure day itself still counts as in house.
pub fn staying_on<'a>(reservations: &[&'a Reservation], day: NaiveDate) -> Vec<&'a Reservation> {
    reservations
        .iter()
        .filter(|r| {
            match (epoch_to_local_date(r.arrival), epoch_to_local_date(r.departure)) {
                (Some(arrival), Some(departure)) => arrival <= day && day <= departure,
                _ => false,
            }
        })
        .copied()
        .collect()
}

/// Group reservations by unit name, alphabetically.
pub fn by_unit<'a>(reservations: &[&'a Reservation]) -> BTreeMap<String, Vec<&'a Reservation>> {
    let mut grouped: BTreeMap<String, Vec<&Reservation>> = BTreeMap::new();
    for res in reservations {
        let unit = if res.unit_name.is_empty() {
            "Unknown".to_string()
        } else {
            res.unit_name.clone()
        };
        grouped.entry(unit).or_default().push(res);
    }
    for list in grouped.values_mut() {
        list.sort_by_key(|r| r.arrival);
    }
    grouped
}

/// Occupancy and revenue for one unit within a single week.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitWeekStats {
    pub unit: String,
    pub nights: u32,
    pub revenue: f64,
    pub guests: Vec<String>,
}

/// Per-unit week statistics for the week starting at `week_start`
/// (Monday). Stays straddling the week boundary count only their in-week
/// nights, with revenue pro-rated per night.
pub fn week_stats(reservations: &[&Reservation], week_start: NaiveDate) -> Vec<UnitWeekStats> {
    let week_end = week_start + Duration::days(7);
    let mut per_unit: BTreeMap<String, UnitWeekStats> = BTreeMap::new();

    for res in reservations {
        let (Some(arrival), Some(departure)) =
            (epoch_to_local_date(res.arrival), epoch_to_local_date(res.departure))
        else {
            continue;
        };

        let start = arrival.max(week_start);
        let end = departure.min(week_end);
        let nights_in_week = (end - start).num_days();
        if nights_in_week <= 0 {
            continue;
        }
        let nights_in_week = nights_in_week as u32;

        let revenue = if res.total_nights > 0 {
            res.total_price / res.total_nights as f64 * nights_in_week as f64
        } else {
            res.total_price
        };

        let unit = if res.unit_name.is_empty() {
            "Unknown".to_string()
        } else {
            res.unit_name.clone()
        };
        let entry = per_unit.entry(unit.clone()).or_insert_with(|| UnitWeekStats {
            unit,
            nights: 0,
            revenue: 0.0,
            guests: Vec::new(),
        });
        entry.nights += nights_in_week;
        entry.revenue += revenue;
        entry.guests.push(res.guest_name.clone());
    }

    per_unit.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use innkeep_core::time::day_bounds;

    fn res(id: &str, unit: &str, arrival: NaiveDate, nights: i64, price: f64) -> Reservation {
        Reservation {
            id: id.to_string(),
            guest_name: format!("Guest {id}"),
            guest_email: None,
            guest_phone: None,
            unit_id: None,
            unit_name: unit.to_string(),
            arrival: day_bounds(arrival).0,
            departure: day_bounds(arrival + Duration::days(nights)).0,
            adults: 2,
            children: 0,
            total_nights: nights as u32,
            total_price: price,
            currency: "EUR".to_string(),
            channel: None,
            note: None,
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
    fn confirmed_filters_and_dedups() {
        let mut cancelled = res("a", "U1", day(2024, 6, 1), 2, 100.0);
        cancelled.status = ReservationStatus::Cancelled;
        let kept = res("b", "U1", day(2024, 6, 1), 2, 100.0);
        let dup = kept.clone();
        let all = vec![cancelled, kept, dup];
        let confirmed = confirmed(&all);
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, "b");
    }

    #[test]
    fn buckets_by_day() {
        let a = res("a", "U1", day(2024, 6, 1), 3, 300.0);
        let b = res("b", "U2", day(2024, 6, 2), 1, 80.0);
        let all = vec![a, b];
        let refs = confirmed(&all);

        assert_eq!(arrivals_on(&refs, day(2024, 6, 1)).len(), 1);
        assert_eq!(arrivals_on(&refs, day(2024, 6, 2)).len(), 1);
        // a departs June 4, b departs June 3.
        assert_eq!(departures_on(&refs, day(2024, 6, 4))[0].id, "a");
        assert_eq!(departures_on(&refs, day(2024, 6, 3))[0].id, "b");
    }

    #[test]
    fn staying_includes_departure_day() {
        let a = res("a", "U1", day(2024, 6, 1), 3, 300.0);
        let all = vec![a];
        let refs = confirmed(&all);
        assert_eq!(staying_on(&refs, day(2024, 6, 1)).len(), 1);
        assert_eq!(staying_on(&refs, day(2024, 6, 4)).len(), 1); // departure day
        assert!(staying_on(&refs, day(2024, 6, 5)).is_empty());
    }

    #[test]
    fn week_stats_pro_rates_straddling_stays() {
        // Monday 2024-06-03; stay Saturday 2024-06-01 → 2024-06-05 (4 nights,
        // 2 of them in the target week), 400 total → 100/night.
        let a = res("a", "U1", day(2024, 6, 1), 4, 400.0);
        let all = vec![a];
        let refs = confirmed(&all);
        let stats = week_stats(&refs, day(2024, 6, 3));
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].nights, 2);
        assert!((stats[0].revenue - 200.0).abs() < 1e-9);
    }

    #[test]
    fn week_stats_skips_non_overlapping() {
        let a = res("a", "U1", day(2024, 5, 1), 2, 100.0);
        let all = vec![a];
        let refs = confirmed(&all);
        assert!(week_stats(&refs, day(2024, 6, 3)).is_empty());
    }

    #[test]
    fn groups_by_unit_sorted() {
        let a = res("a", "B-unit", day(2024, 6, 2), 1, 50.0);
        let b = res("b", "A-unit", day(2024, 6, 1), 1, 50.0);
        let all = vec![a, b];
        let refs = confirmed(&all);
        let grouped = by_unit(&refs);
        let units: Vec<_> = grouped.keys().cloned().collect();
        assert_eq!(units, vec!["A-unit".to_string(), "B-unit".to_string()]);
    }
}
