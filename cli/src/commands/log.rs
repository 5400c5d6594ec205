use anyhow::{Result, bail};

use nutrilog_core::service::Tracker;

use super::helpers::{exit_empty, format_nutrients, format_quantity, parse_date, parse_quantity};
use super::resolve_food;

pub(crate) fn cmd_log(
    tracker: &Tracker,
    food_query: Option<&str>,
    quantity: Option<f64>,
    food_id: Option<i64>,
    date: Option<String>,
    note: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;

    let food = match food_id {
        Some(id) => match tracker.get_food(id) {
            Ok(food) => food,
            Err(e) if e.is_not_found() => exit_empty(&e.to_string(), json),
            Err(e) => return Err(e.into()),
        },
        None => {
            let Some(query) = food_query else {
                bail!("Provide a food name or --food-id");
            };
            match resolve_food(tracker, query)? {
                Some(food) => food,
                None => exit_empty(
                    &format!("No food found for '{query}'. Add it with `nutrilog food add`"),
                    json,
                ),
            }
        }
    };

    let quantity = match quantity {
        Some(q) => parse_quantity(q)?,
        None => food.unit_kind.default_quantity(),
    };

    let logged = tracker.log_food(date, food.id, quantity, note)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&logged.to_resolved())?);
    } else {
        let name = &logged.food.name;
        let id = logged.entry.id;
        let qty = format_quantity(logged.entry.quantity, logged.food.unit_kind);
        println!("Logged {qty} {name} for {date} (entry {id})");
        println!("  adds {}", format_nutrients(&logged.nutrients()));
    }

    Ok(())
}

pub(crate) fn cmd_delete(tracker: &Tracker, entry_id: i64, json: bool) -> Result<()> {
    if tracker.delete_entry(entry_id)? {
        if json {
            println!("{}", serde_json::json!({ "deleted": entry_id }));
        } else {
            println!("Deleted entry {entry_id}");
        }
        Ok(())
    } else {
        exit_empty(&format!("Entry {entry_id} not found"), json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_log_default_quantity_by_unit() {
        let tracker = Tracker::open_in_memory().unwrap();
        tracker.import_starter_foods().unwrap();

        cmd_log(
            &tracker,
            Some("Banana"),
            None,
            None,
            Some("2024-03-09".to_string()),
            None,
            true,
        )
        .unwrap();
        cmd_log(
            &tracker,
            Some("Paneer"),
            None,
            None,
            Some("2024-03-09".to_string()),
            Some("dinner".to_string()),
            true,
        )
        .unwrap();

        let summary = tracker.daily_summary(day()).unwrap();
        let quantities: Vec<f64> = summary.entries.iter().map(|e| e.quantity).collect();
        assert_eq!(quantities, vec![1.0, 100.0]);
        assert_eq!(summary.entries[1].note.as_deref(), Some("dinner"));
    }

    #[test]
    fn test_log_by_food_id() {
        let tracker = Tracker::open_in_memory().unwrap();
        tracker.import_starter_foods().unwrap();
        let egg = tracker.get_food_by_name("Egg (whole)").unwrap();

        cmd_log(
            &tracker,
            None,
            Some(3.0),
            Some(egg.id),
            Some("2024-03-09".to_string()),
            None,
            false,
        )
        .unwrap();

        let summary = tracker.daily_summary(day()).unwrap();
        assert_eq!(summary.entries.len(), 1);
        assert!((summary.totals.calories - 210.0).abs() < 1e-9);
    }

    #[test]
    fn test_log_rejects_negative_quantity() {
        let tracker = Tracker::open_in_memory().unwrap();
        tracker.import_starter_foods().unwrap();
        assert!(cmd_log(&tracker, Some("Banana"), Some(-1.0), None, None, None, false).is_err());
    }

    #[test]
    fn test_log_without_food_or_id_fails() {
        let tracker = Tracker::open_in_memory().unwrap();
        assert!(cmd_log(&tracker, None, Some(1.0), None, None, None, false).is_err());
    }

    #[test]
    fn test_delete_entry() {
        let tracker = Tracker::open_in_memory().unwrap();
        tracker.import_starter_foods().unwrap();
        let banana = tracker.get_food_by_name("Banana").unwrap();
        let logged = tracker.log_food(day(), banana.id, 1.0, None).unwrap();

        cmd_delete(&tracker, logged.entry.id, false).unwrap();
        assert!(tracker.get_entry(logged.entry.id).unwrap_err().is_not_found());
    }
}
