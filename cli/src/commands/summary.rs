use anyhow::Result;
use chrono::Local;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutrilog_core::models::RangeSummary;
use nutrilog_core::service::{MAX_HISTORY_DAYS, Tracker};

use super::helpers::{exit_empty, format_nutrients, format_quantity, no_neg_zero, parse_date};

pub(crate) fn cmd_summary(tracker: &Tracker, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let summary = tracker.daily_summary(date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.entries.is_empty() {
        exit_empty(&format!("No entries for {date}"), false);
    }

    println!("=== {date} ===\n");
    for e in &summary.entries {
        let id = e.entry_id;
        let name = &e.food_name;
        let qty = format_quantity(e.quantity, e.unit_kind);
        let note = e
            .note
            .as_ref()
            .map(|n| format!(" ({n})"))
            .unwrap_or_default();
        println!("  [{id}] {name} {qty}{note}");
        println!("      {}", format_nutrients(&e.totals));
    }
    println!();
    println!("  TOTAL: {}", format_nutrients(&summary.totals));

    let split = summary.macro_split;
    let p = no_neg_zero(split.protein_pct);
    let c = no_neg_zero(split.carbs_pct);
    let f = no_neg_zero(split.fat_pct);
    println!("  SPLIT: P {p:.0}% | C {c:.0}% | F {f:.0}%");

    Ok(())
}

pub(crate) fn cmd_history(tracker: &Tracker, days: u32, json: bool) -> Result<()> {
    let days = days.clamp(1, MAX_HISTORY_DAYS);
    let today = Local::now().date_naive();
    let range = tracker.history(today, days)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&range)?);
        return Ok(());
    }

    if range.days.is_empty() {
        exit_empty(&format!("No entries in the last {days} days"), false);
    }

    print_range(&range);
    Ok(())
}

pub(crate) fn cmd_range(
    tracker: &Tracker,
    from: String,
    to: Option<String>,
    json: bool,
) -> Result<()> {
    let start = parse_date(Some(from))?;
    let end = parse_date(to)?;
    let range = tracker.range_summary(start, end)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&range)?);
        return Ok(());
    }

    if range.days.is_empty() {
        exit_empty(&format!("No entries between {start} and {end}"), false);
    }

    print_range(&range);
    Ok(())
}

fn print_range(range: &RangeSummary) {
    #[derive(Tabled)]
    struct DayRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Entries")]
        entries: usize,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "Fiber")]
        fiber: String,
    }

    let rows: Vec<DayRow> = range
        .days
        .iter()
        .map(|d| {
            let t = &d.totals;
            let cal = no_neg_zero(t.calories);
            let p = no_neg_zero(t.protein_g);
            let c = no_neg_zero(t.carbs_g);
            let f = no_neg_zero(t.fat_g);
            let fib = no_neg_zero(t.fiber_g);
            DayRow {
                date: d.date.to_string(),
                entries: d.entry_count,
                calories: format!("{cal:.0}"),
                protein: format!("{p:.0}g"),
                carbs: format!("{c:.0}g"),
                fat: format!("{f:.0}g"),
                fiber: format!("{fib:.0}g"),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let (start, end) = (range.start, range.end);
    println!("  {start} to {end}: {}", format_nutrients(&range.totals));
}
