use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutrilog_core::models::{FoodDefinition, Nutrients, UnitKind};
use nutrilog_core::nutrition::calories_from_macros;

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.trim().to_lowercase().as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            other => NaiveDate::parse_from_str(other, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

pub(crate) fn parse_quantity(quantity: f64) -> Result<f64> {
    if !quantity.is_finite() || quantity < 0.0 {
        bail!("Quantity must be a non-negative number (got {quantity})");
    }
    Ok(quantity)
}

pub(crate) fn prompt_choice(count: usize) -> Result<usize> {
    eprint!("\nSelect a food (1-{count}): ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

pub(crate) fn print_food_table(foods: &[&FoodDefinition]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Per")]
        unit: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "Fiber")]
        fiber: String,
        #[tabled(rename = "Calories")]
        calories: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            id: f.id,
            name: truncate(&f.name, 35),
            unit: unit_display(f.unit_kind).to_string(),
            protein: format!("{:.1}", f.protein_g),
            carbs: format!("{:.1}", f.carbs_g),
            fat: format!("{:.1}", f.fat_g),
            fiber: format!("{:.1}", f.fiber_g),
            calories: if f.calories > 0.0 {
                format!("{:.0}", f.calories)
            } else {
                // Derived at resolve time
                let derived = calories_from_macros(f.protein_g, f.carbs_g, f.fat_g);
                format!("~{derived:.0}")
            },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..9)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn unit_display(unit: UnitKind) -> &'static str {
    match unit {
        UnitKind::PerHundredGrams => "100 g",
        UnitKind::PerPiece => "piece",
        UnitKind::PerServing => "serving",
    }
}

/// "150g", "2 pc", "1.5 serving".
pub(crate) fn format_quantity(quantity: f64, unit: UnitKind) -> String {
    let qty = if quantity.fract() == 0.0 {
        format!("{quantity:.0}")
    } else {
        format!("{quantity}")
    };
    match unit {
        UnitKind::PerHundredGrams => format!("{qty}{}", unit.quantity_label()),
        UnitKind::PerPiece | UnitKind::PerServing => format!("{qty} {}", unit.quantity_label()),
    }
}

pub(crate) fn format_nutrients(n: &Nutrients) -> String {
    let cal = no_neg_zero(n.calories);
    let p = no_neg_zero(n.protein_g);
    let c = no_neg_zero(n.carbs_g);
    let f = no_neg_zero(n.fat_g);
    let fib = no_neg_zero(n.fiber_g);
    format!("{cal:.0} kcal | P:{p:.1}g C:{c:.1}g F:{f:.1}g Fiber:{fib:.1}g")
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Report a "nothing to show" condition and exit with status 2.
pub(crate) fn exit_empty(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_none() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(parse_date(Some("Today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string())).unwrap(),
            today + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string())).is_err());
        assert!(parse_date(Some("2024-13-01".to_string())).is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert!((parse_quantity(150.0).unwrap() - 150.0).abs() < f64::EPSILON);
        assert!(parse_quantity(0.0).is_ok());
        assert!(parse_quantity(-1.0).is_err());
        assert!(parse_quantity(f64::NAN).is_err());
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(150.0, UnitKind::PerHundredGrams), "150g");
        assert_eq!(format_quantity(2.0, UnitKind::PerPiece), "2 pc");
        assert_eq!(format_quantity(1.5, UnitKind::PerServing), "1.5 serving");
    }

    #[test]
    fn test_format_nutrients() {
        let n = Nutrients {
            protein_g: 12.0,
            carbs_g: 1.2,
            fat_g: 10.0,
            fiber_g: -0.0,
            calories: 142.8,
        };
        assert_eq!(
            format_nutrients(&n),
            "143 kcal | P:12.0g C:1.2g F:10.0g Fiber:0.0g"
        );
    }

    #[test]
    fn test_json_error_escapes() {
        assert_eq!(
            json_error("Food \"x\" not found"),
            r#"{"error":"Food \"x\" not found"}"#
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("Müsli", 10), "Müsli");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(5.0), 5.0);
        assert_eq!(no_neg_zero(-3.0), -3.0);
    }
}
