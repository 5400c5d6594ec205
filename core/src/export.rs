//! Delimited-text backups of the catalog and the log.

use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::models::{FoodDefinition, ResolvedEntry, UnitKind};

#[derive(Serialize)]
struct FoodRow<'a> {
    id: i64,
    name: &'a str,
    unit: UnitKind,
    protein: f64,
    carbs: f64,
    fat: f64,
    fiber: f64,
    calories: f64,
}

#[derive(Serialize)]
struct EntryRow<'a> {
    id: i64,
    date: NaiveDate,
    food: &'a str,
    unit: UnitKind,
    qty: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    fiber: f64,
    calories: f64,
    note: &'a str,
}

/// One row per food, per-unit values as stored.
pub fn write_foods_csv<W: Write>(foods: &[FoodDefinition], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for f in foods {
        wtr.serialize(FoodRow {
            id: f.id,
            name: &f.name,
            unit: f.unit_kind,
            protein: f.protein_g,
            carbs: f.carbs_g,
            fat: f.fat_g,
            fiber: f.fiber_g,
            calories: f.calories,
        })?;
    }
    if foods.is_empty() {
        wtr.write_record([
            "id", "name", "unit", "protein", "carbs", "fat", "fiber", "calories",
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// One row per logged entry, with its resolved totals rather than per-unit values.
pub fn write_entries_csv<W: Write>(entries: &[ResolvedEntry], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for e in entries {
        wtr.serialize(EntryRow {
            id: e.entry_id,
            date: e.date,
            food: &e.food_name,
            unit: e.unit_kind,
            qty: e.quantity,
            protein: e.totals.protein_g,
            carbs: e.totals.carbs_g,
            fat: e.totals.fat_g,
            fiber: e.totals.fiber_g,
            calories: e.totals.calories,
            note: e.note.as_deref().unwrap_or_default(),
        })?;
    }
    if entries.is_empty() {
        wtr.write_record([
            "id", "date", "food", "unit", "qty", "protein", "carbs", "fat", "fiber", "calories",
            "note",
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
