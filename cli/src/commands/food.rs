use anyhow::Result;

use nutrilog_core::models::{FoodDefinition, FoodInput, UnitKind};
use nutrilog_core::service::Tracker;

use super::helpers::{exit_empty, print_food_table, unit_display};

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_food_add(
    tracker: &Tracker,
    name: &str,
    unit: &str,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
    fiber: Option<f64>,
    calories: Option<f64>,
    json: bool,
) -> Result<()> {
    let unit_kind: UnitKind = unit.parse()?;
    let food = tracker.upsert_food(&FoodInput {
        name: name.to_string(),
        unit_kind: Some(unit_kind),
        protein_g: protein,
        carbs_g: carbs,
        fat_g: fat,
        fiber_g: fiber,
        calories,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        let name = &food.name;
        let id = food.id;
        let per = unit_display(food.unit_kind);
        println!("Saved food: {name} (id: {id}, values per {per})");
        if food.calories == 0.0 {
            println!("Calories will be derived from protein, carbs and fat");
        }
    }

    Ok(())
}

pub(crate) fn cmd_food_list(tracker: &Tracker, search: Option<&str>, json: bool) -> Result<()> {
    let foods = match search {
        Some(query) => tracker.search_foods(query)?,
        None => tracker.list_foods()?,
    };

    if foods.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No foods found");
        }
        std::process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
    } else {
        let refs: Vec<&FoodDefinition> = foods.iter().collect();
        print_food_table(&refs);
    }

    Ok(())
}

pub(crate) fn cmd_food_delete(
    tracker: &Tracker,
    name: Option<&str>,
    id: Option<i64>,
    json: bool,
) -> Result<()> {
    let food = match (id, name) {
        (Some(id), _) => tracker.get_food(id),
        (None, Some(name)) => tracker.get_food_by_name(name),
        (None, None) => anyhow::bail!("Provide a food name or --id"),
    };
    let food = match food {
        Ok(food) => food,
        Err(e) if e.is_not_found() => exit_empty(&e.to_string(), json),
        Err(e) => return Err(e.into()),
    };

    let hidden = tracker.entries_referencing(food.id)?;
    tracker.delete_food(food.id)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "deleted": food.id, "name": food.name, "hidden_entries": hidden })
        );
    } else {
        let name = &food.name;
        println!("Deleted food: {name}");
        if hidden > 0 {
            println!("{hidden} log entries for it are kept but no longer shown in summaries");
        }
    }

    Ok(())
}

pub(crate) fn cmd_food_starter(tracker: &Tracker, json: bool) -> Result<()> {
    let imported = tracker.import_starter_foods()?;

    if json {
        println!("{}", serde_json::json!({ "imported": imported }));
    } else {
        println!("Imported {imported} starter foods");
    }

    Ok(())
}
