mod export;
mod food;
mod helpers;
mod log;
mod summary;

use anyhow::Result;

use nutrilog_core::models::FoodDefinition;
use nutrilog_core::service::Tracker;

use helpers::{print_food_table, prompt_choice};

pub(crate) use export::{cmd_export_entries, cmd_export_foods};
pub(crate) use food::{cmd_food_add, cmd_food_delete, cmd_food_list, cmd_food_starter};
pub(crate) use log::{cmd_delete, cmd_log};
pub(crate) use summary::{cmd_history, cmd_range, cmd_summary};

/// Resolve a food by exact name, falling back to a catalog search.
///
/// Several search hits are shown as a table and the user picks one.
pub(super) fn resolve_food(tracker: &Tracker, query: &str) -> Result<Option<FoodDefinition>> {
    match tracker.get_food_by_name(query) {
        Ok(food) => return Ok(Some(food)),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e.into()),
    }

    let matches = tracker.search_foods(query)?;
    if matches.len() <= 1 {
        return Ok(matches.into_iter().next());
    }

    let refs: Vec<&FoodDefinition> = matches.iter().collect();
    print_food_table(&refs);
    let idx = prompt_choice(matches.len())?;
    Ok(matches.into_iter().nth(idx))
}
