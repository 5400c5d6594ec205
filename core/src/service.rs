use std::io::Write;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::export;
use crate::models::{
    DailySummary, FoodDefinition, FoodInput, LogEntry, LoggedFood, NewLogEntry, Nutrients,
    RangeSummary, ResolvedEntry, STARTER_FOODS, validate_amount,
};
use crate::nutrition;

/// The longest window `history` will scan.
pub const MAX_HISTORY_DAYS: u32 = 365;

/// Food catalog and consumption log over an explicitly owned database handle.
pub struct Tracker {
    db: Database,
}

impl Tracker {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open(db_path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    // --- Catalog ---

    /// Create a food or overwrite the one with the same name, keeping its id.
    pub fn upsert_food(&self, input: &FoodInput) -> Result<FoodDefinition> {
        let food = input.normalize()?;
        self.db.upsert_food(&food)
    }

    /// Idempotent: deleting an unknown id is a no-op that returns `false`.
    pub fn delete_food(&self, id: i64) -> Result<bool> {
        let referenced = self.db.count_entries_for_food(id)?;
        let deleted = self.db.delete_food(id)?;
        if deleted && referenced > 0 {
            info!(id, referenced, "deleted food still referenced by log entries");
        }
        Ok(deleted)
    }

    pub fn list_foods(&self) -> Result<Vec<FoodDefinition>> {
        self.db.list_foods()
    }

    pub fn search_foods(&self, query: &str) -> Result<Vec<FoodDefinition>> {
        self.db.search_foods(query)
    }

    pub fn get_food(&self, id: i64) -> Result<FoodDefinition> {
        self.db.get_food_by_id(id)
    }

    pub fn get_food_by_name(&self, name: &str) -> Result<FoodDefinition> {
        self.db.get_food_by_name(name.trim())
    }

    /// Number of log entries pointing at a food id, including dangling ones.
    pub fn entries_referencing(&self, food_id: i64) -> Result<i64> {
        self.db.count_entries_for_food(food_id)
    }

    /// Upsert the built-in starter foods, returning how many were saved.
    pub fn import_starter_foods(&self) -> Result<usize> {
        let mut saved = 0;
        for starter in STARTER_FOODS {
            self.db.upsert_food(&starter.to_new_food())?;
            saved += 1;
        }
        info!(saved, "imported starter foods");
        Ok(saved)
    }

    // --- Log ---

    /// Totals a quantity of a food would add, without logging anything.
    pub fn preview(&self, food_id: i64, quantity: f64) -> Result<Nutrients> {
        validate_amount("quantity", quantity)?;
        let food = self.db.get_food_by_id(food_id)?;
        Ok(nutrition::resolve(&food, quantity))
    }

    pub fn log_food(
        &self,
        date: NaiveDate,
        food_id: i64,
        quantity: f64,
        note: Option<String>,
    ) -> Result<LoggedFood> {
        let entry = self.db.insert_entry(&NewLogEntry {
            date,
            food_id,
            quantity,
            note,
        })?;
        self.db.get_logged(entry.id)
    }

    pub fn get_entry(&self, id: i64) -> Result<LogEntry> {
        self.db.get_entry(id)
    }

    pub fn delete_entry(&self, id: i64) -> Result<bool> {
        self.db.delete_entry(id)
    }

    // --- Summaries ---

    pub fn daily_summary(&self, date: NaiveDate) -> Result<DailySummary> {
        let rows = self.db.entries_for_date(date)?;
        let totals = nutrition::summarize(&rows);
        Ok(DailySummary {
            date,
            entries: rows.iter().map(LoggedFood::to_resolved).collect(),
            totals,
            macro_split: nutrition::macro_split(&totals),
        })
    }

    /// Per-day totals for `start..=end`.
    pub fn range_summary(&self, start: NaiveDate, end: NaiveDate) -> Result<RangeSummary> {
        if start > end {
            return Err(Error::validation(format!(
                "start date {start} is after end date {end}"
            )));
        }
        let rows = self.db.entries_between(start, end)?;
        debug!(%start, %end, rows = rows.len(), "range summary");
        let days = nutrition::daily_totals(&rows);
        let totals = days.iter().map(|d| d.totals).sum();
        Ok(RangeSummary {
            start,
            end,
            days,
            totals,
        })
    }

    /// The `days` most recent days ending at `end`, inclusive.
    pub fn history(&self, end: NaiveDate, days: u32) -> Result<RangeSummary> {
        if days == 0 || days > MAX_HISTORY_DAYS {
            return Err(Error::validation(format!(
                "days must be between 1 and {MAX_HISTORY_DAYS} (got {days})"
            )));
        }
        let start = end - Duration::days(i64::from(days) - 1);
        self.range_summary(start, end)
    }

    // --- Export ---

    pub fn export_foods_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let foods = self.db.list_foods()?;
        export::write_foods_csv(&foods, writer)?;
        Ok(foods.len())
    }

    pub fn export_entries_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let rows: Vec<ResolvedEntry> = self
            .db
            .all_logged()?
            .iter()
            .map(LoggedFood::to_resolved)
            .collect();
        export::write_entries_csv(&rows, writer)?;
        Ok(rows.len())
    }
}
