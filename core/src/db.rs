use std::path::Path;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{FoodDefinition, LogEntry, LoggedFood, NewFood, NewLogEntry, UnitKind};

const DATE_FORMAT: &str = "%Y-%m-%d";

const FOOD_COLUMNS: &str = "id, name, unit, protein, carbs, fat, fiber, calories";

const LOGGED_SELECT: &str = "SELECT e.id, e.d, e.food_id, e.qty, e.note,
        f.id, f.name, f.unit, f.protein, f.carbs, f.fat, f.fiber, f.calories
 FROM entries e
 JOIN foods f ON e.food_id = f.id";

impl ToSql for UnitKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for UnitKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// SQLite-backed store for the food catalog and the consumption log.
///
/// Entries reference foods by id without a foreign-key constraint. Deleting a
/// food leaves its entries in place; every joined read uses an inner join, so
/// those entries simply drop out of views and summaries.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "opening database");
        let conn = Connection::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        debug!(journal_mode = %mode, "database opened");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        // Catalogs written by older releases declare a foreign key on
        // entries.food_id; it must never block a food delete.
        conn.pragma_update(None, "foreign_keys", false)?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Bring the schema up to date. Safe to run on every open, including on
    /// databases created by earlier releases that predate `user_version`.
    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            debug!("migrating schema to v1");
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS foods (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT UNIQUE NOT NULL,
                    unit TEXT NOT NULL CHECK (unit IN ('per100g', 'per_piece', 'per_serving')),
                    protein REAL NOT NULL DEFAULT 0,
                    carbs REAL NOT NULL DEFAULT 0,
                    fat REAL NOT NULL DEFAULT 0,
                    fiber REAL NOT NULL DEFAULT 0,
                    calories REAL NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    d TEXT NOT NULL,
                    food_id INTEGER NOT NULL,
                    qty REAL NOT NULL,
                    note TEXT DEFAULT ''
                );

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            debug!("migrating schema to v2");
            // Older catalogs were created before fiber was tracked.
            if !self.column_exists("foods", "fiber")? {
                self.conn.execute_batch(
                    "ALTER TABLE foods ADD COLUMN fiber REAL NOT NULL DEFAULT 0;",
                )?;
            }
            self.conn.execute_batch(
                "CREATE INDEX IF NOT EXISTS idx_entries_d ON entries(d);
                 CREATE INDEX IF NOT EXISTS idx_entries_food ON entries(food_id);

                 PRAGMA user_version = 2;",
            )?;
        }

        Ok(())
    }

    fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
            params![table, column],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn schema_version(&self) -> Result<i64> {
        Ok(self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?)
    }

    // --- Row mapping helpers ---

    fn parse_date(idx: usize, value: &str) -> rusqlite::Result<NaiveDate> {
        NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    fn clean_note(note: Option<String>) -> Option<String> {
        note.filter(|n| !n.trim().is_empty())
    }

    // Expects columns starting at `offset`:
    // id, name, unit, protein, carbs, fat, fiber, calories
    // Nutrient columns read NULL as 0 so legacy rows never carry a missing value.
    fn food_at(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<FoodDefinition> {
        let amount = |i: usize| -> rusqlite::Result<f64> {
            Ok(row.get::<_, Option<f64>>(offset + i)?.unwrap_or(0.0))
        };
        Ok(FoodDefinition {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            unit_kind: row.get(offset + 2)?,
            protein_g: amount(3)?,
            carbs_g: amount(4)?,
            fat_g: amount(5)?,
            fiber_g: amount(6)?,
            calories: amount(7)?,
        })
    }

    fn food_from_row(row: &rusqlite::Row) -> rusqlite::Result<FoodDefinition> {
        Self::food_at(row, 0)
    }

    fn entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<LogEntry> {
        let date: String = row.get(1)?;
        Ok(LogEntry {
            id: row.get(0)?,
            date: Self::parse_date(1, &date)?,
            food_id: row.get(2)?,
            quantity: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
            note: Self::clean_note(row.get(4)?),
        })
    }

    // Expects the column layout of LOGGED_SELECT:
    // 0: e.id, 1: e.d, 2: e.food_id, 3: e.qty, 4: e.note,
    // 5..=12: food columns
    fn logged_from_row(row: &rusqlite::Row) -> rusqlite::Result<LoggedFood> {
        Ok(LoggedFood {
            entry: Self::entry_from_row(row)?,
            food: Self::food_at(row, 5)?,
        })
    }

    // --- Foods ---

    /// Insert a food, or overwrite every field of the one sharing its name.
    /// The existing id is kept.
    pub fn upsert_food(&self, food: &NewFood) -> Result<FoodDefinition> {
        food.validate()?;
        let name = food.name.trim();
        self.conn.execute(
            "INSERT INTO foods (name, unit, protein, carbs, fat, fiber, calories)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(name) DO UPDATE SET
                unit = excluded.unit,
                protein = excluded.protein,
                carbs = excluded.carbs,
                fat = excluded.fat,
                fiber = excluded.fiber,
                calories = excluded.calories",
            params![
                name,
                food.unit_kind,
                food.protein_g,
                food.carbs_g,
                food.fat_g,
                food.fiber_g,
                food.calories,
            ],
        )?;
        let saved = self.get_food_by_name(name)?;
        debug!(id = saved.id, name = %saved.name, unit = %saved.unit_kind, "food saved");
        Ok(saved)
    }

    pub fn get_food_by_id(&self, id: i64) -> Result<FoodDefinition> {
        self.conn
            .query_row(
                &format!("SELECT {FOOD_COLUMNS} FROM foods WHERE id = ?1"),
                params![id],
                Self::food_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("Food", id))
    }

    pub fn get_food_by_name(&self, name: &str) -> Result<FoodDefinition> {
        self.conn
            .query_row(
                &format!("SELECT {FOOD_COLUMNS} FROM foods WHERE name = ?1"),
                params![name],
                Self::food_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("Food", name))
    }

    /// Remove a food. Unknown ids are not an error; the return value says
    /// whether anything was deleted. Entries are never touched.
    pub fn delete_food(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM foods WHERE id = ?1", params![id])?;
        debug!(id, deleted = rows > 0, "delete food");
        Ok(rows > 0)
    }

    /// All foods, ordered by name.
    pub fn list_foods(&self) -> Result<Vec<FoodDefinition>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {FOOD_COLUMNS} FROM foods ORDER BY name"))?;
        let foods = stmt
            .query_map([], Self::food_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(foods)
    }

    pub fn search_foods(&self, query: &str) -> Result<Vec<FoodDefinition>> {
        let escaped = query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{escaped}%");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FOOD_COLUMNS} FROM foods WHERE name LIKE ?1 ESCAPE '\\' ORDER BY name"
        ))?;
        let foods = stmt
            .query_map(params![pattern], Self::food_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(foods)
    }

    // --- Entries ---

    /// Log a quantity of an existing food.
    pub fn insert_entry(&self, entry: &NewLogEntry) -> Result<LogEntry> {
        entry.validate()?;
        self.get_food_by_id(entry.food_id)?;
        let date_str = entry.date.format(DATE_FORMAT).to_string();
        self.conn.execute(
            "INSERT INTO entries (d, food_id, qty, note) VALUES (?1, ?2, ?3, ?4)",
            params![
                date_str,
                entry.food_id,
                entry.quantity,
                entry.clean_note().unwrap_or_default(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, food_id = entry.food_id, date = %date_str, "entry logged");
        self.get_entry(id)
    }

    /// A raw entry, whether or not its food still exists.
    pub fn get_entry(&self, id: i64) -> Result<LogEntry> {
        self.conn
            .query_row(
                "SELECT id, d, food_id, qty, note FROM entries WHERE id = ?1",
                params![id],
                Self::entry_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("Entry", id))
    }

    /// An entry joined with its food. Dangling entries are reported as not found.
    pub fn get_logged(&self, id: i64) -> Result<LoggedFood> {
        self.conn
            .query_row(
                &format!("{LOGGED_SELECT} WHERE e.id = ?1"),
                params![id],
                Self::logged_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("Entry", id))
    }

    pub fn delete_entry(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM entries WHERE id = ?1", params![id])?;
        debug!(id, deleted = rows > 0, "delete entry");
        Ok(rows > 0)
    }

    pub fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<LoggedFood>> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let mut stmt = self
            .conn
            .prepare(&format!("{LOGGED_SELECT} WHERE e.d = ?1 ORDER BY e.id"))?;
        let rows = stmt
            .query_map(params![date_str], Self::logged_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Entries dated `start..=end`, oldest first.
    pub fn entries_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<LoggedFood>> {
        let start_str = start.format(DATE_FORMAT).to_string();
        let end_str = end.format(DATE_FORMAT).to_string();
        let mut stmt = self.conn.prepare(&format!(
            "{LOGGED_SELECT} WHERE e.d BETWEEN ?1 AND ?2 ORDER BY e.d, e.id"
        ))?;
        let rows = stmt
            .query_map(params![start_str, end_str], Self::logged_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Every entry that still resolves to a food, oldest first.
    pub fn all_logged(&self) -> Result<Vec<LoggedFood>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LOGGED_SELECT} ORDER BY e.d, e.id"))?;
        let rows = stmt
            .query_map([], Self::logged_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count_entries_for_food(&self, food_id: i64) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE food_id = ?1",
            params![food_id],
            |row| row.get(0),
        )?)
    }
}
