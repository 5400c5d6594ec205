use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The basis a food's nutrient values are expressed per.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    #[serde(rename = "per100g")]
    PerHundredGrams,
    #[serde(rename = "per_piece")]
    PerPiece,
    #[serde(rename = "per_serving")]
    PerServing,
}

impl UnitKind {
    pub const ALL: [UnitKind; 3] = [Self::PerHundredGrams, Self::PerPiece, Self::PerServing];

    /// Storage and CLI code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::PerHundredGrams => "per100g",
            Self::PerPiece => "per_piece",
            Self::PerServing => "per_serving",
        }
    }

    /// Unit of a logged quantity for this kind: grams or a count.
    #[must_use]
    pub fn quantity_label(self) -> &'static str {
        match self {
            Self::PerHundredGrams => "g",
            Self::PerPiece => "pc",
            Self::PerServing => "serving",
        }
    }

    #[must_use]
    pub fn default_quantity(self) -> f64 {
        match self {
            Self::PerHundredGrams => 100.0,
            Self::PerPiece | Self::PerServing => 1.0,
        }
    }

    /// Multiplier applied to per-unit values for a logged quantity.
    #[must_use]
    pub fn factor(self, quantity: f64) -> f64 {
        match self {
            Self::PerHundredGrams => quantity / 100.0,
            Self::PerPiece | Self::PerServing => quantity,
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for UnitKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.code().eq_ignore_ascii_case(s) || format!("{kind:?}").eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| {
                Error::validation(format!(
                    "Invalid unit kind '{s}'. Must be one of: per100g, per_piece, per_serving"
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodDefinition {
    pub id: i64,
    pub name: String,
    pub unit_kind: UnitKind,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    /// Energy per unit; `0.0` means derive it from the macros.
    pub calories: f64,
}

/// Catalog input as it arrives from a form or the command line.
///
/// Missing nutrient fields are allowed here and become `0.0` in
/// [`FoodInput::normalize`], which is the only place that rule is applied.
#[derive(Debug, Clone, Default)]
pub struct FoodInput {
    pub name: String,
    pub unit_kind: Option<UnitKind>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub calories: Option<f64>,
}

impl FoodInput {
    pub fn normalize(&self) -> Result<NewFood> {
        let unit_kind = self
            .unit_kind
            .ok_or_else(|| Error::validation("Unit kind is required"))?;
        let food = NewFood {
            name: self.name.trim().to_string(),
            unit_kind,
            protein_g: self.protein_g.unwrap_or(0.0),
            carbs_g: self.carbs_g.unwrap_or(0.0),
            fat_g: self.fat_g.unwrap_or(0.0),
            fiber_g: self.fiber_g.unwrap_or(0.0),
            calories: self.calories.unwrap_or(0.0),
        };
        food.validate()?;
        Ok(food)
    }
}

/// A fully specified catalog upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFood {
    pub name: String,
    pub unit_kind: UnitKind,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub calories: f64,
}

impl NewFood {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Food name is required"));
        }
        for (field, value) in [
            ("protein", self.protein_g),
            ("carbs", self.carbs_g),
            ("fat", self.fat_g),
            ("fiber", self.fiber_g),
            ("calories", self.calories),
        ] {
            validate_amount(field, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub food_id: i64,
    /// Grams for `PerHundredGrams` foods, a count otherwise.
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub date: NaiveDate,
    pub food_id: i64,
    pub quantity: f64,
    pub note: Option<String>,
}

impl NewLogEntry {
    pub fn validate(&self) -> Result<()> {
        validate_amount("quantity", self.quantity)
    }

    /// Trimmed note, with blank notes dropped.
    #[must_use]
    pub fn clean_note(&self) -> Option<String> {
        self.note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }
}

pub(crate) fn validate_amount(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::validation(format!("{field} must be a finite number")));
    }
    if value < 0.0 {
        return Err(Error::validation(format!(
            "{field} must be non-negative (got {value})"
        )));
    }
    Ok(())
}

/// A log entry joined with the food it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedFood {
    pub entry: LogEntry,
    pub food: FoodDefinition,
}

/// Absolute nutrient totals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Nutrients {
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub calories: f64,
}

impl Nutrients {
    pub const ZERO: Nutrients = Nutrients {
        protein_g: 0.0,
        carbs_g: 0.0,
        fat_g: 0.0,
        fiber_g: 0.0,
        calories: 0.0,
    };

    #[must_use]
    pub fn macro_grams(&self) -> f64 {
        self.protein_g + self.carbs_g + self.fat_g
    }
}

impl Add for Nutrients {
    type Output = Nutrients;

    fn add(mut self, rhs: Nutrients) -> Nutrients {
        self += rhs;
        self
    }
}

impl AddAssign for Nutrients {
    fn add_assign(&mut self, rhs: Nutrients) {
        self.protein_g += rhs.protein_g;
        self.carbs_g += rhs.carbs_g;
        self.fat_g += rhs.fat_g;
        self.fiber_g += rhs.fiber_g;
        self.calories += rhs.calories;
    }
}

impl Sum for Nutrients {
    fn sum<I: Iterator<Item = Nutrients>>(iter: I) -> Self {
        iter.fold(Nutrients::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Nutrients> for Nutrients {
    fn sum<I: Iterator<Item = &'a Nutrients>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Share of protein, carbs and fat in total macro grams, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MacroSplit {
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fat_pct: f64,
}

/// A logged row with its resolved totals, flattened for display and export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEntry {
    pub entry_id: i64,
    pub date: NaiveDate,
    pub food_id: i64,
    pub food_name: String,
    pub unit_kind: UnitKind,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub totals: Nutrients,
}

/// All rows logged on one date, with their sum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub entries: Vec<LoggedFood>,
    pub totals: Nutrients,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub entries: Vec<ResolvedEntry>,
    pub totals: Nutrients,
    pub macro_split: MacroSplit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTotals {
    pub date: NaiveDate,
    pub entry_count: usize,
    pub totals: Nutrients,
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Only dates with at least one entry, ascending.
    pub days: Vec<DayTotals>,
    pub totals: Nutrients,
}

// --- Starter catalog ---

pub struct StarterFood {
    pub name: &'static str,
    pub unit_kind: UnitKind,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub calories: f64,
}

impl StarterFood {
    #[must_use]
    pub fn to_new_food(&self) -> NewFood {
        NewFood {
            name: self.name.to_string(),
            unit_kind: self.unit_kind,
            protein_g: self.protein_g,
            carbs_g: self.carbs_g,
            fat_g: self.fat_g,
            fiber_g: self.fiber_g,
            calories: self.calories,
        }
    }
}

const fn starter(
    name: &'static str,
    unit_kind: UnitKind,
    protein_g: f64,
    carbs_g: f64,
    fat_g: f64,
    fiber_g: f64,
    calories: f64,
) -> StarterFood {
    StarterFood {
        name,
        unit_kind,
        protein_g,
        carbs_g,
        fat_g,
        fiber_g,
        calories,
    }
}

/// Common foods with approximate macros, offered as a first-run import.
pub const STARTER_FOODS: &[StarterFood] = &[
    starter("Egg (whole)", UnitKind::PerPiece, 6.0, 0.6, 5.0, 0.0, 70.0),
    starter("Chicken breast (cooked)", UnitKind::PerHundredGrams, 31.0, 0.0, 3.6, 0.0, 165.0),
    starter("Paneer", UnitKind::PerHundredGrams, 18.0, 3.4, 20.0, 0.0, 265.0),
    starter("Milk (cow)", UnitKind::PerHundredGrams, 3.4, 5.0, 3.3, 0.0, 61.0),
    starter("Rice (cooked)", UnitKind::PerHundredGrams, 2.7, 28.0, 0.3, 0.4, 130.0),
    starter("Roti/Chapati", UnitKind::PerPiece, 3.0, 18.0, 3.0, 2.0, 120.0),
    starter("Dal (cooked)", UnitKind::PerHundredGrams, 9.0, 20.0, 0.4, 8.0, 116.0),
    starter("Banana", UnitKind::PerPiece, 1.3, 27.0, 0.3, 3.1, 105.0),
    starter("Peanut butter", UnitKind::PerHundredGrams, 25.0, 20.0, 50.0, 6.0, 588.0),
    starter("Whey protein scoop", UnitKind::PerServing, 24.0, 3.0, 2.0, 0.0, 120.0),
];
