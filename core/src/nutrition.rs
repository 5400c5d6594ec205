//! Turns logged quantities into absolute nutrient totals and rolls them up.
//!
//! Everything here is pure: rows come from the storage layer already joined
//! with their food, and nothing is written back.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{
    DayGroup, DayTotals, FoodDefinition, LoggedFood, MacroSplit, Nutrients, ResolvedEntry,
};

/// Atwater energy factors, kcal per gram.
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Energy from macros. Fiber is counted as 0 kcal/g.
#[must_use]
pub fn calories_from_macros(protein_g: f64, carbs_g: f64, fat_g: f64) -> f64 {
    protein_g * KCAL_PER_G_PROTEIN + carbs_g * KCAL_PER_G_CARBS + fat_g * KCAL_PER_G_FAT
}

/// Absolute nutrients for `quantity` of `food`.
///
/// A stored calorie value of zero means "derive from macros", so the energy of
/// such foods is computed from the already-scaled protein, carbs and fat.
#[must_use]
pub fn resolve(food: &FoodDefinition, quantity: f64) -> Nutrients {
    let factor = food.unit_kind.factor(quantity);
    let protein_g = food.protein_g * factor;
    let carbs_g = food.carbs_g * factor;
    let fat_g = food.fat_g * factor;
    let fiber_g = food.fiber_g * factor;
    let calories = if food.calories > 0.0 {
        food.calories * factor
    } else {
        calories_from_macros(protein_g, carbs_g, fat_g)
    };
    Nutrients {
        protein_g,
        carbs_g,
        fat_g,
        fiber_g,
        calories,
    }
}

impl LoggedFood {
    #[must_use]
    pub fn nutrients(&self) -> Nutrients {
        resolve(&self.food, self.entry.quantity)
    }

    #[must_use]
    pub fn to_resolved(&self) -> ResolvedEntry {
        ResolvedEntry {
            entry_id: self.entry.id,
            date: self.entry.date,
            food_id: self.food.id,
            food_name: self.food.name.clone(),
            unit_kind: self.food.unit_kind,
            quantity: self.entry.quantity,
            note: self.entry.note.clone(),
            totals: self.nutrients(),
        }
    }
}

/// Field-wise sum of every row's resolved totals. Empty input gives zero.
#[must_use]
pub fn summarize<'a, I>(rows: I) -> Nutrients
where
    I: IntoIterator<Item = &'a LoggedFood>,
{
    rows.into_iter().map(LoggedFood::nutrients).sum()
}

/// Partition rows by date, each bucket carrying its own sum.
///
/// Every input row lands in exactly one bucket. Within a bucket rows keep
/// their input order.
#[must_use]
pub fn group_by_day(rows: &[LoggedFood]) -> BTreeMap<NaiveDate, DayGroup> {
    let mut groups: BTreeMap<NaiveDate, DayGroup> = BTreeMap::new();
    for row in rows {
        let group = groups.entry(row.entry.date).or_insert_with(|| DayGroup {
            date: row.entry.date,
            entries: Vec::new(),
            totals: Nutrients::ZERO,
        });
        group.totals += row.nutrients();
        group.entries.push(row.clone());
    }
    groups
}

/// Per-day totals in ascending date order, for history tables and charts.
#[must_use]
pub fn daily_totals(rows: &[LoggedFood]) -> Vec<DayTotals> {
    group_by_day(rows)
        .into_values()
        .map(|group| DayTotals {
            date: group.date,
            entry_count: group.entries.len(),
            totals: group.totals,
        })
        .collect()
}

/// Protein/carbs/fat as percentages of total macro grams.
#[must_use]
pub fn macro_split(totals: &Nutrients) -> MacroSplit {
    let grams = totals.macro_grams();
    if grams <= 0.0 {
        return MacroSplit::default();
    }
    MacroSplit {
        protein_pct: totals.protein_g / grams * 100.0,
        carbs_pct: totals.carbs_g / grams * 100.0,
        fat_pct: totals.fat_g / grams * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogEntry, UnitKind};

    const EPS: f64 = 1e-9;

    fn rice() -> FoodDefinition {
        FoodDefinition {
            id: 1,
            name: "Rice (cooked)".to_string(),
            unit_kind: UnitKind::PerHundredGrams,
            protein_g: 2.7,
            carbs_g: 28.0,
            fat_g: 0.3,
            fiber_g: 0.4,
            calories: 130.0,
        }
    }

    fn egg() -> FoodDefinition {
        FoodDefinition {
            id: 2,
            name: "Egg (whole)".to_string(),
            unit_kind: UnitKind::PerPiece,
            protein_g: 6.0,
            carbs_g: 0.6,
            fat_g: 5.0,
            fiber_g: 0.0,
            calories: 0.0,
        }
    }

    fn logged(id: i64, date: NaiveDate, food: &FoodDefinition, quantity: f64) -> LoggedFood {
        LoggedFood {
            entry: LogEntry {
                id,
                date,
                food_id: food.id,
                quantity,
                note: None,
            },
            food: food.clone(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn assert_close(actual: &Nutrients, expected: &Nutrients) {
        for (a, e) in [
            (actual.protein_g, expected.protein_g),
            (actual.carbs_g, expected.carbs_g),
            (actual.fat_g, expected.fat_g),
            (actual.fiber_g, expected.fiber_g),
            (actual.calories, expected.calories),
        ] {
            assert!((a - e).abs() < EPS, "{actual:?} != {expected:?}");
        }
    }

    fn n(protein_g: f64, carbs_g: f64, fat_g: f64, fiber_g: f64, calories: f64) -> Nutrients {
        Nutrients {
            protein_g,
            carbs_g,
            fat_g,
            fiber_g,
            calories,
        }
    }

    #[test]
    fn test_resolve_per_100g_uses_stored_calories() {
        let totals = resolve(&rice(), 150.0);
        assert_close(&totals, &n(4.05, 42.0, 0.45, 0.6, 195.0));
    }

    #[test]
    fn test_resolve_per_piece_derives_calories() {
        let totals = resolve(&egg(), 2.0);
        assert_close(&totals, &n(12.0, 1.2, 10.0, 0.0, 142.8));
    }

    #[test]
    fn test_resolve_per_serving_is_count_based() {
        let whey = FoodDefinition {
            unit_kind: UnitKind::PerServing,
            protein_g: 24.0,
            calories: 120.0,
            ..egg()
        };
        let totals = resolve(&whey, 1.5);
        assert!((totals.protein_g - 36.0).abs() < EPS);
        assert!((totals.calories - 180.0).abs() < EPS);
    }

    #[test]
    fn test_resolve_zero_quantity_is_zero() {
        for food in [rice(), egg()] {
            assert_close(&resolve(&food, 0.0), &Nutrients::ZERO);
        }
    }

    #[test]
    fn test_resolve_is_proportional_to_quantity() {
        for food in [rice(), egg()] {
            for qty in [0.5, 1.0, 3.0, 137.25] {
                let single = resolve(&food, qty);
                let double = resolve(&food, qty * 2.0);
                assert_close(&double, &(single + single));
            }
        }
    }

    #[test]
    fn test_derived_calories_exclude_fiber() {
        let fibrous = FoodDefinition {
            fiber_g: 10.0,
            calories: 0.0,
            ..rice()
        };
        let totals = resolve(&fibrous, 100.0);
        let expected = calories_from_macros(totals.protein_g, totals.carbs_g, totals.fat_g);
        assert!((totals.calories - expected).abs() < EPS);
        assert!((totals.calories - (2.7 * 4.0 + 28.0 * 4.0 + 0.3 * 9.0)).abs() < EPS);
    }

    #[test]
    fn test_summarize_empty_is_zero() {
        assert_eq!(summarize(&Vec::<LoggedFood>::new()), Nutrients::ZERO);
    }

    #[test]
    fn test_summarize_two_rows() {
        let rows = vec![logged(1, day(1), &rice(), 150.0), logged(2, day(1), &egg(), 2.0)];
        assert_close(&summarize(&rows), &n(16.05, 43.2, 10.45, 0.6, 337.8));
    }

    #[test]
    fn test_summarize_is_additive() {
        let rows = vec![
            logged(1, day(1), &rice(), 80.0),
            logged(2, day(2), &egg(), 3.0),
            logged(3, day(2), &rice(), 220.0),
        ];
        let by_row: Nutrients = rows.iter().map(|r| resolve(&r.food, r.entry.quantity)).sum();
        assert_close(&summarize(&rows), &by_row);

        let (left, right) = rows.split_at(1);
        assert_close(&summarize(&rows), &(summarize(left) + summarize(right)));
    }

    #[test]
    fn test_group_by_day_counts() {
        let rows = vec![
            logged(1, day(1), &rice(), 100.0),
            logged(2, day(2), &egg(), 1.0),
            logged(3, day(1), &egg(), 2.0),
            logged(4, day(1), &rice(), 50.0),
            logged(5, day(2), &rice(), 75.0),
        ];
        let groups = group_by_day(&rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&day(1)].entries.len(), 3);
        assert_eq!(groups[&day(2)].entries.len(), 2);
        assert_close(&groups[&day(1)].totals, &summarize(&groups[&day(1)].entries));
    }

    #[test]
    fn test_group_by_day_is_a_partition() {
        let rows: Vec<LoggedFood> = (1..=12)
            .map(|i| logged(i, day((i % 4) as u32 + 1), &rice(), i as f64))
            .collect();
        let groups = group_by_day(&rows);

        let mut seen: Vec<i64> = groups
            .values()
            .flat_map(|g| {
                assert!(g.entries.iter().all(|r| r.entry.date == g.date));
                g.entries.iter().map(|r| r.entry.id)
            })
            .collect();
        seen.sort_unstable();
        let expected: Vec<i64> = rows.iter().map(|r| r.entry.id).collect();
        assert_eq!(seen, expected);

        let bucket_sum: Nutrients = groups.values().map(|g| g.totals).sum();
        assert_close(&bucket_sum, &summarize(&rows));
    }

    #[test]
    fn test_group_by_day_empty() {
        assert!(group_by_day(&[]).is_empty());
        assert!(daily_totals(&[]).is_empty());
    }

    #[test]
    fn test_daily_totals_ascending() {
        let rows = vec![
            logged(1, day(3), &egg(), 1.0),
            logged(2, day(1), &egg(), 1.0),
            logged(3, day(2), &egg(), 2.0),
        ];
        let days = daily_totals(&rows);
        let dates: Vec<NaiveDate> = days.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
        assert_eq!(days[1].entry_count, 1);
        assert!((days[1].totals.protein_g - 12.0).abs() < EPS);
    }

    #[test]
    fn test_macro_split() {
        let split = macro_split(&n(25.0, 50.0, 25.0, 3.0, 0.0));
        assert!((split.protein_pct - 25.0).abs() < EPS);
        assert!((split.carbs_pct - 50.0).abs() < EPS);
        assert!((split.fat_pct - 25.0).abs() < EPS);

        assert_eq!(macro_split(&Nutrients::ZERO), MacroSplit::default());
    }

    #[test]
    fn test_to_resolved_carries_totals() {
        let row = logged(7, day(1), &rice(), 150.0);
        let resolved = row.to_resolved();
        assert_eq!(resolved.entry_id, 7);
        assert_eq!(resolved.food_name, "Rice (cooked)");
        assert_eq!(resolved.unit_kind, UnitKind::PerHundredGrams);
        assert!((resolved.totals.calories - 195.0).abs() < EPS);
    }
}
