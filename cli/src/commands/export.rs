use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use nutrilog_core::service::Tracker;

pub(crate) fn cmd_export_foods(
    tracker: &Tracker,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    export_to(output, json, "foods", |w| Ok(tracker.export_foods_csv(w)?))
}

pub(crate) fn cmd_export_entries(
    tracker: &Tracker,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    export_to(output, json, "entries", |w| Ok(tracker.export_entries_csv(w)?))
}

/// Run `write` against the output file, or stdout when no path is given.
fn export_to<F>(output: Option<&Path>, json: bool, what: &str, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<usize>,
{
    let Some(path) = output else {
        let mut lock = io::stdout().lock();
        let out: &mut dyn Write = &mut lock;
        write(out)?;
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let rows = write(&mut writer as &mut dyn Write)?;
    writer
        .flush()
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "exported": what, "rows": rows, "path": path.display().to_string() })
        );
    } else {
        eprintln!("Exported {rows} {what} to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutrilog_core::models::{FoodInput, UnitKind};

    #[test]
    fn test_export_foods_to_file() {
        let tracker = Tracker::open_in_memory().unwrap();
        tracker
            .upsert_food(&FoodInput {
                name: "Banana".to_string(),
                unit_kind: Some(UnitKind::PerPiece),
                protein_g: Some(1.3),
                carbs_g: Some(27.0),
                fat_g: Some(0.3),
                fiber_g: Some(3.1),
                calories: Some(105.0),
            })
            .unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("foods.csv");
        cmd_export_foods(&tracker, Some(&path), false).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,name,unit,protein,carbs,fat,fiber,calories");
        assert_eq!(lines[1], "1,Banana,per_piece,1.3,27.0,0.3,3.1,105.0");
    }

    #[test]
    fn test_export_entries_to_file_skips_dangling() {
        let tracker = Tracker::open_in_memory().unwrap();
        tracker.import_starter_foods().unwrap();
        let date = chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let egg = tracker.get_food_by_name("Egg (whole)").unwrap();
        let banana = tracker.get_food_by_name("Banana").unwrap();
        tracker.log_food(date, egg.id, 2.0, None).unwrap();
        tracker.log_food(date, banana.id, 1.0, None).unwrap();
        tracker.delete_food(egg.id).unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("entries.csv");
        cmd_export_entries(&tracker, Some(&path), true).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains(",Banana,per_piece,1.0,"));
    }

    #[test]
    fn test_export_to_missing_dir_fails() {
        let tracker = Tracker::open_in_memory().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing").join("foods.csv");
        let err = cmd_export_foods(&tracker, Some(&path), false).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to create export file"));
    }
}
