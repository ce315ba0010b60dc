//! Reading and writing delimited files.

use crate::error::{Result, ResultExt as _};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Load a CSV file with a header row.
///
/// Every token in `null_values` is read as null in every column; empty
/// fields are null as well. Column dtypes are inferred from the first
/// 10 000 rows and fixed up later by the datatype repair.
pub fn load_table(path: &Path, null_values: &[String]) -> Result<DataFrame> {
    let tokens: Vec<PlSmallStr> = null_values.iter().map(|t| t.as_str().into()).collect();

    let mut reader = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(10000))
        .with_has_header(true)
        .with_missing_is_null(true);
    if !tokens.is_empty() {
        reader = reader.with_null_values(Some(NullValues::AllColumns(tokens)));
    }

    let df = reader
        .finish()?
        .collect()
        .with_context(|| format!("Failed to read CSV {}", path.display()))?;

    info!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Write `df` as CSV with a header row, creating parent directories.
pub fn save_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("Failed to write CSV file {}", path.display()))?;
    Ok(())
}

/// `<dir>/<stem>_<suffix>.csv` next to `path`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table");
    path.with_file_name(format!("{stem}_{suffix}.csv"))
}

/// Default cleaned-output path for an input file.
pub fn cleaned_path(input: &Path) -> PathBuf {
    sibling(input, "cleaned")
}

/// Default duplicate review file: named after the input, placed next to
/// the output.
pub fn review_path(input: &Path, output: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table");
    output.with_file_name(format!("{stem}_duplicates.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_tokens_are_null() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bookings.csv");
        std::fs::write(&path, "agent,children,country\nNULL,2,PRT\n9,NA,\n")?;

        let nulls = vec!["NA".to_owned(), "NULL".to_owned()];
        let df = load_table(&path, &nulls)?;
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("agent")?.null_count(), 1);
        assert_eq!(df.column("children")?.null_count(), 1);
        assert_eq!(df.column("country")?.null_count(), 1);
        assert_eq!(df.column("agent")?.dtype(), &DataType::Int64);
        Ok(())
    }

    #[test]
    fn test_save_then_load_keeps_rows() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out").join("bookings_cleaned.csv");
        let mut df = df!(
            "hotel" => ["City Hotel", "Resort Hotel"],
            "adr" => [0.0, 75.5],
        )?;
        save_table(&mut df, &path)?;

        let loaded = load_table(&path, &[])?;
        assert!(loaded.equals_missing(&df));
        Ok(())
    }

    #[test]
    fn test_default_paths() {
        let input = Path::new("/data/hotel_bookings.csv");
        assert_eq!(
            cleaned_path(input),
            PathBuf::from("/data/hotel_bookings_cleaned.csv")
        );
        assert_eq!(
            review_path(input, Path::new("/out/clean.csv")),
            PathBuf::from("/out/hotel_bookings_duplicates.csv")
        );
    }
}
