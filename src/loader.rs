//! Source loader: CSV ingestion and enrichment joins.
//!
//! The primary catalog is loaded as-is with per-column type inference.
//! Supplementary catalogs are then joined in, one after another, each
//! against the already-enriched relation, on a case-insensitive equality
//! of a configured key pair. A missing or malformed file aborts the run.

use anyhow::{bail, Context, Result};
use csv::StringRecord;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Statement;
use std::path::{Path, PathBuf};

use crate::store::Session;

/// Staging table the primary catalog is loaded into and enriched in place
pub const STAGE_TABLE: &str = "stage_exoplanets";

const SCRATCH_TABLE: &str = "supplement_src";

/// A supplementary catalog and the key pair used to join it in
pub struct SupplementSpec {
    pub path: PathBuf,
    /// Join key column in the (already enriched) primary relation
    pub primary_key: String,
    /// Join key column in the supplementary source
    pub foreign_key: String,
}

impl SupplementSpec {
    /// The publication-date catalog convention: primary `name` vs `pl_name`
    pub fn publication_dates(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            primary_key: "name".to_string(),
            foreign_key: "pl_name".to_string(),
        }
    }
}

/// Inferred column affinity, widening INTEGER -> REAL -> TEXT
#[derive(Debug, Clone, Copy, PartialEq)]
enum Inferred {
    Integer,
    Real,
    Text,
}

impl Inferred {
    fn sql_type(self) -> &'static str {
        match self {
            Inferred::Integer => "INTEGER",
            Inferred::Real => "REAL",
            Inferred::Text => "TEXT",
        }
    }
}

enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    fn bind_to(&self, idx: usize, stmt: &mut Statement) -> rusqlite::Result<()> {
        match self {
            SqlValue::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
            SqlValue::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            SqlValue::Real(f) => stmt.raw_bind_parameter(idx, f)?,
            SqlValue::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
        }
        Ok(())
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Load a delimited source file into a fresh table, inferring column types
/// from the data. Returns the number of rows imported.
pub fn load_csv(session: &Session, table: &str, path: &Path) -> Result<u64> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open source file {:?}", path))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {:?}", path))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() {
        bail!("Source file {:?} has an empty header row", path);
    }

    let mut records: Vec<StringRecord> = Vec::new();
    for record in reader.records() {
        let record =
            record.with_context(|| format!("Malformed record in source file {:?}", path))?;
        records.push(record);
    }

    let types = infer_types(&headers, &records);

    let column_defs: Vec<String> = headers
        .iter()
        .zip(&types)
        .map(|(name, ty)| format!("    {} {}", quote_ident(name), ty.sql_type()))
        .collect();
    session.execute(&format!(
        "DROP TABLE IF EXISTS {t};\nCREATE TABLE {t} (\n{cols}\n);",
        t = table,
        cols = column_defs.join(",\n")
    ))?;

    let placeholders: Vec<&str> = headers.iter().map(|_| "?").collect();
    let insert_sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        headers
            .iter()
            .map(|h| quote_ident(h))
            .collect::<Vec<_>>()
            .join(", "),
        placeholders.join(", ")
    );

    let progress = ProgressBar::new(records.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{msg:30} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap()
            .progress_chars("=>-"),
    );
    progress.set_message(table.to_string());

    let tx = session.conn().unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(&insert_sql)?;
        for record in &records {
            for (col_idx, (field, ty)) in record.iter().zip(&types).enumerate() {
                parse_field(field, *ty).bind_to(col_idx + 1, &mut stmt)?;
            }
            stmt.raw_execute()?;
            progress.inc(1);
        }
    }
    tx.commit()?;
    progress.finish_with_message(format!("{}: {} rows", table, records.len()));

    Ok(records.len() as u64)
}

fn infer_types(headers: &[String], records: &[StringRecord]) -> Vec<Inferred> {
    let mut types = vec![Inferred::Integer; headers.len()];
    let mut seen = vec![false; headers.len()];

    for record in records {
        for (idx, field) in record.iter().enumerate() {
            let field = field.trim();
            if field.is_empty() || idx >= types.len() {
                continue;
            }
            seen[idx] = true;
            types[idx] = match types[idx] {
                Inferred::Integer if field.parse::<i64>().is_ok() => Inferred::Integer,
                Inferred::Integer | Inferred::Real if field.parse::<f64>().is_ok() => {
                    Inferred::Real
                }
                _ => Inferred::Text,
            };
        }
    }

    // A column with no values at all stays TEXT
    for (ty, seen) in types.iter_mut().zip(seen) {
        if !seen {
            *ty = Inferred::Text;
        }
    }
    types
}

fn parse_field(field: &str, ty: Inferred) -> SqlValue {
    let field = field.trim();
    if field.is_empty() {
        return SqlValue::Null;
    }
    match ty {
        Inferred::Integer => field
            .parse::<i64>()
            .map(SqlValue::Integer)
            .unwrap_or(SqlValue::Null),
        Inferred::Real => field
            .parse::<f64>()
            .map(SqlValue::Real)
            .unwrap_or(SqlValue::Null),
        Inferred::Text => SqlValue::Text(field.to_string()),
    }
}

/// Join one supplementary source into the base relation. All non-key
/// supplementary columns are appended to every base row; rows without a
/// match keep NULLs. The join is a case-insensitive exact match, so later
/// supplements see the columns earlier ones introduced.
pub fn enrich(session: &Session, base_table: &str, supp: &SupplementSpec) -> Result<()> {
    load_csv(session, SCRATCH_TABLE, &supp.path)?;

    let base_cols = session.table_columns(base_table)?;
    if !base_cols.iter().any(|c| *c == supp.primary_key) {
        bail!(
            "Join key column '{}' not found in relation {} (columns: {})",
            supp.primary_key,
            base_table,
            base_cols.join(", ")
        );
    }
    let supp_cols = session.table_columns(SCRATCH_TABLE)?;
    if !supp_cols.iter().any(|c| *c == supp.foreign_key) {
        bail!(
            "Join key column '{}' not found in supplementary source {:?}",
            supp.foreign_key,
            supp.path
        );
    }

    let carried: Vec<String> = supp_cols
        .iter()
        .filter(|c| **c != supp.foreign_key)
        .cloned()
        .collect();
    if let Some(clash) = carried.iter().find(|c| base_cols.contains(*c)) {
        bail!(
            "Supplementary column '{}' from {:?} already exists in the enriched relation",
            clash,
            supp.path
        );
    }

    let select_supp: Vec<String> = carried
        .iter()
        .map(|c| format!("s.{}", quote_ident(c)))
        .collect();

    session.execute(&format!(
        "CREATE TABLE {base}_enriched AS
         SELECT e.*, {supp_cols}
         FROM {base} e
         LEFT JOIN {scratch} s ON LOWER(e.{pk}) = LOWER(s.{fk});
         DROP TABLE {base};
         ALTER TABLE {base}_enriched RENAME TO {base};
         DROP TABLE {scratch};",
        base = base_table,
        scratch = SCRATCH_TABLE,
        supp_cols = select_supp.join(", "),
        pk = quote_ident(&supp.primary_key),
        fk = quote_ident(&supp.foreign_key),
    ))?;

    Ok(())
}

/// Fail fast if any expected column is missing from the loaded relation,
/// instead of letting downstream builds produce all-null output.
pub fn check_columns(session: &Session, table: &str, required: &[&str]) -> Result<()> {
    let present = session.table_columns(table)?;
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|c| !present.iter().any(|p| p.as_str() == *c))
        .collect();
    if !missing.is_empty() {
        bail!(
            "Relation {} is missing expected column(s): {}",
            table,
            missing.join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_types_widening() {
        let headers: Vec<String> = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        let records = vec![
            StringRecord::from(vec!["1", "1.5", "x", ""]),
            StringRecord::from(vec!["2", "3", "2", ""]),
        ];
        let types = infer_types(&headers, &records);
        assert_eq!(
            types,
            vec![
                Inferred::Integer,
                Inferred::Real,
                Inferred::Text,
                Inferred::Text
            ]
        );
    }

    #[test]
    fn test_parse_field_null_on_empty() {
        assert!(matches!(parse_field("  ", Inferred::Real), SqlValue::Null));
        assert!(matches!(
            parse_field("2.5", Inferred::Real),
            SqlValue::Real(_)
        ));
        assert!(matches!(
            parse_field("12", Inferred::Integer),
            SqlValue::Integer(12)
        ));
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("name"), "\"name\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
