//! Dimension builder: one data-driven loop over the axis descriptors.
//!
//! For every axis: project the distinct non-null natural-key combinations,
//! sort them by the natural key, and assign surrogate keys 1..n in that
//! order. The explicit sort makes key assignment reproducible across runs
//! on unchanged input. Labels are computed in Rust by the axis classifier;
//! the calendar axis additionally derives its date parts from the parsed
//! release date rather than copying them from the source.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use rusqlite::types::Value;

use crate::schema::{Dimension, DIMENSIONS};
use crate::store::Session;

/// Build every dimension table from the enriched relation. Returns
/// (table, row count) per dimension, in build order.
pub fn build_all(session: &Session, source_table: &str) -> Result<Vec<(&'static str, u64)>> {
    let mut built = Vec::with_capacity(DIMENSIONS.len());
    for dim in DIMENSIONS {
        let count = build_dimension(session, source_table, dim)
            .with_context(|| format!("Failed to build dimension {}", dim.table))?;
        built.push((dim.table, count));
    }
    Ok(built)
}

/// Build one dimension table. Replaces any previous build.
pub fn build_dimension(session: &Session, source_table: &str, dim: &Dimension) -> Result<u64> {
    let naturals = dim.natural_keys.join(", ");
    let not_null = dim
        .natural_keys
        .iter()
        .map(|c| format!("{} IS NOT NULL", c))
        .collect::<Vec<_>>()
        .join(" AND ");

    // Deterministic enumeration: distinct naturals in natural-key order
    let select_sql = format!(
        "SELECT DISTINCT {cols} FROM {src} WHERE {not_null} ORDER BY {cols}",
        cols = naturals,
        src = source_table,
        not_null = not_null
    );
    let mut stmt = session.conn().prepare(&select_sql)?;
    let arity = dim.natural_keys.len();
    let rows: Vec<Vec<Value>> = stmt
        .query_map([], |row| {
            (0..arity).map(|i| row.get::<_, Value>(i)).collect()
        })?
        .collect::<rusqlite::Result<_>>()?;

    create_table(session, dim)?;

    let insert_sql = insert_statement(dim);
    let tx = session.conn().unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(&insert_sql)?;
        for (idx, row) in rows.iter().enumerate() {
            let mut param = 1;
            stmt.raw_bind_parameter(param, (idx + 1) as i64)?;
            param += 1;
            for value in row {
                stmt.raw_bind_parameter(param, value)?;
                param += 1;
            }
            if let Some(label) = dim.label {
                let source_idx = dim.label_source_index().ok_or_else(|| {
                    anyhow!(
                        "Label source column {} is not a natural key of {}",
                        label.source,
                        dim.table
                    )
                })?;
                let value = numeric(&row[source_idx], dim.table, label.source)?;
                stmt.raw_bind_parameter(param, (label.classify)(value))?;
                param += 1;
            }
            if dim.calendar {
                let raw = text(&row[0], dim.table, dim.natural_keys[0])?;
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| {
                    format!("Unparseable release date '{}' in {}", raw, source_table)
                })?;
                stmt.raw_bind_parameter(param, date.format("%Y-%m-%d").to_string())?;
                stmt.raw_bind_parameter(param + 1, date.year() as i64)?;
                stmt.raw_bind_parameter(param + 2, date.month() as i64)?;
                stmt.raw_bind_parameter(param + 3, date.format("%B").to_string())?;
                stmt.raw_bind_parameter(param + 4, date.day() as i64)?;
                stmt.raw_bind_parameter(param + 5, date.format("%A").to_string())?;
            }
            stmt.raw_execute()?;
        }
    }
    tx.commit()?;

    Ok(rows.len() as u64)
}

fn create_table(session: &Session, dim: &Dimension) -> Result<()> {
    let mut columns = vec![format!("    {} INTEGER PRIMARY KEY", dim.key_column)];
    for (name, ty) in dim.natural_keys.iter().zip(dim.natural_types) {
        columns.push(format!("    {} {}", name, ty.sql_type()));
    }
    if let Some(label) = dim.label {
        columns.push(format!("    {} TEXT", label.column));
    }
    if dim.calendar {
        columns.push("    date TEXT".to_string());
        columns.push("    year INTEGER".to_string());
        columns.push("    month INTEGER".to_string());
        columns.push("    month_name TEXT".to_string());
        columns.push("    day INTEGER".to_string());
        columns.push("    weekday_name TEXT".to_string());
    }

    session.execute(&format!(
        "DROP TABLE IF EXISTS {t};\nCREATE TABLE {t} (\n{cols}\n);",
        t = dim.table,
        cols = columns.join(",\n")
    ))
}

fn insert_statement(dim: &Dimension) -> String {
    let mut columns = vec![dim.key_column];
    columns.extend(dim.natural_keys);
    if let Some(label) = dim.label {
        columns.push(label.column);
    }
    if dim.calendar {
        columns.extend(["date", "year", "month", "month_name", "day", "weekday_name"]);
    }
    let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        dim.table,
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn numeric(value: &Value, table: &str, column: &str) -> Result<f64> {
    match value {
        Value::Integer(i) => Ok(*i as f64),
        Value::Real(f) => Ok(*f),
        other => bail!(
            "Expected a numeric value for {}.{}, got {:?}",
            table,
            column,
            other
        ),
    }
}

fn text<'a>(value: &'a Value, table: &str, column: &str) -> Result<&'a str> {
    match value {
        Value::Text(s) => Ok(s.as_str()),
        other => bail!(
            "Expected a text value for {}.{}, got {:?}",
            table,
            column,
            other
        ),
    }
}
