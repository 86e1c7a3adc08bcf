//! Persistence layer: engine session handle and the on-disk table store.
//!
//! Every pipeline stage works against an explicit [`Session`] instead of a
//! shared global connection, so two independent runs can coexist in one
//! process (the analysis stage always opens its own session and sees only
//! the persisted files, never the ETL session's tables).
//!
//! The store holds one SQLite database file per table: the fact table at the
//! store root, dimensions under `dimensions/`, aggregates under `results/`.

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

use crate::schema::DIMENSIONS;

/// Fact table name, in the engine and in the store
pub const FACT_TABLE: &str = "exoplanets";

/// One engine session. Owns a private in-memory database.
pub struct Session {
    conn: Connection,
}

impl Session {
    pub fn open() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open engine session")?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn execute(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .with_context(|| format!("Statement failed: {}", sql))?;
        Ok(())
    }

    pub fn row_count(&self, table: &str) -> Result<u64> {
        let count: u64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .with_context(|| format!("Failed to count rows in {}", table))?;
        Ok(count)
    }

    /// Column names of a table, in declaration order
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", table))
            .with_context(|| format!("Failed to inspect table {}", table))?;
        let cols = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if cols.is_empty() {
            return Err(anyhow!("Table {} does not exist", table));
        }
        Ok(cols)
    }
}

/// Directory layout of the persisted star schema and aggregate results
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fact_path(&self) -> PathBuf {
        self.root.join(format!("{}.db", FACT_TABLE))
    }

    pub fn dimension_path(&self, table: &str) -> PathBuf {
        self.root.join("dimensions").join(format!("{}.db", table))
    }

    pub fn result_path(&self, name: &str) -> PathBuf {
        self.root.join("results").join(format!("{}.db", name))
    }

    /// Path for a table by name, fact or dimension
    pub fn table_path(&self, table: &str) -> PathBuf {
        if table == FACT_TABLE {
            self.fact_path()
        } else {
            self.dimension_path(table)
        }
    }
}

/// Serialize one table to its own database file, replacing any previous file.
///
/// The copy goes through a short-lived separate connection rather than an
/// ATTACH on the session: the analysis session already holds one attachment
/// per store file, which fills SQLite's attach limit, so exporting must not
/// consume a slot of its own.
pub fn export_table(session: &Session, table: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    // Full-rebuild semantics: a stale file is removed, never appended to
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to replace {:?}", path))?;
    }

    let create_sql: String = session
        .conn()
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .with_context(|| format!("No table {} to export", table))?;

    let target =
        Connection::open(path).with_context(|| format!("Failed to create store file {:?}", path))?;
    target
        .execute(&create_sql, [])
        .with_context(|| format!("Failed to create table {} in {:?}", table, path))?;

    let ncols = session.table_columns(table)?.len();
    let mut select = session
        .conn()
        .prepare(&format!("SELECT * FROM {}", table))?;
    let rows = select.query_map([], |row| {
        (0..ncols)
            .map(|i| row.get::<_, rusqlite::types::Value>(i))
            .collect::<rusqlite::Result<Vec<_>>>()
    })?;

    let placeholders = vec!["?"; ncols].join(", ");
    let tx = target.unchecked_transaction()?;
    {
        let mut insert = tx.prepare(&format!("INSERT INTO {} VALUES ({})", table, placeholders))?;
        for row in rows {
            for (idx, value) in row?.iter().enumerate() {
                insert.raw_bind_parameter(idx + 1, value)?;
            }
            insert.raw_execute()?;
        }
    }
    tx.commit()
        .with_context(|| format!("Failed to export table {}", table))?;

    Ok(())
}

/// Expose every persisted fact/dimension file as a read-only temp view in
/// the given session, named like the original table.
pub fn import_views(session: &Session, layout: &StoreLayout) -> Result<()> {
    let mut tables = vec![FACT_TABLE];
    tables.extend(DIMENSIONS.iter().map(|d| d.table));

    for table in tables {
        let path = layout.table_path(table);
        if !path.exists() {
            return Err(anyhow!(
                "Store file {:?} not found; run the etl stage first",
                path
            ));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("Non-UTF-8 store path: {:?}", path))?;
        let alias = format!("store_{}", table);
        session
            .conn()
            .execute(&format!("ATTACH DATABASE ?1 AS {}", alias), [path_str])
            .with_context(|| format!("Failed to attach {:?}", path))?;
        session.execute(&format!(
            "CREATE TEMP VIEW {t} AS SELECT * FROM {alias}.{t};",
            t = table,
            alias = alias
        ))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = StoreLayout::new("/tmp/mart");
        assert_eq!(layout.fact_path(), PathBuf::from("/tmp/mart/exoplanets.db"));
        assert_eq!(
            layout.dimension_path("dim_date"),
            PathBuf::from("/tmp/mart/dimensions/dim_date.db")
        );
        assert_eq!(
            layout.result_path("planets_era_detection_method"),
            PathBuf::from("/tmp/mart/results/planets_era_detection_method.db")
        );
        assert_eq!(layout.table_path(FACT_TABLE), layout.fact_path());
        assert_eq!(
            layout.table_path("dim_planet_type"),
            layout.dimension_path("dim_planet_type")
        );
    }

    #[test]
    fn test_export_does_not_need_an_attach_slot() {
        let dir = tempfile::TempDir::new().unwrap();
        let session = Session::open().unwrap();
        session
            .execute("CREATE TABLE t (a INTEGER, b TEXT); INSERT INTO t VALUES (1, 'x'), (2, NULL);")
            .unwrap();

        // occupy every attachment slot, as the analysis session does with
        // the fact file plus nine dimension files
        for i in 0..10 {
            let slot = dir.path().join(format!("slot{}.db", i));
            session
                .conn()
                .execute(
                    &format!("ATTACH DATABASE ?1 AS slot{}", i),
                    [slot.to_str().unwrap()],
                )
                .unwrap();
        }

        let out = dir.path().join("out.db");
        export_table(&session, "t", &out).unwrap();

        let conn = Connection::open(&out).unwrap();
        let rows: Vec<(i64, Option<String>)> = conn
            .prepare("SELECT a, b FROM t ORDER BY a")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(rows, vec![(1, Some("x".to_string())), (2, None)]);
    }

    #[test]
    fn test_session_round_trip() {
        let session = Session::open().unwrap();
        session
            .execute("CREATE TABLE t (a INTEGER, b TEXT); INSERT INTO t VALUES (1, 'x');")
            .unwrap();
        assert_eq!(session.row_count("t").unwrap(), 1);
        assert_eq!(session.table_columns("t").unwrap(), vec!["a", "b"]);
        assert!(session.table_columns("missing").is_err());
    }
}
