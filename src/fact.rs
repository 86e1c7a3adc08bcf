//! Fact assembler: binds the enriched relation to every dimension.
//!
//! One generated statement left-joins the enriched relation to each
//! dimension on exact natural-key equality and carries over only the
//! surrogate key column. Rows with a null natural key get a NULL foreign
//! key for that axis; that is expected and not an error. What is an error
//! is fan-out: a dimension whose natural key is not unique would duplicate
//! fact rows, so uniqueness is probed before the join and the row count is
//! verified after it.

use anyhow::{bail, Result};

use crate::schema::{Dimension, DIMENSIONS};
use crate::store::{Session, FACT_TABLE};

/// Re-materialize the fact table from the enriched relation and the nine
/// built dimensions. Returns the fact row count.
pub fn assemble(session: &Session, source_table: &str) -> Result<u64> {
    for dim in DIMENSIONS {
        check_natural_key_unique(session, dim)?;
    }

    let source_count = session.row_count(source_table)?;

    let mut selects = vec!["e.*".to_string()];
    let mut joins = Vec::new();
    for (idx, dim) in DIMENSIONS.iter().enumerate() {
        let alias = format!("d{}", idx);
        selects.push(format!("{}.{}", alias, dim.key_column));
        let on = dim
            .natural_keys
            .iter()
            .map(|key| format!("e.{k} = {a}.{k}", k = key, a = alias))
            .collect::<Vec<_>>()
            .join(" AND ");
        joins.push(format!("LEFT JOIN {} {} ON {}", dim.table, alias, on));
    }

    session.execute(&format!(
        "DROP TABLE IF EXISTS {fact};\nCREATE TABLE {fact} AS\nSELECT {selects}\nFROM {src} e\n{joins};",
        fact = FACT_TABLE,
        selects = selects.join(", "),
        src = source_table,
        joins = joins.join("\n")
    ))?;

    let fact_count = session.row_count(FACT_TABLE)?;
    if fact_count != source_count {
        bail!(
            "Fact assembly fanned out rows: {} source rows became {} fact rows",
            source_count,
            fact_count
        );
    }

    Ok(fact_count)
}

/// Integrity probe: the natural key must identify exactly one dimension row.
fn check_natural_key_unique(session: &Session, dim: &Dimension) -> Result<()> {
    let naturals = dim.natural_keys.join(", ");
    let sql = format!(
        "SELECT COUNT(*) FROM (SELECT {cols} FROM {t} GROUP BY {cols} HAVING COUNT(*) > 1)",
        cols = naturals,
        t = dim.table
    );
    let duplicates: u64 = session.conn().query_row(&sql, [], |row| row.get(0))?;
    if duplicates > 0 {
        bail!(
            "Dimension {} has {} duplicated natural key value(s) ({}); joining it would duplicate fact rows",
            dim.table,
            duplicates,
            naturals
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension;
    use crate::loader::STAGE_TABLE;

    fn session_with_source() -> Session {
        let session = Session::open().unwrap();
        session
            .execute(&format!(
                "CREATE TABLE {t} (
                     name TEXT, discovery_year INTEGER, planet_type TEXT,
                     detection_method TEXT, distance REAL, stellar_magnitude REAL,
                     mass_multiplier REAL, orbital_period REAL, releasedate TEXT
                 );
                 INSERT INTO {t} VALUES
                     ('Kepler-1b', 2011, 'Gas Giant', 'Transit', 500.0, 12.0, 1.2, 3.5, '2012-01-01'),
                     ('HD 1', 1999, 'Super Earth', 'Radial Velocity', 50.0, 6.0, NULL, 400.0, NULL);",
                t = STAGE_TABLE
            ))
            .unwrap();
        session
    }

    #[test]
    fn test_assemble_attaches_foreign_keys() {
        let session = session_with_source();
        dimension::build_all(&session, STAGE_TABLE).unwrap();

        let count = assemble(&session, STAGE_TABLE).unwrap();
        assert_eq!(count, 2);

        // Null mass_multiplier propagates as a NULL foreign key
        let (mass_fk, era_fk): (Option<i64>, Option<i64>) = session
            .conn()
            .query_row(
                "SELECT mass_category_id, discovery_era_id FROM exoplanets WHERE name = 'HD 1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(mass_fk, None);
        assert!(era_fk.is_some());
    }

    #[test]
    fn test_duplicate_natural_key_is_rejected() {
        let session = session_with_source();
        dimension::build_all(&session, STAGE_TABLE).unwrap();
        session
            .execute(
                "INSERT INTO dim_planet_type (planet_type_id, planet_type)
                 SELECT planet_type_id + 10, planet_type FROM dim_planet_type;",
            )
            .unwrap();

        let err = assemble(&session, STAGE_TABLE).unwrap_err();
        assert!(err.to_string().contains("dim_planet_type"));
    }
}
