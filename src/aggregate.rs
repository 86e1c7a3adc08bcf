//! Grouped-count aggregates over the persisted star schema.
//!
//! Each aggregate joins the fact table to its dimensions on surrogate
//! foreign keys, groups by the dimension label columns, counts rows and
//! orders deterministically (count descending for the ranked view, natural
//! axis order for timelines and categorical views). Inner joins mean rows
//! with a NULL foreign key on a joined axis are excluded; that is the
//! documented null-propagation behavior, not data loss.
//!
//! Every aggregate is materialized into its own table and exported to its
//! own file under `results/`; aggregates are never merged and each is
//! reproducible from the fact and dimension tables alone.

use anyhow::{Context, Result};

use crate::store::{export_table, Session, StoreLayout};

pub struct Aggregate {
    /// Result table and file name
    pub name: &'static str,
    pub sql: &'static str,
}

pub static AGGREGATES: &[Aggregate] = &[
    Aggregate {
        name: "planets_era_detection_method",
        sql: "SELECT de.discovery_era, dm.detection_method, COUNT(*) AS num_planets
              FROM exoplanets e
              JOIN dim_discovery_era de ON e.discovery_era_id = de.discovery_era_id
              JOIN dim_detection_method dm ON e.detection_method_id = dm.detection_method_id
              GROUP BY de.discovery_era, dm.detection_method
              ORDER BY num_planets DESC",
    },
    Aggregate {
        name: "planets_discovery_year_count_timeline",
        sql: "SELECT de.discovery_year, COUNT(*) AS num_planets
              FROM exoplanets e
              JOIN dim_discovery_era de ON e.discovery_era_id = de.discovery_era_id
              GROUP BY de.discovery_year
              ORDER BY de.discovery_year",
    },
    Aggregate {
        name: "exoplanet_discovery_count_by_year",
        sql: "SELECT de.discovery_year, dp.planet_type, COUNT(*) AS num_planets
              FROM exoplanets e
              JOIN dim_discovery_era de ON e.discovery_era_id = de.discovery_era_id
              JOIN dim_planet_type dp ON e.planet_type_id = dp.planet_type_id
              GROUP BY de.discovery_year, dp.planet_type
              ORDER BY de.discovery_year",
    },
    Aggregate {
        name: "exoplanet_detection_method_count_by_year",
        sql: "SELECT de.discovery_year, dm.detection_method, COUNT(*) AS num_planets
              FROM exoplanets e
              JOIN dim_discovery_era de ON e.discovery_era_id = de.discovery_era_id
              JOIN dim_detection_method dm ON e.detection_method_id = dm.detection_method_id
              GROUP BY de.discovery_year, dm.detection_method
              ORDER BY de.discovery_year",
    },
    Aggregate {
        name: "exoplanet_distance_cat_type_count",
        sql: "SELECT dd.distance_category, dp.planet_type, COUNT(*) AS num_planets
              FROM exoplanets e
              JOIN dim_distance_category dd ON e.distance_category_id = dd.distance_category_id
              JOIN dim_planet_type dp ON e.planet_type_id = dp.planet_type_id
              GROUP BY dp.planet_type, dd.distance_category
              ORDER BY dp.planet_type",
    },
    Aggregate {
        name: "exoplanet_distance_cat_brightness_cat_count",
        sql: "SELECT dd.distance_category, db.brightness_category, COUNT(*) AS num_planets
              FROM exoplanets e
              JOIN dim_distance_category dd ON e.distance_category_id = dd.distance_category_id
              JOIN dim_brightness_category db ON e.brightness_category_id = db.brightness_category_id
              GROUP BY dd.distance_category, db.brightness_category
              ORDER BY dd.distance_category",
    },
    Aggregate {
        name: "exoplanet_planet_type_orbit_period_count",
        sql: "SELECT dp.planet_type, oc.period_class, COUNT(*) AS num_planets
              FROM exoplanets e
              JOIN dim_planet_type dp ON e.planet_type_id = dp.planet_type_id
              JOIN dim_orbit_category oc ON e.orbit_category_id = oc.orbit_category_id
              GROUP BY dp.planet_type, oc.period_class
              ORDER BY dp.planet_type",
    },
];

pub fn aggregate_names() -> Vec<&'static str> {
    AGGREGATES.iter().map(|a| a.name).collect()
}

/// Run every aggregate against the session's fact/dimension views and
/// export each to its own file under `results/`. Returns (name, row count).
pub fn run_all(session: &Session, layout: &StoreLayout) -> Result<Vec<(&'static str, u64)>> {
    let mut produced = Vec::with_capacity(AGGREGATES.len());
    for agg in AGGREGATES {
        let count = run_one(session, layout, agg)
            .with_context(|| format!("Failed to produce aggregate {}", agg.name))?;
        produced.push((agg.name, count));
    }
    Ok(produced)
}

fn run_one(session: &Session, layout: &StoreLayout, agg: &Aggregate) -> Result<u64> {
    session.execute(&format!(
        "DROP TABLE IF EXISTS {t};\nCREATE TABLE {t} AS {sql};",
        t = agg.name,
        sql = agg.sql
    ))?;
    let count = session.row_count(agg.name)?;
    export_table(session, agg.name, &layout.result_path(agg.name))?;
    session.execute(&format!("DROP TABLE {};", agg.name))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seven_aggregates_with_unique_names() {
        assert_eq!(AGGREGATES.len(), 7);
        let mut names = aggregate_names();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), AGGREGATES.len());
    }

    #[test]
    fn test_aggregates_join_on_surrogate_keys() {
        for agg in AGGREGATES {
            assert!(agg.sql.contains("FROM exoplanets"), "{}", agg.name);
            assert!(agg.sql.contains("COUNT(*)"), "{}", agg.name);
            // every join condition is a foreign key equality, never a raw value
            for line in agg.sql.lines().filter(|l| l.contains(" ON ")) {
                assert!(line.contains("_id ="), "non-key join in {}: {}", agg.name, line);
            }
        }
    }
}
