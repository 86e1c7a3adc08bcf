//! Axis descriptors for the nine dimension tables of the star schema

use super::types::*;
use crate::category;

pub static PLANET_TYPE: Dimension = Dimension {
    table: "dim_planet_type",
    key_column: "planet_type_id",
    natural_keys: &["planet_type"],
    natural_types: &[ColType::Text],
    label: None,
    calendar: false,
};

pub static DETECTION_METHOD: Dimension = Dimension {
    table: "dim_detection_method",
    key_column: "detection_method_id",
    natural_keys: &["detection_method"],
    natural_types: &[ColType::Text],
    label: None,
    calendar: false,
};

// The brightness rule here predates dim_brightness_category and uses
// different thresholds. Both axes exist in the source model; they must
// stay independent (see dim_brightness_category below).
pub static STELLAR_TYPE: Dimension = Dimension {
    table: "dim_stellar_type",
    key_column: "stellar_type_id",
    natural_keys: &["distance", "stellar_magnitude"],
    natural_types: &[ColType::Real, ColType::Real],
    label: Some(Label {
        column: "brightness_class",
        source: "stellar_magnitude",
        classify: category::stellar_brightness,
    }),
    calendar: false,
};

pub static MASS_CATEGORY: Dimension = Dimension {
    table: "dim_mass_category",
    key_column: "mass_category_id",
    natural_keys: &["mass_multiplier"],
    natural_types: &[ColType::Real],
    label: Some(Label {
        column: "mass_category",
        source: "mass_multiplier",
        classify: category::mass_category,
    }),
    calendar: false,
};

pub static DISTANCE_CATEGORY: Dimension = Dimension {
    table: "dim_distance_category",
    key_column: "distance_category_id",
    natural_keys: &["distance"],
    natural_types: &[ColType::Real],
    label: Some(Label {
        column: "distance_category",
        source: "distance",
        classify: category::distance_category,
    }),
    calendar: false,
};

pub static ORBIT_CATEGORY: Dimension = Dimension {
    table: "dim_orbit_category",
    key_column: "orbit_category_id",
    natural_keys: &["orbital_period"],
    natural_types: &[ColType::Real],
    label: Some(Label {
        column: "period_class",
        source: "orbital_period",
        classify: category::orbit_category,
    }),
    calendar: false,
};

pub static BRIGHTNESS_CATEGORY: Dimension = Dimension {
    table: "dim_brightness_category",
    key_column: "brightness_category_id",
    natural_keys: &["stellar_magnitude"],
    natural_types: &[ColType::Real],
    label: Some(Label {
        column: "brightness_category",
        source: "stellar_magnitude",
        classify: category::brightness_category,
    }),
    calendar: false,
};

pub static DISCOVERY_ERA: Dimension = Dimension {
    table: "dim_discovery_era",
    key_column: "discovery_era_id",
    natural_keys: &["discovery_year"],
    natural_types: &[ColType::Integer],
    label: Some(Label {
        column: "discovery_era",
        source: "discovery_year",
        classify: category::discovery_era,
    }),
    calendar: false,
};

pub static DATE: Dimension = Dimension {
    table: "dim_date",
    key_column: "date_id",
    natural_keys: &["releasedate"],
    natural_types: &[ColType::Text],
    label: None,
    calendar: true,
};

/// All dimensions, in build order
pub static DIMENSIONS: &[&Dimension] = &[
    &PLANET_TYPE,
    &DETECTION_METHOD,
    &STELLAR_TYPE,
    &MASS_CATEGORY,
    &DISTANCE_CATEGORY,
    &ORBIT_CATEGORY,
    &BRIGHTNESS_CATEGORY,
    &DISCOVERY_ERA,
    &DATE,
];

pub fn get_dimension(table: &str) -> Option<&'static Dimension> {
    DIMENSIONS.iter().find(|d| d.table == table).copied()
}

pub fn dimension_names() -> Vec<&'static str> {
    DIMENSIONS.iter().map(|d| d.table).collect()
}

/// Distinct source columns every dimension build depends on; the loader
/// checks these exist before any dimension is built.
pub fn required_source_columns() -> Vec<&'static str> {
    let mut cols: Vec<&'static str> = DIMENSIONS
        .iter()
        .flat_map(|d| d.natural_keys.iter().copied())
        .collect();
    cols.sort_unstable();
    cols.dedup();
    cols
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_dimensions() {
        assert_eq!(DIMENSIONS.len(), 9);
    }

    #[test]
    fn test_table_names_unique() {
        let mut names = dimension_names();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), DIMENSIONS.len());
    }

    #[test]
    fn test_descriptor_shapes() {
        for dim in DIMENSIONS {
            assert!(!dim.natural_keys.is_empty(), "{} has no natural key", dim.table);
            assert_eq!(
                dim.natural_keys.len(),
                dim.natural_types.len(),
                "{} key/type arity mismatch",
                dim.table
            );
            if dim.label.is_some() {
                assert!(
                    dim.label_source_index().is_some(),
                    "{} label source is not a natural key",
                    dim.table
                );
            }
        }
    }

    #[test]
    fn test_get_dimension() {
        assert!(get_dimension("dim_mass_category").is_some());
        assert!(get_dimension("dim_unknown").is_none());
    }

    #[test]
    fn test_required_source_columns() {
        let cols = required_source_columns();
        assert!(cols.contains(&"distance"));
        assert!(cols.contains(&"releasedate"));
        // distance and stellar_magnitude each feed two axes but appear once
        assert_eq!(cols.iter().filter(|c| **c == "distance").count(), 1);
    }
}
