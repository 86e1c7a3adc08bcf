//! Bucket classifiers for the binned dimension axes.
//!
//! Every function is total and deterministic: thresholds are fixed, tested
//! in ascending order, first match wins, and boundary values use strict `<`
//! so each boundary belongs to the bucket above it. Null attributes never
//! reach these functions; the dimension builder filters nulls out before
//! key assignment.

pub fn mass_category(mass_multiplier: f64) -> &'static str {
    if mass_multiplier < 0.1 {
        "Very Low Mass"
    } else if mass_multiplier < 1.0 {
        "Low Mass"
    } else if mass_multiplier < 5.0 {
        "Medium Mass"
    } else if mass_multiplier < 20.0 {
        "High Mass"
    } else {
        "Very High Mass"
    }
}

pub fn distance_category(distance: f64) -> &'static str {
    if distance < 10.0 {
        "Very Close (<10 ly)"
    } else if distance < 100.0 {
        "Close (<100 ly)"
    } else if distance < 1000.0 {
        "Medium (<1000 ly)"
    } else {
        "Far (>1000 ly)"
    }
}

pub fn orbit_category(orbital_period: f64) -> &'static str {
    if orbital_period < 10.0 {
        "Very Short"
    } else if orbital_period < 100.0 {
        "Short"
    } else if orbital_period < 1000.0 {
        "Moderate"
    } else {
        "Long"
    }
}

pub fn brightness_category(stellar_magnitude: f64) -> &'static str {
    if stellar_magnitude < 5.0 {
        "Very Bright"
    } else if stellar_magnitude < 10.0 {
        "Bright"
    } else if stellar_magnitude < 15.0 {
        "Dim"
    } else {
        "Very Dim"
    }
}

pub fn discovery_era(discovery_year: f64) -> &'static str {
    if discovery_year < 2000.0 {
        "<2000"
    } else if discovery_year < 2010.0 {
        "Early 21st Century"
    } else if discovery_year < 2020.0 {
        "Kepler Era"
    } else {
        "Modern Era"
    }
}

/// Older brightness rule attached to the stellar_type axis. Uses different
/// thresholds than `brightness_category`; the two axes are independent and
/// intentionally not reconciled.
pub fn stellar_brightness(stellar_magnitude: f64) -> &'static str {
    if stellar_magnitude < 0.0 {
        "very bright"
    } else if stellar_magnitude < 2.0 {
        "bright"
    } else if stellar_magnitude < 5.0 {
        "moderate"
    } else if stellar_magnitude < 10.0 {
        "dim"
    } else {
        "very dim"
    }
}
