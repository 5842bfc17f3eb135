//! # Diff Engine
//!
//! Pure functions comparing desired parameters with observed AWS state.
//!
//! Each kind exposes `late_initialize` (fill unset desired fields from AWS, never
//! overwrite) and an up-to-date check. Replication groups additionally classify
//! drift into the one update class AWS can apply next.

pub mod cache_cluster;
pub mod cache_subnet_group;
pub mod provisioned_product;
pub mod replication_group;
pub mod tags;

use std::collections::BTreeSet;

pub use tags::{diff_tags, TagDiff};

/// Copy `observed` into an unset `desired`. Returns whether `desired` changed.
pub fn late_init<T>(desired: &mut Option<T>, observed: Option<T>) -> bool {
    if desired.is_none() && observed.is_some() {
        *desired = observed;
        return true;
    }
    false
}

/// Copy `observed` into an empty `desired` list.
pub fn late_init_vec<T: Clone>(desired: &mut Vec<T>, observed: &[T]) -> bool {
    if desired.is_empty() && !observed.is_empty() {
        *desired = observed.to_vec();
        return true;
    }
    false
}

/// Copy `observed` into an empty required string.
pub fn late_init_string(desired: &mut String, observed: Option<&str>) -> bool {
    match observed {
        Some(o) if desired.is_empty() && !o.is_empty() => {
            *desired = o.to_string();
            true
        }
        _ => false,
    }
}

/// Order-insensitive comparison of string lists.
pub fn string_set_equal(a: &[String], b: &[String]) -> bool {
    a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
}

/// Numeric comparison where an unset value equals zero.
pub fn int_equal_default_zero(desired: Option<i32>, observed: Option<i32>) -> bool {
    desired.unwrap_or(0) == observed.unwrap_or(0)
}

/// Whether a desired engine version matches the version AWS reports.
///
/// A desired version may be a prefix (`7.0` matches `7.0.7`) or use `x` as a
/// wildcard component (`6.x` matches `6.2.6`).
pub fn engine_version_matches(desired: &str, observed: &str) -> bool {
    let observed: Vec<&str> = observed.split('.').collect();
    for (i, part) in desired.split('.').enumerate() {
        if part.eq_ignore_ascii_case("x") {
            return i < observed.len();
        }
        match observed.get(i) {
            Some(o) if *o == part => {}
            _ => return false,
        }
    }
    true
}

/// Maintenance and snapshot windows are reported in lower case.
pub fn window_equal(desired: &str, observed: Option<&str>) -> bool {
    observed.is_some_and(|o| o.eq_ignore_ascii_case(desired))
}
