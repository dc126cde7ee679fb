//! Y-axis averaging
//!
//! Collapses rows that share an x value into a single row holding the mean
//! of their y values. Facets that are not constant across the collapsed rows
//! are replaced by [`REFINE_SENTINEL`] so hover labels do not claim a single
//! condition for a point that mixes several.
//!
//! Only meaningful for 2D traces; surfaces are never averaged.

use crate::fit::Marker;
use crate::record::{FacetSummary, REFINE_SENTINEL};
use crate::statistics::mean;

/// Replaces duplicate-x markers with their y-mean, re-sorted by x.
#[must_use]
pub fn average_y(markers: Vec<Marker>) -> Vec<Marker> {
    let mut groups: Vec<(f64, Vec<Marker>)> = Vec::new();
    for marker in markers {
        match groups.iter_mut().find(|(x, _)| *x == marker.x) {
            Some((_, group)) => group.push(marker),
            None => groups.push((marker.x, vec![marker])),
        }
    }

    let mut averaged: Vec<Marker> = groups
        .into_iter()
        .map(|(x, group)| {
            let ys: Vec<f64> = group.iter().map(|m| m.y).collect();
            let y = mean(&ys).unwrap_or(0.0);
            let facets = merge_facets(&group);
            Marker { x, y, z: None, facets }
        })
        .collect();

    averaged.sort_by(|a, b| a.x.total_cmp(&b.x));
    averaged
}

/// Keeps a facet value only if every row in the group agrees on it.
fn merge_facets(group: &[Marker]) -> FacetSummary {
    let mut merged = group[0].facets.clone();

    let refine = |field: &mut String, get: fn(&FacetSummary) -> &str| {
        if group.iter().any(|m| get(&m.facets) != field.as_str()) {
            *field = REFINE_SENTINEL.to_string();
        }
    };

    refine(&mut merged.gas, |f| &f.gas);
    refine(&mut merged.surfactant, |f| &f.surfactant);
    refine(&mut merged.surfactant_concentration, |f| {
        &f.surfactant_concentration
    });
    refine(&mut merged.additive, |f| &f.additive);
    refine(&mut merged.additive_concentration, |f| {
        &f.additive_concentration
    });
    refine(&mut merged.liquid_phase, |f| &f.liquid_phase);

    merged
}
