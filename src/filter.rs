//! Facet filter selections.
//!
//! A [`FilterSelection`] is a conjunction of per-facet membership tests: a
//! record passes when, for every constrained facet, its value is in that
//! facet's admissible set. Unconstrained facets admit everything, so the
//! empty selection passes every record.

use crate::record::{Facet, Record};
use std::collections::{HashMap, HashSet};

/// A set of admissible values per facet.
///
/// # Examples
/// ```
/// use foamfit::{Facet, FilterSelection};
///
/// let selection = FilterSelection::new()
///     .restrict(Facet::Gas, ["N2", "CO2"])
///     .restrict(Facet::Surfactant, ["SDS"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilterSelection {
    allowed: HashMap<Facet, HashSet<String>>,
}

impl FilterSelection {
    /// Creates a selection with no constraints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrains `facet` to the given values, replacing any previous
    /// constraint on that facet.
    ///
    /// Constraining a facet to an empty set admits no records.
    #[must_use]
    pub fn restrict<I, S>(mut self, facet: Facet, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed
            .insert(facet, values.into_iter().map(Into::into).collect());
        self
    }

    /// Removes the constraint on `facet`, if any.
    pub fn clear(&mut self, facet: Facet) {
        self.allowed.remove(&facet);
    }

    /// True when no facet is constrained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Tests a single record against the selection.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        Facet::ALL.iter().all(|facet| {
            self.allowed
                .get(facet)
                .map_or(true, |values| values.contains(record.facet(*facet)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(study: &str, gas: &str) -> Record {
        Record::new(study).with_facet(Facet::Gas, gas)
    }

    #[test]
    fn empty_selection_matches_everything() {
        let selection = FilterSelection::new();
        assert!(selection.matches(&record("A", "N2")));
        assert!(selection.matches(&record("B", "CO2")));
    }

    #[test]
    fn conjunction_across_facets() {
        let selection = FilterSelection::new()
            .restrict(Facet::Study, ["A"])
            .restrict(Facet::Gas, ["N2"]);

        assert!(selection.matches(&record("A", "N2")));
        assert!(!selection.matches(&record("A", "CO2")));
        assert!(!selection.matches(&record("B", "N2")));
    }

    #[test]
    fn empty_value_set_matches_nothing() {
        let selection = FilterSelection::new().restrict(Facet::Gas, Vec::<String>::new());
        assert!(!selection.matches(&record("A", "N2")));
    }

    #[test]
    fn restrict_replaces_previous_constraint() {
        let selection = FilterSelection::new()
            .restrict(Facet::Gas, ["N2"])
            .restrict(Facet::Gas, ["CO2"]);

        assert!(!selection.matches(&record("A", "N2")));
        assert!(selection.matches(&record("A", "CO2")));
    }
}
