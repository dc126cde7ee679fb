//! Experimental records and their categorical facets.
//!
//! A [`Record`] is one observation from the literature: which study it came
//! from, the categorical conditions of the experiment (gas, surfactant,
//! concentrations, additive, liquid phase), and an open-ended set of named
//! numeric measurements ("Temperature (C)", "Halflife (Min)", ...).
//!
//! Records are immutable once loaded into a [`crate::Dataset`]. Missing
//! facet values must be normalized to the [`NONE_SENTINEL`] by the ingestion
//! layer; missing measurements are simply absent, never zero.

use std::collections::HashMap;

/// Sentinel facet value meaning "not applicable / not recorded".
pub const NONE_SENTINEL: &str = "None";

/// Sentinel facet value produced by Y-averaging when the collapsed rows do
/// not agree on a facet, signalling that the average conflates conditions.
pub const REFINE_SENTINEL: &str = "Refine Further";

/// The seven categorical filter dimensions, in their fixed application order.
///
/// The order matters only for reproducibility of the filter pass; the filter
/// itself is a pure conjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    /// Study / publication the observation came from. Doubles as group identity.
    Study,
    /// Gas used to generate the foam.
    Gas,
    /// Surfactant species.
    Surfactant,
    /// Surfactant concentration (kept categorical, as published).
    SurfactantConcentration,
    /// Additive species.
    Additive,
    /// Additive concentration.
    AdditiveConcentration,
    /// Liquid phase.
    LiquidPhase,
}

impl Facet {
    /// All facets, in filter application order.
    pub const ALL: [Facet; 7] = [
        Facet::Study,
        Facet::Gas,
        Facet::Surfactant,
        Facet::SurfactantConcentration,
        Facet::Additive,
        Facet::AdditiveConcentration,
        Facet::LiquidPhase,
    ];
}

/// One experimental observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Study the observation belongs to. Group identity.
    pub study: String,
    /// Gas facet value.
    pub gas: String,
    /// Surfactant facet value.
    pub surfactant: String,
    /// Surfactant concentration facet value.
    pub surfactant_concentration: String,
    /// Additive facet value.
    pub additive: String,
    /// Additive concentration facet value.
    pub additive_concentration: String,
    /// Liquid phase facet value.
    pub liquid_phase: String,

    measurements: HashMap<String, f64>,
}

impl Record {
    /// Creates a record for `study` with every other facet set to
    /// [`NONE_SENTINEL`] and no measurements.
    pub fn new(study: impl Into<String>) -> Self {
        Self {
            study: study.into(),
            gas: NONE_SENTINEL.to_string(),
            surfactant: NONE_SENTINEL.to_string(),
            surfactant_concentration: NONE_SENTINEL.to_string(),
            additive: NONE_SENTINEL.to_string(),
            additive_concentration: NONE_SENTINEL.to_string(),
            liquid_phase: NONE_SENTINEL.to_string(),
            measurements: HashMap::new(),
        }
    }

    /// Sets a facet value. Builder-style, for ingestion code and tests.
    #[must_use]
    pub fn with_facet(mut self, facet: Facet, value: impl Into<String>) -> Self {
        let value = value.into();
        match facet {
            Facet::Study => self.study = value,
            Facet::Gas => self.gas = value,
            Facet::Surfactant => self.surfactant = value,
            Facet::SurfactantConcentration => self.surfactant_concentration = value,
            Facet::Additive => self.additive = value,
            Facet::AdditiveConcentration => self.additive_concentration = value,
            Facet::LiquidPhase => self.liquid_phase = value,
        }
        self
    }

    /// Adds a named numeric measurement. Builder-style.
    #[must_use]
    pub fn with_measurement(mut self, column: impl Into<String>, value: f64) -> Self {
        self.measurements.insert(column.into(), value);
        self
    }

    /// Returns the value of a facet.
    #[must_use]
    pub fn facet(&self, facet: Facet) -> &str {
        match facet {
            Facet::Study => &self.study,
            Facet::Gas => &self.gas,
            Facet::Surfactant => &self.surfactant,
            Facet::SurfactantConcentration => &self.surfactant_concentration,
            Facet::Additive => &self.additive,
            Facet::AdditiveConcentration => &self.additive_concentration,
            Facet::LiquidPhase => &self.liquid_phase,
        }
    }

    /// Returns a measurement by column name, or `None` if the value is
    /// missing for this record.
    #[must_use]
    pub fn measurement(&self, column: &str) -> Option<f64> {
        self.measurements.get(column).copied()
    }

    /// Iterates over the record's measurement columns.
    pub fn measurement_columns(&self) -> impl Iterator<Item = &str> {
        self.measurements.keys().map(String::as_str)
    }
}

/// The non-study facet values of a row, carried along for hover labels.
///
/// The Y-averaging aggregator rewrites fields of this summary to
/// [`REFINE_SENTINEL`] when the averaged rows disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetSummary {
    /// Gas facet value.
    pub gas: String,
    /// Surfactant facet value.
    pub surfactant: String,
    /// Surfactant concentration facet value.
    pub surfactant_concentration: String,
    /// Additive facet value.
    pub additive: String,
    /// Additive concentration facet value.
    pub additive_concentration: String,
    /// Liquid phase facet value.
    pub liquid_phase: String,
}

impl FacetSummary {
    /// Extracts the hover-relevant facets from a record.
    #[must_use]
    pub fn of(record: &Record) -> Self {
        Self {
            gas: record.gas.clone(),
            surfactant: record.surfactant.clone(),
            surfactant_concentration: record.surfactant_concentration.clone(),
            additive: record.additive.clone(),
            additive_concentration: record.additive_concentration.clone(),
            liquid_phase: record.liquid_phase.clone(),
        }
    }
}

impl std::fmt::Display for FacetSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Gas: {}\nSurfactant: {}\nConcentration Surfactant: {}\nAdditive: {}\nConcentration Additive: {}\nLiquid Phase: {}",
            self.gas,
            self.surfactant,
            self.surfactant_concentration,
            self.additive,
            self.additive_concentration,
            self.liquid_phase
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facets_default_to_none_sentinel() {
        let r = Record::new("Kruss 2019");
        for facet in &Facet::ALL[1..] {
            assert_eq!(r.facet(*facet), NONE_SENTINEL);
        }
        assert_eq!(r.facet(Facet::Study), "Kruss 2019");
    }

    #[test]
    fn missing_measurement_is_absent_not_zero() {
        let r = Record::new("A").with_measurement("Halflife (Min)", 12.5);
        assert_eq!(r.measurement("Halflife (Min)"), Some(12.5));
        assert_eq!(r.measurement("Temperature (C)"), None);
    }
}
