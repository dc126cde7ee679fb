//! The immutable record store and pipeline entry points.
//!
//! A [`Dataset`] is built once from ingested records and then only read.
//! Construction fixes the study order (first seen wins) and assigns each
//! study a display color from a fixed palette, cycling when there are more
//! studies than colors. Every pipeline call goes through here:
//! [`Dataset::filter`] for the raw table view, [`Dataset::fit_2d`] and
//! [`Dataset::fit_3d`] for the plots.

use crate::error::{Error, Result};
use crate::filter::FilterSelection;
use crate::fit::{fit_group, FitRequest, GroupResult};
use crate::record::Record;
use std::collections::{HashMap, HashSet};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Study trace colors, assigned in first-seen order and cycled on exhaustion.
const PALETTE: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// Immutable store of all loaded records.
///
/// Safe to share across threads once constructed; all operations take
/// `&self`.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
    studies: Vec<String>,
    colors: HashMap<String, &'static str>,
    columns: HashSet<String>,
}

impl Dataset {
    /// Builds a dataset, fixing study order and colors.
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        let mut studies: Vec<String> = Vec::new();
        let mut colors: HashMap<String, &'static str> = HashMap::new();
        let mut columns: HashSet<String> = HashSet::new();

        for record in &records {
            if !colors.contains_key(&record.study) {
                let color = PALETTE[studies.len() % PALETTE.len()];
                colors.insert(record.study.clone(), color);
                studies.push(record.study.clone());
            }
            for column in record.measurement_columns() {
                if !columns.contains(column) {
                    columns.insert(column.to_string());
                }
            }
        }

        log::debug!(
            "dataset loaded: {} records, {} studies, {} measurement columns",
            records.len(),
            studies.len(),
            columns.len()
        );

        Self {
            records,
            studies,
            colors,
            columns,
        }
    }

    /// All records, in insertion order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Study names in first-seen order.
    #[must_use]
    pub fn studies(&self) -> &[String] {
        &self.studies
    }

    /// Measurement columns seen across all records.
    #[must_use]
    pub fn columns(&self) -> &HashSet<String> {
        &self.columns
    }

    /// The display color assigned to a study.
    #[must_use]
    pub fn color_of(&self, study: &str) -> Option<&'static str> {
        self.colors.get(study).copied()
    }

    /// Records passing the selection, in insertion order.
    ///
    /// Powers the raw table view; the fit entry points call it internally.
    #[must_use]
    pub fn filter(&self, selection: &FilterSelection) -> Vec<&Record> {
        let rows: Vec<&Record> = self
            .records
            .iter()
            .filter(|record| selection.matches(record))
            .collect();
        log::debug!("filter matched {} of {} records", rows.len(), self.records.len());
        rows
    }

    /// Splits filtered rows by study, in the dataset's study order.
    ///
    /// Studies with no surviving rows are retained with an empty group so
    /// comparison panels keep a consistent legend.
    #[must_use]
    pub fn partition<'a>(&self, rows: &[&'a Record]) -> Vec<(String, Vec<&'a Record>)> {
        self.studies
            .iter()
            .map(|study| {
                let group: Vec<&Record> = rows
                    .iter()
                    .copied()
                    .filter(|record| &record.study == study)
                    .collect();
                (study.clone(), group)
            })
            .collect()
    }

    /// Filters, partitions and fits every study for a 2D plot.
    ///
    /// # Errors
    /// [`Error::UnknownColumn`] if an axis names a measurement column the
    /// dataset has never seen, [`Error::DegreeTooHigh`] if the requested
    /// degree is outside 1..=3. Per-group fit failures are reported as
    /// [`crate::FitOutcome::NoFit`] inside the results, never as `Err`.
    pub fn fit_2d(
        &self,
        selection: &FilterSelection,
        x_field: &str,
        y_field: &str,
        request: &FitRequest,
    ) -> Result<Vec<GroupResult>> {
        self.check_column(x_field)?;
        self.check_column(y_field)?;
        self.run(selection, x_field, y_field, None, request)
    }

    /// Filters, partitions and fits every study for a 3D surface plot.
    ///
    /// # Errors
    /// Same caller errors as [`Dataset::fit_2d`].
    pub fn fit_3d(
        &self,
        selection: &FilterSelection,
        x_field: &str,
        y_field: &str,
        z_field: &str,
        request: &FitRequest,
    ) -> Result<Vec<GroupResult>> {
        self.check_column(x_field)?;
        self.check_column(y_field)?;
        self.check_column(z_field)?;
        self.run(selection, x_field, y_field, Some(z_field), request)
    }

    fn run(
        &self,
        selection: &FilterSelection,
        x_field: &str,
        y_field: &str,
        z_field: Option<&str>,
        request: &FitRequest,
    ) -> Result<Vec<GroupResult>> {
        if !(1..=3).contains(&request.degree) {
            return Err(Error::DegreeTooHigh(request.degree));
        }

        let rows = self.filter(selection);
        let groups = self.partition(&rows);

        #[cfg(feature = "parallel")]
        let results = groups
            .par_iter()
            .map(|(study, group)| {
                fit_group(
                    study,
                    self.colors[study.as_str()],
                    group,
                    x_field,
                    y_field,
                    z_field,
                    request,
                )
            })
            .collect();

        #[cfg(not(feature = "parallel"))]
        let results = groups
            .iter()
            .map(|(study, group)| {
                fit_group(
                    study,
                    self.colors[study.as_str()],
                    group,
                    x_field,
                    y_field,
                    z_field,
                    request,
                )
            })
            .collect();

        Ok(results)
    }

    fn check_column(&self, column: &str) -> Result<()> {
        if self.columns.contains(column) {
            Ok(())
        } else {
            Err(Error::UnknownColumn(column.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Facet;

    fn sample() -> Dataset {
        let mut records = Vec::new();
        for (study, gas, x, y) in [
            ("A", "N2", 1.0, 2.0),
            ("B", "CO2", 1.0, 3.0),
            ("A", "N2", 2.0, 4.0),
            ("C", "N2", 1.0, 1.0),
        ] {
            records.push(
                Record::new(study)
                    .with_facet(Facet::Gas, gas)
                    .with_measurement("Temperature (C)", x)
                    .with_measurement("Halflife (Min)", y),
            );
        }
        Dataset::new(records)
    }

    #[test]
    fn studies_keep_first_seen_order() {
        let dataset = sample();
        let studies: Vec<&str> = dataset.studies().iter().map(String::as_str).collect();
        assert_eq!(studies, ["A", "B", "C"]);
    }

    #[test]
    fn colors_follow_palette_order() {
        let dataset = sample();
        assert_eq!(dataset.color_of("A"), Some(PALETTE[0]));
        assert_eq!(dataset.color_of("B"), Some(PALETTE[1]));
        assert_eq!(dataset.color_of("C"), Some(PALETTE[2]));
        assert_eq!(dataset.color_of("unknown"), None);
    }

    #[test]
    fn palette_cycles_past_its_length() {
        let records: Vec<Record> = (0..12).map(|i| Record::new(format!("S{i}"))).collect();
        let dataset = Dataset::new(records);
        assert_eq!(dataset.color_of("S10"), Some(PALETTE[0]));
        assert_eq!(dataset.color_of("S11"), Some(PALETTE[1]));
    }

    #[test]
    fn filter_preserves_insertion_order() {
        let dataset = sample();
        let selection = FilterSelection::new().restrict(Facet::Gas, ["N2"]);
        let rows = dataset.filter(&selection);
        let studies: Vec<&str> = rows.iter().map(|r| r.study.as_str()).collect();
        assert_eq!(studies, ["A", "A", "C"]);
    }

    #[test]
    fn filter_is_idempotent() {
        let dataset = sample();
        let selection = FilterSelection::new().restrict(Facet::Gas, ["N2"]);
        let once = dataset.filter(&selection);
        let twice: Vec<&Record> = once
            .iter()
            .copied()
            .filter(|r| selection.matches(r))
            .collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn tighter_selection_never_grows_the_result() {
        let dataset = sample();
        let loose = FilterSelection::new().restrict(Facet::Gas, ["N2", "CO2"]);
        let tight = loose.clone().restrict(Facet::Study, ["A"]);
        assert!(dataset.filter(&tight).len() <= dataset.filter(&loose).len());
    }

    #[test]
    fn partition_is_complete_and_disjoint() {
        let dataset = sample();
        let rows = dataset.filter(&FilterSelection::new());
        let groups = dataset.partition(&rows);

        let total: usize = groups.iter().map(|(_, g)| g.len()).sum();
        assert_eq!(total, rows.len());
        for (study, group) in &groups {
            assert!(group.iter().all(|r| &r.study == study));
        }
    }

    #[test]
    fn partition_retains_empty_groups() {
        let dataset = sample();
        let selection = FilterSelection::new().restrict(Facet::Gas, ["CO2"]);
        let rows = dataset.filter(&selection);
        let groups = dataset.partition(&rows);

        assert_eq!(groups.len(), 3);
        assert!(groups[0].1.is_empty());
        assert_eq!(groups[1].1.len(), 1);
        assert!(groups[2].1.is_empty());
    }

    #[test]
    fn unknown_axis_column_is_a_caller_error() {
        let dataset = sample();
        let result = dataset.fit_2d(
            &FilterSelection::new(),
            "Temperature (C)",
            "No Such Column",
            &FitRequest::new(),
        );
        assert!(matches!(result, Err(Error::UnknownColumn(_))));
    }

    #[test]
    fn degree_outside_range_is_a_caller_error() {
        let dataset = sample();
        let result = dataset.fit_2d(
            &FilterSelection::new(),
            "Temperature (C)",
            "Halflife (Min)",
            &FitRequest::new().with_degree(4),
        );
        assert!(matches!(result, Err(Error::DegreeTooHigh(4))));
    }
}
