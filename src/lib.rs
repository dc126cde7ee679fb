//! Filtering and curve/surface fitting for foam half-life literature data.
//!
//! This crate is the computational core behind an interactive viewer of
//! foam stability measurements collected from published studies. Callers
//! load the records once into a [`Dataset`], then issue pipeline requests:
//! filter rows by categorical facets, group them by study, and fit each
//! group with polynomial, logarithmic, exponential or power models, in 1D
//! or as a surface. Results come back as per-study [`GroupResult`]s holding
//! prepared marker samples, fitted coefficients, evaluated plot grids and
//! formatted equation labels. Rendering, ingestion and UI state live
//! outside this crate.
//!
//! ```
//! use foamfit::{Dataset, Facet, FilterSelection, FitFamily, FitRequest, Record};
//!
//! let dataset = Dataset::new(vec![
//!     Record::new("Smith 2019")
//!         .with_facet(Facet::Gas, "N2")
//!         .with_measurement("Temperature (C)", 20.0)
//!         .with_measurement("Halflife (Min)", 12.0),
//!     Record::new("Smith 2019")
//!         .with_facet(Facet::Gas, "N2")
//!         .with_measurement("Temperature (C)", 40.0)
//!         .with_measurement("Halflife (Min)", 8.0),
//!     Record::new("Smith 2019")
//!         .with_facet(Facet::Gas, "N2")
//!         .with_measurement("Temperature (C)", 60.0)
//!         .with_measurement("Halflife (Min)", 3.0),
//! ]);
//!
//! let selection = FilterSelection::new().restrict(Facet::Gas, ["N2"]);
//! let request = FitRequest::new().with_family(FitFamily::Polynomial);
//! let groups = dataset
//!     .fit_2d(&selection, "Temperature (C)", "Halflife (Min)", &request)
//!     .unwrap();
//!
//! assert_eq!(groups.len(), 1);
//! assert!(groups[0].fits[0].is_fitted());
//! ```
//!
//! Fit failures are contained: a group whose data cannot support a family
//! (too few points, zeros under a logarithm, a solver that will not
//! converge) yields [`FitOutcome::NoFit`] for that group and family while
//! every other trace is returned normally.
//!
//! With the `parallel` feature enabled, groups are fitted on the rayon
//! thread pool; results keep the dataset's study order either way.
#![warn(missing_docs)]

mod aggregate;
mod dataset;
mod error;
mod filter;
mod fit;
pub mod format;
mod leastsq;
mod normalize;
mod record;
mod statistics;

pub use dataset::Dataset;
pub use error::{Error, Result};
pub use filter::FilterSelection;
pub use fit::{
    FitFamily, FitModel, FitOutcome, FitRequest, FitSamples, FittedCurve, GroupResult, Marker,
    SurfaceGrid, TraceMode, CURVE_SAMPLES, MIN_POINTS_CURVE, MIN_POINTS_SURFACE, SURFACE_SAMPLES,
};
pub use leastsq::{curve_fit, solve_normal, LeastSquaresOptions};
pub use record::{Facet, FacetSummary, Record, NONE_SENTINEL, REFINE_SENTINEL};
