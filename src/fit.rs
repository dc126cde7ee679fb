//! Per-group curve and surface fitting
//!
//! This is the algorithmic heart of the crate. A group (one study's rows,
//! already filtered) is reduced to axis arrays, optionally averaged and
//! normalized, and then each requested fit family is computed on its own
//! copy of those arrays. Polynomial families go through the SVD
//! least-squares solver; logarithmic, exponential and power families go
//! through Levenberg-Marquardt.
//!
//! A family that cannot be fit (too few points, non-positive inputs for a
//! log/power model, a singular system, no convergence) produces
//! [`FitOutcome::NoFit`] for that group and family only. Nothing here
//! panics on bad data.

use crate::aggregate::average_y;
use crate::error::{Error, Result};
use crate::format;
use crate::leastsq::{curve_fit, solve_normal, LeastSquaresOptions};
use crate::normalize::normalize;
use crate::record::{FacetSummary, Record};
use crate::statistics;
use nalgebra::{DMatrix, DVector};

/// Points on the evaluation grid of a fitted 1D curve.
pub const CURVE_SAMPLES: usize = 1000;
/// Points per axis on the evaluation grid of a fitted surface.
pub const SURFACE_SAMPLES: usize = 20;
/// Minimum group size for any 1D fit.
pub const MIN_POINTS_CURVE: usize = 3;
/// Minimum group size for any surface fit.
pub const MIN_POINTS_SURFACE: usize = 4;

/// The trace families a caller can request per group.
///
/// `Scatter` and `Line` are display modes for the raw markers; the other
/// four are genuine fits with coefficients and an equation label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FitFamily {
    /// Raw data points.
    Scatter,
    /// Raw data points joined by line segments.
    Line,
    /// Polynomial of the requested degree (1..=3).
    Polynomial,
    /// `y = a·ln(bx) + c`, or `z = a·ln(bx)·ln(cy) + d` on surfaces.
    Logarithmic,
    /// `y = a·e^(−bx) + c`, or `z = a·e^(−bx)·e^(−cy) + d` on surfaces.
    Exponential,
    /// `y = a·xⁿ + b`, or `z = a·x^m·y^n + b` on surfaces.
    Power,
}

impl FitFamily {
    /// The genuine fit families, in legend priority order.
    pub const GENUINE: [FitFamily; 4] = [
        FitFamily::Polynomial,
        FitFamily::Logarithmic,
        FitFamily::Exponential,
        FitFamily::Power,
    ];

    /// Lowercase family name, used in log messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            FitFamily::Scatter => "scatter",
            FitFamily::Line => "line",
            FitFamily::Polynomial => "polynomial",
            FitFamily::Logarithmic => "logarithmic",
            FitFamily::Exponential => "exponential",
            FitFamily::Power => "power",
        }
    }
}

impl std::fmt::Display for FitFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What to fit and how to prepare the axes.
#[derive(Debug, Clone)]
pub struct FitRequest {
    /// Requested families; see [`FitFamily`].
    pub families: Vec<FitFamily>,
    /// Polynomial degree (1D) or surface order (2D), 1..=3.
    pub degree: usize,
    /// Min-max normalize the x axis before plotting and fitting.
    pub normalize_x: bool,
    /// Min-max normalize the y axis.
    pub normalize_y: bool,
    /// Min-max normalize the z axis (surfaces only).
    pub normalize_z: bool,
    /// Collapse duplicate x values to their mean y (1D only).
    pub average_y: bool,
}

impl Default for FitRequest {
    fn default() -> Self {
        Self {
            families: vec![FitFamily::Scatter],
            degree: 1,
            normalize_x: false,
            normalize_y: false,
            normalize_z: false,
            average_y: false,
        }
    }
}

impl FitRequest {
    /// A scatter-only request with degree 1 and no preprocessing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a family to the request if not already present.
    #[must_use]
    pub fn with_family(mut self, family: FitFamily) -> Self {
        if !self.families.contains(&family) {
            self.families.push(family);
        }
        self
    }

    /// Sets the polynomial degree / surface order.
    #[must_use]
    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }
}

/// How the raw markers of a group should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceMode {
    /// Points only.
    Markers,
    /// Line segments only.
    Lines,
    /// Both points and line segments.
    LinesMarkers,
    /// Neither `Scatter` nor `Line` was requested; only fits are drawn.
    Hidden,
}

/// One plotted data point with its hover facets.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// X-axis value, possibly normalized.
    pub x: f64,
    /// Y-axis value, possibly normalized or averaged.
    pub y: f64,
    /// Z-axis value on surfaces, `None` on 2D traces.
    pub z: Option<f64>,
    /// Facet values for the hover label.
    pub facets: FacetSummary,
}

/// A fitted surface evaluated on a rectangular grid.
///
/// `z[i][j]` is the model value at `(x[j], y[i])`.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceGrid {
    /// Grid x coordinates, ascending.
    pub x: Vec<f64>,
    /// Grid y coordinates, ascending.
    pub y: Vec<f64>,
    /// Model values, one row per y coordinate.
    pub z: Vec<Vec<f64>>,
}

/// Evaluated plot samples of a fitted model.
#[derive(Debug, Clone, PartialEq)]
pub enum FitSamples {
    /// 1D curve samples.
    Curve(Vec<(f64, f64)>),
    /// Surface grid samples.
    Surface(SurfaceGrid),
}

/// A fitted model's coefficients.
///
/// Polynomial coefficients are stored highest power first; surface
/// coefficients are stored in the solver's basis order recorded below each
/// variant. [`format::equation`] maps them to their algebraic positions.
#[derive(Debug, Clone, PartialEq)]
pub enum FitModel {
    /// 1D polynomial; coefficients highest power first.
    Polynomial {
        /// `[a, b]` for degree 1, `[a, b, c]` for degree 2, and so on.
        coefficients: Vec<f64>,
        /// R² for degree 1; `None` for higher degrees, where the statistic
        /// is not reported, and for constant observations.
        r_squared: Option<f64>,
    },
    /// `y = a·ln(bx) + c`
    Logarithmic {
        /// Amplitude.
        a: f64,
        /// Argument scale; positive after a successful fit.
        b: f64,
        /// Offset.
        c: f64,
    },
    /// `y = a·e^(−bx) + c`
    Exponential {
        /// Amplitude.
        a: f64,
        /// Decay rate.
        b: f64,
        /// Offset.
        c: f64,
    },
    /// `y = a·xⁿ + b`
    Power {
        /// Amplitude.
        a: f64,
        /// Exponent.
        n: f64,
        /// Offset.
        b: f64,
    },
    /// Polynomial surface; coefficients in basis order
    /// (order 1: `[x, y, 1]`; order 2: `[1, x, y, xy, x², y²]`;
    /// order 3: `[1, x, y, x², xy, y², x³, x²y, xy², y³]`).
    PolynomialSurface {
        /// Basis-order coefficients.
        coefficients: Vec<f64>,
        /// Surface order, 1..=3.
        order: usize,
    },
    /// `z = a·ln(bx)·ln(cy) + d`
    LogSurface {
        /// Amplitude.
        a: f64,
        /// X argument scale.
        b: f64,
        /// Y argument scale.
        c: f64,
        /// Offset.
        d: f64,
    },
    /// `z = a·e^(−bx)·e^(−cy) + d`
    ExpSurface {
        /// Amplitude.
        a: f64,
        /// X decay rate.
        b: f64,
        /// Y decay rate.
        c: f64,
        /// Offset.
        d: f64,
    },
    /// `z = a·x^m·y^n + b`
    PowerSurface {
        /// Amplitude.
        a: f64,
        /// X exponent.
        m: f64,
        /// Y exponent.
        n: f64,
        /// Offset.
        b: f64,
    },
}

impl FitModel {
    /// Evaluates a 1D model at `x`; `None` for surface variants.
    #[must_use]
    pub fn predict_1d(&self, x: f64) -> Option<f64> {
        match self {
            FitModel::Polynomial { coefficients, .. } => Some(horner(coefficients, x)),
            FitModel::Logarithmic { a, b, c } => Some(a * (b * x).ln() + c),
            FitModel::Exponential { a, b, c } => Some(a * (-b * x).exp() + c),
            FitModel::Power { a, n, b } => Some(a * x.powf(*n) + b),
            _ => None,
        }
    }

    /// Evaluates a surface model at `(x, y)`; `None` for 1D variants.
    #[must_use]
    pub fn predict_2d(&self, x: f64, y: f64) -> Option<f64> {
        match self {
            FitModel::PolynomialSurface {
                coefficients,
                order,
            } => Some(
                surface_basis(*order, x, y)
                    .iter()
                    .zip(coefficients)
                    .map(|(basis, coeff)| basis * coeff)
                    .sum(),
            ),
            FitModel::LogSurface { a, b, c, d } => Some(a * (b * x).ln() * (c * y).ln() + d),
            FitModel::ExpSurface { a, b, c, d } => Some(a * (-b * x).exp() * (-c * y).exp() + d),
            FitModel::PowerSurface { a, m, n, b } => Some(a * x.powf(*m) * y.powf(*n) + b),
            _ => None,
        }
    }
}

/// A successfully fitted family, ready to plot.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedCurve {
    /// The model and its coefficients.
    pub model: FitModel,
    /// Display equation with formatted coefficients.
    pub equation: String,
    /// Whether this trace carries the group's legend entry.
    pub show_legend: bool,
    /// Evaluated plot samples.
    pub samples: FitSamples,
}

/// Result of one requested family on one group.
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    /// The family could not be fit for this group; siblings are unaffected.
    NoFit {
        /// The family that failed.
        family: FitFamily,
    },
    /// The family was fit.
    Fitted(FittedCurve),
}

impl FitOutcome {
    /// True when the outcome carries a fitted curve.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        matches!(self, FitOutcome::Fitted(_))
    }
}

/// Everything the renderer needs for one study's traces.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult {
    /// Study name; group identity and legend label.
    pub study: String,
    /// Display color shared by all of the group's traces.
    pub color: &'static str,
    /// Prepared marker samples, sorted by x.
    pub markers: Vec<Marker>,
    /// How to draw the markers. When not `Hidden`, the marker trace carries
    /// the group's legend entry and every fit suppresses its own.
    pub mode: TraceMode,
    /// One outcome per requested genuine family, in priority order.
    pub fits: Vec<FitOutcome>,
}

/// Fits all requested families for one study's rows.
pub(crate) fn fit_group(
    study: &str,
    color: &'static str,
    rows: &[&Record],
    x_field: &str,
    y_field: &str,
    z_field: Option<&str>,
    request: &FitRequest,
) -> GroupResult {
    let surface = z_field.is_some();

    // rows missing any selected axis are excluded up front
    let mut markers: Vec<Marker> = rows
        .iter()
        .filter_map(|record| {
            let x = record.measurement(x_field)?;
            let y = record.measurement(y_field)?;
            let z = match z_field {
                Some(field) => Some(record.measurement(field)?),
                None => None,
            };
            Some(Marker {
                x,
                y,
                z,
                facets: FacetSummary::of(record),
            })
        })
        .collect();

    let min_points = if surface {
        MIN_POINTS_SURFACE
    } else {
        MIN_POINTS_CURVE
    };
    let enough = markers.len() >= min_points;

    if enough && !surface && request.average_y {
        markers = average_y(markers);
    }
    markers.sort_by(|a, b| a.x.total_cmp(&b.x));

    if request.normalize_x {
        normalize_axis(&mut markers, |m| m.x, |m, v| m.x = v);
    }
    if request.normalize_y {
        normalize_axis(&mut markers, |m| m.y, |m, v| m.y = v);
    }
    if surface && request.normalize_z {
        normalize_axis(
            &mut markers,
            |m| m.z.unwrap_or(f64::NAN),
            |m, v| m.z = Some(v),
        );
    }

    let scatter = request.families.contains(&FitFamily::Scatter);
    let line = request.families.contains(&FitFamily::Line);
    let mode = match (scatter, line) {
        (true, true) => TraceMode::LinesMarkers,
        (true, false) => TraceMode::Markers,
        (false, true) => TraceMode::Lines,
        (false, false) => TraceMode::Hidden,
    };

    let mut legend_taken = mode != TraceMode::Hidden;
    let mut fits = Vec::new();
    for family in FitFamily::GENUINE {
        if !request.families.contains(&family) {
            continue;
        }
        if !enough {
            fits.push(FitOutcome::NoFit { family });
            continue;
        }

        // every family works on its own copy of the prepared axes
        let xs: Vec<f64> = markers.iter().map(|m| m.x).collect();
        let ys: Vec<f64> = markers.iter().map(|m| m.y).collect();
        let zs: Vec<f64> = markers.iter().filter_map(|m| m.z).collect();

        let fitted = if surface {
            fit_surface_family(family, &xs, &ys, &zs, request.degree)
        } else {
            fit_curve_family(family, &xs, &ys, request.degree)
        };

        match fitted {
            Ok(model) => {
                let samples = if surface {
                    FitSamples::Surface(sample_surface(&model, &xs, &ys))
                } else {
                    FitSamples::Curve(sample_curve(&model, &xs))
                };
                let equation = format::equation(&model);
                let show_legend = !legend_taken;
                legend_taken = true;
                fits.push(FitOutcome::Fitted(FittedCurve {
                    model,
                    equation,
                    show_legend,
                    samples,
                }));
            }
            Err(error) => {
                log::warn!("{family} fit failed for study `{study}`: {error}");
                fits.push(FitOutcome::NoFit { family });
            }
        }
    }

    GroupResult {
        study: study.to_string(),
        color,
        markers,
        mode,
        fits,
    }
}

fn normalize_axis(
    markers: &mut [Marker],
    get: impl Fn(&Marker) -> f64,
    set: impl Fn(&mut Marker, f64),
) {
    let mut values: Vec<f64> = markers.iter().map(&get).collect();
    normalize(&mut values);
    for (marker, value) in markers.iter_mut().zip(values) {
        set(marker, value);
    }
}

fn fit_curve_family(family: FitFamily, xs: &[f64], ys: &[f64], degree: usize) -> Result<FitModel> {
    match family {
        FitFamily::Polynomial => fit_polynomial(xs, ys, degree),
        FitFamily::Logarithmic => {
            require_positive(xs)?;
            let residuals =
                |p: &[f64]| model_residuals(xs, ys, |x| p[0] * (p[1] * x).ln() + p[2]);
            let p = curve_fit(residuals, &[1.0, 1.0, 1.0], &LeastSquaresOptions::default())?;
            require_finite(&p)?;
            Ok(FitModel::Logarithmic {
                a: p[0],
                b: p[1],
                c: p[2],
            })
        }
        FitFamily::Exponential => {
            let residuals =
                |p: &[f64]| model_residuals(xs, ys, |x| p[0] * (-p[1] * x).exp() + p[2]);
            let p = curve_fit(residuals, &[1.0, 1e-6, 1.0], &LeastSquaresOptions::default())?;
            require_finite(&p)?;
            Ok(FitModel::Exponential {
                a: p[0],
                b: p[1],
                c: p[2],
            })
        }
        FitFamily::Power => {
            require_positive(xs)?;
            let residuals = |p: &[f64]| model_residuals(xs, ys, |x| p[0] * x.powf(p[1]) + p[2]);
            let p = curve_fit(residuals, &[1.0, 1.0, 1.0], &LeastSquaresOptions::default())?;
            require_finite(&p)?;
            Ok(FitModel::Power {
                a: p[0],
                n: p[1],
                b: p[2],
            })
        }
        FitFamily::Scatter | FitFamily::Line => Err(Error::NoData),
    }
}

fn fit_surface_family(
    family: FitFamily,
    xs: &[f64],
    ys: &[f64],
    zs: &[f64],
    order: usize,
) -> Result<FitModel> {
    match family {
        FitFamily::Polynomial => fit_polynomial_surface(xs, ys, zs, order),
        FitFamily::Logarithmic => {
            require_positive(xs)?;
            require_positive(ys)?;
            let residuals = |p: &[f64]| {
                surface_residuals(xs, ys, zs, |x, y| {
                    p[0] * (p[1] * x).ln() * (p[2] * y).ln() + p[3]
                })
            };
            let p = curve_fit(
                residuals,
                &[1.0, 1.0, 1.0, 1.0],
                &LeastSquaresOptions::default(),
            )?;
            require_finite(&p)?;
            Ok(FitModel::LogSurface {
                a: p[0],
                b: p[1],
                c: p[2],
                d: p[3],
            })
        }
        FitFamily::Exponential => {
            let residuals = |p: &[f64]| {
                surface_residuals(xs, ys, zs, |x, y| {
                    p[0] * (-p[1] * x).exp() * (-p[2] * y).exp() + p[3]
                })
            };
            let p = curve_fit(
                residuals,
                &[1.0, 1e-6, 1e-6, 1.0],
                &LeastSquaresOptions::default(),
            )?;
            require_finite(&p)?;
            Ok(FitModel::ExpSurface {
                a: p[0],
                b: p[1],
                c: p[2],
                d: p[3],
            })
        }
        FitFamily::Power => {
            require_positive(xs)?;
            require_positive(ys)?;
            let residuals = |p: &[f64]| {
                surface_residuals(xs, ys, zs, |x, y| p[0] * x.powf(p[1]) * y.powf(p[2]) + p[3])
            };
            let p = curve_fit(
                residuals,
                &[1.0, 1.0, 1.0, 1.0],
                &LeastSquaresOptions::default(),
            )?;
            require_finite(&p)?;
            Ok(FitModel::PowerSurface {
                a: p[0],
                m: p[1],
                n: p[2],
                b: p[3],
            })
        }
        FitFamily::Scatter | FitFamily::Line => Err(Error::NoData),
    }
}

/// Ordinary least squares on the monomial basis, highest power first.
fn fit_polynomial(xs: &[f64], ys: &[f64], degree: usize) -> Result<FitModel> {
    if !(1..=3).contains(&degree) {
        return Err(Error::DegreeTooHigh(degree));
    }

    let design = DMatrix::from_fn(xs.len(), degree + 1, |row, col| {
        xs[row].powi((degree - col) as i32)
    });
    let rhs = DVector::from_column_slice(ys);

    let coefficients = solve_normal(&design, &rhs)?;
    require_finite(&coefficients)?;

    let r_squared = if degree == 1 {
        let predicted: Vec<f64> = xs.iter().map(|&x| horner(&coefficients, x)).collect();
        statistics::r_squared(ys, &predicted)
    } else {
        None
    };

    Ok(FitModel::Polynomial {
        coefficients,
        r_squared,
    })
}

fn fit_polynomial_surface(xs: &[f64], ys: &[f64], zs: &[f64], order: usize) -> Result<FitModel> {
    if !(1..=3).contains(&order) {
        return Err(Error::DegreeTooHigh(order));
    }
    if xs.is_empty() {
        return Err(Error::NoData);
    }

    let rows: Vec<Vec<f64>> = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| surface_basis(order, x, y))
        .collect();
    let basis_len = rows[0].len();
    let design = DMatrix::from_row_iterator(xs.len(), basis_len, rows.into_iter().flatten());
    let rhs = DVector::from_column_slice(zs);

    let coefficients = solve_normal(&design, &rhs)?;
    require_finite(&coefficients)?;

    Ok(FitModel::PolynomialSurface {
        coefficients,
        order,
    })
}

/// Bivariate monomial basis row for a surface of the given order.
fn surface_basis(order: usize, x: f64, y: f64) -> Vec<f64> {
    match order {
        1 => vec![x, y, 1.0],
        2 => vec![1.0, x, y, x * y, x * x, y * y],
        _ => vec![
            1.0,
            x,
            y,
            x * x,
            x * y,
            y * y,
            x * x * x,
            x * x * y,
            x * y * y,
            y * y * y,
        ],
    }
}

fn model_residuals(xs: &[f64], ys: &[f64], model: impl Fn(f64) -> f64) -> Vec<f64> {
    xs.iter().zip(ys).map(|(&x, &y)| model(x) - y).collect()
}

fn surface_residuals(
    xs: &[f64],
    ys: &[f64],
    zs: &[f64],
    model: impl Fn(f64, f64) -> f64,
) -> Vec<f64> {
    xs.iter()
        .zip(ys)
        .zip(zs)
        .map(|((&x, &y), &z)| model(x, y) - z)
        .collect()
}

fn require_positive(values: &[f64]) -> Result<()> {
    if values.iter().all(|&v| v > 0.0) {
        Ok(())
    } else {
        Err(Error::NonPositiveData)
    }
}

fn require_finite(params: &[f64]) -> Result<()> {
    if params.iter().all(|p| p.is_finite()) {
        Ok(())
    } else {
        Err(Error::NoConvergence)
    }
}

/// Evaluates `coefficients` (highest power first) at `x`.
fn horner(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().fold(0.0, |acc, &c| acc * x + c)
}

/// `count` evenly spaced values spanning `[min, max]`.
fn linspace(min: f64, max: f64, count: usize) -> Vec<f64> {
    let step = (max - min) / (count - 1) as f64;
    (0..count).map(|i| min + step * i as f64).collect()
}

fn sample_curve(model: &FitModel, xs: &[f64]) -> Vec<(f64, f64)> {
    // xs is sorted ascending by the caller
    let (min, max) = (xs[0], xs[xs.len() - 1]);
    linspace(min, max, CURVE_SAMPLES)
        .into_iter()
        .map(|x| (x, model.predict_1d(x).unwrap_or(f64::NAN)))
        .collect()
}

fn sample_surface(model: &FitModel, xs: &[f64], ys: &[f64]) -> SurfaceGrid {
    let (min_x, max_x) = bounds(xs);
    let (min_y, max_y) = bounds(ys);
    let grid_x = linspace(min_x, max_x, SURFACE_SAMPLES);
    let grid_y = linspace(min_y, max_y, SURFACE_SAMPLES);

    let z = grid_y
        .iter()
        .map(|&y| {
            grid_x
                .iter()
                .map(|&x| model.predict_2d(x, y).unwrap_or(f64::NAN))
                .collect()
        })
        .collect();

    SurfaceGrid {
        x: grid_x,
        y: grid_y,
        z,
    }
}

fn bounds(values: &[f64]) -> (f64, f64) {
    values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
        (min.min(v), max.max(v))
    })
}
