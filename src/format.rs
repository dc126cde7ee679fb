//! Equation label formatting
//!
//! Turns a fitted model into the human-readable equation string shown next
//! to its trace. Coefficients outside a comfortable magnitude window switch
//! to scientific notation so labels stay short.

use crate::fit::FitModel;

/// Magnitude at or below which a coefficient is rendered scientifically.
const SCIENTIFIC_BELOW: f64 = 0.000_999;
/// Magnitude above which a coefficient is rendered scientifically.
const SCIENTIFIC_ABOVE: f64 = 10_000.0;

/// Formats a single coefficient for display.
///
/// Exact zero renders as `0`; very small or very large magnitudes use
/// scientific notation with three mantissa digits; everything else rounds
/// to three decimals with trailing zeros trimmed.
#[must_use]
pub fn coefficient(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if magnitude <= SCIENTIFIC_BELOW || magnitude > SCIENTIFIC_ABOVE {
        return format!("{value:.3e}");
    }

    round_half_up_3(value)
}

/// Rounds to three decimals, half away from zero, on the shortest decimal
/// representation of the value.
///
/// Binary rounding would turn a value entered as `1.0005` (stored as
/// `1.00049…`) into `1.000`; rounding the decimal digits a reader sees gives
/// the expected `1.001`. Trailing zeros and a bare decimal point are trimmed.
fn round_half_up_3(value: f64) -> String {
    let negative = value < 0.0;
    let repr = format!("{}", value.abs());
    let (int_part, frac_part) = match repr.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (repr.as_str(), ""),
    };

    let mut digits: Vec<u8> = int_part.bytes().map(|b| b - b'0').collect();
    let mut int_len = digits.len();
    for i in 0..3 {
        digits.push(frac_part.as_bytes().get(i).map_or(0, |b| b - b'0'));
    }

    let mut carry = frac_part.as_bytes().get(3).is_some_and(|&b| b >= b'5');
    if carry {
        for digit in digits.iter_mut().rev() {
            if *digit == 9 {
                *digit = 0;
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
    }
    if carry {
        digits.insert(0, 1);
        int_len += 1;
    }

    let mut rendered = String::new();
    if negative {
        rendered.push('-');
    }
    for &digit in &digits[..int_len] {
        rendered.push((b'0' + digit) as char);
    }

    let mut frac: &[u8] = &digits[int_len..];
    while frac.last() == Some(&0) {
        frac = &frac[..frac.len() - 1];
    }
    if !frac.is_empty() {
        rendered.push('.');
        for &digit in frac {
            rendered.push((b'0' + digit) as char);
        }
    }
    rendered
}

/// Builds the display equation for a fitted model.
///
/// Coefficients are substituted into each family's canonical template in
/// algebraic position, independent of the order the solver produced them in.
#[must_use]
pub fn equation(model: &FitModel) -> String {
    let c = coefficient;
    match model {
        FitModel::Polynomial { coefficients, .. } => match coefficients.as_slice() {
            [a, b] => format!("y = {}x + {}", c(*a), c(*b)),
            [a, b, d] => format!("y = {}x² + {}x + {}", c(*a), c(*b), c(*d)),
            [a, b, d, e] => {
                format!("y = {}x³ + {}x² + {}x + {}", c(*a), c(*b), c(*d), c(*e))
            }
            _ => String::new(),
        },
        FitModel::Logarithmic { a, b, c: k } => {
            format!("y = {}ln({}x) + {}", c(*a), c(*b), c(*k))
        }
        FitModel::Exponential { a, b, c: k } => {
            format!("y = {}e^(-{}x) + {}", c(*a), c(*b), c(*k))
        }
        FitModel::Power { a, n, b } => format!("y = {}x^{} + {}", c(*a), c(*n), c(*b)),
        FitModel::PolynomialSurface {
            coefficients,
            order,
        } => surface_equation(coefficients, *order),
        FitModel::LogSurface { a, b, c: k, d } => {
            format!("z = {}ln({}x)ln({}y) + {}", c(*a), c(*b), c(*k), c(*d))
        }
        FitModel::ExpSurface { a, b, c: k, d } => {
            format!("z = {}e^(-{}x)e^(-{}y) + {}", c(*a), c(*b), c(*k), c(*d))
        }
        FitModel::PowerSurface { a, m, n, b } => {
            format!("z = {}x^{}y^{} + {}", c(*a), c(*m), c(*n), c(*b))
        }
    }
}

/// Maps solver-order surface coefficients into their template positions.
fn surface_equation(coefficients: &[f64], order: usize) -> String {
    let c = coefficient;
    match (order, coefficients) {
        // basis [x, y, 1]
        (1, [x, y, k]) => format!("z = {}x + {}y + {}", c(*x), c(*y), c(*k)),
        // basis [1, x, y, xy, x², y²]
        (2, [k, x, y, xy, xx, yy]) => format!(
            "z = {}x² + {}y² + {}xy + {}x + {}y + {}",
            c(*xx),
            c(*yy),
            c(*xy),
            c(*x),
            c(*y),
            c(*k)
        ),
        // basis [1, x, y, x², xy, y², x³, x²y, xy², y³]
        (3, [k, x, y, xx, xy, yy, xxx, xxy, xyy, yyy]) => format!(
            "z = {}x³ + {}y³ + {}x²y + {}xy² + {}x² + {}y² + {}xy + {}x + {}y + {}",
            c(*xxx),
            c(*yyy),
            c(*xxy),
            c(*xyy),
            c(*xx),
            c(*yy),
            c(*xy),
            c(*x),
            c(*y),
            c(*k)
        ),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_magnitudes_go_scientific() {
        assert_eq!(coefficient(0.0005), "5.000e-4");
        assert_eq!(coefficient(-0.000999), "-9.990e-4");
    }

    #[test]
    fn large_magnitudes_go_scientific() {
        assert_eq!(coefficient(15000.0), "1.500e4");
        assert_eq!(coefficient(10000.0), "10000");
    }

    #[test]
    fn mid_range_rounds_and_trims() {
        assert_eq!(coefficient(2.0), "2");
        assert_eq!(coefficient(1.0005), "1.001");
        assert_eq!(coefficient(-3.140), "-3.14");
        assert_eq!(coefficient(0.001), "0.001");
    }

    #[test]
    fn zero_renders_bare() {
        assert_eq!(coefficient(0.0), "0");
    }

    #[test]
    fn linear_equation_template() {
        let model = FitModel::Polynomial {
            coefficients: vec![2.0, 0.0],
            r_squared: Some(1.0),
        };
        assert_eq!(equation(&model), "y = 2x + 0");
    }

    #[test]
    fn quadratic_surface_reorders_solver_coefficients() {
        let model = FitModel::PolynomialSurface {
            coefficients: vec![6.0, 4.0, 5.0, 3.0, 1.0, 2.0],
            order: 2,
        };
        assert_eq!(equation(&model), "z = 1x² + 2y² + 3xy + 4x + 5y + 6");
    }
}
