//! Numeric gap filling within one chunk.
//!
//! Interior gaps are interpolated between known neighbours; leading and
//! trailing gaps take the nearest known value. Only `Null` cells are written.

use hmerge_core::types::Scalar;

use crate::policy::NumericMethod;

/// Fill the `Null` cells of `values`. Returns the number of cells filled;
/// a column with no known values is left untouched.
///
/// `row_offset` is the absolute position of `values[0]` in the output and is
/// the x-axis for [`NumericMethod::Time`].
pub fn fill_numeric(values: &mut [Scalar], method: NumericMethod, row_offset: u64) -> usize {
    let known: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.as_f64().map(|y| (axis(method, row_offset, i), y)))
        .collect();
    let (first, last) = match (known.first(), known.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return 0,
    };

    let mut filled = 0;
    for (i, v) in values.iter_mut().enumerate() {
        if !v.is_null() {
            continue;
        }
        let x = axis(method, row_offset, i);
        let y = if x < first.0 {
            first.1
        } else if x > last.0 {
            last.1
        } else {
            // First known point to the right of x; x sits strictly inside.
            let right = known.partition_point(|(kx, _)| *kx < x);
            match method {
                NumericMethod::Linear | NumericMethod::Time => {
                    linear(known[right - 1], known[right], x)
                }
                NumericMethod::Polynomial => polynomial(&known, right, x),
            }
        };
        if y.is_finite() {
            *v = Scalar::F64(y);
            filled += 1;
        }
    }
    filled
}

fn axis(method: NumericMethod, row_offset: u64, i: usize) -> f64 {
    match method {
        NumericMethod::Time => (row_offset + i as u64) as f64,
        _ => i as f64,
    }
}

fn linear(a: (f64, f64), b: (f64, f64), x: f64) -> f64 {
    let t = (x - a.0) / (b.0 - a.0);
    a.1 + t * (b.1 - a.1)
}

/// Quadratic Lagrange fit through the bracketing pair plus whichever of the
/// next points out is closer to `x` (left on ties).
fn polynomial(known: &[(f64, f64)], right: usize, x: f64) -> f64 {
    let left = right - 1;
    if known.len() < 3 {
        return linear(known[left], known[right], x);
    }
    let extra = match (left.checked_sub(1), known.get(right + 1)) {
        (Some(l), Some(r)) => {
            if x - known[l].0 <= r.0 - x {
                known[l]
            } else {
                *r
            }
        }
        (Some(l), None) => known[l],
        (None, Some(r)) => *r,
        (None, None) => return linear(known[left], known[right], x),
    };
    lagrange3([known[left], known[right], extra], x)
}

fn lagrange3(p: [(f64, f64); 3], x: f64) -> f64 {
    let mut sum = 0.0;
    for i in 0..3 {
        let mut term = p[i].1;
        for j in 0..3 {
            if i != j {
                term *= (x - p[j].0) / (p[i].0 - p[j].0);
            }
        }
        sum += term;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(v: &[Option<f64>]) -> Vec<Scalar> {
        v.iter()
            .map(|x| x.map(Scalar::F64).unwrap_or(Scalar::Null))
            .collect()
    }

    fn approx(v: &Scalar, want: f64) -> bool {
        v.as_f64().map(|x| (x - want).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn isolated_gap_is_midpoint() {
        let mut v = nums(&[Some(10.0), None, Some(30.0)]);
        assert_eq!(fill_numeric(&mut v, NumericMethod::Linear, 0), 1);
        assert_eq!(v[1], Scalar::F64(20.0));
    }

    #[test]
    fn edges_take_nearest_known() {
        let mut v = nums(&[None, Some(4.0), None, Some(8.0), None]);
        fill_numeric(&mut v, NumericMethod::Linear, 0);
        assert_eq!(v, nums(&[Some(4.0), Some(4.0), Some(6.0), Some(8.0), Some(8.0)]));
    }

    #[test]
    fn integer_neighbours_interpolate() {
        let mut v = vec![Scalar::I64(1), Scalar::Null, Scalar::Null, Scalar::I64(4)];
        fill_numeric(&mut v, NumericMethod::Linear, 0);
        assert!(approx(&v[1], 2.0));
        assert!(approx(&v[2], 3.0));
        assert_eq!(v[0], Scalar::I64(1));
    }

    #[test]
    fn time_matches_linear_on_row_axis() {
        let base = nums(&[Some(1.0), None, None, Some(7.0)]);
        let mut a = base.clone();
        let mut b = base;
        fill_numeric(&mut a, NumericMethod::Linear, 0);
        fill_numeric(&mut b, NumericMethod::Time, 500);
        assert_eq!(a, b);
    }

    #[test]
    fn polynomial_recovers_quadratic() {
        // y = x^2 at x = 0, 1, 3; gap at x = 2.
        let mut v = nums(&[Some(0.0), Some(1.0), None, Some(9.0)]);
        fill_numeric(&mut v, NumericMethod::Polynomial, 0);
        assert!(approx(&v[2], 4.0));
    }

    #[test]
    fn polynomial_falls_back_to_linear() {
        let mut v = nums(&[Some(2.0), None, Some(4.0)]);
        fill_numeric(&mut v, NumericMethod::Polynomial, 0);
        assert_eq!(v[1], Scalar::F64(3.0));
    }

    #[test]
    fn all_missing_left_alone() {
        let mut v = nums(&[None, None]);
        assert_eq!(fill_numeric(&mut v, NumericMethod::Linear, 0), 0);
        assert!(v.iter().all(Scalar::is_null));
    }
}
