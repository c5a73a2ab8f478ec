//! Numeric equation solving over a bounded real interval.

use super::expr::Expr;
use super::{EquationSolver, Solution};
use crate::error::ToolError;

const SEARCH_MIN: f64 = -100.0;
const SEARCH_MAX: f64 = 100.0;
const SCAN_STEPS: usize = 20_000;
const BISECTION_ROUNDS: usize = 100;
const ROOT_TOLERANCE: f64 = 1e-6;
const TOUCH_TOLERANCE: f64 = 1e-10;
const IDENTITY_TOLERANCE: f64 = 1e-12;

/// Finds real roots of `lhs = rhs` (or `expr = 0`) in `[-100, 100]` by
/// scanning for sign changes and refining each bracket with bisection.
/// Expressions without `x` and without `=` are evaluated instead, and an
/// equation whose sides agree at every sample is reported as an identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericSolver;

impl EquationSolver for NumericSolver {
    fn solve(&self, equation: &str) -> Result<Solution, ToolError> {
        let (lhs, rhs) = split_equation(equation)?;
        let lhs = Expr::parse(lhs)?;
        let rhs = match rhs {
            Some(rhs) => Expr::parse(rhs)?,
            None if !lhs.uses_x() => {
                let value = lhs.eval(0.0);
                if !value.is_finite() {
                    return Err(ToolError::Evaluation(format!(
                        "'{}' has no finite value",
                        equation.trim()
                    )));
                }
                return Ok(Solution::Value(value));
            }
            None => Expr::Num(0.0),
        };

        let f = |x: f64| lhs.eval(x) - rhs.eval(x);
        Ok(solve_on_grid(f))
    }
}

fn split_equation(equation: &str) -> Result<(&str, Option<&str>), ToolError> {
    let trimmed = equation.trim();
    if trimmed.is_empty() {
        return Err(ToolError::Parse {
            position: 0,
            message: "empty equation".to_string(),
        });
    }

    let mut parts = trimmed.splitn(3, '=');
    let lhs = parts.next().unwrap_or_default();
    let rhs = parts.next();
    if parts.next().is_some() {
        let position = trimmed.rfind('=').unwrap_or_default();
        return Err(ToolError::Parse {
            position,
            message: "more than one '='".to_string(),
        });
    }
    Ok((lhs, rhs))
}

fn solve_on_grid(f: impl Fn(f64) -> f64) -> Solution {
    let step = (SEARCH_MAX - SEARCH_MIN) / SCAN_STEPS as f64;
    let xs: Vec<f64> = (0..=SCAN_STEPS)
        .map(|i| SEARCH_MIN + step * i as f64)
        .collect();
    let ys: Vec<f64> = xs.iter().map(|&x| f(x)).collect();

    if is_identity(&ys) {
        return Solution::Identity;
    }
    Solution::Roots(find_roots(&f, &xs, &ys, step))
}

/// Every defined sample is zero.
fn is_identity(ys: &[f64]) -> bool {
    let mut defined = ys.iter().filter(|y| y.is_finite()).peekable();
    defined.peek().is_some() && defined.all(|y| y.abs() <= IDENTITY_TOLERANCE)
}

fn find_roots(f: &impl Fn(f64) -> f64, xs: &[f64], ys: &[f64], step: f64) -> Vec<f64> {
    let mut roots: Vec<f64> = Vec::new();
    let mut push = |root: f64| {
        let root = if root.abs() < 1e-9 { 0.0 } else { root };
        if !roots.iter().any(|r| (r - root).abs() < 1e-6) {
            roots.push(root);
        }
    };

    for i in 0..SCAN_STEPS {
        let (a, b) = (xs[i], xs[i + 1]);
        let (fa, fb) = (ys[i], ys[i + 1]);
        if !fa.is_finite() || !fb.is_finite() {
            continue;
        }

        if fa == 0.0 {
            push(a);
        } else if fa.signum() != fb.signum() && fb != 0.0 {
            let root = bisect(f, a, b, fa);
            // A sign change across a pole is not a root.
            if f(root).abs() < ROOT_TOLERANCE {
                push(root);
            }
        } else if i > 0 && touches_zero(ys, i) {
            let root = refine_touch(f, xs[i] - step, xs[i] + step);
            if f(root).abs() <= TOUCH_TOLERANCE {
                push(root);
            }
        }
    }
    if ys[SCAN_STEPS] == 0.0 {
        push(xs[SCAN_STEPS]);
    }

    roots.sort_by(f64::total_cmp);
    roots
}

fn bisect(f: &impl Fn(f64) -> f64, mut a: f64, mut b: f64, mut fa: f64) -> f64 {
    for _ in 0..BISECTION_ROUNDS {
        let mid = (a + b) / 2.0;
        let fm = f(mid);
        if fm == 0.0 {
            return mid;
        }
        if fm.signum() == fa.signum() {
            a = mid;
            fa = fm;
        } else {
            b = mid;
        }
    }
    (a + b) / 2.0
}

/// Local minimum of |f| close to zero with no sign change on either side, a
/// candidate double root. The refined minimum still has to reach zero.
fn touches_zero(ys: &[f64], i: usize) -> bool {
    let (prev, cur, next) = (ys[i - 1], ys[i], ys[i + 1]);
    if !prev.is_finite() || !next.is_finite() {
        return false;
    }
    let same_side = prev.signum() == cur.signum() && cur.signum() == next.signum();
    same_side && cur.abs() < 1e-3 && cur.abs() <= prev.abs() && cur.abs() <= next.abs()
}

fn refine_touch(f: &impl Fn(f64) -> f64, mut a: f64, mut b: f64) -> f64 {
    for _ in 0..BISECTION_ROUNDS {
        let m1 = a + (b - a) / 3.0;
        let m2 = b - (b - a) / 3.0;
        if f(m1).abs() < f(m2).abs() {
            b = m2;
        } else {
            a = m1;
        }
    }
    (a + b) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots(equation: &str) -> Vec<f64> {
        match NumericSolver.solve(equation).unwrap() {
            Solution::Roots(r) => r,
            other => panic!("expected roots, got {:?}", other),
        }
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "roots: {:?}", actual);
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{} != {}", a, e);
        }
    }

    #[test]
    fn test_quadratic() {
        assert_close(&roots("x**2 - 4 = 0"), &[-2.0, 2.0]);
        assert_close(&roots("x^2 = 4"), &[-2.0, 2.0]);
        assert_close(&roots("x^2 - 4"), &[-2.0, 2.0]);
    }

    #[test]
    fn test_linear_and_double_root() {
        assert_close(&roots("2x + 3 = 0"), &[-1.5]);
        assert_close(&roots("(x - 1)^2 = 0"), &[1.0]);
    }

    #[test]
    fn test_no_real_roots() {
        assert!(roots("x^2 + 1 = 0").is_empty());
        assert!(roots("2 = 3").is_empty());
    }

    #[test]
    fn test_near_miss_is_not_a_double_root() {
        assert!(roots("x^2 + 0.0000001 = 0").is_empty());
        assert_eq!(
            NumericSolver.solve("x^2 + 0.0000001 = 0").unwrap().to_string(),
            "no real solutions"
        );
        assert_close(&roots("x^2 - 2x + 1 = 0"), &[1.0]);
    }

    #[test]
    fn test_identities() {
        assert_eq!(NumericSolver.solve("2 + 2 = 4").unwrap(), Solution::Identity);
        assert_eq!(NumericSolver.solve("x = x").unwrap(), Solution::Identity);
        assert_eq!(NumericSolver.solve("2(x + 1) = 2x + 2").unwrap(), Solution::Identity);
        assert_eq!(NumericSolver.solve("x = x").unwrap().to_string(), "true for all x");
    }

    #[test]
    fn test_poles_are_not_roots() {
        assert!(roots("1 / x = 0").is_empty());
    }

    #[test]
    fn test_constant_expression_is_evaluated() {
        assert_eq!(NumericSolver.solve("2 + 2").unwrap(), Solution::Value(4.0));
        assert!(NumericSolver.solve("1 / 0").is_err());
    }

    #[test]
    fn test_malformed_equations() {
        assert!(NumericSolver.solve("").is_err());
        assert!(NumericSolver.solve("x = 1 = 2").is_err());
        assert!(NumericSolver.solve("x + = 2").is_err());
    }
}
