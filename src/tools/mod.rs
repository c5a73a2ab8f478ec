//! Built-in tools the chat workflow can invoke: an equation solver and a
//! function plotter.

mod expr;
mod plot;
mod solver;

pub use expr::Expr;
pub use plot::ImagePlotter;
pub use solver::NumericSolver;

use crate::error::ToolError;
use crate::utils::trim_decimal;

const DISPLAY_PRECISION: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    /// Real roots of an equation in `x`, ascending.
    Roots(Vec<f64>),
    /// Value of an expression with no unknown.
    Value(f64),
    /// Both sides agree everywhere they are defined.
    Identity,
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Solution::Roots(roots) if roots.is_empty() => write!(f, "no real solutions"),
            Solution::Roots(roots) => {
                let rendered: Vec<String> = roots
                    .iter()
                    .map(|r| trim_decimal(*r, DISPLAY_PRECISION))
                    .collect();
                write!(f, "{}", rendered.join(", "))
            }
            Solution::Value(v) => write!(f, "{}", trim_decimal(*v, DISPLAY_PRECISION)),
            Solution::Identity => write!(f, "true for all x"),
        }
    }
}

pub trait EquationSolver: Send + Sync {
    fn solve(&self, equation: &str) -> Result<Solution, ToolError>;
}

pub trait PlotRenderer: Send + Sync {
    /// Render `y = function(x)` and return the PNG as base64.
    fn render(&self, function: &str) -> Result<String, ToolError>;
}
