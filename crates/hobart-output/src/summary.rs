//! Demand estimate summary and terminal/Markdown rendering.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One coefficient with its linear-IV and nonlinear-IV estimates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoefficientEstimate {
    /// Coefficient name ("ln_me", a characteristic, or "intercept").
    pub name: String,

    /// Linear IV estimate.
    pub linear: f64,

    /// Nonlinear IV estimate.
    pub nonlinear: f64,
}

impl CoefficientEstimate {
    /// Create a new coefficient estimate row.
    pub const fn new(name: String, linear: f64, nonlinear: f64) -> Self {
        Self { name, linear, nonlinear }
    }
}

impl fmt::Display for CoefficientEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: linear {:.4}, nonlinear {:.4}",
            self.name, self.linear, self.nonlinear
        )
    }
}

/// Complete demand estimation summary for one investor and period.
///
/// Carries plain values only, so reporting does not depend on the estimation
/// crates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemandSummary {
    /// Investor identifier the estimates belong to.
    pub manager_id: i64,

    /// Date the estimation ran.
    pub estimated_on: NaiveDate,

    /// Total securities in the observation set, zero weights included.
    pub n_holdings: usize,

    /// Strictly positive holdings (the rows the linear estimator used).
    pub n_positive: usize,

    /// Iterations taken by the nonlinear fit.
    pub iterations: usize,

    /// Whether the linear fit hit the market-equity ceiling.
    pub linear_constrained: bool,

    /// Whether the nonlinear fit hit the market-equity ceiling.
    pub nonlinear_constrained: bool,

    /// Coefficient estimates in model order:
    /// market equity, characteristics.., intercept.
    pub coefficients: Vec<CoefficientEstimate>,
}

impl DemandSummary {
    /// Create a new demand summary.
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        manager_id: i64,
        estimated_on: NaiveDate,
        n_holdings: usize,
        n_positive: usize,
        iterations: usize,
        linear_constrained: bool,
        nonlinear_constrained: bool,
        coefficients: Vec<CoefficientEstimate>,
    ) -> Self {
        Self {
            manager_id,
            estimated_on,
            n_holdings,
            n_positive,
            iterations,
            linear_constrained,
            nonlinear_constrained,
            coefficients,
        }
    }

    /// Share of securities actually held.
    pub fn held_ratio(&self) -> f64 {
        if self.n_holdings == 0 {
            return 0.0;
        }
        self.n_positive as f64 / self.n_holdings as f64
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nDemand Estimates: manager {}\n", self.manager_id));
        output.push_str(&format!("Estimated: {}\n", self.estimated_on));
        output.push_str(&"=".repeat(64));
        output.push('\n');

        output.push_str("\nSample:\n");
        output.push_str(&"-".repeat(64));
        output.push('\n');
        output.push_str(&format!(
            "  Securities:               {} ({} held, {:.1}%)\n",
            self.n_holdings,
            self.n_positive,
            self.held_ratio() * 100.0
        ));
        output.push_str(&format!(
            "  Nonlinear iterations:     {}\n",
            self.iterations
        ));
        output.push_str(&format!(
            "  Ceiling binding:          linear {}, nonlinear {}\n",
            if self.linear_constrained { "yes" } else { "no" },
            if self.nonlinear_constrained { "yes" } else { "no" },
        ));

        output.push_str("\nCoefficients:\n");
        output.push_str(&"-".repeat(64));
        output.push('\n');
        output.push_str(&format!(
            "{:<24} {:>16} {:>16}\n",
            "Coefficient", "Linear IV", "Nonlinear IV"
        ));
        output.push_str(&"-".repeat(64));
        output.push('\n');
        for row in &self.coefficients {
            output.push_str(&format!(
                "{:<24} {:>16.4} {:>16.4}\n",
                row.name, row.linear, row.nonlinear
            ));
        }

        output.push_str(&"=".repeat(64));
        output.push('\n');

        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Demand Estimates: manager {}\n\n", self.manager_id));
        output.push_str(&format!("**Estimated:** {}\n\n", self.estimated_on));

        output.push_str("## Sample\n\n");
        output.push_str(&format!(
            "- **Securities:** {} ({} held, {:.1}%)\n",
            self.n_holdings,
            self.n_positive,
            self.held_ratio() * 100.0
        ));
        output.push_str(&format!(
            "- **Nonlinear iterations:** {}\n",
            self.iterations
        ));
        output.push_str(&format!(
            "- **Ceiling binding:** linear {}, nonlinear {}\n\n",
            self.linear_constrained, self.nonlinear_constrained
        ));

        output.push_str("## Coefficients\n\n");
        output.push_str("| Coefficient | Linear IV | Nonlinear IV |\n");
        output.push_str("|-------------|-----------|--------------|\n");
        for row in &self.coefficients {
            output.push_str(&format!(
                "| {} | {:.4} | {:.4} |\n",
                row.name, row.linear, row.nonlinear
            ));
        }

        output
    }
}

impl fmt::Display for DemandSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Demand Estimates: manager {} ({} securities, {} held)",
            self.manager_id, self.n_holdings, self.n_positive
        )?;
        for row in &self.coefficients {
            writeln!(f, "  {row}")?;
        }
        Ok(())
    }
}
