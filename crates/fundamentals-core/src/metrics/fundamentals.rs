// crates/fundamentals-core/src/metrics/fundamentals.rs
// ============================================================================
// Module: Fundamental Metric Variants
// Description: The ten valuation and profitability metrics.
// Purpose: Map raw fundamental inputs to percent scores and ledger columns.
// Dependencies: crate::metrics
// ============================================================================

//! ## Overview
//! Each variant is a closed input struct. Inputs are optional; a missing
//! input propagates to a `None` percent. Columns are always persisted, with
//! missing inputs stored as nulls.

use serde::Deserialize;
use serde::Serialize;

use super::Metric;
use super::MetricField;
use super::finite;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// `1 - numerator / denominator`.
fn one_minus_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    finite(1.0 - numerator? / denominator?)
}

/// `1 / (1 + value)`.
fn inverse_one_plus(value: Option<f64>) -> Option<f64> {
    finite(1.0 / (1.0 + value?))
}

// ============================================================================
// SECTION: Earnings Multiples
// ============================================================================

/// Forward versus trailing price-to-earnings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceToEarnings {
    /// Forward P/E.
    pub forward_pe: Option<f64>,
    /// Trailing P/E.
    pub trailing_pe: Option<f64>,
}

impl Metric for PriceToEarnings {
    fn name(&self) -> &'static str {
        "Price to Earnings Ratio"
    }

    fn description(&self) -> &'static str {
        "Expected contraction of the forward P/E relative to the trailing P/E."
    }

    fn compute_percent(&self) -> Option<f64> {
        one_minus_ratio(self.forward_pe, self.trailing_pe)
    }

    fn columns(&self) -> Vec<MetricField> {
        vec![
            MetricField::real("TrailingPE", self.trailing_pe),
            MetricField::real("ForwardPE", self.forward_pe),
        ]
    }
}

/// Price/earnings-to-growth against its trailing value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceToEarningsGrowth {
    /// Current PEG.
    pub peg: Option<f64>,
    /// Trailing PEG.
    pub trailing_peg: Option<f64>,
}

impl Metric for PriceToEarningsGrowth {
    fn name(&self) -> &'static str {
        "Price to Earnings Growth"
    }

    fn description(&self) -> &'static str {
        "Change of the PEG ratio relative to its trailing value."
    }

    fn compute_percent(&self) -> Option<f64> {
        one_minus_ratio(self.peg, self.trailing_peg)
    }

    fn columns(&self) -> Vec<MetricField> {
        vec![
            MetricField::real("PEG", self.peg),
            MetricField::real("TrailingPEG", self.trailing_peg),
        ]
    }
}

/// Forward versus trailing earnings per share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EarningsPerShare {
    /// Forward EPS.
    pub forward_eps: Option<f64>,
    /// Trailing EPS.
    pub trailing_eps: Option<f64>,
}

impl Metric for EarningsPerShare {
    fn name(&self) -> &'static str {
        "Earnings Per Share"
    }

    fn description(&self) -> &'static str {
        "Forward earnings per share relative to trailing earnings per share."
    }

    fn compute_percent(&self) -> Option<f64> {
        one_minus_ratio(self.forward_eps, self.trailing_eps)
    }

    fn columns(&self) -> Vec<MetricField> {
        vec![
            MetricField::real("ForwardEPS", self.forward_eps),
            MetricField::real("TrailingEPS", self.trailing_eps),
        ]
    }
}

// ============================================================================
// SECTION: Cash and Book Value
// ============================================================================

/// Free cash flow against market capitalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FreeCashflow {
    /// Free cash flow.
    pub free_cashflow: Option<f64>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
}

impl Metric for FreeCashflow {
    fn name(&self) -> &'static str {
        "Free Cashflow"
    }

    fn description(&self) -> &'static str {
        "Free cash flow as a share of market capitalization."
    }

    fn compute_percent(&self) -> Option<f64> {
        one_minus_ratio(self.free_cashflow, self.market_cap)
    }

    fn columns(&self) -> Vec<MetricField> {
        vec![
            MetricField::real("FreeCashflow", self.free_cashflow),
            MetricField::real("MarketCap", self.market_cap),
        ]
    }
}

/// Price-to-book ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceToBook {
    /// Price-to-book ratio.
    pub pb: Option<f64>,
}

impl Metric for PriceToBook {
    fn name(&self) -> &'static str {
        "Price to Book"
    }

    fn description(&self) -> &'static str {
        "Discount of market price to book value."
    }

    fn compute_percent(&self) -> Option<f64> {
        let pb = self.pb?;
        finite((1.0 - pb) / pb)
    }

    fn columns(&self) -> Vec<MetricField> {
        vec![MetricField::real("PriceToBook", self.pb)]
    }
}

/// Return on equity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnOnEquity {
    /// Return on equity.
    pub roe: Option<f64>,
}

impl Metric for ReturnOnEquity {
    fn name(&self) -> &'static str {
        "Return on Equity"
    }

    fn description(&self) -> &'static str {
        "Return on equity scored against a baseline of ten."
    }

    fn compute_percent(&self) -> Option<f64> {
        finite((10.0 - self.roe?) / 10.0)
    }

    fn columns(&self) -> Vec<MetricField> {
        vec![MetricField::real("ReturnOnEquity", self.roe)]
    }
}

// ============================================================================
// SECTION: Dividends, Sales, Leverage
// ============================================================================

/// Dividend payout ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendPayout {
    /// Dividend payout ratio.
    pub dp: Option<f64>,
}

impl Metric for DividendPayout {
    fn name(&self) -> &'static str {
        "Dividend Payout"
    }

    fn description(&self) -> &'static str {
        "Inverse of the dividend payout ratio."
    }

    fn compute_percent(&self) -> Option<f64> {
        finite(1.0 / self.dp?)
    }

    fn columns(&self) -> Vec<MetricField> {
        vec![MetricField::real("DividendPayout", self.dp)]
    }
}

/// Price-to-sales ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceToSales {
    /// Price-to-sales ratio.
    pub ps: Option<f64>,
}

impl Metric for PriceToSales {
    fn name(&self) -> &'static str {
        "Price to Sales"
    }

    fn description(&self) -> &'static str {
        "Price-to-sales ratio reported as-is."
    }

    fn compute_percent(&self) -> Option<f64> {
        finite(self.ps?)
    }

    fn columns(&self) -> Vec<MetricField> {
        vec![MetricField::real("PriceToSales", self.ps)]
    }
}

/// Dividend yield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendYield {
    /// Dividend yield.
    pub dy: Option<f64>,
}

impl Metric for DividendYield {
    fn name(&self) -> &'static str {
        "Dividend Yield"
    }

    fn description(&self) -> &'static str {
        "Dividend yield mapped onto the unit interval."
    }

    fn compute_percent(&self) -> Option<f64> {
        inverse_one_plus(self.dy)
    }

    fn columns(&self) -> Vec<MetricField> {
        vec![MetricField::real("DividendYield", self.dy)]
    }
}

/// Debt-to-equity ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DebtToEquity {
    /// Debt-to-equity ratio.
    pub de: Option<f64>,
}

impl Metric for DebtToEquity {
    fn name(&self) -> &'static str {
        "Debt to Equity"
    }

    fn description(&self) -> &'static str {
        "Leverage mapped onto the unit interval; lower debt scores higher."
    }

    fn compute_percent(&self) -> Option<f64> {
        inverse_one_plus(self.de)
    }

    fn columns(&self) -> Vec<MetricField> {
        vec![MetricField::real("DebtToEquity", self.de)]
    }
}
