// crates/fundamentals-core/src/metrics/mod.rs
// ============================================================================
// Module: Fundamentals Metrics
// Description: Metric contract, ledger attachment, and tracked metric wrapper.
// Purpose: Compute percent scores and persist raw inputs as daily observations.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Every metric implements [`Metric`]: a pure `compute_percent` over its raw
//! inputs plus the columns it persists. A [`TrackedMetric`] computes the
//! percent eagerly and, when attached to a [`Ledger`], upserts
//! `{Date: today, <metric columns>}` into the shared ledger relation.
//!
//! Any missing required input yields a `None` percent; so does a non-finite
//! result such as a division by zero.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod fundamentals;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use crate::core::ColumnSpec;
use crate::core::DateSource;
use crate::core::LocalClock;
use crate::core::ScalarType;
use crate::core::Scalar;
use crate::core::Snapshot;
use crate::interfaces::RelationStore;
use crate::runtime::UpsertEngine;
use crate::runtime::UpsertError;
use crate::runtime::UpsertReport;

pub use fundamentals::DebtToEquity;
pub use fundamentals::DividendPayout;
pub use fundamentals::DividendYield;
pub use fundamentals::EarningsPerShare;
pub use fundamentals::FreeCashflow;
pub use fundamentals::PriceToBook;
pub use fundamentals::PriceToEarnings;
pub use fundamentals::PriceToEarningsGrowth;
pub use fundamentals::PriceToSales;
pub use fundamentals::ReturnOnEquity;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default relation shared by all fundamental metrics.
pub const DEFAULT_LEDGER_RELATION: &str = "Fundamentals";

// ============================================================================
// SECTION: Metric Contract
// ============================================================================

/// One persisted metric column and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricField {
    /// Column declaration.
    pub column: ColumnSpec,
    /// Value for the current observation.
    pub value: Scalar,
}

impl MetricField {
    /// Declares a real-valued field.
    #[must_use]
    pub fn real(name: &str, value: Option<f64>) -> Self {
        Self {
            column: ColumnSpec::new(name, ScalarType::Real),
            value: value.into(),
        }
    }
}

/// Contract implemented by every metric variant.
pub trait Metric {
    /// Human-readable metric name.
    fn name(&self) -> &'static str;

    /// Short description of what the metric measures.
    fn description(&self) -> &'static str;

    /// Computes the percent score, or `None` when inputs are missing or the
    /// result is not finite.
    fn compute_percent(&self) -> Option<f64>;

    /// Returns the raw input columns persisted for each observation.
    fn columns(&self) -> Vec<MetricField>;
}

/// Returns `value` when it is finite.
pub(crate) fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

// ============================================================================
// SECTION: Ledger
// ============================================================================

/// Shared relation that collects metric observations.
///
/// # Invariants
/// - Every observation is keyed by the date source's current date.
pub struct Ledger<'s> {
    /// Upsert engine over the attached store.
    engine: UpsertEngine<&'s dyn RelationStore>,
    /// Relation receiving observations.
    relation: String,
    /// Clock used to key observations.
    dates: Box<dyn DateSource + 's>,
}

impl<'s> Ledger<'s> {
    /// Creates a ledger over `engine` writing to the default relation with
    /// the local clock.
    #[must_use]
    pub fn new(engine: UpsertEngine<&'s dyn RelationStore>) -> Self {
        Self {
            engine,
            relation: DEFAULT_LEDGER_RELATION.to_string(),
            dates: Box::new(LocalClock),
        }
    }

    /// Overrides the ledger relation name.
    #[must_use]
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = relation.into();
        self
    }

    /// Overrides the date source.
    #[must_use]
    pub fn with_date_source(mut self, dates: impl DateSource + 's) -> Self {
        self.dates = Box::new(dates);
        self
    }

    /// Returns the ledger relation name.
    #[must_use]
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Returns the underlying engine.
    #[must_use]
    pub const fn engine(&self) -> &UpsertEngine<&'s dyn RelationStore> {
        &self.engine
    }

    /// Builds today's one-row observation for a metric.
    ///
    /// # Errors
    ///
    /// Returns [`UpsertError::Snapshot`] when a metric column collides with
    /// the key column or another metric column.
    pub fn observation<M: Metric + ?Sized>(&self, metric: &M) -> Result<Snapshot, UpsertError> {
        let key = ColumnSpec::new(self.engine.config().key_column.clone(), ScalarType::Text);
        let date = Scalar::Text(self.dates.today().key());
        let fields = metric.columns().into_iter().map(|field| (field.column, field.value));
        Ok(Snapshot::single_row(std::iter::once((key, date)).chain(fields))?)
    }

    /// Persists today's observation for a metric.
    ///
    /// # Errors
    ///
    /// Returns [`UpsertError`] when the upsert fails.
    pub fn record<M: Metric + ?Sized>(&self, metric: &M) -> Result<UpsertReport, UpsertError> {
        let observation = self.observation(metric)?;
        self.engine.upsert(&self.relation, &observation)
    }

    /// Reads the full ledger history.
    ///
    /// # Errors
    ///
    /// Returns [`UpsertError::Store`] when the relation cannot be read.
    pub fn history(&self) -> Result<Snapshot, UpsertError> {
        Ok(self.engine.store().read_relation(&self.relation)?)
    }
}

// ============================================================================
// SECTION: Tracked Metric
// ============================================================================

/// Metric paired with its derived percent and an optional ledger.
pub struct TrackedMetric<'l, M> {
    /// Metric inputs.
    metric: M,
    /// Derived percent score.
    percent: Option<f64>,
    /// Ledger receiving observations.
    ledger: Option<&'l Ledger<'l>>,
    /// Report of the most recent persisted observation.
    last_report: Option<UpsertReport>,
}

impl<'l, M: Metric> TrackedMetric<'l, M> {
    /// Computes the percent and, with a ledger attached, persists one
    /// observation.
    ///
    /// # Errors
    ///
    /// Returns [`UpsertError`] when persisting fails.
    pub fn new(metric: M, ledger: Option<&'l Ledger<'l>>) -> Result<Self, UpsertError> {
        let mut tracked = Self {
            metric,
            percent: None,
            ledger,
            last_report: None,
        };
        tracked.refresh()?;
        Ok(tracked)
    }

    /// Computes the percent without any persistence.
    #[must_use]
    pub fn detached(metric: M) -> Self {
        let percent = metric.compute_percent();
        Self {
            metric,
            percent,
            ledger: None,
            last_report: None,
        }
    }

    /// Recomputes the percent and persists an observation when attached.
    ///
    /// # Errors
    ///
    /// Returns [`UpsertError`] when persisting fails.
    pub fn refresh(&mut self) -> Result<Option<&UpsertReport>, UpsertError> {
        self.percent = self.metric.compute_percent();
        if let Some(ledger) = self.ledger {
            self.last_report = Some(ledger.record(&self.metric)?);
        }
        Ok(self.last_report.as_ref())
    }

    /// Mutates the inputs, then refreshes.
    ///
    /// # Errors
    ///
    /// Returns [`UpsertError`] when persisting fails.
    pub fn update_inputs(
        &mut self,
        change: impl FnOnce(&mut M),
    ) -> Result<Option<&UpsertReport>, UpsertError> {
        change(&mut self.metric);
        self.refresh()
    }

    /// Returns the metric inputs.
    pub const fn metric(&self) -> &M {
        &self.metric
    }

    /// Returns the derived percent score.
    pub const fn percent(&self) -> Option<f64> {
        self.percent
    }

    /// Returns the metric name.
    pub fn name(&self) -> &'static str {
        self.metric.name()
    }

    /// Returns the metric description.
    pub fn description(&self) -> &'static str {
        self.metric.description()
    }

    /// Returns the most recent persistence report.
    pub const fn last_report(&self) -> Option<&UpsertReport> {
        self.last_report.as_ref()
    }
}

impl<M: Metric> fmt::Display for TrackedMetric<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent {
            None => write!(f, "{}: 0%", self.name()),
            Some(percent) => {
                let rounded = (percent * 10_000.0).round() / 100.0;
                write!(f, "{}: {rounded}%", self.name())
            }
        }
    }
}
