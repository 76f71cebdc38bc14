//! Integration module for the estimation pipeline.
//!
//! Bridges the holdings `DataFrame` coming out of `hobart-data` to the
//! `ObservationSet` the estimators consume, and the fits back into a
//! `DemandSummary` for display.

pub(crate) mod pipeline;
