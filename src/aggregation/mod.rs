//! Statistics and Aggregation Engine
//!
//! This module reduces weather time series along the time axis, across
//! locations, or both.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │          DataFunctions              │
//! │   inner + outer function pair       │
//! └─────────────────────────────────────┘
//!                  ↓
//! ┌─────────────────────────────────────┐
//! │            Aggregator               │
//! │  dispatch on (inner, outer) kinds   │
//! └─────────────────────────────────────┘
//!          ↓                   ↓
//! ┌─────────────────┐ ┌─────────────────┐
//! │ time_aggregate  │ │ area_aggregate  │
//! │ sliding window  │ │ per time slice  │
//! └─────────────────┘ └─────────────────┘
//!                  ↓
//! ┌─────────────────────────────────────┐
//! │          StatCalculator             │
//! │  numeric -> Stat, others by type    │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Key Components
//!
//! - **Stat**: weighted statistics over `(time, value, weight)` samples
//! - **DataFunction**: statistic, axis, limits and window of one reduction
//! - **Aggregator**: composes time and area reductions and counts its work

pub mod aggregator;
pub mod function;
pub mod stat;

pub use aggregator::{
    area_aggregate, filter, include_value, time_aggregate, time_aggregate_group, Aggregatable,
    Aggregator, AggregatorStats, AggregatorStatsSnapshot, StatCalculator, DEFAULT_MISSING_VALUE,
};
pub use function::{
    DataFunction, DataFunctions, FunctionId, FunctionType, MAX_AGGREGATION_INTERVAL,
};
pub use stat::{DataItem, Stat, Window};
