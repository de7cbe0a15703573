//! Media aggregation.
//!
//! The aggregator fans one title out to every enabled, capability-matching
//! source concurrently, then reconciles the per-source results into a
//! single ranked [`vermeer_core::MediaContext`]: style filtering, the
//! fallback-if-none-found rule, stable priority ordering, square-icon
//! promotion and the title-as-icon substitution, in that order.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod aggregator;
mod merge;

pub use aggregator::Aggregator;
