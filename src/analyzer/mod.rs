//! Analyzer module - rubric scoring engine

pub mod engine;
pub mod scoring;
pub mod signals;

pub use engine::{AggregateStats, RubricEngine};
pub use scoring::ScoreCalculator;
pub use signals::{Signal, SignalContext, SignalSet};
