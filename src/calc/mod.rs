//! Calculation engines.
//!
//! A [`CalculationEngine`] holds named expressions that may read each
//! other's results, tracks those reads in a [`DependencyManager`] and
//! recomputes only what a change affects, in dependency order. A
//! [`BatchLoader`] adds many entries at once in whatever order they were
//! written. [`SimpleCalcEngine`] is a lighter alternative that links
//! expressions through expression variables and has no recalculation step.

mod batch;
pub mod dependency;
mod engine;
mod error;
mod results;
mod simple;

pub use batch::BatchLoader;
pub use dependency::DependencyManager;
pub use engine::{CalculationEngine, NodeEvent};
pub use error::CalcError;
pub use simple::SimpleCalcEngine;

pub(crate) use results::SharedResults;
