//! Portfolio summary module.
//!
//! Builds the full-portfolio view: holdings and positions as separate detail
//! lists plus portfolio-wide totals.

mod summary_model;
mod summary_service;

pub use summary_model::*;
pub use summary_service::*;
