//! Broker domain - linked accounts and the cached rows they report.

mod broker_model;
mod broker_traits;

pub use broker_model::*;
pub use broker_traits::*;
