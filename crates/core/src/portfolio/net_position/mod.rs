//! Net position module.
//!
//! Merges cached holdings and positions into one row per symbol, with equity
//! and derivative cost bases kept strictly apart.

mod net_position_model;
mod net_position_service;

pub use net_position_model::*;
pub use net_position_service::*;
