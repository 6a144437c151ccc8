//! Portfolio aggregation - per-symbol net position merge and the
//! full-portfolio summary view.

pub mod net_position;
pub mod summary;

pub use net_position::*;
pub use summary::*;
