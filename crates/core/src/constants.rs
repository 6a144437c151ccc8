/// Decimal precision for valuation calculations
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for percentage figures
pub const PERCENT_DECIMAL_PRECISION: u32 = 2;
