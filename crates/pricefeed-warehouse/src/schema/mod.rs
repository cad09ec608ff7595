/// Helpers shared by every source
pub mod common;
pub mod fx;
pub mod stock;
