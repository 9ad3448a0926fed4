//! Module for additional computational capabilities
pub mod uom_macros;
