//! Pure domain logic: no I/O, no clocks of its own.

pub mod analytics;
pub mod numbering;
pub mod settlement;
