//! MCPS request primitives.

mod data;
