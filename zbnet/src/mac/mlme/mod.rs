//! MLME request primitives, one exchange per module.

mod associate;
mod disassociate;
mod reset;
mod scan;
mod set;
mod start;
