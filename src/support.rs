//! Supporting utilities used by models.
//!
//! These modules are public because they are useful on their own (and are
//! needed to implement the collaborator traits the models call), but their
//! APIs are not stable.

pub mod constraint;
pub mod field;
pub mod time;
pub mod units;
