//! Common code shared between the detection client and its test harness.
pub mod blob;
pub mod protocol;
