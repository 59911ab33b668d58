//! CLI command implementations.

pub mod layout;
pub mod roundtrip;
