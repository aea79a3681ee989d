//! Providers Module - External Data Sources
//!
//! The chain capability trait and its JSON-RPC implementation.

pub mod chain;
pub mod rpc;

pub use chain::*;
pub use rpc::*;
