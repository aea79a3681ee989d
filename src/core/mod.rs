//! Core Module - Deposit evaluation
//!
//! Recipient resolution, on-chain identification, rule evaluation and
//! rendering.

pub mod deployment;
pub mod evaluator;
pub mod identifier;
pub mod locator;
pub mod presenter;
pub mod resolver;
pub mod rules;

pub use deployment::*;
pub use evaluator::*;
pub use identifier::*;
pub use locator::*;
pub use presenter::*;
pub use resolver::*;
pub use rules::*;
