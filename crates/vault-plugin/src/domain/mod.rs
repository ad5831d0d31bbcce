//! Domain layer for the vault reporting plugin
//!
//! - config: resolved offchain configuration and protocol limits
//! - errors: item/store/plugin error classification
//! - identifier: secret identifier validation
//! - quorum: 2f+1 threshold math
//! - context: round cancellation
//! - ocr: values exchanged with the OCR host

mod config;
mod context;
mod errors;
mod identifier;
mod ocr;
mod quorum;

pub use config::*;
pub use context::*;
pub use errors::*;
pub use identifier::*;
pub use ocr::*;
pub use quorum::*;
