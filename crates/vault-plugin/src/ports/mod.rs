//! Ports layer (Hexagonal Architecture)
//!
//! Inbound: what the OCR host drives. Outbound: what the plugin consumes.

mod inbound;
mod outbound;

pub use inbound::*;
pub use outbound::*;
