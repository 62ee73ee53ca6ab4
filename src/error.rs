//! Error handling for C2M operations
//!
//! This module re-exports the error type used throughout the codec. It uses
//! thiserror and carries byte offsets or cell indexes wherever the failing
//! input can be located.

pub use crate::common::C2mError;
pub use crate::common::Result;
