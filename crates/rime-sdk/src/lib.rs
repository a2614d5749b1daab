//! # RIME SDK
//!
//! Client SDK for interacting with RIME nodes.

pub mod client;
pub mod stream;

pub use client::RimeClient;
pub use stream::EventStream;

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::client::RimeClient;
    pub use crate::stream::EventStream;
    pub use rime_core::prelude::*;
    pub use rime_state::{EventKind, RimeEvent};
}
