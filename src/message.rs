// src/message.rs

//! Message kinds crossing the host/UI process boundary.
//!
//! The transport is ordered and delivers at least once, but makes no
//! promise about reply order across different correlation ids; every
//! reply therefore carries the originating style id unchanged.

use crate::style::StyleId;
use crate::tokens::TokenStore;

/// Scan result for one rendered sample: distances of the first opaque
/// pixel from the top and bottom edges, plus the full canvas height.
/// Both bounds are `None` when the render contained no opaque pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanBounds {
    pub top: Option<u32>,
    pub bottom: Option<u32>,
    pub height: u32,
}

/// Messages the privileged host side sends to the UI side.
#[derive(Debug)]
pub enum HostMessage {
    /// Rendered PNG bytes for one style, awaiting a bounds scan.
    Bytes { id: StyleId, bytes: Vec<u8> },
    /// The completed token store, handed off for editing and export.
    /// Sent exactly once, after every style has been processed.
    Config { config: TokenStore },
}

/// Messages the UI side sends back to the host.
#[derive(Debug)]
pub enum UiMessage {
    /// Sent once at startup; triggers the pipeline.
    Ready,
    /// Reply to a `Bytes` request, tagged with the originating style id.
    /// A decode failure travels back as the error text and is fatal
    /// host-side; there is no retry policy.
    Response {
        id: StyleId,
        outcome: Result<ScanBounds, String>,
    },
}
