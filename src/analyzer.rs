// src/analyzer.rs

//! The unprivileged side of the pipeline: decodes rendered samples and
//! scans them for the vertical extent of opaque pixels.
//!
//! This side can read pixel buffers but cannot enumerate styles; each
//! inbound request is served independently and answered exactly once,
//! with the originating style id carried back unchanged.

use crate::message::{HostMessage, ScanBounds, UiMessage};
use crate::tokens::TokenStore;
use image::RgbaImage;
use log::{debug, info, warn};
use std::sync::mpsc::{Receiver, Sender};

/// Decodes PNG sample bytes into an RGBA frame.
pub fn decode_sample(bytes: &[u8]) -> Result<RgbaImage, image::ImageError> {
    let decoded = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?;
    Ok(decoded.into_rgba8())
}

/// Scans a frame for its opaque vertical bounds.
///
/// `top` is the index of the first row holding a pixel with non-zero
/// alpha, scanning rows top to bottom and columns left to right within a
/// row. `bottom` is the distance of the last such row from the bottom
/// edge (`height - row`), found by the mirrored scan. `height` is always
/// the full canvas height, not a scan result. A fully transparent frame
/// yields `None` for both bounds.
pub fn scan_alpha_bounds(frame: &RgbaImage) -> ScanBounds {
    let (width, height) = frame.dimensions();

    let mut top = None;
    'top: for y in 0..height {
        for x in 0..width {
            if frame.get_pixel(x, y)[3] > 0 {
                top = Some(y);
                break 'top;
            }
        }
    }

    let mut bottom = None;
    'bottom: for y in (0..height).rev() {
        for x in (0..width).rev() {
            if frame.get_pixel(x, y)[3] > 0 {
                bottom = Some(height - y);
                break 'bottom;
            }
        }
    }

    ScanBounds { top, bottom, height }
}

/// What the analyzer hands back to its spawner once the host delivers the
/// finished config and the loop ends.
#[derive(Debug)]
pub struct AnalyzerOutcome {
    pub config: TokenStore,
}

/// Reactive loop for the UI-side process.
///
/// Readiness is announced once at startup. Every scan request gets
/// exactly one reply (decode failures travel back as the error outcome).
/// The loop ends when the completed config arrives; it returns `None` if
/// the host side goes away before the handoff.
pub fn run_analyzer(
    requests: Receiver<HostMessage>,
    replies: Sender<UiMessage>,
) -> Option<AnalyzerOutcome> {
    if replies.send(UiMessage::Ready).is_err() {
        warn!("analyzer: host went away before startup");
        return None;
    }

    for message in requests {
        match message {
            HostMessage::Bytes { id, bytes } => {
                debug!(
                    "analyzer: scanning {} byte sample for style '{}'",
                    bytes.len(),
                    id
                );
                let outcome = match decode_sample(&bytes) {
                    Ok(frame) => {
                        let bounds = scan_alpha_bounds(&frame);
                        if bounds.top.is_none() {
                            warn!("analyzer: sample for style '{}' is fully transparent", id);
                        }
                        Ok(bounds)
                    }
                    Err(err) => Err(err.to_string()),
                };
                if replies.send(UiMessage::Response { id, outcome }).is_err() {
                    warn!("analyzer: reply channel closed; stopping");
                    return None;
                }
            }
            HostMessage::Config { config } => {
                info!("analyzer: received final config with {} groups", config.len());
                return Some(AnalyzerOutcome { config });
            }
        }
    }

    warn!("analyzer: request channel closed before the config handoff");
    None
}
