// src/transport.rs

//! Request/response plumbing between the orchestrator and the analyzer.
//!
//! The channel itself is ordered and non-blocking, but replies are
//! matched to in-flight requests through a pending-request table keyed by
//! style id, never by arrival order. At most one render is in flight at a
//! time (the host-side scratch node must be discarded before the next
//! style can render), so `request_scan` is a synchronous-looking
//! suspension point: it sends, then pumps the receiver until its own id
//! is fulfilled or the bounded wait expires.

use crate::error::PipelineError;
use crate::message::{HostMessage, ScanBounds, UiMessage};
use crate::style::StyleId;
use crate::tokens::TokenStore;
use log::{debug, trace, warn};
use std::collections::HashMap;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// How long the host waits for a scan reply before declaring the request
/// dead. A reply that never arrives would otherwise stall the pipeline
/// forever.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// One in-flight request slot. Fulfilled exactly once.
#[derive(Debug)]
enum Pending {
    Waiting,
    Fulfilled(Result<ScanBounds, String>),
}

/// Table of in-flight scan requests plus the dispatch logic that resolves
/// exactly the entry matching an inbound reply's id.
#[derive(Debug, Default)]
pub struct ResponseBroker {
    pending: HashMap<StyleId, Pending>,
}

impl ResponseBroker {
    pub fn new() -> Self {
        ResponseBroker {
            pending: HashMap::new(),
        }
    }

    /// Registers a request slot for `id`. The pipeline keeps at most one
    /// render in flight, but the table keys on identity so a late reply
    /// for an earlier request can never satisfy the wrong await.
    pub fn register(&mut self, id: StyleId) {
        if self.pending.insert(id.clone(), Pending::Waiting).is_some() {
            warn!("broker: duplicate registration for style '{}'", id);
        }
    }

    /// Routes one inbound message. Replies for ids nobody is waiting on,
    /// and second replies for an already-fulfilled id, are logged and
    /// dropped.
    pub fn dispatch(&mut self, message: UiMessage) {
        match message {
            UiMessage::Ready => {
                debug!("broker: READY received outside startup; ignoring");
            }
            UiMessage::Response { id, outcome } => match self.pending.get_mut(&id) {
                Some(slot @ Pending::Waiting) => {
                    trace!("broker: fulfilling request for style '{}'", id);
                    *slot = Pending::Fulfilled(outcome);
                }
                Some(Pending::Fulfilled(_)) => {
                    warn!("broker: second reply for style '{}' dropped", id);
                }
                None => {
                    warn!("broker: reply for unknown style '{}' dropped", id);
                }
            },
        }
    }

    /// Removes and returns the fulfilled outcome for `id`, if it is ready.
    pub fn take(&mut self, id: &StyleId) -> Option<Result<ScanBounds, String>> {
        if !matches!(self.pending.get(id), Some(Pending::Fulfilled(_))) {
            return None;
        }
        match self.pending.remove(id) {
            Some(Pending::Fulfilled(outcome)) => Some(outcome),
            _ => None,
        }
    }
}

/// The orchestrator's view of the analyzer process.
pub trait AnalyzerLink {
    /// Sends one rendered sample and blocks until its correlated bounds
    /// arrive.
    fn request_scan(&mut self, id: &StyleId, bytes: Vec<u8>) -> Result<ScanBounds, PipelineError>;

    /// Hands the finished token store to the UI side.
    fn post_config(&mut self, config: TokenStore) -> Result<(), PipelineError>;
}

/// Channel-backed link used by the real pipeline. Owns the host ends of
/// both channels and the broker that correlates replies.
pub struct ChannelLink {
    tx: Sender<HostMessage>,
    rx: Receiver<UiMessage>,
    broker: ResponseBroker,
    timeout: Duration,
}

impl ChannelLink {
    pub fn new(tx: Sender<HostMessage>, rx: Receiver<UiMessage>) -> Self {
        ChannelLink {
            tx,
            rx,
            broker: ResponseBroker::new(),
            timeout: RESPONSE_TIMEOUT,
        }
    }

    #[cfg(test)]
    fn with_timeout(tx: Sender<HostMessage>, rx: Receiver<UiMessage>, timeout: Duration) -> Self {
        ChannelLink {
            tx,
            rx,
            broker: ResponseBroker::new(),
            timeout,
        }
    }

    /// Blocks until the UI side announces it is listening. Anything else
    /// arriving first is routed through the broker.
    pub fn wait_ready(&mut self) -> Result<(), PipelineError> {
        loop {
            match self.rx.recv() {
                Ok(UiMessage::Ready) => {
                    debug!("link: analyzer ready");
                    return Ok(());
                }
                Ok(other) => self.broker.dispatch(other),
                Err(_) => return Err(PipelineError::ChannelClosed),
            }
        }
    }
}

impl AnalyzerLink for ChannelLink {
    fn request_scan(&mut self, id: &StyleId, bytes: Vec<u8>) -> Result<ScanBounds, PipelineError> {
        self.broker.register(id.clone());
        trace!("link: sending {} sample bytes for style '{}'", bytes.len(), id);
        self.tx
            .send(HostMessage::Bytes {
                id: id.clone(),
                bytes,
            })
            .map_err(|_| PipelineError::ChannelClosed)?;

        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(outcome) = self.broker.take(id) {
                return outcome.map_err(|reason| PipelineError::Decode {
                    style: id.clone(),
                    reason,
                });
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(PipelineError::RenderTimeout {
                    style: id.clone(),
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
            match self.rx.recv_timeout(remaining) {
                Ok(message) => self.broker.dispatch(message),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(PipelineError::RenderTimeout {
                        style: id.clone(),
                        timeout_ms: self.timeout.as_millis() as u64,
                    })
                }
                Err(RecvTimeoutError::Disconnected) => return Err(PipelineError::ChannelClosed),
            }
        }
    }

    fn post_config(&mut self, config: TokenStore) -> Result<(), PipelineError> {
        self.tx
            .send(HostMessage::Config { config })
            .map_err(|_| PipelineError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn bounds(top: u32, bottom: u32, height: u32) -> ScanBounds {
        ScanBounds {
            top: Some(top),
            bottom: Some(bottom),
            height,
        }
    }

    #[test]
    fn broker_fulfills_only_the_matching_entry() {
        let mut broker = ResponseBroker::new();
        let first = StyleId::new("S:1");
        let second = StyleId::new("S:2");
        broker.register(first.clone());
        broker.register(second.clone());

        broker.dispatch(UiMessage::Response {
            id: second.clone(),
            outcome: Ok(bounds(2, 2, 20)),
        });

        assert!(broker.take(&first).is_none());
        assert_eq!(broker.take(&second), Some(Ok(bounds(2, 2, 20))));
    }

    #[test]
    fn broker_drops_replies_for_unknown_ids() {
        let mut broker = ResponseBroker::new();
        broker.dispatch(UiMessage::Response {
            id: StyleId::new("S:ghost"),
            outcome: Ok(bounds(1, 1, 10)),
        });
        assert!(broker.take(&StyleId::new("S:ghost")).is_none());
    }

    #[test]
    fn broker_keeps_the_first_of_two_replies() {
        let mut broker = ResponseBroker::new();
        let id = StyleId::new("S:1");
        broker.register(id.clone());
        broker.dispatch(UiMessage::Response {
            id: id.clone(),
            outcome: Ok(bounds(3, 4, 30)),
        });
        broker.dispatch(UiMessage::Response {
            id: id.clone(),
            outcome: Ok(bounds(9, 9, 90)),
        });
        assert_eq!(broker.take(&id), Some(Ok(bounds(3, 4, 30))));
    }

    #[test_log::test]
    fn request_scan_skips_stale_replies_and_resolves_by_id() {
        let (host_tx, _ui_rx) = mpsc::channel();
        let (ui_tx, host_rx) = mpsc::channel();
        let id = StyleId::new("S:want");

        // A stray reply for a different id sits in the channel ahead of
        // the real one; correlation must skip past it.
        ui_tx
            .send(UiMessage::Response {
                id: StyleId::new("S:stale"),
                outcome: Ok(bounds(1, 1, 10)),
            })
            .unwrap();
        ui_tx
            .send(UiMessage::Response {
                id: id.clone(),
                outcome: Ok(bounds(5, 6, 40)),
            })
            .unwrap();

        let mut link = ChannelLink::new(host_tx, host_rx);
        let result = link.request_scan(&id, vec![0u8; 4]).unwrap();
        assert_eq!(result, bounds(5, 6, 40));
    }

    #[test]
    fn request_scan_times_out_when_no_reply_arrives() {
        let (host_tx, _ui_rx) = mpsc::channel();
        let (_ui_tx, host_rx) = mpsc::channel::<UiMessage>();
        let mut link = ChannelLink::with_timeout(host_tx, host_rx, Duration::from_millis(10));

        let err = link.request_scan(&StyleId::new("S:1"), Vec::new()).unwrap_err();
        assert!(matches!(err, PipelineError::RenderTimeout { .. }));
    }

    #[test]
    fn request_scan_surfaces_decode_failures_as_fatal() {
        let (host_tx, _ui_rx) = mpsc::channel();
        let (ui_tx, host_rx) = mpsc::channel();
        let id = StyleId::new("S:bad");
        ui_tx
            .send(UiMessage::Response {
                id: id.clone(),
                outcome: Err("not a PNG".to_string()),
            })
            .unwrap();

        let mut link = ChannelLink::new(host_tx, host_rx);
        let err = link.request_scan(&id, vec![1, 2, 3]).unwrap_err();
        match err {
            PipelineError::Decode { style, reason } => {
                assert_eq!(style, id);
                assert_eq!(reason, "not a PNG");
            }
            other => panic!("expected Decode, got {:?}", other),
        }
    }

    #[test]
    fn wait_ready_routes_early_replies_through_the_broker() {
        let (host_tx, _ui_rx) = mpsc::channel();
        let (ui_tx, host_rx) = mpsc::channel();
        ui_tx
            .send(UiMessage::Response {
                id: StyleId::new("S:early"),
                outcome: Ok(bounds(1, 1, 10)),
            })
            .unwrap();
        ui_tx.send(UiMessage::Ready).unwrap();

        let mut link = ChannelLink::new(host_tx, host_rx);
        assert!(link.wait_ready().is_ok());
    }

    #[test]
    fn channel_teardown_is_channel_closed() {
        let (host_tx, _ui_rx) = mpsc::channel();
        let (ui_tx, host_rx) = mpsc::channel::<UiMessage>();
        drop(ui_tx);
        let mut link = ChannelLink::new(host_tx, host_rx);
        assert!(matches!(
            link.wait_ready().unwrap_err(),
            PipelineError::ChannelClosed
        ));
    }
}
