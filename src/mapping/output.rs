//! Output sinks
//!
//! [`ChannelSink`] hands events to an async dispatcher over an mpsc channel,
//! [`TracingSink`] just logs them. Real OS injection lives behind whatever
//! consumes the channel.
//!
//! The channel is bounded for pointer motion only. Once `capacity` events are
//! waiting, new `MoveRelative` and `SetCursor` events are dropped, while key,
//! button and overlay events are always queued so every press keeps its
//! release.

use crate::mapping::mapping_types::OutputEvent;
use crate::mapping::providers::OutputSink;
use chrono::Local;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

fn is_motion(event: &OutputEvent) -> bool {
    matches!(
        event,
        OutputEvent::MoveRelative { .. } | OutputEvent::SetCursor(_)
    )
}

/// Forwards output events into an mpsc channel without blocking
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<OutputEvent>,
    backlog: Arc<AtomicUsize>,
    capacity: usize,
}

impl ChannelSink {
    /// Creates a sink together with the receiving end of its channel
    pub fn channel(capacity: usize) -> (Self, OutputReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let backlog = Arc::new(AtomicUsize::new(0));
        debug!("Created output channel with motion capacity {}", capacity);
        (
            Self {
                sender,
                backlog: backlog.clone(),
                capacity,
            },
            OutputReceiver { receiver, backlog },
        )
    }
}

impl OutputSink for ChannelSink {
    fn emit(&self, event: OutputEvent) {
        if is_motion(&event) && self.backlog.load(Ordering::Acquire) >= self.capacity {
            debug!("Output channel backed up, dropping {:?}", event);
            return;
        }

        self.backlog.fetch_add(1, Ordering::AcqRel);
        match self.sender.send(event) {
            Ok(_) => debug!("Output event queued: {:?}", event),
            Err(_) => {
                self.backlog.fetch_sub(1, Ordering::AcqRel);
                warn!("Output channel closed, dropping {:?}", event)
            }
        }
    }
}

/// Receiving end of a [`ChannelSink`]
#[derive(Debug)]
pub struct OutputReceiver {
    receiver: mpsc::UnboundedReceiver<OutputEvent>,
    backlog: Arc<AtomicUsize>,
}

impl OutputReceiver {
    pub async fn recv(&mut self) -> Option<OutputEvent> {
        let event = self.receiver.recv().await;
        if event.is_some() {
            self.backlog.fetch_sub(1, Ordering::AcqRel);
        }
        event
    }

    pub fn try_recv(&mut self) -> Option<OutputEvent> {
        let event = self.receiver.try_recv().ok();
        if event.is_some() {
            self.backlog.fetch_sub(1, Ordering::AcqRel);
        }
        event
    }

    /// Number of events queued and not yet received
    pub fn backlog(&self) -> usize {
        self.backlog.load(Ordering::Acquire)
    }
}

/// Logs every output event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn emit(&self, event: OutputEvent) {
        match event {
            OutputEvent::MoveRelative { .. } | OutputEvent::SetCursor(_) => {
                debug!("Output: {:?}", event)
            }
            _ => info!(
                "Output: {:?} at {}",
                event,
                Local::now().format("%H:%M:%S.%3f")
            ),
        }
    }
}

/// Drains the output channel into `sink` until cancelled or the channel closes
///
/// Returns the number of events dispatched.
pub async fn run_dispatcher(
    mut receiver: OutputReceiver,
    sink: impl OutputSink,
    cancel: CancellationToken,
) -> usize {
    info!("Starting output dispatcher");
    let mut dispatched = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Output dispatcher cancelled");
                break;
            }
            event = receiver.recv() => {
                match event {
                    Some(event) => {
                        sink.emit(event);
                        dispatched += 1;
                    }
                    None => {
                        info!("Output channel closed, dispatcher exiting");
                        break;
                    }
                }
            }
        }
    }

    info!("Output dispatcher finished after {} events", dispatched);
    dispatched
}
