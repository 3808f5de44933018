//! UI-affine event dispatcher.
//!
//! The JS bridge needs single-threaded, ordered delivery. Every emission is
//! queued on one unbounded channel and handed to the sink by a single
//! consumer task, so events from one producer reach JS in the order they
//! were dispatched. Interleaving across producers is unspecified.

use std::sync::Arc;

use log::{info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use financekit_core::events::{EmitError, RelayEvent, RelayEventSink};

enum Dispatch {
    Event(RelayEvent),
    Confirmed(RelayEvent, oneshot::Sender<Result<(), EmitError>>),
    Flush(oneshot::Sender<()>),
}

/// Handle for queuing events onto the UI context.
#[derive(Clone)]
pub struct UiDispatcher {
    tx: mpsc::UnboundedSender<Dispatch>,
}

impl UiDispatcher {
    /// Starts the consumer task. It runs until every handle is dropped.
    pub fn spawn(sink: Arc<dyn RelayEventSink>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(ui_event_worker(rx, sink));
        (Self { tx }, handle)
    }

    /// Queues an event without waiting for the bridge.
    pub fn dispatch(&self, event: RelayEvent) -> Result<(), EmitError> {
        self.tx
            .send(Dispatch::Event(event))
            .map_err(|_| EmitError::DispatcherClosed)
    }

    /// Queues an event and waits until the sink accepted or refused it.
    pub async fn dispatch_confirmed(&self, event: RelayEvent) -> Result<(), EmitError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Dispatch::Confirmed(event, ack_tx))
            .map_err(|_| EmitError::DispatcherClosed)?;
        ack_rx.await.map_err(|_| EmitError::DispatcherClosed)?
    }

    /// Waits until everything queued before this call has been handed over.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Dispatch::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

async fn ui_event_worker(
    mut rx: mpsc::UnboundedReceiver<Dispatch>,
    sink: Arc<dyn RelayEventSink>,
) {
    info!("UI event dispatcher started");

    while let Some(dispatch) = rx.recv().await {
        match dispatch {
            Dispatch::Event(event) => {
                let name = event.name();
                if let Err(e) = sink.emit(event) {
                    warn!("Dropped {} event: {}", name.as_str(), e);
                }
            }
            Dispatch::Confirmed(event, ack) => {
                let _ = ack.send(sink.emit(event));
            }
            Dispatch::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    info!("UI event dispatcher shutting down");
}
