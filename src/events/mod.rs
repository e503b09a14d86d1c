use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Domain events emitted after a write commits. These are notifications
/// for collaborators (audit log, notifications service) and never part
/// of the write itself; the ledger stays correct whether or not anyone
/// is listening.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockReceived {
        event_id: i32,
        part_id: i32,
        location_id: i32,
        qty: i32,
    },
    StockReturned {
        event_id: i32,
        part_id: i32,
        location_id: i32,
        qty: i32,
    },
    StockCorrected {
        event_id: i32,
        part_id: i32,
        location_id: i32,
        qty_delta: i32,
    },
    RequestCreated(i32),
    RequestApproved(i32),
    RequestFulfilled {
        request_id: i32,
        event_ids: Vec<i32>,
    },
    RequestCancelled(i32),
    LocationCreated(i32),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Creates a channel pair sized for a single-process deployment.
pub fn event_channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. The embedding server
/// replaces this with its real subscriber wiring.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = rx.recv().await {
        debug!(?event, "processing event");
    }
    info!("Event processor stopped");
}
