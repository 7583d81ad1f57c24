// Cart change notifications
// Every subscriber alive at publish time receives the event. Nothing is queued for
// subscribers that join later, and publishing with nobody listening is fine.

use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum CartEvent {
    Updated { order_item_id: String },
    Removed { order_item_id: String },
    Added { order_item_id: String },
    Refreshed { item_count: usize },
}

#[derive(Debug, Clone)]
pub struct CartEvents {
    sender: broadcast::Sender<CartEvent>,
}

impl Default for CartEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl CartEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    // Returns how many subscribers the event was delivered to
    pub fn publish(&self, event: CartEvent) -> usize {
        match self.sender.send(event) {
            Ok(delivered) => delivered,
            Err(broadcast::error::SendError(event)) => {
                debug!(?event, "cart event dropped, no subscribers");
                0
            }
        }
    }
}
