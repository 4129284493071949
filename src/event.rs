use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::cart::CartSummary;
use crate::catalog::CatalogSnapshot;

/// Storefront events
#[derive(Debug, Clone)]
pub enum ShopEvent {
  /// A catalog snapshot became current
  CatalogLoaded(Arc<CatalogSnapshot>),
  /// The cart was mutated; carries the full cart as re-read from the store
  CartChanged(CartSummary),
  /// A storefront operation failed and left prior state unchanged
  OperationFailed {
    operation: &'static str,
    message: String,
  },
}

/// Fan-out of storefront events to any number of subscribers
#[derive(Clone)]
pub struct EventBus {
  tx: broadcast::Sender<ShopEvent>,
}

impl EventBus {
  pub fn new(capacity: usize) -> Self {
    let (tx, _rx) = broadcast::channel(capacity);
    Self { tx }
  }

  pub fn subscribe(&self) -> EventStream {
    EventStream {
      rx: self.tx.subscribe(),
    }
  }

  pub fn publish(&self, event: ShopEvent) {
    if self.tx.send(event).is_err() {
      debug!("no subscribers for storefront event");
    }
  }
}

impl Default for EventBus {
  fn default() -> Self {
    Self::new(64)
  }
}

/// One subscriber's view of the event bus
pub struct EventStream {
  rx: broadcast::Receiver<ShopEvent>,
}

impl EventStream {
  /// Receive the next event, skipping over anything this subscriber was too
  /// slow to see.
  #[allow(dead_code)]
  pub async fn next(&mut self) -> Option<ShopEvent> {
    loop {
      match self.rx.recv().await {
        Ok(event) => return Some(event),
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
          warn!(skipped, "event subscriber lagged");
        }
        Err(broadcast::error::RecvError::Closed) => return None,
      }
    }
  }

  /// Take the next already-published event without waiting.
  pub fn try_next(&mut self) -> Option<ShopEvent> {
    loop {
      match self.rx.try_recv() {
        Ok(event) => return Some(event),
        Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
          warn!(skipped, "event subscriber lagged");
        }
        Err(_) => return None,
      }
    }
  }
}
