//! Window-addressed event bus.
//!
//! # Responsibility
//! - Keep a registry of UI surfaces (windows) and their event queues.
//! - Deliver typed event envelopes to one window, fire-and-forget.
//!
//! # Invariants
//! - Events sent to the same window from one caller arrive in send order.
//! - Sending to an unregistered window is a silent no-op, never an error.
//! - A registration whose receiver was dropped is pruned on the next send.

use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};

pub const EVENT_LAYOUT_ACTION: &str = "layout-action";

/// Layout mutation requested from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutActionType {
    #[serde(rename = "insertatindex")]
    InsertAtIndex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutActionData {
    pub action_type: LayoutActionType,
    pub tab_id: String,
    pub block_id: String,
    /// Position in the nested layout tree.
    pub index_path: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_hint: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventData {
    LayoutAction(LayoutActionData),
}

/// Envelope pushed to a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowEvent {
    pub event_type: String,
    pub window_id: String,
    pub data: EventData,
}

impl WindowEvent {
    pub fn layout_action(window_id: impl Into<String>, data: LayoutActionData) -> Self {
        Self {
            event_type: EVENT_LAYOUT_ACTION.to_string(),
            window_id: window_id.into(),
            data: EventData::LayoutAction(data),
        }
    }

    pub fn as_layout_action(&self) -> Option<&LayoutActionData> {
        match &self.data {
            EventData::LayoutAction(data) => Some(data),
        }
    }
}

#[derive(Debug)]
struct Registration {
    generation: u64,
    tx: Sender<WindowEvent>,
}

/// Registry of window event queues shared across requests.
#[derive(Debug, Default)]
pub struct EventBus {
    windows: RwLock<HashMap<String, Registration>>,
    next_generation: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a window and returns its event receiver.
    ///
    /// Re-registering replaces the previous queue; its receiver sees the
    /// channel close.
    pub fn register(&self, window_id: impl Into<String>) -> Receiver<WindowEvent> {
        let window_id = window_id.into();
        let (tx, rx) = channel();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        debug!("event=bus_register module=eventbus status=ok window_id={window_id}");
        self.windows
            .write()
            .insert(window_id, Registration { generation, tx });
        rx
    }

    pub fn unregister(&self, window_id: &str) {
        if self.windows.write().remove(window_id).is_some() {
            debug!("event=bus_unregister module=eventbus status=ok window_id={window_id}");
        }
    }

    pub fn is_registered(&self, window_id: &str) -> bool {
        self.windows.read().contains_key(window_id)
    }

    /// Pushes `event` to `window_id`.
    ///
    /// Returns whether the event was queued. Callers are free to ignore the
    /// result: no observer is not a failure.
    pub fn send_event_to_window(&self, window_id: &str, event: WindowEvent) -> bool {
        let (generation, delivered) = {
            let windows = self.windows.read();
            let Some(registration) = windows.get(window_id) else {
                debug!(
                    "event=bus_send module=eventbus status=dropped reason=unregistered window_id={window_id} event_type={}",
                    event.event_type
                );
                return false;
            };
            (registration.generation, registration.tx.send(event).is_ok())
        };

        if !delivered {
            debug!(
                "event=bus_send module=eventbus status=dropped reason=disconnected window_id={window_id}"
            );
            let mut windows = self.windows.write();
            // Leave a registration made after the failed send alone.
            if windows
                .get(window_id)
                .is_some_and(|current| current.generation == generation)
            {
                windows.remove(window_id);
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_event(window_id: &str, block_id: &str, index_path: Vec<usize>) -> WindowEvent {
        WindowEvent::layout_action(
            window_id,
            LayoutActionData {
                action_type: LayoutActionType::InsertAtIndex,
                tab_id: "tab-1".to_string(),
                block_id: block_id.to_string(),
                index_path,
                size_hint: None,
            },
        )
    }

    #[test]
    fn send_to_unregistered_window_is_dropped_silently() {
        let bus = EventBus::new();
        assert!(!bus.send_event_to_window("nobody", insert_event("nobody", "b1", vec![0])));
    }

    #[test]
    fn events_to_one_window_arrive_in_order() {
        let bus = EventBus::new();
        let rx = bus.register("w1");

        for i in 0..5 {
            assert!(bus.send_event_to_window("w1", insert_event("w1", &format!("b{i}"), vec![i])));
        }

        let received: Vec<String> = rx
            .try_iter()
            .filter_map(|event| event.as_layout_action().map(|data| data.block_id.clone()))
            .collect();
        assert_eq!(received, vec!["b0", "b1", "b2", "b3", "b4"]);
    }

    #[test]
    fn events_are_not_cross_delivered() {
        let bus = EventBus::new();
        let rx_a = bus.register("a");
        let rx_b = bus.register("b");

        bus.send_event_to_window("a", insert_event("a", "only-a", vec![0]));

        assert_eq!(rx_a.try_iter().count(), 1);
        assert_eq!(rx_b.try_iter().count(), 0);
    }

    #[test]
    fn dropped_receiver_is_pruned() {
        let bus = EventBus::new();
        drop(bus.register("w1"));

        assert!(!bus.send_event_to_window("w1", insert_event("w1", "b1", vec![0])));
        assert!(!bus.is_registered("w1"));
    }

    #[test]
    fn unregister_stops_delivery() {
        let bus = EventBus::new();
        let rx = bus.register("w1");
        bus.unregister("w1");

        assert!(!bus.send_event_to_window("w1", insert_event("w1", "b1", vec![0])));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn envelope_serializes_to_wire_shape() {
        let mut event = insert_event("w1", "b1", vec![1, 2]);
        if let EventData::LayoutAction(data) = &mut event.data {
            data.size_hint = Some(40);
        }
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["eventType"], "layout-action");
        assert_eq!(json["windowId"], "w1");
        assert_eq!(json["data"]["actionType"], "insertatindex");
        assert_eq!(json["data"]["tabId"], "tab-1");
        assert_eq!(json["data"]["blockId"], "b1");
        assert_eq!(json["data"]["indexPath"], serde_json::json!([1, 2]));
        assert_eq!(json["data"]["sizeHint"], 40);
    }

    #[test]
    fn size_hint_is_omitted_when_absent() {
        let json = serde_json::to_value(insert_event("w1", "b1", vec![0])).unwrap();
        assert!(json["data"].get("sizeHint").is_none());
    }
}
