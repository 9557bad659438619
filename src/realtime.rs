// quill-service/src/realtime.rs
//
// Per-document broadcast rooms. Transient and best-effort: events are
// relayed to whoever is currently subscribed and then forgotten. The
// document store stays the system of record; nothing here persists or
// acknowledges anything.
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Buffered events per room before slow subscribers start lagging.
const ROOM_CAPACITY: usize = 64;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoomEvent {
    /// Last-write-wins relay of an in-flight edit. No ordering is promised
    /// across concurrent senders.
    DocumentUpdated { title: String, content: String },
    /// The access list changed; subscribers should re-fetch the document.
    /// The list itself is never broadcast, so it cannot go stale in flight.
    AccessChanged { document_id: String },
}

#[derive(Default)]
pub struct RoomHub {
    rooms: Mutex<HashMap<String, broadcast::Sender<RoomEvent>>>,
}

impl RoomHub {
    pub fn new() -> RoomHub {
        RoomHub::default()
    }

    /// Join the room for a document, creating it on first join.
    ///
    /// A poisoned lock is recovered rather than propagated: the map holds
    /// only senders, so it stays consistent even if a holder panicked.
    pub fn join(&self, document_id: &str) -> broadcast::Receiver<RoomEvent> {
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        rooms
            .entry(document_id.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Fire-and-forget publish. Returns the number of subscribers the event
    /// reached; an empty room is not an error. Rooms nobody is left in are
    /// dropped on the way out.
    pub fn publish(&self, document_id: &str, event: RoomEvent) -> usize {
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        let reached = match rooms.get(document_id) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        };
        if reached == 0 {
            rooms.remove(document_id);
        }
        reached
    }

    #[cfg(test)]
    pub fn room_count(&self) -> usize {
        self.rooms.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
