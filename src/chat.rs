//! In-process change feed for chat rooms.
//!
//! Consumers do not receive message payloads; an event only says "something
//! changed in room X" so cached message lists can be invalidated and
//! re-fetched. Subscriptions are scoped handles: dropping the handle
//! releases the room slot, and rooms with no subscribers are removed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use uuid::Uuid;

const ROOM_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomEvent {
    pub room_id: Uuid,
}

struct RoomChannel {
    tx: broadcast::Sender<RoomEvent>,
    subscribers: usize,
}

#[derive(Clone, Default)]
pub struct ChatHub {
    rooms: Arc<Mutex<HashMap<Uuid, RoomChannel>>>,
}

impl ChatHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a scoped subscription to a room's change feed.
    pub fn subscribe(&self, room_id: Uuid) -> RoomSubscription {
        let mut rooms = self.rooms.lock().expect("chat hub lock poisoned");
        let channel = rooms.entry(room_id).or_insert_with(|| RoomChannel {
            tx: broadcast::channel(ROOM_CHANNEL_CAPACITY).0,
            subscribers: 0,
        });
        channel.subscribers += 1;
        RoomSubscription {
            hub: self.clone(),
            room_id,
            rx: channel.tx.subscribe(),
        }
    }

    /// Notify subscribers that the room's message list is stale.
    /// A room nobody is watching is a no-op.
    pub fn publish(&self, room_id: Uuid) {
        let rooms = self.rooms.lock().expect("chat hub lock poisoned");
        if let Some(channel) = rooms.get(&room_id) {
            let _ = channel.tx.send(RoomEvent { room_id });
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().expect("chat hub lock poisoned").len()
    }

    fn release(&self, room_id: Uuid) {
        let mut rooms = self.rooms.lock().expect("chat hub lock poisoned");
        if let Some(channel) = rooms.get_mut(&room_id) {
            channel.subscribers -= 1;
            if channel.subscribers == 0 {
                rooms.remove(&room_id);
            }
        }
    }
}

pub struct RoomSubscription {
    hub: ChatHub,
    room_id: Uuid,
    rx: broadcast::Receiver<RoomEvent>,
}

impl RoomSubscription {
    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    /// Next invalidation event, or `None` once the feed is closed. A lagged
    /// receiver skips ahead: the only information carried is staleness, so
    /// missed events collapse into the next one.
    pub async fn recv(&mut self) -> Option<RoomEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        self.hub.release(self.room_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let hub = ChatHub::new();
        let room = Uuid::new_v4();
        let mut first = hub.subscribe(room);
        let mut second = hub.subscribe(room);

        hub.publish(room);

        assert_eq!(first.recv().await.unwrap().room_id, room);
        assert_eq!(second.recv().await.unwrap().room_id, room);
    }

    #[tokio::test]
    async fn publish_to_unwatched_room_is_a_no_op() {
        let hub = ChatHub::new();
        hub.publish(Uuid::new_v4());
        assert_eq!(hub.room_count(), 0);
    }

    #[tokio::test]
    async fn dropping_the_handle_releases_the_room() {
        let hub = ChatHub::new();
        let room = Uuid::new_v4();
        let first = hub.subscribe(room);
        let second = hub.subscribe(room);
        assert_eq!(hub.room_count(), 1);

        drop(first);
        assert_eq!(hub.room_count(), 1);
        drop(second);
        assert_eq!(hub.room_count(), 0);
    }

    #[tokio::test]
    async fn events_are_scoped_to_their_room() {
        let hub = ChatHub::new();
        let room_a = Uuid::new_v4();
        let room_b = Uuid::new_v4();
        let mut sub_a = hub.subscribe(room_a);
        let _sub_b = hub.subscribe(room_b);

        hub.publish(room_b);
        hub.publish(room_a);

        assert_eq!(sub_a.recv().await.unwrap().room_id, room_a);
    }
}
