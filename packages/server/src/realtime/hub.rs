use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use common::realtime::{PresenceNotice, ServerEvent};
use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Identifies one WebSocket connection. A user may hold several.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

struct Subscriber {
    user_id: i32,
    tx: UnboundedSender<ServerEvent>,
}

/// Process-local registry of which connections listen to which room.
///
/// Presence is derived from it: a user is present in a room while at least
/// one of their connections is subscribed. Nothing here is persisted.
pub struct ChatHub {
    rooms: DashMap<i32, HashMap<ConnectionId, Subscriber>>,
    next_id: AtomicU64,
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatHub {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Subscribe `conn` to `room_id`.
    ///
    /// The other subscribers hear `userJoined` only when this is the user's
    /// first connection in the room. Returns the users present after
    /// joining, the caller included.
    pub fn join(
        &self,
        room_id: i32,
        conn: ConnectionId,
        user_id: i32,
        tx: UnboundedSender<ServerEvent>,
    ) -> Vec<i32> {
        let first_connection = {
            let mut subscribers = self.rooms.entry(room_id).or_default();
            let already_present = subscribers.values().any(|s| s.user_id == user_id);
            subscribers.insert(conn, Subscriber { user_id, tx });
            !already_present
        };
        debug!(room_id, user_id, ?conn, first_connection, "Connection joined room");

        if first_connection {
            let notice = ServerEvent::UserJoined(PresenceNotice {
                user_id,
                timestamp: Utc::now().timestamp_millis(),
            });
            self.broadcast_except(room_id, conn, notice);
        }
        self.present_users(room_id)
    }

    /// Unsubscribe `conn`.
    ///
    /// The remaining subscribers hear `userLeft` once the user's last
    /// connection in the room is gone.
    pub fn leave(&self, room_id: i32, conn: ConnectionId) {
        let (removed, still_present) = {
            let Some(mut subscribers) = self.rooms.get_mut(&room_id) else {
                return;
            };
            let removed = subscribers.remove(&conn);
            let still_present = removed
                .as_ref()
                .is_some_and(|r| subscribers.values().any(|s| s.user_id == r.user_id));
            (removed, still_present)
        };
        self.rooms.remove_if(&room_id, |_, subscribers| subscribers.is_empty());

        let Some(subscriber) = removed else { return };
        debug!(room_id, user_id = subscriber.user_id, ?conn, still_present, "Connection left room");
        if !still_present {
            let notice = ServerEvent::UserLeft(PresenceNotice {
                user_id: subscriber.user_id,
                timestamp: Utc::now().timestamp_millis(),
            });
            self.broadcast(room_id, notice);
        }
    }

    /// Tell every subscriber the room is gone and drop the subscriptions.
    ///
    /// Returns how many connections were evicted.
    pub fn close_room(&self, room_id: i32) -> usize {
        self.broadcast(room_id, ServerEvent::error("This room was deleted"));
        let evicted = self
            .rooms
            .remove(&room_id)
            .map(|(_, subscribers)| subscribers.len())
            .unwrap_or(0);
        debug!(room_id, evicted, "Closed room");
        evicted
    }

    /// Send `event` to every subscriber of the room. Returns how many got it.
    pub fn broadcast(&self, room_id: i32, event: ServerEvent) -> usize {
        self.fan_out(room_id, None, event)
    }

    /// Send `event` to every subscriber except `conn`.
    pub fn broadcast_except(&self, room_id: i32, conn: ConnectionId, event: ServerEvent) -> usize {
        self.fan_out(room_id, Some(conn), event)
    }

    fn fan_out(&self, room_id: i32, skip: Option<ConnectionId>, event: ServerEvent) -> usize {
        // Clone the senders so no shard lock is held while sending.
        let targets: Vec<(ConnectionId, UnboundedSender<ServerEvent>)> = match self.rooms.get(&room_id)
        {
            Some(subscribers) => subscribers
                .iter()
                .filter(|(id, _)| Some(**id) != skip)
                .map(|(id, s)| (*id, s.tx.clone()))
                .collect(),
            None => return 0,
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, tx) in targets {
            if tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            if let Some(mut subscribers) = self.rooms.get_mut(&room_id) {
                for id in &dead {
                    subscribers.remove(id);
                }
            }
            self.rooms.remove_if(&room_id, |_, subscribers| subscribers.is_empty());
        }

        delivered
    }

    /// Distinct ids of users connected to the room, ascending.
    pub fn present_users(&self, room_id: i32) -> Vec<i32> {
        let mut users: Vec<i32> = self
            .rooms
            .get(&room_id)
            .map(|subscribers| subscribers.values().map(|s| s.user_id).collect())
            .unwrap_or_default();
        users.sort_unstable();
        users.dedup();
        users
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Drop every subscription. Writers end once their sender is gone.
    pub fn clear(&self) {
        self.rooms.clear();
    }
}
