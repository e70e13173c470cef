// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live change notifications for map clients.
//!
//! Every committed mutation, restore, reset and registration is pushed to
//! all connected WebSocket clients as a small JSON fact. Clients re-read
//! the map or statistics over HTTP when they need the full picture.
//!
//! - Events are informational and never authoritative
//! - No commands are accepted over the socket
//! - Slow clients lose the oldest events rather than holding up writers

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use zonemap_api::ChangeNotification;

/// Maximum number of events to buffer in the broadcast channel.
const EVENT_BUFFER_SIZE: usize = 100;

/// One municipality's new assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveAssignment {
    /// Municipality identifier.
    pub id: String,
    /// New zone.
    pub zone: String,
    /// New zone color.
    pub color: String,
}

/// Live event types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// Municipalities moved to another zone.
    ZoneReassigned {
        /// Region code.
        region: String,
        /// The new assignments.
        municipalities: Vec<LiveAssignment>,
    },
    /// A zone was renamed.
    ZoneRenamed {
        /// Region code.
        region: String,
        /// Old name.
        from: String,
        /// New name.
        to: String,
        /// Color of the renamed zone.
        color: String,
        /// The municipalities that moved with it.
        municipalities: Vec<LiveAssignment>,
    },
    /// A zone's color changed.
    ZoneRecolored {
        /// Region code.
        region: String,
        /// Zone name.
        zone: String,
        /// New color.
        color: String,
    },
    /// A zone was added.
    ZoneAdded {
        /// Region code.
        region: String,
        /// Zone name.
        zone: String,
        /// Zone color.
        color: String,
    },
    /// A region was restored from a backup.
    RegionRestored {
        /// Region code.
        region: String,
        /// Backup identifier.
        backup_id: String,
    },
    /// A region's change log was archived and cleared.
    RegionReset {
        /// Region code.
        region: String,
        /// Backup taken before the reset.
        backup_id: String,
    },
    /// A region was registered or reactivated.
    RegionRegistered {
        /// Region code.
        region: String,
        /// Display name.
        name: String,
    },
    /// Connection confirmation (sent on initial connect).
    Connected {
        /// Server timestamp (RFC 3339).
        timestamp: String,
    },
}

fn assignments(municipalities: &[zonemap::AffectedMunicipality]) -> Vec<LiveAssignment> {
    municipalities
        .iter()
        .map(|m| LiveAssignment {
            id: m.id.to_string(),
            zone: m.zone.to_string(),
            color: m.color.to_string(),
        })
        .collect()
}

impl From<&ChangeNotification> for LiveEvent {
    fn from(notification: &ChangeNotification) -> Self {
        match notification {
            ChangeNotification::ZoneReassigned {
                region,
                municipalities,
            } => Self::ZoneReassigned {
                region: region.to_string(),
                municipalities: assignments(municipalities),
            },
            ChangeNotification::ZoneRenamed {
                region,
                from,
                to,
                color,
                municipalities,
            } => Self::ZoneRenamed {
                region: region.to_string(),
                from: from.to_string(),
                to: to.to_string(),
                color: color.to_string(),
                municipalities: assignments(municipalities),
            },
            ChangeNotification::ZoneRecolored {
                region,
                zone,
                color,
            } => Self::ZoneRecolored {
                region: region.to_string(),
                zone: zone.to_string(),
                color: color.to_string(),
            },
            ChangeNotification::ZoneAdded {
                region,
                zone,
                color,
            } => Self::ZoneAdded {
                region: region.to_string(),
                zone: zone.to_string(),
                color: color.to_string(),
            },
            ChangeNotification::RegionRestored { region, backup_id } => Self::RegionRestored {
                region: region.to_string(),
                backup_id: backup_id.clone(),
            },
            ChangeNotification::RegionReset { region, backup_id } => Self::RegionReset {
                region: region.to_string(),
                backup_id: backup_id.clone(),
            },
            ChangeNotification::RegionRegistered { region, name } => Self::RegionRegistered {
                region: region.to_string(),
                name: name.clone(),
            },
        }
    }
}

/// Fans live events out to every connected client.
#[derive(Debug, Clone)]
pub struct LiveEventBroadcaster {
    tx: broadcast::Sender<LiveEvent>,
}

impl LiveEventBroadcaster {
    /// Creates a new event broadcaster.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    /// Broadcasts an event to all connected clients.
    ///
    /// If no clients are connected, the event is dropped.
    pub fn broadcast(&self, event: &LiveEvent) {
        match self.tx.send(event.clone()) {
            Ok(count) => {
                debug!(?event, receivers = count, "Broadcast live event");
            }
            Err(_) => {
                debug!(?event, "No receivers for live event");
            }
        }
    }

    /// Broadcasts the live form of a committed change.
    pub fn notify(&self, notification: &ChangeNotification) {
        self.broadcast(&LiveEvent::from(notification));
    }

    /// Subscribes to events sent from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }
}

impl Default for LiveEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Handles WebSocket upgrade requests for live event streaming.
///
/// # Arguments
///
/// * `ws` - WebSocket upgrade request
/// * `broadcaster` - The live event broadcaster from application state
///
/// # Returns
///
/// An HTTP response that upgrades the connection to WebSocket
pub async fn live_events_handler(
    ws: WebSocketUpgrade,
    AxumState(broadcaster): AxumState<Arc<LiveEventBroadcaster>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

/// Sends a connection confirmation, then streams events until the client
/// goes away.
async fn handle_socket(socket: WebSocket, broadcaster: Arc<LiveEventBroadcaster>) {
    info!("Client connected to live event stream");

    let (mut sender, mut receiver) = socket.split();
    let mut rx: broadcast::Receiver<LiveEvent> = broadcaster.subscribe();

    let connected_event: LiveEvent = LiveEvent::Connected {
        timestamp: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| String::from("unknown")),
    };

    if let Ok(json) = serde_json::to_string(&connected_event)
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        warn!("Failed to send connection confirmation");
        return;
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            let event: LiveEvent = match rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live client lagged; events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(?e, "Failed to serialize live event");
                }
            }
        }
    });

    // The socket carries no commands; drain until close
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Received unexpected message from client, ignoring");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!("Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("Receive task completed");
            send_task.abort();
        }
    }

    info!("Client disconnected from live event stream");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use zonemap::AffectedMunicipality;
    use zonemap_domain::{MunicipalityId, RegionCode, ZoneColor, ZoneName};

    fn region() -> RegionCode {
        RegionCode::parse("XX").unwrap()
    }

    #[test]
    fn test_broadcast_no_receivers() {
        let broadcaster: LiveEventBroadcaster = LiveEventBroadcaster::new();
        broadcaster.broadcast(&LiveEvent::Connected {
            timestamp: String::from("2026-03-14T09:30:00Z"),
        });
        assert_eq!(broadcaster.tx.receiver_count(), 0);
    }

    #[test]
    fn test_notify_reaches_every_receiver() {
        let broadcaster: LiveEventBroadcaster = LiveEventBroadcaster::new();
        let mut rx1: broadcast::Receiver<LiveEvent> = broadcaster.subscribe();
        let mut rx2: broadcast::Receiver<LiveEvent> = broadcaster.subscribe();

        broadcaster.notify(&ChangeNotification::ZoneAdded {
            region: region(),
            zone: ZoneName::new("East").unwrap(),
            color: ZoneColor::parse("#0000FF").unwrap(),
        });

        let expected: LiveEvent = LiveEvent::ZoneAdded {
            region: String::from("XX"),
            zone: String::from("East"),
            color: String::from("#0000FF"),
        };
        assert_eq!(rx1.try_recv().unwrap(), expected);
        assert_eq!(rx2.try_recv().unwrap(), expected);
    }

    #[test]
    fn test_reassignment_event_serialization() {
        let notification: ChangeNotification = ChangeNotification::ZoneReassigned {
            region: region(),
            municipalities: vec![AffectedMunicipality {
                id: MunicipalityId::normalize("001").unwrap(),
                name: String::from("Alpha"),
                zone: ZoneName::new("South").unwrap(),
                color: ZoneColor::parse("#00FF00").unwrap(),
            }],
        };

        let json: serde_json::Value =
            serde_json::to_value(LiveEvent::from(&notification)).unwrap();

        assert_eq!(json["type"], "zone_reassigned");
        assert_eq!(json["region"], "XX");
        assert_eq!(json["municipalities"][0]["id"], "001");
        assert_eq!(json["municipalities"][0]["zone"], "South");
        assert_eq!(json["municipalities"][0]["color"], "#00FF00");
        let back: LiveEvent = serde_json::from_value(json).unwrap();
        assert!(matches!(back, LiveEvent::ZoneReassigned { .. }));
    }
}
