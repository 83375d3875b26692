//! Fire-and-forget telemetry
//!
//! A [`TelemetrySink`] observes coarse game events (kills, discoveries,
//! deaths) for an external narrator. Sinks never report failure back into
//! the simulation, so a missing or slow consumer cannot change an outcome.

use std::sync::mpsc::{Receiver, Sender, channel};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType", content = "eventData", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TelemetryEvent {
    MonsterEncountered {
        #[serde(rename = "monsterName")]
        monster_name: String,
        #[serde(rename = "isFirstEncounter")]
        first_encounter: bool,
    },
    MonsterKilled {
        #[serde(rename = "monsterName")]
        monster_name: String,
        #[serde(rename = "killedBy")]
        killed_by: String,
    },
    ItemDiscovered {
        #[serde(rename = "itemName")]
        item_name: String,
        category: String,
    },
    NewLevel {
        depth: i32,
    },
    PlayerDied {
        #[serde(rename = "killedBy")]
        killed_by: String,
    },
}

pub trait TelemetrySink: Send {
    fn record(&mut self, event: TelemetryEvent);
}

/// Forwards events over an mpsc channel to a consumer on another thread.
///
/// Once the receiver is dropped, events are silently discarded.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Sender<TelemetryEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<TelemetryEvent>) {
        let (tx, rx) = channel();
        (Self { tx }, rx)
    }
}

impl TelemetrySink for ChannelSink {
    fn record(&mut self, event: TelemetryEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("telemetry receiver gone, dropping event");
        }
    }
}

/// Collects events in memory
#[derive(Debug, Default)]
pub struct VecSink {
    pub events: Vec<TelemetryEvent>,
}

impl TelemetrySink for VecSink {
    fn record(&mut self, event: TelemetryEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_delivers_across_threads() {
        let (mut sink, rx) = ChannelSink::new();
        let handle = std::thread::spawn(move || rx.iter().collect::<Vec<_>>());
        sink.record(TelemetryEvent::NewLevel { depth: 3 });
        sink.record(TelemetryEvent::PlayerDied {
            killed_by: "a goblin".into(),
        });
        drop(sink);
        let got = handle.join().unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], TelemetryEvent::NewLevel { depth: 3 });
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (mut sink, rx) = ChannelSink::new();
        drop(rx);
        sink.record(TelemetryEvent::NewLevel { depth: 1 });
    }

    #[test]
    fn test_wire_shape() {
        let e = TelemetryEvent::MonsterKilled {
            monster_name: "goblin".into(),
            killed_by: "player".into(),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["eventType"], "MONSTER_KILLED");
        assert_eq!(json["eventData"]["monsterName"], "goblin");
    }
}
