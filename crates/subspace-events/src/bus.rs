use std::collections::VecDeque;

use subspace_types::{Frequency, PlayerId, Tick};

/// Everything the simulation layer surfaces instead of calling straight
/// into a renderer/sound mixer: warps, weapon hits, door state changes,
/// and soccer goals. `subspace-sim`/`subspace-world` return their own
/// narrowly-typed events (`PlayerEvent`, `WeaponOutcome`, `DoorClosed`);
/// the client composition root converts those into `GameEvent`s and pushes
/// them here so one loop can log/dispatch all of them uniformly.
#[derive(Debug, Clone, Copy)]
pub enum GameEvent {
    PlayerWarped { player_id: PlayerId },
    PlayerEnteredArena { player_id: PlayerId },
    PlayerLeftArena { player_id: PlayerId },
    WeaponWallExplosion { player_id: PlayerId },
    WeaponPlayerExplosion { player_id: PlayerId },
    PlayerDied { killed: PlayerId, killer: PlayerId, bounty: u16 },
    DoorClosed { x: u16, y: u16 },
    TeamGoal { frequency: Frequency },
}

/// A bounded FIFO of game events. Unlike the teacher's mod-listener
/// registry (which dispatches immediately to registered callbacks), this
/// core has no script/render consumer to call into directly, so events sit
/// in a capped queue until the client's tick loop drains them. Capacity
/// bounds memory if a consumer falls behind instead of growing unbounded.
pub struct EventBus {
    queue: VecDeque<(Tick, GameEvent)>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        EventBus { queue: VecDeque::with_capacity(capacity.min(1024)), capacity }
    }

    pub fn push(&mut self, now: Tick, event: GameEvent) {
        if self.queue.len() >= self.capacity {
            self.queue.pop_front();
            tracing::warn!(capacity = self.capacity, "event bus overflowed, dropping oldest event");
        }
        self.queue.push_back((now, event));
    }

    pub fn drain(&mut self) -> impl Iterator<Item = (Tick, GameEvent)> + '_ {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_events_in_push_order() {
        let mut bus = EventBus::new(4);
        bus.push(Tick::new(1), GameEvent::PlayerWarped { player_id: 1 });
        bus.push(Tick::new(2), GameEvent::DoorClosed { x: 5, y: 6 });

        let drained: Vec<_> = bus.drain().collect();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0].1, GameEvent::PlayerWarped { player_id: 1 }));
        assert!(bus.is_empty());
    }

    #[test]
    fn overflow_drops_oldest_event() {
        let mut bus = EventBus::new(2);
        bus.push(Tick::new(0), GameEvent::PlayerWarped { player_id: 1 });
        bus.push(Tick::new(0), GameEvent::PlayerWarped { player_id: 2 });
        bus.push(Tick::new(0), GameEvent::PlayerWarped { player_id: 3 });

        let drained: Vec<_> = bus.drain().collect();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0].1, GameEvent::PlayerWarped { player_id: 2 }));
        assert!(matches!(drained[1].1, GameEvent::PlayerWarped { player_id: 3 }));
    }
}
