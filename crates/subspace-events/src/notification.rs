use subspace_types::Tick;

/// Color classes classic notification text is tagged with. The original's
/// `TextColor` enum wasn't in the filtered source material; this carries
/// the handful of colors `ApplyPrize`/`FireWeapons`-style call sites would
/// plausibly reach for (informational vs. warning vs. hostile-action).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColor {
    White,
    Yellow,
    Green,
    Red,
    Blue,
}

#[derive(Debug, Clone)]
pub struct GameNotification {
    pub message: String,
    pub color: TextColor,
    pub end_tick: Tick,
}

const NOTIFICATION_DURATION_TICKS: u32 = 500;
const SLOT_COUNT: usize = 7;

/// Fixed-size rotating notification board: each `push` either reuses an
/// already-expired slot or steals the one with the oldest expiry, so a
/// burst of messages never grows unbounded and old text fades out in
/// arrival order. A renderer outside this core draws whatever `visible`
/// returns each frame.
pub struct NotificationSystem {
    slots: [GameNotification; SLOT_COUNT],
}

impl NotificationSystem {
    pub fn new() -> Self {
        NotificationSystem {
            slots: std::array::from_fn(|_| GameNotification { message: String::new(), color: TextColor::White, end_tick: Tick::ZERO }),
        }
    }

    /// Finds the best slot to (re)use: the first already-expired slot, or
    /// else whichever slot expires soonest.
    fn best_slot(&self, now: Tick) -> usize {
        let mut best = 0;
        for (i, slot) in self.slots.iter().enumerate() {
            if now.diff(slot.end_tick) > 0 {
                return i;
            }
            if slot.end_tick.diff(self.slots[best].end_tick) < 0 {
                best = i;
            }
        }
        best
    }

    pub fn push(&mut self, now: Tick, color: TextColor, message: impl Into<String>) {
        let slot = self.best_slot(now);
        self.slots[slot] = GameNotification { message: message.into(), color, end_tick: now.advance(NOTIFICATION_DURATION_TICKS) };
    }

    /// Every notification still on-screen at `now`, oldest slot first.
    pub fn visible(&self, now: Tick) -> impl Iterator<Item = &GameNotification> {
        self.slots.iter().filter(move |n| now.diff(n.end_tick) <= 0 && !n.message.is_empty())
    }
}

impl Default for NotificationSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_reuses_expired_slot_before_evicting_live_ones() {
        let mut notifications = NotificationSystem::new();
        for i in 0..SLOT_COUNT {
            notifications.push(Tick::new(0), TextColor::White, format!("msg {i}"));
        }

        assert_eq!(notifications.visible(Tick::new(0)).count(), SLOT_COUNT);

        notifications.push(Tick::new(10_000), TextColor::Red, "fresh");
        let visible: Vec<_> = notifications.visible(Tick::new(10_000)).collect();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].message, "fresh");
    }

    #[test]
    fn nothing_visible_before_anything_pushed() {
        let notifications = NotificationSystem::new();
        assert_eq!(notifications.visible(Tick::new(0)).count(), 0);
    }
}
