use subspace_types::Tick;

/// Progresses `EncryptionRequested → Authentication → ArenaLogin →
/// MapDownload → Complete`, with three terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    EncryptionRequested,
    Authentication,
    ArenaLogin,
    MapDownload,
    Complete,
    GameTimeout,
    ConnectTimeout,
    Quit,
}

impl LoginState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoginState::GameTimeout | LoginState::ConnectTimeout | LoginState::Quit)
    }
}

/// The checksum-challenge fields reported by the `0x1A` Security packet,
/// needed before the client can answer with its own checksums.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityChallengeState {
    pub prize_seed: u32,
    pub door_seed: u32,
    pub timestamp: Tick,
    pub checksum_key: u32,
    pub received: bool,
}

/// One `(sent_timestamp, rtt)` sample from a `SyncTimeResponse`, kept in a
/// short rolling window so `time_diff` is averaged rather than jumping on a
/// single noisy round trip.
#[derive(Debug, Clone, Copy)]
struct SyncSample {
    rtt: i32,
    time_diff: i32,
}

const SYNC_HISTORY_LEN: usize = 8;
const SYNC_PERIOD_TICKS: i32 = 50; // 500 ms at 100 Hz
const CONNECT_TIMEOUT_TICKS: i32 = 50;

/// Everything `Connection` tracks about the current session beyond the raw
/// transport: login progress, the rolling time-sync window, and the
/// security challenge/response state.
pub struct Session {
    pub state: LoginState,
    pub connect_tick: Tick,
    pub last_sync_sent: Tick,
    pub weapons_received: u32,
    pub security: SecurityChallengeState,
    pub map_checksum: u32,
    pub map_loaded: bool,
    sync_history: Vec<SyncSample>,
    pub ping: i32,
    pub time_diff: i32,
}

impl Session {
    pub fn new(now: Tick) -> Self {
        Session {
            state: LoginState::EncryptionRequested,
            connect_tick: now,
            last_sync_sent: now,
            weapons_received: 0,
            security: SecurityChallengeState::default(),
            map_checksum: 0,
            map_loaded: false,
            sync_history: Vec::with_capacity(SYNC_HISTORY_LEN),
            ping: 0,
            time_diff: 0,
        }
    }

    pub fn should_send_sync(&self, now: Tick) -> bool {
        now.diff(self.last_sync_sent) >= SYNC_PERIOD_TICKS
    }

    pub fn connect_timed_out(&self, now: Tick) -> bool {
        self.state == LoginState::EncryptionRequested && now.diff(self.connect_tick) >= CONNECT_TIMEOUT_TICKS
    }

    /// Folds in a `(sent_timestamp, server_timestamp)` sample per spec.md's
    /// §4.9 formula, keeping a bounded rolling window so `time_diff` is the
    /// mean of recent samples while `ping` tracks only the latest one.
    pub fn on_sync_response(&mut self, now: Tick, sent_timestamp: Tick, server_timestamp: u32) {
        let rtt = now.diff(sent_timestamp).max(0);
        let ping = (rtt / 2) * 10;

        let mut time_diff = (3 * rtt) / 5 + (server_timestamp as i32 - now.0 as i32);
        if time_diff.abs() <= 10 {
            time_diff = 0;
        }

        self.ping = ping;

        if self.sync_history.len() == SYNC_HISTORY_LEN {
            self.sync_history.remove(0);
        }
        self.sync_history.push(SyncSample { rtt, time_diff });

        let sum: i32 = self.sync_history.iter().map(|s| s.time_diff).sum();
        self.time_diff = sum / self.sync_history.len() as i32;
    }

    /// The server's view of "now" for weapons and positions is always the
    /// local tick shifted by the averaged clock offset.
    pub fn server_tick(&self, local_tick: Tick) -> Tick {
        Tick::new((local_tick.0 as i32 + self.time_diff) as u32)
    }

    pub fn ready_for_security_response(&self) -> bool {
        self.security.received && self.map_loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_response_snaps_small_offsets_to_zero() {
        let mut session = Session::new(Tick::new(0));
        session.on_sync_response(Tick::new(10), Tick::new(0), 10 - 5);
        assert_eq!(session.time_diff, 0);
    }

    #[test]
    fn connect_timeout_fires_after_500ms_in_encryption_requested() {
        let session = Session::new(Tick::new(0));
        assert!(!session.connect_timed_out(Tick::new(40)));
        assert!(session.connect_timed_out(Tick::new(50)));
    }

    #[test]
    fn time_diff_averages_across_the_rolling_window() {
        let mut session = Session::new(Tick::new(0));
        session.on_sync_response(Tick::new(100), Tick::new(0), 200);
        let first = session.time_diff;
        session.on_sync_response(Tick::new(200), Tick::new(100), 100);
        assert_ne!(session.time_diff, first);
    }
}
