use std::net::UdpSocket;

use subspace_files::{FileCache, FileRequester, RequestOutcome};
use subspace_protocol_core::envelope::CoreType;
use subspace_protocol_core::{
    envelope, vie_checksum, CipherScheme, ContinuumCipher, PacketDispatcher, PacketSequencer,
    PacketSink, VieCipher, VieRng,
};
use subspace_protocol_game::{ArenaLoginRequest, GameKind, PasswordRequest, SecurityChallenge, SecurityResponse};
use subspace_types::Tick;

use crate::config::{ClientConfig, EncryptMethod};
use crate::security::{SecurityReply, SecuritySolver};
use crate::session::{LoginState, Session};

const MAX_PACKET_SIZE: usize = 520;
const CLIENT_VERSION: u16 = 40;

/// What Connection surfaces to Game each tick. Game never touches the
/// socket, cipher, or sequencer directly — everything crosses this
/// boundary.
#[derive(Debug)]
pub enum ConnectionEvent {
    StateChanged(LoginState),
    /// A fully reassembled top-level game packet: `(kind_byte, payload)`.
    GamePacket(u8, Vec<u8>),
    /// The in-flight file download (map or LVZ pack) finished.
    FileDownloaded { filename: String, data: Vec<u8> },
}

/// Which expansion request a solver reply belongs to: the one-time
/// handshake expansion, or a later server-initiated re-key hook. Requests
/// are assumed to resolve in submission order since there's only ever one
/// security solver and the game thread drives one connection at a time —
/// documented in the workspace's grounding ledger as a simplification of
/// the original's per-work-item callback pointer.
enum ExpansionPurpose {
    Handshake,
    ServerHook(u32),
}

struct Outbound<'a> {
    socket: &'a UdpSocket,
    cipher: &'a CipherScheme,
    sent_total: &'a mut u32,
}

impl PacketSink for Outbound<'_> {
    fn send_core(&mut self, bytes: &[u8]) {
        let encrypted = self.cipher.encrypt(bytes);
        let _ = self.socket.send(&encrypted);
        *self.sent_total += 1;
    }
}

pub struct Connection {
    socket: UdpSocket,
    cipher: CipherScheme,
    sequencer: PacketSequencer,
    session: Session,
    security: SecuritySolver,
    file_requester: FileRequester,
    dispatcher: PacketDispatcher<Connection>,
    pending_events: Vec<ConnectionEvent>,

    encrypt_method: EncryptMethod,
    vie_client_key: u32,
    continuum_key1: u32,
    expansion_queue: std::collections::VecDeque<ExpansionPurpose>,
    huge_download_total: Option<u32>,

    total_sent: u32,
    total_received: u32,
    pending_exe_checksum: Option<u32>,

    name: String,
    password: String,
    arena_name: String,
    x_res: u16,
    y_res: u16,
}

impl Connection {
    pub fn new(config: &ClientConfig, now: Tick, cache_root: impl Into<std::path::PathBuf>) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        socket.connect((config.server_ip, config.server_port))?;

        let mut rng = VieRng::new(now.0 ^ 0x9E37_79B9);
        let vie_client_key = VieCipher::generate_key(now.0, &mut rng);

        let mut conn = Connection {
            socket,
            cipher: CipherScheme::None,
            sequencer: PacketSequencer::new(),
            session: Session::new(now),
            security: SecuritySolver::new(config.security_oracle_addr.clone()),
            file_requester: FileRequester::new(FileCache::new(cache_root)),
            dispatcher: build_dispatcher(),
            pending_events: Vec::new(),
            encrypt_method: config.encrypt_method,
            vie_client_key,
            continuum_key1: 0,
            expansion_queue: std::collections::VecDeque::new(),
            huge_download_total: None,
            total_sent: 0,
            total_received: 0,
            pending_exe_checksum: None,
            name: config.player_name.clone(),
            password: config.player_password.clone(),
            arena_name: config.arena_name.clone(),
            x_res: config.x_res,
            y_res: config.y_res,
        };

        conn.send_encryption_request();
        Ok(conn)
    }

    pub fn state(&self) -> LoginState {
        self.session.state
    }

    pub fn security_challenge(&self) -> crate::session::SecurityChallengeState {
        self.session.security
    }

    pub fn ping(&self) -> i32 {
        self.session.ping
    }

    pub fn time_diff(&self) -> i32 {
        self.session.time_diff
    }

    pub fn server_tick(&self, local_tick: Tick) -> Tick {
        self.session.server_tick(local_tick)
    }

    pub fn mark_map_loaded(&mut self, checksum: u32) {
        self.session.map_loaded = true;
        self.session.map_checksum = checksum;
    }

    fn send_encryption_request(&mut self) {
        let pkt = match self.encrypt_method {
            EncryptMethod::Subspace => envelope::build_encryption_request_vie(self.vie_client_key),
            EncryptMethod::Continuum => envelope::build_encryption_request_continuum(),
        };
        let _ = self.socket.send(&pkt);
        self.total_sent += 1;
    }

    fn send_password(&mut self) {
        let req = PasswordRequest {
            continuum: matches!(self.encrypt_method, EncryptMethod::Continuum),
            registration: false,
            name: self.name.clone(),
            password: self.password.clone(),
            machine_id: 0,
            timezone_bias: 0,
            version: CLIENT_VERSION,
        };
        let encoded = req.encode();
        let encrypted = self.cipher.encrypt(&encoded);
        let _ = self.socket.send(&encrypted);
        self.total_sent += 1;
    }

    pub fn send_arena_login(&mut self) {
        let req = ArenaLoginRequest {
            ship: 8,
            audio: false,
            x_res: self.x_res,
            y_res: self.y_res,
            arena: 0xFFFF,
            arena_name: self.arena_name.clone(),
            want_lvz: true,
        };
        let encoded = req.encode();
        let encrypted = self.cipher.encrypt(&encoded);
        let _ = self.socket.send(&encrypted);
        self.total_sent += 1;
    }

    pub fn send_security_response(&mut self, resp: &SecurityResponse) {
        let encoded = resp.encode();
        let encrypted = self.cipher.encrypt(&encoded);
        let _ = self.socket.send(&encrypted);
        self.total_sent += 1;
    }

    /// Every classic-cipher security answer needs the VIE-exe checksum;
    /// Continuum defers it to the oracle instead (queued here, collected on
    /// the next `tick`'s solver poll into `pending_exe_checksum`).
    pub fn vie_exe_checksum(&self) -> u32 {
        vie_checksum(self.session.security.checksum_key)
    }

    /// The oracle-computed checksum for a Continuum connection, once the
    /// solver has resolved it. `None` until then; the caller should hold
    /// off sending a `SecurityResponse` until this is populated.
    pub fn pending_exe_checksum(&self) -> Option<u32> {
        self.pending_exe_checksum
    }

    /// The checksum this connection should claim in its `SecurityResponse`,
    /// picking the right source for the active cipher scheme. `None` for a
    /// Continuum connection still waiting on the oracle.
    pub fn exe_checksum(&self) -> Option<u32> {
        match self.encrypt_method {
            EncryptMethod::Subspace => Some(self.vie_exe_checksum()),
            EncryptMethod::Continuum => self.pending_exe_checksum,
        }
    }

    pub fn weapons_received(&self) -> u32 {
        self.session.weapons_received
    }

    fn request_exe_checksum_from_oracle(&mut self) {
        self.security.request_checksum(self.session.security.checksum_key);
    }

    pub fn send_unreliable(&mut self, bytes: &[u8]) {
        let encrypted = self.cipher.encrypt(bytes);
        let _ = self.socket.send(&encrypted);
        self.total_sent += 1;
    }

    pub fn send_reliable(&mut self, now: Tick, bytes: &[u8]) {
        let mut outbound = Outbound { socket: &self.socket, cipher: &self.cipher, sent_total: &mut self.total_sent };
        self.sequencer.send_reliable(now, bytes, &mut outbound);
    }

    /// Starts (or queues) a file download; per spec.md's FileRequester
    /// design, only one request is ever in flight, so this sends the wire
    /// request only when nothing else is downloading.
    pub fn request_file(&mut self, now: Tick, filename: &str, arena: &str, index: u16, size: u32, checksum: u32, decompress: bool) -> subspace_files::FileResult<Option<Vec<u8>>> {
        match self.file_requester.request(filename, arena, index, size, checksum, decompress)? {
            RequestOutcome::CacheHit(data) => Ok(Some(data)),
            RequestOutcome::SendNow(index) => {
                let mut w = subspace_buffer::ByteWriter::with_capacity(3);
                w.u8(0x0C).u16(index);
                self.send_reliable(now, &w.into_vec());
                Ok(None)
            }
            RequestOutcome::Queued => Ok(None),
        }
    }

    pub fn tick(&mut self, now: Tick) -> Vec<ConnectionEvent> {
        let mut events = Vec::new();

        if self.session.connect_timed_out(now) {
            self.session.state = LoginState::ConnectTimeout;
            events.push(ConnectionEvent::StateChanged(LoginState::ConnectTimeout));
            return events;
        }

        self.poll_security(&mut events);

        if self.session.should_send_sync(now) {
            let pkt = envelope::build_sync_request(now.0, self.total_sent, self.total_received);
            let _ = self.socket.send(&pkt);
            self.total_sent += 1;
            self.session.last_sync_sent = now;
        }

        let mut buf = [0u8; MAX_PACKET_SIZE];
        loop {
            match self.socket.recv(&mut buf) {
                Ok(0) => {
                    self.on_disconnect(&mut events);
                    break;
                }
                Ok(n) => {
                    self.total_received += 1;
                    if let Some(plain) = self.cipher.decrypt(&buf[..n]) {
                        self.process_decrypted(&plain, now, &mut events);
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(_) => {
                    self.on_disconnect(&mut events);
                    break;
                }
            }
        }

        let ready = {
            let mut outbound = Outbound { socket: &self.socket, cipher: &self.cipher, sent_total: &mut self.total_sent };
            self.sequencer.tick(now, &mut outbound)
        };
        for body in ready {
            self.process_decrypted(&body, now, &mut events);
        }

        self.advance_login_state(&mut events);

        events
    }

    fn on_disconnect(&mut self, events: &mut Vec<ConnectionEvent>) {
        let next = if self.session.state == LoginState::Complete { LoginState::GameTimeout } else { LoginState::ConnectTimeout };
        if self.session.state != next {
            self.session.state = next;
            events.push(ConnectionEvent::StateChanged(next));
        }
    }

    fn poll_security(&mut self, events: &mut Vec<ConnectionEvent>) {
        for reply in self.security.poll() {
            match reply {
                SecurityReply::Expansion { key2: _, table } => {
                    let purpose = self.expansion_queue.pop_front();
                    match purpose {
                        Some(ExpansionPurpose::Handshake) | None => {
                            let mut cipher = ContinuumCipher::new();
                            cipher.expanded_key = table;
                            cipher.finalize_expansion(self.continuum_key1);
                            self.cipher = CipherScheme::Continuum(Box::new(cipher));
                            self.session.state = LoginState::Authentication;
                            events.push(ConnectionEvent::StateChanged(LoginState::Authentication));
                            self.send_password();
                        }
                        Some(ExpansionPurpose::ServerHook(seed)) => {
                            let mut w = subspace_buffer::ByteWriter::with_capacity(2 + 4 + 80);
                            w.u8(0x00).u8(0x13).u32(seed);
                            for word in table {
                                w.u32(word);
                            }
                            let encoded = w.into_vec();
                            let encrypted = self.cipher.encrypt(&encoded);
                            let _ = self.socket.send(&encrypted);
                            self.total_sent += 1;
                        }
                    }
                }
                SecurityReply::Checksum { key: _, checksum } => {
                    self.pending_exe_checksum = Some(checksum);
                }
                SecurityReply::Failed(err) => {
                    tracing::warn!(%err, "security oracle request failed");
                }
            }
        }
    }

    fn advance_login_state(&mut self, events: &mut Vec<ConnectionEvent>) {
        if self.session.state == LoginState::MapDownload && self.session.ready_for_security_response() {
            self.session.state = LoginState::Complete;
            events.push(ConnectionEvent::StateChanged(LoginState::Complete));
        }
    }

    fn process_decrypted(&mut self, pkt: &[u8], now: Tick, events: &mut Vec<ConnectionEvent>) {
        if pkt.is_empty() {
            return;
        }

        if pkt[0] != 0x00 {
            self.process_game_packet(pkt[0], &pkt[1..], events);
            return;
        }

        let subtype = match pkt.get(1) {
            Some(&b) => b,
            None => return,
        };

        match CoreType::from_u8(subtype) {
            Some(CoreType::EncryptionResponse) if pkt.len() >= 6 => {
                let key = u32::from_le_bytes(pkt[2..6].try_into().unwrap());
                let mut vie = VieCipher::new(self.vie_client_key);
                if vie.initialize(key) {
                    self.cipher = CipherScheme::Vie(vie);
                    self.session.state = LoginState::Authentication;
                    events.push(ConnectionEvent::StateChanged(LoginState::Authentication));
                    self.send_password();
                } else {
                    tracing::warn!(key, "server echoed an encryption key outside the VIE handshake contract");
                    self.session.state = LoginState::ConnectTimeout;
                    events.push(ConnectionEvent::StateChanged(LoginState::ConnectTimeout));
                }
            }
            Some(CoreType::ContinuumEncResponse) if pkt.len() >= 10 => {
                let key1 = u32::from_le_bytes(pkt[2..6].try_into().unwrap());
                let key2 = u32::from_le_bytes(pkt[6..10].try_into().unwrap());
                self.continuum_key1 = key1;

                let ack = envelope::build_continuum_encryption_ack(key1);
                let _ = self.socket.send(&ack);
                self.total_sent += 1;

                self.expansion_queue.push_back(ExpansionPurpose::Handshake);
                self.security.request_expansion(key2);
            }
            Some(CoreType::SyncResponse) if pkt.len() >= 10 => {
                let received_timestamp = u32::from_le_bytes(pkt[2..6].try_into().unwrap());
                let local_timestamp = u32::from_le_bytes(pkt[6..10].try_into().unwrap());
                self.session.on_sync_response(now, Tick::new(received_timestamp), local_timestamp);
            }
            Some(CoreType::Disconnect) => {
                self.on_disconnect(events);
            }
            Some(CoreType::Reliable) => {
                let mut outbound = Outbound { socket: &self.socket, cipher: &self.cipher, sent_total: &mut self.total_sent };
                self.sequencer.on_reliable_message(now, pkt, &mut outbound);
            }
            Some(CoreType::Ack) => {
                self.sequencer.on_reliable_ack(pkt);
            }
            Some(CoreType::SmallChunkBody) => {
                self.sequencer.on_small_chunk_body(pkt);
            }
            Some(CoreType::SmallChunkTail) => {
                let combined = self.sequencer.on_small_chunk_tail(pkt);
                self.process_decrypted(&combined, now, events);
            }
            Some(CoreType::HugeChunk) => {
                self.on_huge_chunk(pkt, now, events);
            }
            Some(CoreType::HugeChunkCancel) => {
                self.sequencer.on_cancel_huge_chunk();
                self.huge_download_total = None;
            }
            Some(CoreType::Cluster) => {
                self.process_cluster(&pkt[2..], now, events);
            }
            Some(CoreType::ContinuumKeyExpansionRequest) if pkt.len() >= 6 => {
                let seed = u32::from_le_bytes(pkt[2..6].try_into().unwrap());
                self.expansion_queue.push_back(ExpansionPurpose::ServerHook(seed));
                self.security.request_expansion(seed);
            }
            _ => {}
        }
    }

    fn on_huge_chunk(&mut self, pkt: &[u8], now: Tick, events: &mut Vec<ConnectionEvent>) {
        let body = if self.huge_download_total.is_none() && pkt.len() >= 6 {
            let total = u32::from_le_bytes(pkt[2..6].try_into().unwrap());
            self.huge_download_total = Some(total);
            let mut synthetic = vec![0x00u8, pkt[1]];
            synthetic.extend_from_slice(&pkt[6..]);
            synthetic
        } else {
            pkt.to_vec()
        };

        self.sequencer.on_huge_chunk(&body);

        if let Some(total) = self.huge_download_total {
            if self.sequencer.huge_chunk_len() as u32 >= total {
                let data = self.sequencer.take_huge_chunk();
                self.huge_download_total = None;

                let filename = self.file_requester.current().map(|r| r.filename.clone()).unwrap_or_default();

                match self.file_requester.on_file_received(&data) {
                    Ok((decoded, next_index)) => {
                        events.push(ConnectionEvent::FileDownloaded { filename, data: decoded });
                        if let Some(index) = next_index {
                            let mut w = subspace_buffer::ByteWriter::with_capacity(3);
                            w.u8(0x0C).u16(index);
                            self.send_reliable(now, &w.into_vec());
                        }
                    }
                    Err(err) => tracing::warn!(%err, "failed to finish file download"),
                }
            }
        }
    }

    fn process_cluster(&mut self, mut rest: &[u8], now: Tick, events: &mut Vec<ConnectionEvent>) {
        while let Some(&len) = rest.first() {
            let len = len as usize;
            if rest.len() < 1 + len {
                break;
            }
            let frame = rest[1..1 + len].to_vec();
            self.process_decrypted(&frame, now, events);
            rest = &rest[1 + len..];
        }
    }

    /// Routes a fully reassembled game packet through the registered
    /// handler table for its kind, then drains whatever those handlers
    /// queued. The dispatcher owns the handler lists; `self` is swapped out
    /// for the call since a handler needs `&mut Connection` at the same
    /// time the dispatch loop holds `&mut self.dispatcher`.
    fn process_game_packet(&mut self, kind_byte: u8, payload: &[u8], events: &mut Vec<ConnectionEvent>) {
        let mut dispatcher = std::mem::take(&mut self.dispatcher);
        dispatcher.dispatch(self, kind_byte, payload);
        self.dispatcher = dispatcher;
        events.append(&mut self.pending_events);
    }

    fn on_security_challenge(&mut self, challenge: SecurityChallenge) {
        self.session.security.prize_seed = challenge.prize_seed;
        self.session.security.door_seed = challenge.door_seed;
        self.session.security.timestamp = challenge.timestamp;
        self.session.security.checksum_key = challenge.checksum_key;
        self.session.security.received = true;

        if matches!(self.encrypt_method, EncryptMethod::Continuum) {
            self.request_exe_checksum_from_oracle();
        }
    }
}

/// Builds the handler table `Connection` dispatches every game packet
/// through. Every known kind first gets a forwarding handler that surfaces
/// it to `Game` as a `ConnectionEvent::GamePacket`; a few kinds also carry
/// a second handler that reacts to the packet at the login-state-machine
/// level, since that reaction has to happen in `Connection` rather than
/// wait for `Game` to see the event next tick.
fn build_dispatcher() -> PacketDispatcher<Connection> {
    let mut dispatcher = PacketDispatcher::new();

    for kind in GameKind::ALL {
        let kind_byte = kind.as_u8();
        dispatcher.register(
            kind_byte,
            Box::new(move |ctx: &mut Connection, payload: &[u8]| {
                ctx.pending_events.push(ConnectionEvent::GamePacket(kind_byte, payload.to_vec()));
            }),
        );
    }

    dispatcher.register(
        GameKind::Security.as_u8(),
        Box::new(|ctx: &mut Connection, payload: &[u8]| {
            if let Ok(challenge) = SecurityChallenge::decode(payload) {
                ctx.on_security_challenge(challenge);
            }
        }),
    );

    dispatcher.register(
        GameKind::MapInformation.as_u8(),
        Box::new(|ctx: &mut Connection, _payload: &[u8]| {
            if ctx.session.state == LoginState::ArenaLogin {
                ctx.session.state = LoginState::MapDownload;
                ctx.pending_events.push(ConnectionEvent::StateChanged(LoginState::MapDownload));
            }
        }),
    );

    dispatcher.register(
        GameKind::PasswordResponse.as_u8(),
        Box::new(|ctx: &mut Connection, payload: &[u8]| {
            if ctx.session.state != LoginState::Authentication {
                return;
            }
            if payload.first() == Some(&0) {
                ctx.session.state = LoginState::ArenaLogin;
                ctx.pending_events.push(ConnectionEvent::StateChanged(LoginState::ArenaLogin));
                ctx.send_arena_login();
            } else {
                ctx.session.state = LoginState::ConnectTimeout;
                ctx.pending_events.push(ConnectionEvent::StateChanged(LoginState::ConnectTimeout));
            }
        }),
    );

    dispatcher
}
