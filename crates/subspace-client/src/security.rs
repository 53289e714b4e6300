//! The Continuum key-expansion/checksum oracle client.
//!
//! The real zone never trusts a Continuum client to expand its own keys or
//! report its own memory checksum, so both are delegated to an external
//! service reached over a short-lived blocking TCP connection. The original
//! runs this through a generic mutex/condvar work queue serviced by a fixed
//! thread pool; this port has exactly one caller (the game thread) and one
//! kind of asynchronous work, so a thread-per-request plus an
//! `std::sync::mpsc` channel drained once per tick gets the same
//! fire-and-forget async shape without porting a general work-queue
//! abstraction that nothing else in this crate needs.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;

const EXPANSION_REQUEST_TYPE: u8 = 0;
const EXPANSION_RESPONSE_TYPE: u8 = 1;
const CHECKSUM_REQUEST_TYPE: u8 = 2;
const CHECKSUM_RESPONSE_TYPE: u8 = 3;

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("oracle connection failed: {0}")]
    Connect(#[from] std::io::Error),
    #[error("oracle replied with unexpected response type {0}")]
    BadResponseType(u8),
}

/// What the solver was asked to do, carried back through the channel so the
/// game thread knows which pending request a reply belongs to.
#[derive(Debug)]
pub enum SecurityReply {
    Expansion { key2: u32, table: [u32; 20] },
    Checksum { key: u32, checksum: u32 },
    Failed(SecurityError),
}

fn write_expansion_request(key2: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(5);
    buf.push(EXPANSION_REQUEST_TYPE);
    buf.extend_from_slice(&key2.to_le_bytes());
    buf
}

fn write_checksum_request(key: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(5);
    buf.push(CHECKSUM_REQUEST_TYPE);
    buf.extend_from_slice(&key.to_le_bytes());
    buf
}

fn run_expansion(addr: String, key2: u32) -> Result<SecurityReply, SecurityError> {
    let mut stream = TcpStream::connect(&addr)?;
    stream.write_all(&write_expansion_request(key2))?;

    let mut response = [0u8; 1 + 4 + 80];
    stream.read_exact(&mut response)?;

    if response[0] != EXPANSION_RESPONSE_TYPE {
        return Err(SecurityError::BadResponseType(response[0]));
    }

    let mut table = [0u32; 20];
    for (i, word) in table.iter_mut().enumerate() {
        let off = 5 + i * 4;
        *word = u32::from_le_bytes(response[off..off + 4].try_into().unwrap());
    }

    Ok(SecurityReply::Expansion { key2, table })
}

fn run_checksum(addr: String, key: u32) -> Result<SecurityReply, SecurityError> {
    let mut stream = TcpStream::connect(&addr)?;
    stream.write_all(&write_checksum_request(key))?;

    let mut response = [0u8; 1 + 4 + 4];
    stream.read_exact(&mut response)?;

    if response[0] != CHECKSUM_RESPONSE_TYPE {
        return Err(SecurityError::BadResponseType(response[0]));
    }

    let checksum = u32::from_le_bytes(response[5..9].try_into().unwrap());
    Ok(SecurityReply::Checksum { key, checksum })
}

/// Dispatches oracle requests onto their own thread and collects the
/// replies through a channel the game thread drains once per tick.
pub struct SecuritySolver {
    oracle_addr: String,
    tx: Sender<SecurityReply>,
    rx: Receiver<SecurityReply>,
    in_flight: u32,
}

impl SecuritySolver {
    pub fn new(oracle_addr: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel();
        SecuritySolver { oracle_addr: oracle_addr.into(), tx, rx, in_flight: 0 }
    }

    pub fn request_expansion(&mut self, key2: u32) {
        let addr = self.oracle_addr.clone();
        let tx = self.tx.clone();
        self.in_flight += 1;
        std::thread::spawn(move || {
            let reply = run_expansion(addr, key2).unwrap_or_else(SecurityReply::Failed);
            let _ = tx.send(reply);
        });
    }

    pub fn request_checksum(&mut self, key: u32) {
        let addr = self.oracle_addr.clone();
        let tx = self.tx.clone();
        self.in_flight += 1;
        std::thread::spawn(move || {
            let reply = run_checksum(addr, key).unwrap_or_else(SecurityReply::Failed);
            let _ = tx.send(reply);
        });
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    /// Polled once at the top of every tick, per spec.md's async-oracle
    /// design note: never block, just collect whatever landed since the
    /// last poll.
    pub fn poll(&mut self) -> Vec<SecurityReply> {
        let mut replies = Vec::new();
        while let Ok(reply) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            replies.push(reply);
        }
        replies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_request_has_type_byte_and_key() {
        let buf = write_expansion_request(0xAABBCCDD);
        assert_eq!(buf[0], EXPANSION_REQUEST_TYPE);
        assert_eq!(u32::from_le_bytes(buf[1..5].try_into().unwrap()), 0xAABBCCDD);
    }

    #[test]
    fn checksum_request_has_type_byte_and_key() {
        let buf = write_checksum_request(42);
        assert_eq!(buf[0], CHECKSUM_REQUEST_TYPE);
        assert_eq!(u32::from_le_bytes(buf[1..5].try_into().unwrap()), 42);
    }

    #[test]
    fn new_solver_has_nothing_in_flight() {
        let solver = SecuritySolver::new("127.0.0.1:1");
        assert_eq!(solver.in_flight(), 0);
    }
}
