use std::net::Ipv4Addr;
use std::path::Path;

use serde::Deserialize;

/// Window presentation mode. The core never opens a window itself; this is
/// carried only so a renderer reading the same config file sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    Windowed,
    Fullscreen,
    BorderlessFullscreen,
}

impl Default for WindowType {
    fn default() -> Self {
        WindowType::Windowed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptMethod {
    Subspace,
    Continuum,
}

impl Default for EncryptMethod {
    fn default() -> Self {
        EncryptMethod::Continuum
    }
}

fn default_true() -> bool {
    true
}
fn default_sound_volume() -> f32 {
    0.8
}
fn default_sound_radius_increase() -> f32 {
    0.0
}
fn default_target_bounty() -> u32 {
    0
}
fn default_server_ip() -> Ipv4Addr {
    Ipv4Addr::LOCALHOST
}
fn default_server_port() -> u16 {
    5000
}
fn default_player_name() -> String {
    "newbie".to_string()
}
fn default_player_password() -> String {
    String::new()
}
fn default_arena_name() -> String {
    String::new()
}
fn default_x_res() -> u16 {
    1920
}
fn default_y_res() -> u16 {
    1080
}
fn default_oracle_addr() -> String {
    "127.0.0.1:12000".to_string()
}

/// Everything the core reads out of `config/client.toml`.
///
/// `vsync`/`window_type`/sound fields are consumed by spec.md's host and
/// kept here purely as pass-through settings the core never itself acts on;
/// `encrypt_method` and the connection block below are the fields this
/// binary actually uses to drive a connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub vsync: bool,
    pub window_type: WindowType,
    pub encrypt_method: EncryptMethod,
    pub sound_enabled: bool,
    #[serde(default = "default_sound_volume")]
    pub sound_volume: f32,
    #[serde(default = "default_sound_radius_increase")]
    pub sound_radius_increase: f32,
    pub notify_max_prizes: bool,
    #[serde(default = "default_target_bounty")]
    pub target_bounty: u32,

    #[serde(default = "default_server_ip")]
    pub server_ip: Ipv4Addr,
    #[serde(default = "default_server_port")]
    pub server_port: u16,
    #[serde(default = "default_player_name")]
    pub player_name: String,
    #[serde(default = "default_player_password")]
    pub player_password: String,
    #[serde(default = "default_arena_name")]
    pub arena_name: String,
    #[serde(default = "default_x_res")]
    pub x_res: u16,
    #[serde(default = "default_y_res")]
    pub y_res: u16,
    /// `ip:port` of the external checksum/key-expansion oracle the
    /// SecuritySolver dials for Continuum connections.
    #[serde(default = "default_oracle_addr")]
    pub security_oracle_addr: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            vsync: true,
            window_type: WindowType::default(),
            encrypt_method: EncryptMethod::default(),
            sound_enabled: true,
            sound_volume: default_sound_volume(),
            sound_radius_increase: default_sound_radius_increase(),
            notify_max_prizes: true,
            target_bounty: default_target_bounty(),
            server_ip: default_server_ip(),
            server_port: default_server_port(),
            player_name: default_player_name(),
            player_password: default_player_password(),
            arena_name: default_arena_name(),
            x_res: default_x_res(),
            y_res: default_y_res(),
            security_oracle_addr: default_oracle_addr(),
        }
    }
}

impl ClientConfig {
    /// Loads `path`, falling back to defaults (with a log line) if the file
    /// doesn't exist — there's no config file shipped with a fresh checkout.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file found, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&raw)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ClientConfig::load(Path::new("/nonexistent/client.toml")).unwrap();
        assert_eq!(config.server_port, 5000);
        assert_eq!(config.encrypt_method, EncryptMethod::Continuum);
    }

    #[test]
    fn partial_toml_fills_in_remaining_defaults() {
        let config: ClientConfig = toml::from_str("player_name = \"bob\"\n").unwrap();
        assert_eq!(config.player_name, "bob");
        assert_eq!(config.sound_volume, default_sound_volume());
        assert!(config.vsync);
    }
}
