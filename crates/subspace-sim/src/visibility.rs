//! Computes which players a renderer should show on the radar/spectate
//! feed and how, without doing any drawing itself. Grounded on the
//! stealth/x-radar visibility gate and indicator classification in the
//! original client's `Radar::RenderPlayers`; everything about textures,
//! sprite atlases, and pixel layout stays with the renderer.

use subspace_types::{Frequency, PlayerId, StatusFlags};

use crate::player::{PlayerManager, Vec2f, SPECTATOR_SHIP};

/// How a visible player should be marked: same team, carrying a flag,
/// a dangerous (high-bounty) enemy, or a plain enemy. Matches the four
/// sprite buckets the original radar falls back on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadarCategory {
    Teammate,
    EnemyFlagCarrier,
    EnemyHighBounty,
    Enemy,
}

#[derive(Debug, Clone, Copy)]
pub struct RadarIndicator {
    pub player_id: PlayerId,
    pub position: Vec2f,
    pub category: RadarCategory,
    /// True for the viewer's own ship or the player currently being
    /// spectated; the renderer blinks these instead of drawing them solid.
    pub is_self_or_spectated: bool,
}

const HIGH_BOUNTY_THRESHOLD: u16 = 100;

/// A stealthed enemy is hidden unless the viewer has x-radar active or the
/// target shares the viewer's frequency. Spectators never show up.
fn is_visible(viewer_xradar: bool, viewer_freq: Frequency, other: &crate::player::Player) -> bool {
    if other.ship >= SPECTATOR_SHIP {
        return false;
    }
    if other.togglables.contains(StatusFlags::STEALTH) && !viewer_xradar && other.frequency != viewer_freq {
        return false;
    }
    true
}

fn classify(other: &crate::player::Player, viewer_freq: Frequency) -> RadarCategory {
    if other.frequency == viewer_freq {
        RadarCategory::Teammate
    } else if other.flags > 0 {
        RadarCategory::EnemyFlagCarrier
    } else if other.bounty > HIGH_BOUNTY_THRESHOLD {
        RadarCategory::EnemyHighBounty
    } else {
        RadarCategory::Enemy
    }
}

/// Builds the full radar feed for the current viewer. `spectating` is the
/// id of whichever player a spectator is currently following, if any.
pub fn radar_indicators(players: &PlayerManager, viewer_freq: Frequency, spectating: Option<PlayerId>) -> Vec<RadarIndicator> {
    let Some(viewer) = players.get_self() else {
        return Vec::new();
    };
    let viewer_xradar = viewer.togglables.contains(StatusFlags::XRADAR);
    let viewer_id = viewer.id;
    let viewer_ship = viewer.ship;

    players
        .iter()
        .filter(|p| is_visible(viewer_xradar, viewer_freq, p))
        .map(|p| {
            let category = classify(p, viewer_freq);
            let is_self_or_spectated =
                spectating == Some(p.id) || (p.id == viewer_id && viewer_ship != SPECTATOR_SHIP);
            RadarIndicator { player_id: p.id, position: p.position, category, is_self_or_spectated }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerManager;
    use subspace_protocol_game::PlayerEntering;

    fn entering(id: PlayerId, frequency: Frequency, ship: u8) -> PlayerEntering {
        PlayerEntering {
            ship,
            audio: 0,
            name: "p".to_string(),
            squad: String::new(),
            kill_points: 0,
            flag_points: 0,
            id,
            frequency,
            wins: 0,
            losses: 0,
            attach_parent: 0xFFFF,
            flags: 0,
            koth: 0,
        }
    }

    fn manager_with(entries: &[(PlayerId, Frequency, u8)], self_id: PlayerId) -> PlayerManager {
        let mut mgr = PlayerManager::new();
        mgr.reset(self_id);
        for &(id, freq, ship) in entries {
            mgr.on_player_entering(&entering(id, freq, ship));
        }
        mgr
    }

    #[test]
    fn stealthed_enemy_is_hidden_without_xradar() {
        let mut mgr = manager_with(&[(1, 0, 0), (2, 1, 0)], 1);
        mgr.get_by_id_mut(2).unwrap().togglables.insert(StatusFlags::STEALTH);

        let indicators = radar_indicators(&mgr, 0, None);
        assert!(indicators.iter().all(|i| i.player_id != 2));
    }

    #[test]
    fn stealthed_teammate_still_shows() {
        let mut mgr = manager_with(&[(1, 0, 0), (2, 0, 0)], 1);
        mgr.get_by_id_mut(2).unwrap().togglables.insert(StatusFlags::STEALTH);

        let indicators = radar_indicators(&mgr, 0, None);
        assert!(indicators.iter().any(|i| i.player_id == 2 && i.category == RadarCategory::Teammate));
    }

    #[test]
    fn flag_carrier_classification_beats_high_bounty() {
        let mut mgr = manager_with(&[(1, 0, 0), (2, 1, 0)], 1);
        let enemy = mgr.get_by_id_mut(2).unwrap();
        enemy.flags = 1;
        enemy.bounty = 200;

        let indicators = radar_indicators(&mgr, 0, None);
        let indicator = indicators.iter().find(|i| i.player_id == 2).unwrap();
        assert_eq!(indicator.category, RadarCategory::EnemyFlagCarrier);
    }

    #[test]
    fn spectators_never_appear() {
        let mgr = manager_with(&[(1, 0, 0), (2, 1, SPECTATOR_SHIP)], 1);
        let indicators = radar_indicators(&mgr, 0, None);
        assert!(indicators.iter().all(|i| i.player_id != 2));
    }
}
