//! Leaderboard
//!
//! Derived ranking of players by kills. Nothing is stored between calls.

use serde::{Serialize, Deserialize};

use crate::game::events::{GameEvent, GameEventData};
use crate::game::state::{ArenaState, PlayerState};

/// How many entries the leaderboard shows.
pub const LEADERBOARD_SIZE: usize = 5;

/// One row of the leaderboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Display name
    pub name: String,
    /// Kill count
    pub kills: u32,
}

/// Rank players by kills, descending, and keep the top five.
///
/// The sort is stable: equal kill counts keep the order the iterator
/// yields them in.
pub fn rank<'a>(players: impl IntoIterator<Item = &'a PlayerState>) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = players
        .into_iter()
        .map(|p| LeaderboardEntry {
            name: p.name.clone(),
            kills: p.kills,
        })
        .collect();

    entries.sort_by(|a, b| b.kills.cmp(&a.kills));
    entries.truncate(LEADERBOARD_SIZE);
    entries
}

/// Recompute the leaderboard and queue a broadcast of it.
pub fn publish(state: &mut ArenaState) {
    let top = rank(state.players.values());
    state.push_event(GameEvent::broadcast(state.tick(), GameEventData::LeaderboardUpdate { top }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use crate::game::state::{AbilityKind, Cosmetic, PlayerId};

    fn player(byte: u8, name: &str, kills: u32) -> PlayerState {
        let mut p = PlayerState::new(
            PlayerId::new([byte; 16]),
            name.to_string(),
            Cosmetic::default(),
            AbilityKind::Arise,
            Vec2::ZERO,
        );
        p.kills = kills;
        p
    }

    #[test]
    fn test_rank_orders_by_kills() {
        let players = [player(1, "A", 3), player(2, "B", 5), player(3, "C", 1)];
        let top = rank(players.iter());

        let names: Vec<_> = top.iter().map(|e| e.name.as_str()).collect();
        let kills: Vec<_> = top.iter().map(|e| e.kills).collect();
        assert_eq!(names, ["B", "A", "C"]);
        assert_eq!(kills, [5, 3, 1]);
    }

    #[test]
    fn test_rank_truncates_to_five() {
        let players: Vec<_> = (0..8).map(|i| player(i, "p", i as u32)).collect();
        let top = rank(players.iter());
        assert_eq!(top.len(), LEADERBOARD_SIZE);
        assert_eq!(top[0].kills, 7);
        assert_eq!(top[4].kills, 3);
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        let players = [player(1, "first", 2), player(2, "second", 2), player(3, "third", 4)];
        let top = rank(players.iter());
        let names: Vec<_> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["third", "first", "second"]);
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank(std::iter::empty::<&PlayerState>()).is_empty());
    }
}
