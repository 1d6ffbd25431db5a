//! Final match ranking.
//!
//! Players still standing come first, ordered by their latest snapshot score. Eliminated
//! players follow, later elimination ranking higher.

use std::cmp::Reverse;

use crate::protocol::{PlayerId, RoomRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    /// 1-based.
    pub rank: u32,
    pub player: PlayerId,
    pub name: String,
    pub score: u32,
    pub eliminated: bool,
}

/// Rank every player on the roster or in the elimination list.
pub fn rank_players(room: &RoomRecord) -> Vec<Standing> {
    let name_of = |id: &PlayerId| {
        room.players
            .get(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    let mut survivors: Vec<(&PlayerId, u32)> = room
        .players
        .keys()
        .filter(|id| !room.is_eliminated(id))
        .map(|id| {
            let score = room.game_states.get(id).map_or(0, |s| s.score);
            (id, score)
        })
        .collect();
    survivors.sort_by_key(|&(_, score)| Reverse(score));

    let mut eliminated: Vec<_> = room
        .eliminations
        .iter()
        .filter(|(_, record)| record.eliminated)
        .collect();
    eliminated.sort_by_key(|(_, record)| Reverse(record.server_timestamp));

    let standing_survivors = survivors.into_iter().map(|(id, score)| (id, score, false));
    let standing_eliminated = eliminated
        .into_iter()
        .map(|(id, record)| (id, record.final_score, true));

    standing_survivors
        .chain(standing_eliminated)
        .enumerate()
        .map(|(idx, (id, score, eliminated))| Standing {
            rank: idx as u32 + 1,
            player: id.clone(),
            name: name_of(id),
            score,
            eliminated,
        })
        .collect()
}

/// Rank of one player, if present.
pub fn rank_of(standings: &[Standing], player: &PlayerId) -> Option<u32> {
    standings
        .iter()
        .find(|s| &s.player == player)
        .map(|s| s.rank)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::core::GameSnapshot;
    use crate::protocol::{EliminationRecord, PlayerEntry, RoomCode, RoomStatus};

    fn room(ids: &[&str]) -> RoomRecord {
        let mut players = BTreeMap::new();
        for (i, id) in ids.iter().enumerate() {
            players.insert(
                PlayerId::new(*id),
                PlayerEntry {
                    name: id.to_uppercase(),
                    slot: i as u8 + 1,
                    ready: true,
                    is_host: i == 0,
                },
            );
        }
        RoomRecord {
            room_code: RoomCode::parse("RANK01").unwrap(),
            max_players: 4,
            current_players: ids.len() as u8,
            host_id: PlayerId::new(ids[0]),
            host_name: ids[0].to_uppercase(),
            status: RoomStatus::Playing,
            start_timestamp: Some(0),
            created_at: 0,
            players,
            game_states: BTreeMap::new(),
            eliminations: BTreeMap::new(),
        }
    }

    fn eliminate(room: &mut RoomRecord, id: &str, at: u64, score: u32) {
        room.eliminations.insert(
            PlayerId::new(id),
            EliminationRecord {
                eliminated: true,
                server_timestamp: at,
                final_score: score,
            },
        );
    }

    #[test]
    fn later_elimination_ranks_higher() {
        let mut r = room(&["a", "b", "c", "d"]);
        eliminate(&mut r, "b", 100, 5_000);
        eliminate(&mut r, "d", 300, 10);
        eliminate(&mut r, "c", 200, 900);

        let standings = rank_players(&r);
        let order: Vec<_> = standings.iter().map(|s| s.player.as_str()).collect();
        assert_eq!(order, vec!["a", "d", "c", "b"]);
        assert_eq!(standings[0].rank, 1);
        assert!(!standings[0].eliminated);
        assert_eq!(standings[1].score, 10);
        assert_eq!(standings[3].name, "B");
        assert_eq!(rank_of(&standings, &PlayerId::new("c")), Some(3));
    }

    #[test]
    fn survivors_tie_broken_by_score() {
        let mut r = room(&["a", "b", "c"]);
        for (id, score) in [("a", 100), ("b", 700)] {
            r.game_states.insert(
                PlayerId::new(id),
                GameSnapshot {
                    score,
                    level: 1,
                    ..Default::default()
                },
            );
        }
        eliminate(&mut r, "c", 50, 2_000);

        let standings = rank_players(&r);
        assert_eq!(standings[0].player, PlayerId::new("b"));
        assert_eq!(standings[1].player, PlayerId::new("a"));
        assert_eq!(standings[2].player, PlayerId::new("c"));
        assert_eq!(standings[2].score, 2_000);
    }

    #[test]
    fn departed_player_keeps_elimination_rank() {
        let mut r = room(&["a", "b"]);
        eliminate(&mut r, "ghost", 10, 1);
        let standings = rank_players(&r);
        assert_eq!(standings.len(), 3);
        assert_eq!(standings[2].name, "ghost");
    }
}
