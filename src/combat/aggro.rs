//! # Aggro Table
//!
//! Per-encounter hostility tracking used for enemy target selection.

use crate::{CombatantId, CombatantKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A combatant an enemy may choose to attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetCandidate {
    pub id: CombatantId,
    pub kind: CombatantKind,
}

/// Accumulated hostility per combatant.
///
/// Created fresh with each enemy and discarded with the encounter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggroTable {
    points: HashMap<CombatantId, u64>,
}

impl AggroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `points` of hostility toward `id`.
    pub fn add_aggro(&mut self, id: CombatantId, points: u64) {
        *self.points.entry(id).or_insert(0) += points;
    }

    /// Recorded points for `id`, zero when absent.
    pub fn aggro_for(&self, id: CombatantId) -> u64 {
        self.points.get(&id).copied().unwrap_or(0)
    }

    /// Picks who to attack.
    ///
    /// Returns the candidate with the strictly greatest recorded points, the
    /// earliest candidate winning ties. When nobody has any points the first
    /// player candidate is chosen; minions are never a fallback target.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{AggroTable, CombatantKind, TargetCandidate};
    /// use uuid::Uuid;
    ///
    /// let a = TargetCandidate { id: Uuid::new_v4(), kind: CombatantKind::Player };
    /// let b = TargetCandidate { id: Uuid::new_v4(), kind: CombatantKind::Minion };
    ///
    /// let mut table = AggroTable::new();
    /// assert_eq!(table.highest_aggro_target(&[b, a]), Some(a.id));
    ///
    /// table.add_aggro(a.id, 10);
    /// table.add_aggro(b.id, 15);
    /// assert_eq!(table.highest_aggro_target(&[a, b]), Some(b.id));
    /// ```
    pub fn highest_aggro_target(&self, candidates: &[TargetCandidate]) -> Option<CombatantId> {
        let mut best: Option<CombatantId> = None;
        let mut best_points = 0;

        for candidate in candidates {
            let points = self.aggro_for(candidate.id);
            if points > best_points {
                best = Some(candidate.id);
                best_points = points;
            }
        }

        best.or_else(|| {
            candidates
                .iter()
                .find(|c| c.kind == CombatantKind::Player)
                .map(|c| c.id)
        })
    }

    /// Snapshot of every recorded entry.
    pub fn entries(&self) -> impl Iterator<Item = (CombatantId, u64)> + '_ {
        self.points.iter().map(|(id, points)| (*id, *points))
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Drops the entry for a combatant that left the encounter.
    pub fn forget(&mut self, id: CombatantId) {
        self.points.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::new_combatant_id;

    fn candidate(kind: CombatantKind) -> TargetCandidate {
        TargetCandidate {
            id: new_combatant_id(),
            kind,
        }
    }

    #[test]
    fn test_add_aggro_accumulates() {
        let mut table = AggroTable::new();
        let id = new_combatant_id();
        assert_eq!(table.aggro_for(id), 0);

        table.add_aggro(id, 4);
        table.add_aggro(id, 6);
        assert_eq!(table.aggro_for(id), 10);
    }

    #[test]
    fn test_highest_aggro_wins() {
        let a = candidate(CombatantKind::Player);
        let b = candidate(CombatantKind::Minion);
        let mut table = AggroTable::new();
        table.add_aggro(a.id, 10);
        table.add_aggro(b.id, 15);

        assert_eq!(table.highest_aggro_target(&[a, b]), Some(b.id));
        assert_eq!(table.highest_aggro_target(&[b, a]), Some(b.id));
    }

    #[test]
    fn test_ties_keep_first_seen() {
        let a = candidate(CombatantKind::Minion);
        let b = candidate(CombatantKind::Minion);
        let mut table = AggroTable::new();
        table.add_aggro(a.id, 7);
        table.add_aggro(b.id, 7);

        assert_eq!(table.highest_aggro_target(&[a, b]), Some(a.id));
        assert_eq!(table.highest_aggro_target(&[b, a]), Some(b.id));
    }

    #[test]
    fn test_fallback_prefers_player_over_minions() {
        let minion = candidate(CombatantKind::Minion);
        let player = candidate(CombatantKind::Player);
        let mut table = AggroTable::new();

        // Zero points count as no hostility
        table.add_aggro(minion.id, 0);
        assert_eq!(table.highest_aggro_target(&[minion, player]), Some(player.id));

        assert_eq!(table.highest_aggro_target(&[minion]), None);
        assert_eq!(table.highest_aggro_target(&[]), None);
    }

    #[test]
    fn test_forget_removes_entry() {
        let a = candidate(CombatantKind::Player);
        let mut table = AggroTable::new();
        table.add_aggro(a.id, 3);
        table.forget(a.id);
        assert!(table.is_empty());
    }
}
