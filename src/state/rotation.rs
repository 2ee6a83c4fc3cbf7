//! Pure rotation math for a six-slot lineup, including the libero front-row
//! correction applied after each cyclic shift.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::state::roster::{COURT_SLOTS, FRONT_LEFT, Player};

/// Follow-up produced by [`rotate`] when the shift pushed a libero toward the
/// front row.
#[derive(Debug, Clone, PartialEq)]
pub enum RotationCorrection {
    /// The libero reached the front-left slot and was replaced by the player
    /// they originally came on for. The libero must rejoin the off-court
    /// libero list.
    LiberoReturned {
        /// The libero removed from the lineup.
        libero: Player,
        /// Id of the original player restored at the front-left slot.
        original: Uuid,
    },
    /// A libero reached the front-left slot but no original was recorded for
    /// them. The libero is left in place; callers should log this loudly.
    MissingOriginal {
        /// Id of the stranded libero.
        libero: Uuid,
    },
}

/// Result of rotating a lineup one position.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationOutcome {
    /// Lineup after the shift and any libero correction.
    pub lineup: [Player; COURT_SLOTS],
    /// Libero-original map after any correction.
    pub libero_originals: IndexMap<Uuid, Player>,
    /// Correction applied, if the shift moved a libero into the front row.
    pub correction: Option<RotationCorrection>,
}

/// Rotate a lineup one position clockwise: the player in the last slot becomes
/// the new server (slot 0) and everyone else shifts one slot up.
///
/// After the shift the front-left slot is inspected: a libero may never play
/// front row, so when one lands there the recorded original takes the slot
/// back and the corresponding `libero_originals` entry is dropped. Pure:
/// deterministic over its inputs, no I/O.
pub fn rotate(
    lineup: [Player; COURT_SLOTS],
    mut libero_originals: IndexMap<Uuid, Player>,
) -> RotationOutcome {
    let [z1, z6, z5, z4, z3, z2] = lineup;
    let mut rotated = [z2, z1, z6, z5, z4, z3];

    let front_left = &rotated[FRONT_LEFT];
    let correction = if front_left.is_libero {
        let libero_id = front_left.id;
        match libero_originals.shift_remove(&libero_id) {
            Some(original) => {
                let original_id = original.id;
                let libero = std::mem::replace(&mut rotated[FRONT_LEFT], original);
                Some(RotationCorrection::LiberoReturned {
                    libero,
                    original: original_id,
                })
            }
            None => Some(RotationCorrection::MissingOriginal { libero: libero_id }),
        }
    } else {
        None
    };

    RotationOutcome {
        lineup: rotated,
        libero_originals,
        correction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(n: u8) -> Player {
        Player {
            id: Uuid::new_v4(),
            number: n,
            name: format!("P{n}"),
            position: "outside".into(),
            is_libero: false,
        }
    }

    fn libero(n: u8) -> Player {
        Player {
            is_libero: true,
            position: "libero".into(),
            ..player(n)
        }
    }

    #[test]
    fn rotate_is_a_cyclic_shift() {
        let lineup = [player(1), player(2), player(3), player(4), player(5), player(6)];
        let ids: Vec<Uuid> = lineup.iter().map(|p| p.id).collect();

        let out = rotate(lineup, IndexMap::new());

        assert!(out.correction.is_none());
        // Last slot becomes the new server, everyone else shifts by one.
        assert_eq!(out.lineup[0].id, ids[5]);
        for slot in 1..COURT_SLOTS {
            assert_eq!(out.lineup[slot].id, ids[slot - 1]);
        }
    }

    #[test]
    fn rotate_preserves_the_player_set() {
        let lineup = [player(1), player(2), player(3), player(4), player(5), player(6)];
        let mut before: Vec<Uuid> = lineup.iter().map(|p| p.id).collect();
        before.sort();

        let out = rotate(lineup, IndexMap::new());
        let mut after: Vec<Uuid> = out.lineup.iter().map(|p| p.id).collect();
        after.sort();

        assert_eq!(before, after);
    }

    #[test]
    fn libero_reaching_front_left_is_swapped_for_the_original() {
        let lib = libero(17);
        let original = player(4);
        let mut originals = IndexMap::new();
        originals.insert(lib.id, original.clone());

        // Libero sits in the last back-row slot; rotation pushes them to
        // front-left.
        let lineup = [player(1), player(2), lib.clone(), player(9), player(5), player(6)];
        let out = rotate(lineup, originals);

        assert_eq!(out.lineup[FRONT_LEFT].id, original.id);
        assert!(out.libero_originals.is_empty());
        match out.correction {
            Some(RotationCorrection::LiberoReturned { libero: l, original: o }) => {
                assert_eq!(l.id, lib.id);
                assert_eq!(o, original.id);
            }
            other => panic!("expected libero correction, got {other:?}"),
        }
        assert!(out.lineup.iter().all(|p| !p.is_libero));
    }

    #[test]
    fn missing_original_leaves_the_libero_in_place() {
        let lib = libero(17);
        let lineup = [player(1), player(2), lib.clone(), player(9), player(5), player(6)];

        let out = rotate(lineup, IndexMap::new());

        assert_eq!(out.lineup[FRONT_LEFT].id, lib.id);
        assert_eq!(
            out.correction,
            Some(RotationCorrection::MissingOriginal { libero: lib.id })
        );
    }
}
