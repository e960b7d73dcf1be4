//! Turn scheduling: who explains and who guesses in each round.
//!
//! Pure state-transition logic. `step` computes the assignment for round N
//! from round N-1, and `unstep` is its exact inverse: any sequence of steps
//! can be unwound back through every intermediate state, including the
//! pre-round-0 state. The round-replay feature depends on that property, so
//! both directions use the same wraparound convention (`rem_euclid`, which
//! never yields a negative remainder).

use crate::error::GameError;

/// Roster indices of the two active roles for the current round.
/// Invariant: `explainer != guesser` in every reachable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub explainer: usize,
    pub guesser: usize,
}

/// Position of the current round within the game's fairness cycles.
/// A circle is one full sweep of explainers; an epoch is a maximal run of
/// circles after which the explainer/guesser offset pattern would repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundCoordinates {
    pub epoch: i64,
    pub circle: i64,
    pub round: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CircleState {
    coords: RoundCoordinates,
    explainer: usize,
    guesser: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PairState {
    coords: RoundCoordinates,
    cursor: usize,
    /// Which pair member currently explains (0 or 1); toggles every circle
    /// so both members of a pair alternate roles.
    explain_side: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rotation {
    Circle {
        roster_len: usize,
        state: Option<CircleState>,
    },
    Pairs {
        pairs: Vec<(usize, usize)>,
        state: Option<PairState>,
    },
}

/// Rotation state machine, one per game, fixed to a strategy at game start.
/// Constructed only through the validating constructors, so every value of
/// this type holds a roster the strategy can actually rotate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnScheduler {
    rotation: Rotation,
}

impl TurnScheduler {
    /// One cycling ring over the roster: the explainer index advances every
    /// round, the guesser index ratchets so every ordered pair is exercised
    /// once per epoch. Needs at least two participants (a single player has
    /// no valid guesser).
    pub fn circle(roster_len: usize) -> Result<Self, GameError> {
        if roster_len < 2 {
            return Err(GameError::InvalidRotationConfiguration(format!(
                "circle rotation needs at least 2 players, got {}",
                roster_len
            )));
        }
        Ok(TurnScheduler {
            rotation: Rotation::Circle {
                roster_len,
                state: None,
            },
        })
    }

    /// Fixed pairs of adjacent roster indices: (0,1), (2,3), … The roster
    /// order itself decides the pairing, so random and pre-assigned pairing
    /// differ only in how the caller ordered the roster.
    pub fn pairs(roster_len: usize) -> Result<Self, GameError> {
        if roster_len < 2 || roster_len % 2 != 0 {
            return Err(GameError::InvalidRotationConfiguration(format!(
                "pair rotation needs an even roster of at least 2, got {}",
                roster_len
            )));
        }
        let pairs = (0..roster_len).step_by(2).map(|i| (i, i + 1)).collect();
        Ok(TurnScheduler {
            rotation: Rotation::Pairs { pairs, state: None },
        })
    }

    pub fn is_started(&self) -> bool {
        match &self.rotation {
            Rotation::Circle { state, .. } => state.is_some(),
            Rotation::Pairs { state, .. } => state.is_some(),
        }
    }

    /// Advances to the next round's assignment.
    pub fn step(&mut self) {
        match &mut self.rotation {
            Rotation::Circle { roster_len, state } => {
                let n = *roster_len as i64;
                let (mut round, mut circle, mut epoch, mut explainer, mut guesser) = match state {
                    Some(s) => (
                        s.coords.round,
                        s.coords.circle,
                        s.coords.epoch,
                        s.explainer as i64,
                        s.guesser as i64,
                    ),
                    // The not-started state behaves as the -1 sentinels the
                    // arithmetic below was designed around.
                    None => (-1, -1, 0, -1, -1),
                };

                round += 1;
                explainer = (explainer + 1).rem_euclid(n);
                if explainer == 0 {
                    // A full sweep of explainers completed: new circle, and
                    // the guesser offset ratchets by one extra position.
                    circle += 1;
                    guesser = (guesser + 2).rem_euclid(n);
                    if guesser == 0 {
                        guesser = 1;
                        epoch += 1;
                    }
                } else {
                    guesser = (guesser + 1).rem_euclid(n);
                }

                debug_assert_ne!(explainer, guesser);
                *state = Some(CircleState {
                    coords: RoundCoordinates {
                        epoch,
                        circle,
                        round,
                    },
                    explainer: explainer as usize,
                    guesser: guesser as usize,
                });
            }
            Rotation::Pairs { pairs, state } => {
                let pair_count = pairs.len() as i64;
                let (mut round, mut circle, mut epoch, mut cursor, mut side) = match state {
                    Some(s) => (
                        s.coords.round,
                        s.coords.circle,
                        s.coords.epoch,
                        s.cursor as i64,
                        s.explain_side,
                    ),
                    None => (-1, 0, 0, -1, 0),
                };

                round += 1;
                cursor += 1;
                if cursor >= pair_count {
                    cursor = 0;
                    // An epoch spans two circles: one with each pair member
                    // on the explaining side.
                    if circle.rem_euclid(2) == 1 {
                        epoch += 1;
                    }
                    circle += 1;
                    side = 1 - side;
                }

                *state = Some(PairState {
                    coords: RoundCoordinates {
                        epoch,
                        circle,
                        round,
                    },
                    cursor: cursor as usize,
                    explain_side: side,
                });
            }
        }
    }

    /// Exact inverse of `step`. Unstepping the round-0 state restores the
    /// not-started state; unstepping a scheduler that never started is a
    /// no-op (the lifecycle refuses replays before round 0).
    pub fn unstep(&mut self) {
        match &mut self.rotation {
            Rotation::Circle { roster_len, state } => {
                let Some(s) = state else {
                    return;
                };
                if s.coords.round == 0 {
                    *state = None;
                    return;
                }

                let n = *roster_len as i64;
                let mut round = s.coords.round;
                let mut circle = s.coords.circle;
                let mut epoch = s.coords.epoch;
                let mut explainer = s.explainer as i64;
                let mut guesser = s.guesser as i64;

                round -= 1;
                explainer = (explainer - 1).rem_euclid(n);
                if explainer == n - 1 {
                    // Stepping backward across a circle boundary.
                    circle -= 1;
                    guesser = (guesser - 2).rem_euclid(n);
                    if guesser == n - 1 {
                        guesser -= 1;
                        epoch -= 1;
                    }
                } else {
                    guesser = (guesser - 1).rem_euclid(n);
                }

                debug_assert_ne!(explainer, guesser);
                *state = Some(CircleState {
                    coords: RoundCoordinates {
                        epoch,
                        circle,
                        round,
                    },
                    explainer: explainer as usize,
                    guesser: guesser as usize,
                });
            }
            Rotation::Pairs { pairs, state } => {
                let Some(s) = state else {
                    return;
                };
                if s.coords.round == 0 {
                    *state = None;
                    return;
                }

                let mut round = s.coords.round;
                let mut circle = s.coords.circle;
                let mut epoch = s.coords.epoch;
                let mut cursor = s.cursor as i64;
                let mut side = s.explain_side;

                round -= 1;
                cursor -= 1;
                if cursor < 0 {
                    cursor = pairs.len() as i64 - 1;
                    circle -= 1;
                    if circle.rem_euclid(2) == 1 {
                        epoch -= 1;
                    }
                    side = 1 - side;
                }

                *state = Some(PairState {
                    coords: RoundCoordinates {
                        epoch,
                        circle,
                        round,
                    },
                    cursor: cursor as usize,
                    explain_side: side,
                });
            }
        }
    }

    /// Current explainer/guesser roster indices, `None` before round 0.
    pub fn assignment(&self) -> Option<Assignment> {
        match &self.rotation {
            Rotation::Circle { state, .. } => state.map(|s| Assignment {
                explainer: s.explainer,
                guesser: s.guesser,
            }),
            Rotation::Pairs { pairs, state } => state.map(|s| {
                let (first, second) = pairs[s.cursor];
                if s.explain_side == 0 {
                    Assignment {
                        explainer: first,
                        guesser: second,
                    }
                } else {
                    Assignment {
                        explainer: second,
                        guesser: first,
                    }
                }
            }),
        }
    }

    /// Current epoch/circle/round counters, `None` before round 0.
    pub fn coordinates(&self) -> Option<RoundCoordinates> {
        match &self.rotation {
            Rotation::Circle { state, .. } => state.map(|s| s.coords),
            Rotation::Pairs { state, .. } => state.map(|s| s.coords),
        }
    }

    pub fn round(&self) -> Option<i64> {
        self.coordinates().map(|c| c.round)
    }
}
