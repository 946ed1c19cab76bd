use crate::model::RepeatTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Playing { index: usize, play_count: u32 },
}

/// What the engine should do after a completion event was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Replay { index: usize, play_count: u32 },
    Advance { index: usize },
}

/// Owns the single-active-track invariant: every playback transition funnels
/// through `activate` or `on_track_finished`, nothing else mutates the state.
#[derive(Debug)]
pub struct Sequencer {
    track_count: usize,
    repeat_target: RepeatTarget,
    state: SequencerState,
}

impl Sequencer {
    pub fn new(track_count: usize) -> Self {
        Self {
            track_count,
            repeat_target: RepeatTarget::default(),
            state: SequencerState::Idle,
        }
    }

    /// The catalog is replaced wholesale, so any active track is dropped.
    pub fn set_track_count(&mut self, track_count: usize) {
        self.track_count = track_count;
        self.state = SequencerState::Idle;
    }

    pub fn track_count(&self) -> usize {
        self.track_count
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn active_index(&self) -> Option<usize> {
        match self.state {
            SequencerState::Playing { index, .. } => Some(index),
            SequencerState::Idle => None,
        }
    }

    pub fn play_count(&self) -> Option<u32> {
        match self.state {
            SequencerState::Playing { play_count, .. } => Some(play_count),
            SequencerState::Idle => None,
        }
    }

    pub fn repeat_target(&self) -> RepeatTarget {
        self.repeat_target
    }

    /// Takes effect at the next completion evaluation, never retroactively.
    pub fn set_repeat_target(&mut self, target: RepeatTarget) {
        self.repeat_target = target;
    }

    pub fn cycle_repeat_target(&mut self) -> RepeatTarget {
        self.repeat_target = self.repeat_target.next();
        self.repeat_target
    }

    /// User-initiated play. Supersedes whatever was active and starts the
    /// play count over at 1. Returns false for an out-of-range index.
    pub fn activate(&mut self, index: usize) -> bool {
        if index >= self.track_count {
            return false;
        }
        self.state = SequencerState::Playing {
            index,
            play_count: 1,
        };
        true
    }

    pub fn stop(&mut self) {
        self.state = SequencerState::Idle;
    }

    /// Completion event for track `index`. Events for a non-active track are
    /// stale (the track was superseded before its completion arrived) and are
    /// dropped.
    pub fn on_track_finished(&mut self, index: usize) -> Option<Decision> {
        let SequencerState::Playing {
            index: active,
            play_count,
        } = self.state
        else {
            return None;
        };

        if index != active {
            return None;
        }

        if self.track_count == 0 {
            self.state = SequencerState::Idle;
            return None;
        }

        if self.repeat_target.allows_replay(play_count) {
            let play_count = play_count.saturating_add(1);
            self.state = SequencerState::Playing {
                index: active,
                play_count,
            };
            return Some(Decision::Replay {
                index: active,
                play_count,
            });
        }

        let next = (active + 1) % self.track_count;
        self.state = SequencerState::Playing {
            index: next,
            play_count: 1,
        };
        Some(Decision::Advance { index: next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prop_assert;

    #[test]
    fn activate_starts_at_play_count_one() {
        let mut sequencer = Sequencer::new(3);
        assert!(sequencer.activate(1));
        assert_eq!(
            sequencer.state(),
            SequencerState::Playing {
                index: 1,
                play_count: 1
            }
        );
    }

    #[test]
    fn activate_rejects_out_of_range_index() {
        let mut sequencer = Sequencer::new(2);
        assert!(!sequencer.activate(2));
        assert_eq!(sequencer.state(), SequencerState::Idle);
    }

    #[test]
    fn empty_catalog_stays_idle() {
        let mut sequencer = Sequencer::new(0);
        assert!(!sequencer.activate(0));
        assert_eq!(sequencer.on_track_finished(0), None);
        assert_eq!(sequencer.state(), SequencerState::Idle);
    }

    #[test]
    fn completion_for_non_active_track_is_a_no_op() {
        let mut sequencer = Sequencer::new(3);
        sequencer.activate(0);
        assert_eq!(sequencer.on_track_finished(2), None);
        assert_eq!(
            sequencer.state(),
            SequencerState::Playing {
                index: 0,
                play_count: 1
            }
        );
    }

    #[test]
    fn completion_while_idle_is_a_no_op() {
        let mut sequencer = Sequencer::new(3);
        assert_eq!(sequencer.on_track_finished(0), None);
    }

    #[test]
    fn single_target_advances_and_wraps() {
        let mut sequencer = Sequencer::new(2);
        sequencer.activate(0);

        assert_eq!(
            sequencer.on_track_finished(0),
            Some(Decision::Advance { index: 1 })
        );
        assert_eq!(sequencer.play_count(), Some(1));

        assert_eq!(
            sequencer.on_track_finished(1),
            Some(Decision::Advance { index: 0 })
        );
    }

    #[test]
    fn triple_target_replays_twice_then_advances() {
        let mut sequencer = Sequencer::new(2);
        sequencer.set_repeat_target(RepeatTarget::Finite(3));
        sequencer.activate(0);

        assert_eq!(
            sequencer.on_track_finished(0),
            Some(Decision::Replay {
                index: 0,
                play_count: 2
            })
        );
        assert_eq!(
            sequencer.on_track_finished(0),
            Some(Decision::Replay {
                index: 0,
                play_count: 3
            })
        );
        assert_eq!(
            sequencer.on_track_finished(0),
            Some(Decision::Advance { index: 1 })
        );
        assert_eq!(sequencer.play_count(), Some(1));
    }

    #[test]
    fn infinite_target_never_advances() {
        let mut sequencer = Sequencer::new(2);
        sequencer.set_repeat_target(RepeatTarget::Infinite);
        sequencer.activate(1);

        for expected_count in 2..50 {
            assert_eq!(
                sequencer.on_track_finished(1),
                Some(Decision::Replay {
                    index: 1,
                    play_count: expected_count
                })
            );
        }
    }

    #[test]
    fn target_change_applies_at_next_completion() {
        let mut sequencer = Sequencer::new(2);
        sequencer.set_repeat_target(RepeatTarget::Finite(10));
        sequencer.activate(0);

        sequencer.on_track_finished(0);
        sequencer.on_track_finished(0);
        assert_eq!(sequencer.play_count(), Some(3));

        // Lowering the target below the current count advances on the next
        // completion instead of resetting anything retroactively.
        sequencer.set_repeat_target(RepeatTarget::Finite(1));
        assert_eq!(
            sequencer.on_track_finished(0),
            Some(Decision::Advance { index: 1 })
        );
    }

    #[test]
    fn replacing_catalog_drops_active_track() {
        let mut sequencer = Sequencer::new(3);
        sequencer.activate(2);
        sequencer.set_track_count(1);
        assert_eq!(sequencer.state(), SequencerState::Idle);
        assert_eq!(sequencer.on_track_finished(2), None);
    }

    #[test]
    fn single_track_catalog_wraps_to_itself() {
        let mut sequencer = Sequencer::new(1);
        sequencer.activate(0);
        assert_eq!(
            sequencer.on_track_finished(0),
            Some(Decision::Advance { index: 0 })
        );
        assert_eq!(sequencer.play_count(), Some(1));
    }

    proptest::proptest! {
        #[test]
        fn active_index_stays_in_bounds_under_random_ops(
            len in 1usize..20,
            ops in proptest::collection::vec((0u8..4, 0usize..24), 1..200),
        ) {
            let mut sequencer = Sequencer::new(len);

            for (op, arg) in ops {
                match op {
                    0 => {
                        let _ = sequencer.activate(arg);
                    }
                    1 => {
                        let _ = sequencer.on_track_finished(arg);
                    }
                    2 => {
                        sequencer.cycle_repeat_target();
                    }
                    _ => {
                        if let Some(active) = sequencer.active_index() {
                            let _ = sequencer.on_track_finished(active);
                        }
                    }
                }

                if let SequencerState::Playing { index, play_count } = sequencer.state() {
                    prop_assert!(index < len);
                    prop_assert!(play_count >= 1);
                }
            }
        }

        #[test]
        fn finite_target_plays_exactly_target_times(target in 1u32..12, len in 2usize..10) {
            let mut sequencer = Sequencer::new(len);
            sequencer.set_repeat_target(RepeatTarget::Finite(target));
            sequencer.activate(0);

            let mut plays = 1u32;
            loop {
                match sequencer.on_track_finished(0) {
                    Some(Decision::Replay { index: 0, play_count }) => {
                        plays += 1;
                        prop_assert!(play_count == plays);
                    }
                    Some(Decision::Advance { index }) => {
                        prop_assert!(index == 1);
                        break;
                    }
                    other => panic!("unexpected decision {other:?}"),
                }
            }
            prop_assert!(plays == target);
        }
    }
}
