#![no_main]

use libfuzzer_sys::fuzz_target;
use replay::model::RepeatTarget;
use replay::sequencer::{Sequencer, SequencerState};

fuzz_target!(|data: &[u8]| {
    let len = (data.len() % 16).max(1);
    let mut sequencer = Sequencer::new(len);

    for byte in data {
        match byte % 6 {
            0 => {
                let _ = sequencer.activate(usize::from(*byte) % (len + 1));
            }
            1 => {
                sequencer.cycle_repeat_target();
            }
            2 => {
                let _ = sequencer.on_track_finished(usize::from(*byte / 6) % (len + 1));
            }
            3 => sequencer.set_repeat_target(RepeatTarget::Infinite),
            4 => sequencer.set_repeat_target(RepeatTarget::Finite(u32::from(*byte) % 11 + 1)),
            _ => {
                if let Some(active) = sequencer.active_index() {
                    let _ = sequencer.on_track_finished(active);
                }
            }
        }

        if let SequencerState::Playing { index, play_count } = sequencer.state() {
            assert!(index < len);
            assert!(play_count >= 1);
        }
    }
});
