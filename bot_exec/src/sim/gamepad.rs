//! Scripted gamepad

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use bot_if::tc::{Axis, Button, Gamepad, GamepadEdges, GamepadSnapshot, Trigger};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A timed gamepad state. The state holds from `at_s` until the next entry.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ScriptEntry {
    pub at_s: f64,

    #[serde(flatten)]
    pub snapshot: GamepadSnapshot,
}

/// A gamepad which replays a script of timed snapshots.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGamepad {
    script: Vec<ScriptEntry>,
    time_s: f64,
    edges: GamepadEdges,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptedGamepad {
    pub fn new(mut script: Vec<ScriptEntry>) -> Self {
        script.sort_by(|a, b| {
            a.at_s
                .partial_cmp(&b.at_s)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Self {
            script,
            time_s: 0.0,
            edges: GamepadEdges::default(),
        }
    }

    /// Advance script time. The new state is picked up on the next `read`.
    pub fn advance(&mut self, dt_s: f64) {
        self.time_s += dt_s;
    }

    /// True once the last entry of the script has been reached.
    pub fn is_finished(&self) -> bool {
        match self.script.last() {
            Some(e) => self.time_s >= e.at_s,
            None => true,
        }
    }

    fn snapshot_now(&self) -> GamepadSnapshot {
        self.script
            .iter()
            .take_while(|e| e.at_s <= self.time_s)
            .last()
            .map(|e| e.snapshot.clone())
            .unwrap_or_default()
    }
}

impl Gamepad for ScriptedGamepad {
    fn read(&mut self) {
        let snapshot = self.snapshot_now();
        self.edges.update(snapshot);
    }

    fn was_just_pressed(&self, button: Button) -> bool {
        self.edges.was_just_pressed(button)
    }

    fn is_down(&self, button: Button) -> bool {
        self.edges.current().is_down(button)
    }

    fn trigger(&self, trigger: Trigger) -> f64 {
        self.edges.current().trigger(trigger)
    }

    fn axis(&self, axis: Axis) -> f64 {
        self.edges.current().axis(axis)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_script_replay() {
        let mut pad = ScriptedGamepad::new(vec![
            ScriptEntry {
                at_s: 0.5,
                snapshot: GamepadSnapshot::default(),
            },
            ScriptEntry {
                at_s: 0.1,
                snapshot: GamepadSnapshot {
                    held: vec![Button::Y],
                    right_trigger: 1.0,
                    ..Default::default()
                },
            },
        ]);

        pad.read();
        assert!(!pad.is_down(Button::Y));

        pad.advance(0.1);
        pad.read();
        assert!(pad.was_just_pressed(Button::Y));
        assert_eq!(pad.trigger(Trigger::Right), 1.0);

        pad.advance(0.1);
        pad.read();
        assert!(pad.is_down(Button::Y));
        assert!(!pad.was_just_pressed(Button::Y));
        assert!(!pad.is_finished());

        pad.advance(0.3);
        pad.read();
        assert!(!pad.is_down(Button::Y));
        assert!(pad.is_finished());
    }
}
