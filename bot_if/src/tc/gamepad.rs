//! # Gamepad input
//!
//! Gamepads are polled once per cycle with [`Gamepad::read`], after which edge (just pressed) and
//! level (held, trigger, stick) queries all refer to that same snapshot.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Digital gamepad buttons.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    A,
    B,
    X,
    Y,
    LeftBumper,
    RightBumper,
    DpadUp,
    DpadDown,
    Back,
    Start,
}

/// Analogue triggers, reading in [0, 1].
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Left,
    Right,
}

/// Analogue stick axes, reading in [-1, 1] with positive Y pointing away from the operator.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A snapshot of every input on a gamepad.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GamepadSnapshot {
    #[serde(default)]
    pub held: Vec<Button>,

    #[serde(default)]
    pub left_trigger: f64,

    #[serde(default)]
    pub right_trigger: f64,

    #[serde(default)]
    pub left_x: f64,

    #[serde(default)]
    pub left_y: f64,

    #[serde(default)]
    pub right_x: f64,

    #[serde(default)]
    pub right_y: f64,
}

/// Edge detection between consecutive snapshots.
///
/// Gamepad implementations that only see levels can hold one of these and call
/// [`GamepadEdges::update`] from their [`Gamepad::read`].
#[derive(Debug, Clone, Default)]
pub struct GamepadEdges {
    prev: GamepadSnapshot,
    curr: GamepadSnapshot,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The input collaborator.
pub trait Gamepad {
    /// Sample the device. Must be called once per cycle before any query.
    fn read(&mut self);

    /// True if the button went down between the last two reads.
    fn was_just_pressed(&self, button: Button) -> bool;

    /// True if the button is held in the latest read.
    fn is_down(&self, button: Button) -> bool;

    /// Level of a trigger in [0, 1].
    fn trigger(&self, trigger: Trigger) -> f64;

    /// Level of a stick axis in [-1, 1].
    fn axis(&self, axis: Axis) -> f64;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GamepadSnapshot {
    pub fn is_down(&self, button: Button) -> bool {
        self.held.contains(&button)
    }

    pub fn trigger(&self, trigger: Trigger) -> f64 {
        match trigger {
            Trigger::Left => self.left_trigger,
            Trigger::Right => self.right_trigger,
        }
    }

    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::LeftX => self.left_x,
            Axis::LeftY => self.left_y,
            Axis::RightX => self.right_x,
            Axis::RightY => self.right_y,
        }
    }
}

impl GamepadEdges {
    /// Shift in a new snapshot.
    pub fn update(&mut self, snapshot: GamepadSnapshot) {
        self.prev = std::mem::replace(&mut self.curr, snapshot);
    }

    pub fn current(&self) -> &GamepadSnapshot {
        &self.curr
    }

    pub fn was_just_pressed(&self, button: Button) -> bool {
        self.curr.is_down(button) && !self.prev.is_down(button)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
