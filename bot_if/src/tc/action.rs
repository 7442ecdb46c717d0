//! # Scheduled mechanism actions
//!
//! An [`Action`] is a side effect scheduled onto a trajectory plan. Rather than capturing code it
//! carries a stable identifier and a mechanism command, so that dispatch and fault isolation are
//! decided by whoever receives it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::eqpt::mech::{GripperState, WristSide};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Stable identifier of an action.
///
/// Actions sharing an identifier are treated as the same callback, so a fault in one disables
/// the others for the rest of the plan.
#[derive(Serialize, Deserialize, Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct ActionId(pub String);

/// A scheduled side effect.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Action {
    pub id: ActionId,

    #[serde(flatten)]
    pub cmd: MechCmd,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command to a mechanism.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "mech", rename_all = "snake_case")]
pub enum MechCmd {
    /// Move the lift to an absolute position.
    Lift { target_ticks: f64 },

    /// Point the wrist to one side.
    Wrist { side: WristSide },

    /// Open or close the gripper.
    Gripper { state: GripperState },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActionId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Action {
    pub fn new<S: Into<String>>(id: S, cmd: MechCmd) -> Self {
        Self {
            id: ActionId::new(id),
            cmd,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_action_from_toml() {
        let action: Action = toml::from_str(
            r#"
            id = "lift_high"
            mech = "lift"
            target_ticks = 2825.0
            "#,
        )
        .unwrap();

        assert_eq!(action.id, ActionId::new("lift_high"));
        assert_eq!(action.cmd, MechCmd::Lift { target_ticks: 2825.0 });

        let action: Action = toml::from_str(
            r#"
            id = "wrist_back"
            mech = "wrist"
            side = "back"
            "#,
        )
        .unwrap();
        assert_eq!(
            action.cmd,
            MechCmd::Wrist {
                side: WristSide::Back
            }
        );
    }
}
