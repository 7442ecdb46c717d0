//! # Bot Executable Parameters
//!
//! This module provide parameters for the bot executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use util::logger::ModuleLevel;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct BotExecParams {
    /// Target period of one control cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Number of consecutive overruns after which the executable gives up.
    pub max_consec_overruns: u64,

    /// Per module log level overrides
    #[serde(default)]
    pub module_levels: Vec<ModuleLevel>,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shipped_params() {
        let params: BotExecParams =
            util::params::load_str(include_str!("../../params/bot_exec.toml")).unwrap();

        assert!((params.cycle_period_s - 0.02).abs() < 1e-12);
        assert_eq!(params.module_levels.len(), 1);
        assert!(util::logger::parse_level(&params.module_levels[0].level).is_ok());
    }
}
