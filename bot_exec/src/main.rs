//! Main bot executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Gamepad and actuator sensing
//!         - Teleoperated or autonomous cycle processing:
//!             - Lift, wrist and gripper targets
//!             - Trajectory sequencing (autonomous)
//!             - Drive demands
//!         - Telemetry
//!         - Simulation step
//!
//! The executable runs the engine against the simulated collaborators in `bot_lib::sim`. In
//! teleop the gamepads replay the scripts in `sim.toml`, in auto the given routine is run.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use bot_if::{eqpt::mech::ActId, tm::Telemetry};
use bot_lib::{
    act_ctrl,
    auto::{AutoCtrl, Routine},
    interlock::WristInterlock,
    params::BotExecParams,
    robot_state::{Collaborators, MechIo, RobotState},
    sim::{self, ScriptedGamepad, SimActuator, SimDrive},
    teleop::{Gamepads, TeleopCtrl},
    tm_logger::TmLogger,
    traj_seq::{self, ExecStatus},
};
use util::{
    host,
    logger::{logger_init, parse_level},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line options.
#[derive(Debug, StructOpt)]
#[structopt(name = "bot_exec", about = "Motion and mechanism coordination engine")]
struct Opts {
    /// Stop after this many cycles.
    #[structopt(long)]
    cycles: Option<u64>,

    /// Minimum log level, one of `info`, `debug` or `trace`.
    #[structopt(long, default_value = "debug")]
    log_level: String,

    #[structopt(subcommand)]
    mode: Mode,
}

/// Control mode to run.
#[derive(Debug, StructOpt)]
enum Mode {
    /// Teleoperated control, using the scripted gamepads from the simulation parameters.
    #[structopt(name = "teleop")]
    Teleop,

    /// Run an autonomous routine.
    #[structopt(name = "auto")]
    Auto {
        /// Routine file in `params/routines`.
        #[structopt(long)]
        routine: String,

        /// Park zone, moves the routine's park segments.
        #[structopt(long, default_value = "0")]
        park_zone: f64,
    },
}

/// The simulated collaborators.
struct SimIo {
    drive: SimDrive,
    lift: SimActuator,
    wrist: SimActuator,
    gripper: SimActuator,
    driver: ScriptedGamepad,
    tool: ScriptedGamepad,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("bot_exec", "sessions").wrap_err("Failed to create the session")?;

    let exec_params: BotExecParams =
        util::params::load("bot_exec.toml").wrap_err("Could not load exec params")?;

    // Initialise logger
    logger_init(
        parse_level(&opts.log_level).wrap_err("Invalid log level")?,
        &exec_params.module_levels,
        &session,
    )
    .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Bot Executable\n");
    info!("Running on: {}", host::get_hostname());
    info!("Session directory: {:?}\n", session.session_root);
    info!("Options: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let act_params: act_ctrl::Params =
        util::params::load("act_ctrl.toml").wrap_err("Could not load actuator control params")?;
    let sim_params: sim::Params =
        util::params::load("sim.toml").wrap_err("Could not load simulation params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut interlock = WristInterlock::default();
    interlock
        .init("interlock.toml")
        .wrap_err("Failed to initialise the wrist interlock")?;
    info!("WristInterlock init complete");

    let mut state = RobotState::new(&act_params, interlock);

    let mut io = SimIo {
        drive: SimDrive::from_params(&sim_params),
        lift: SimActuator::new(ActId::Lift, &sim_params.lift),
        wrist: SimActuator::new(ActId::Wrist, &sim_params.wrist),
        gripper: SimActuator::new(ActId::Gripper, &sim_params.gripper),
        driver: ScriptedGamepad::new(sim_params.driver_script.clone()),
        tool: ScriptedGamepad::new(sim_params.tool_script.clone()),
    };

    let mut tm = TmLogger::create(&session).wrap_err("Failed to initialise the TmLogger")?;

    // Ctrl-C cancels the routine in auto and stops teleop
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = interrupted.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .wrap_err("Failed to set the interrupt handler")?;
    }

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    match opts.mode {
        Mode::Teleop => {
            let mut teleop =
                TeleopCtrl::init("teleop.toml").wrap_err("Failed to initialise TeleopCtrl")?;
            info!("TeleopCtrl init complete");

            run_cycles(&exec_params, opts.cycles, &mut io, |io, dt_s| {
                let report = {
                    let mut collab = Collaborators {
                        drive: &mut io.drive,
                        mechs: MechIo {
                            lift: &mut io.lift,
                            wrist: &mut io.wrist,
                            gripper: &mut io.gripper,
                        },
                        telemetry: &mut tm,
                    };
                    let mut pads = Gamepads {
                        driver: &mut io.driver,
                        tool: &mut io.tool,
                    };
                    teleop.cycle(&mut state, &mut collab, &mut pads, dt_s)
                };

                for f in report.faults.iter() {
                    warn!("Cycle {}: {}", state.num_cycles, f);
                }

                if interrupted.load(Ordering::SeqCst) {
                    info!("Interrupted, stopping");
                    return false;
                }
                if io.driver.is_finished() && io.tool.is_finished() {
                    info!("End of gamepad scripts reached, stopping");
                    return false;
                }
                true
            })?;
        }
        Mode::Auto { routine, park_zone } => {
            let traj_params: traj_seq::Params =
                util::params::load("traj_seq.toml").wrap_err("Could not load sequencer params")?;
            let routine = Routine::load(&routine).wrap_err("Failed to load the routine")?;

            let mut auto = AutoCtrl::init(&routine, park_zone, traj_params)
                .wrap_err("Failed to initialise AutoCtrl")?;
            info!("AutoCtrl init complete");

            {
                let mut collab = Collaborators {
                    drive: &mut io.drive,
                    mechs: MechIo {
                        lift: &mut io.lift,
                        wrist: &mut io.wrist,
                        gripper: &mut io.gripper,
                    },
                    telemetry: &mut tm,
                };
                auto.start(&mut state, &mut collab)
                    .wrap_err("Failed to start the routine")?;
            }

            run_cycles(&exec_params, opts.cycles, &mut io, |io, dt_s| {
                let cancel = interrupted.load(Ordering::SeqCst);
                let report = {
                    let mut collab = Collaborators {
                        drive: &mut io.drive,
                        mechs: MechIo {
                            lift: &mut io.lift,
                            wrist: &mut io.wrist,
                            gripper: &mut io.gripper,
                        },
                        telemetry: &mut tm,
                    };
                    auto.cycle(&mut state, &mut collab, dt_s, cancel)
                };

                for f in report.faults.iter() {
                    warn!("Cycle {}: {}", state.num_cycles, f);
                }

                match report.status {
                    ExecStatus::Done | ExecStatus::Cancelled | ExecStatus::Off => {
                        info!("Routine finished with status {:?}", report.status);
                        false
                    }
                    ExecStatus::TimedOut => {
                        warn!("Routine stopped short of its final pose");
                        false
                    }
                    _ => true,
                }
            })?;
        }
    }

    // ---- SHUTDOWN ----

    tm.flush();
    info!("{} telemetry frames written", tm.num_frames());
    info!("End of execution");

    Ok(())
}

/// Run cycles at the executable's cycle period until `cycle` returns false or the cycle limit is
/// reached.
///
/// The measured time since the start of the previous cycle is passed to `cycle`, and the
/// simulation is stepped by the same time afterwards.
fn run_cycles<F>(
    params: &BotExecParams,
    max_cycles: Option<u64>,
    io: &mut SimIo,
    mut cycle: F,
) -> Result<(), Report>
where
    F: FnMut(&mut SimIo, f64) -> bool,
{
    let period = Duration::from_secs_f64(params.cycle_period_s);
    let mut num_cycles = 0u64;
    let mut num_consec_overruns = 0u64;
    let mut last_start: Option<Instant> = None;

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();
        let dt_s = match last_start {
            Some(t) => (cycle_start_instant - t).as_secs_f64(),
            None => params.cycle_period_s,
        };
        last_start = Some(cycle_start_instant);

        let keep_going = cycle(io, dt_s);

        // ---- SIMULATION ----

        io.drive.step(dt_s);
        io.lift.step(dt_s);
        io.wrist.step(dt_s);
        io.gripper.step(dt_s);
        io.driver.advance(dt_s);
        io.tool.advance(dt_s);

        num_cycles += 1;

        if !keep_going {
            break;
        }
        if let Some(max) = max_cycles {
            if num_cycles >= max {
                info!("Cycle limit of {} reached, stopping", max);
                break;
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match period.checked_sub(cycle_dur) {
            Some(d) => {
                num_consec_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - period.as_secs_f64()
                );
                num_consec_overruns += 1;

                if num_consec_overruns > params.max_consec_overruns {
                    return Err(color_eyre::eyre::eyre!(
                        "More than {} consecutive cycle overruns",
                        params.max_consec_overruns
                    ));
                }
            }
        }
    }

    info!("{} cycles executed", num_cycles);

    Ok(())
}
