//! Simulated drive base

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Rotation2, Vector2};

// Internal
use bot_if::{
    eqpt::drive::{Drive, DriveCmd, DriveError, SegmentProgress},
    nav::{Pose, SegmentGeom},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A drive base which tracks segments perfectly at a constant speed.
#[derive(Debug, Clone)]
pub struct SimDrive {
    pose: Pose,
    speed: f64,
    turn_rate_rads: f64,

    /// The segment being followed
    active: Option<ActiveSegment>,

    /// The last teleoperated command
    last_cmd: Option<DriveCmd>,

    /// Number of teleoperated commands received
    num_commands: usize,
}

#[derive(Debug, Clone)]
struct ActiveSegment {
    geom: SegmentGeom,
    elapsed_s: f64,
    displacement: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimDrive {
    /// Create a drive which follows segments at the given speed.
    pub fn new(speed: f64) -> Self {
        Self::with_turn_rate(speed, std::f64::consts::PI)
    }

    pub fn with_turn_rate(speed: f64, turn_rate_rads: f64) -> Self {
        Self {
            pose: Pose::default(),
            speed,
            turn_rate_rads,
            active: None,
            last_cmd: None,
            num_commands: 0,
        }
    }

    pub fn from_params(params: &super::Params) -> Self {
        Self::with_turn_rate(params.drive_speed, params.drive_turn_rate_rads)
    }

    /// The last teleoperated command.
    pub fn last_cmd(&self) -> Option<DriveCmd> {
        self.last_cmd
    }

    /// Number of teleoperated commands received.
    pub fn num_commands(&self) -> usize {
        self.num_commands
    }

    /// Integrate the last teleoperated command over `dt_s`.
    ///
    /// Segment following is advanced by `progress` instead.
    pub fn step(&mut self, dt_s: f64) {
        let cmd = match self.last_cmd {
            Some(c) => c,
            None => return,
        };

        let mut demand = Vector2::new(cmd.forward, cmd.strafe);
        let mut turn = cmd.turn;

        // Normalise so no component exceeds the power cap
        let largest = demand.x.abs() + demand.y.abs() + turn.abs();
        if largest > 1.0 {
            demand /= largest;
            turn /= largest;
        }
        demand *= cmd.max_power;
        turn *= cmd.max_power;

        // Field centric demands are already in the field frame
        let heading = self.pose.heading_rad();
        let field = match cmd.field_heading_rad {
            Some(_) => demand,
            None => Rotation2::new(heading) * demand,
        };

        let position = self.pose.position() + field * self.speed * dt_s;
        self.pose = Pose::from_position(position, heading + turn * self.turn_rate_rads * dt_s);
    }
}

impl Drive for SimDrive {
    fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    fn get_pose(&self) -> Pose {
        self.pose
    }

    fn follow_path(&mut self, segment: &SegmentGeom) -> Result<(), DriveError> {
        self.active = Some(ActiveSegment {
            geom: segment.clone(),
            elapsed_s: 0.0,
            displacement: 0.0,
        });
        Ok(())
    }

    fn progress(&mut self, dt_s: f64) -> Result<SegmentProgress, DriveError> {
        let active = match self.active {
            Some(ref mut a) => a,
            None => return Err(DriveError::NoActiveSegment),
        };

        active.elapsed_s += dt_s;
        active.displacement = (active.displacement + self.speed * dt_s).min(active.geom.length());

        let finished = active.displacement >= active.geom.length();
        self.pose = active.geom.pose_at(active.displacement);

        Ok(SegmentProgress {
            elapsed_s: active.elapsed_s,
            displacement: active.displacement,
            finished,
        })
    }

    fn drive(&mut self, cmd: &DriveCmd) -> Result<(), DriveError> {
        self.last_cmd = Some(*cmd);
        self.num_commands += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
