//! # Simulation Client
//!
//! The SimClient stands in for the robot's sensors and locomotion system so the control loop can
//! be run without hardware. A background thread integrates the latest velocity demand with
//! unicycle kinematics and, on every step, publishes:
//!
//! - the robot's position as a displacement sample,
//! - its heading plus a fixed IMU mounting offset (removed by the heading bias latch),
//! - an empty marker detection list, as no marker is simulated.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, warn};
use serde::Deserialize;

use crate::{
    nav_ctrl::VelocitySink,
    sensor_state::{SensorMsg, SensorState},
};
use comms_if::eqpt::{
    drive::VelocityCmd,
    marker::MarkerDetections,
    odom::{Displacement, Heading},
};
use util::transform::Pose2D;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the simulation.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimParams {
    /// Integration step, samples are published once per step.
    ///
    /// Units: seconds
    pub step_period_s: f64,

    /// Start position of the robot.
    ///
    /// Units: meters,
    /// Frame: Inertial
    pub start_pos_m_inr: [f64; 2],

    /// Start heading of the robot.
    ///
    /// Units: radians,
    /// Frame: Inertial
    pub start_heading_rad: f64,

    /// Offset added to every heading sample.
    ///
    /// Units: radians
    pub imu_offset_rad: f64,
}

/// Planar unicycle kinematics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unicycle {
    pose: Pose2D,
}

pub struct SimClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
    pose: Arc<Mutex<Pose2D>>,
}

/// Velocity sink which feeds the demands into the simulation.
#[derive(Debug, Clone)]
pub struct SimSink {
    cmd: Arc<Mutex<VelocityCmd>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimClientError {
    #[error("Invalid simulation parameters: {0:?}")]
    InvalidParams(SimParams),

    #[error("Could not start the simulation thread: {0}")]
    ThreadSpawnError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            step_period_s: 0.02,
            start_pos_m_inr: [0.0, 0.0],
            start_heading_rad: 0.0,
            imu_offset_rad: 0.3,
        }
    }
}

impl SimParams {
    /// The step period as a `Duration`, or `None` if the parameters are invalid.
    fn step_period(&self) -> Option<Duration> {
        let finite = self.start_pos_m_inr.iter().all(|v| v.is_finite())
            && self.start_heading_rad.is_finite()
            && self.imu_offset_rad.is_finite();

        if !finite || self.step_period_s <= 0.0 {
            return None;
        }

        Duration::try_from_secs_f64(self.step_period_s).ok()
    }
}

impl Unicycle {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            pose: Pose2D::new(x_m, y_m, heading_rad),
        }
    }

    /// Advance the robot by `dt` seconds under the given demand.
    pub fn step(&mut self, cmd: &VelocityCmd, dt: f64) {
        let theta = self.pose.theta;

        self.pose = Pose2D::new(
            self.pose.x + cmd.linear_ms * theta.cos() * dt,
            self.pose.y + cmd.linear_ms * theta.sin() * dt,
            theta + cmd.angular_rads * dt,
        );
    }

    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    pub fn displacement(&self) -> Displacement {
        Displacement::new([self.pose.x, self.pose.y, 0.0])
    }

    pub fn heading(&self, offset_rad: f64) -> Heading {
        Heading::from_yaw(self.pose.theta + offset_rad)
    }
}

impl SimClient {
    /// Start the simulation, publishing into `sensors`.
    ///
    /// Returns the client and the sink through which demands reach the simulated robot.
    pub fn start(
        params: &SimParams,
        sensors: Arc<SensorState>,
    ) -> Result<(Self, SimSink), SimClientError> {
        let step = params
            .step_period()
            .ok_or_else(|| SimClientError::InvalidParams(params.clone()))?;

        let robot = Unicycle::new(
            params.start_pos_m_inr[0],
            params.start_pos_m_inr[1],
            params.start_heading_rad,
        );

        let bg_run = Arc::new(AtomicBool::new(true));
        let cmd = Arc::new(Mutex::new(VelocityCmd::stop()));
        let pose = Arc::new(Mutex::new(robot.pose()));

        let bg_run_clone = bg_run.clone();
        let cmd_clone = cmd.clone();
        let pose_clone = pose.clone();
        let params = params.clone();

        let bg_jh = thread::Builder::new()
            .name("sim_client".into())
            .spawn(move || {
                bg_thread(params, step, robot, sensors, bg_run_clone, cmd_clone, pose_clone)
            })
            .map_err(SimClientError::ThreadSpawnError)?;

        Ok((
            Self {
                bg_jh: Some(bg_jh),
                bg_run,
                pose,
            },
            SimSink { cmd },
        ))
    }

    /// Ground truth pose of the simulated robot.
    pub fn true_pose(&self) -> Pose2D {
        *self.pose.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stop the background thread and wait for it to exit.
    pub fn stop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                warn!("SimClient background thread panicked");
            }
        }
    }
}

impl Drop for SimClient {
    fn drop(&mut self) {
        self.stop();
    }
}

impl VelocitySink for SimSink {
    fn publish(&mut self, cmd: VelocityCmd) {
        *self.cmd.lock().unwrap_or_else(|e| e.into_inner()) = cmd;
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn bg_thread(
    params: SimParams,
    step: Duration,
    mut robot: Unicycle,
    sensors: Arc<SensorState>,
    bg_run: Arc<AtomicBool>,
    cmd: Arc<Mutex<VelocityCmd>>,
    pose: Arc<Mutex<Pose2D>>,
) {
    while bg_run.load(Ordering::Relaxed) {
        // Invalid samples are logged and dropped by the sensor state
        sensors.push(SensorMsg::Displacement(robot.displacement())).ok();
        sensors
            .push(SensorMsg::Heading(robot.heading(params.imu_offset_rad)))
            .ok();
        sensors.push(SensorMsg::Marker(MarkerDetections::none())).ok();

        thread::sleep(step);

        let demand = *cmd.lock().unwrap_or_else(|e| e.into_inner());
        robot.step(&demand, params.step_period_s);
        *pose.lock().unwrap_or_else(|e| e.into_inner()) = robot.pose();

        debug!("Sim pose: {:?}", robot.pose());
    }
}
