//! # Control loop driver
//!
//! Runs `NavCtrl` at a fixed rate against the shared sensor state. Each cycle:
//!
//! 1. Checks for cancellation
//! 2. Takes a snapshot of the new sensor data
//! 3. Runs the pipeline and publishes the demand, if any
//! 4. Stops with a zero demand if the goal was reached
//! 5. Marks the snapshot's samples consumed
//!
//! Samples are used at most once. A displacement or heading which arrives without its partner is
//! consumed by the cycle that sees it, so dead reckoning only runs when both arrive in the same
//! cycle. A cycle which sees no new data at all leaves the sensor state untouched.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use log::{info, trace, warn};
use serde::Serialize;

use super::{NavCtrl, NavCtrlError, Params};
use crate::{
    convergence::GoalError, fuser::FuserMode, polar_ctrl::PolarState, sensor_state::SensorState,
};
use comms_if::eqpt::drive::VelocityCmd;
use util::module::State;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Destination of the velocity demands, e.g. the locomotion system.
pub trait VelocitySink {
    fn publish(&mut self, cmd: VelocityCmd);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Cooperative cancellation flag, checked by the driver at the start of each cycle.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

/// Runs the control loop.
pub struct Driver<S> {
    nav_ctrl: NavCtrl,
    sensors: Arc<SensorState>,
    sink: S,
    cancel: CancelToken,

    cycle_period: Duration,
    max_run_duration: Option<Duration>,

    report: RunReport,
    num_consec_cycle_overruns: u64,
}

/// Summary of a run, archived at the end of the session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Number of cycles executed, excluding the one which observed a cancellation
    pub num_cycles: u64,

    /// Cycles which produced no demand
    pub num_skipped_cycles: u64,

    pub num_marker_cycles: u64,
    pub num_dead_reckoning_cycles: u64,

    /// Cycles skipped because the selected source gave a degenerate transform
    pub num_degenerate_cycles: u64,

    /// Number of demands published, including the final stop demand
    pub num_cmds_published: u64,

    pub num_cycle_overruns: u64,
    pub max_consec_cycle_overruns: u64,

    /// Polar state and goal error on the last cycle which produced a demand
    pub final_polar_state: Option<PolarState>,
    pub final_goal_error: Option<GoalError>,

    pub exit_reason: Option<ExitReason>,

    /// Units: seconds
    pub run_duration_s: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Outcome of a single cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleResult {
    /// Cancellation was requested before the cycle started, nothing was processed.
    Cancelled,

    /// No demand was produced.
    Skipped,

    /// The demand was published.
    Commanded(VelocityCmd),

    /// The demand was published followed by a stop demand.
    GoalReached(VelocityCmd),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitReason {
    GoalReached,
    Cancelled,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: VelocitySink> Driver<S> {
    /// Create a new driver for an initialised `NavCtrl`.
    pub fn new(
        nav_ctrl: NavCtrl,
        sensors: Arc<SensorState>,
        sink: S,
        cancel: CancelToken,
        params: &Params,
    ) -> Result<Self, NavCtrlError> {
        params.validate()?;

        Ok(Self {
            nav_ctrl,
            sensors,
            sink,
            cancel,
            cycle_period: params.cycle_period()?,
            max_run_duration: params.max_run_duration()?,
            report: RunReport::default(),
            num_consec_cycle_overruns: 0,
        })
    }

    /// Execute a single cycle without any timing.
    pub fn cycle(&mut self) -> Result<CycleResult, NavCtrlError> {
        if self.cancel.is_cancelled() {
            return Ok(CycleResult::Cancelled);
        }

        let snapshot = self.sensors.snapshot();
        let (output, status) = self.nav_ctrl.proc(&snapshot)?;

        self.report.num_cycles += 1;

        match status.source {
            FuserMode::NoData => {
                if !snapshot.is_empty() {
                    self.sensors.consume(&snapshot);
                }
                self.report.num_skipped_cycles += 1;
                trace!("Cycle {} skipped, no data", self.report.num_cycles);
                return Ok(CycleResult::Skipped);
            }
            FuserMode::MarkerTracking => self.report.num_marker_cycles += 1,
            FuserMode::DeadReckoning => self.report.num_dead_reckoning_cycles += 1,
        }

        let result = match output.cmd {
            Some(cmd) => {
                self.publish(cmd);
                self.report.final_polar_state = status.polar_state;
                self.report.final_goal_error = status.goal_error;

                if output.goal_reached {
                    self.publish(VelocityCmd::stop());
                    CycleResult::GoalReached(cmd)
                } else {
                    CycleResult::Commanded(cmd)
                }
            }
            None => {
                self.report.num_skipped_cycles += 1;
                if status.degenerate {
                    self.report.num_degenerate_cycles += 1;
                }
                CycleResult::Skipped
            }
        };

        // The selected source's samples are used up, even if they turned out to be degenerate
        self.sensors.consume(&snapshot);

        Ok(result)
    }

    /// Run the loop until the goal is reached or the run is cancelled.
    ///
    /// A zero demand is always the last demand published, whichever way the loop exits.
    pub fn run(&mut self) -> Result<RunReport, NavCtrlError> {
        info!(
            "Starting control loop at {:.1} Hz",
            1.0 / self.cycle_period.as_secs_f64()
        );

        let run_start = Instant::now();

        let exit_reason = loop {
            let cycle_start_instant = Instant::now();

            if let Some(max) = self.max_run_duration {
                if !self.cancel.is_cancelled() && run_start.elapsed() >= max {
                    warn!(
                        "Maximum run duration of {:.1} s exceeded, cancelling",
                        max.as_secs_f64()
                    );
                    self.cancel.cancel();
                }
            }

            let result = match self.cycle() {
                Ok(r) => r,
                Err(e) => {
                    self.publish(VelocityCmd::stop());
                    return Err(e);
                }
            };

            match result {
                CycleResult::Cancelled => {
                    info!("Run cancelled, stopping");
                    self.publish(VelocityCmd::stop());
                    break ExitReason::Cancelled;
                }
                CycleResult::GoalReached(_) => {
                    info!("Goal reached");
                    break ExitReason::GoalReached;
                }
                _ => (),
            }

            // ---- CYCLE MANAGEMENT ----

            let cycle_dur = Instant::now() - cycle_start_instant;

            match self.cycle_period.checked_sub(cycle_dur) {
                Some(d) => {
                    self.num_consec_cycle_overruns = 0;
                    thread::sleep(d);
                }
                None => {
                    warn!(
                        "Cycle overran by {:.06} s",
                        cycle_dur.as_secs_f64() - self.cycle_period.as_secs_f64()
                    );
                    self.num_consec_cycle_overruns += 1;
                    self.report.num_cycle_overruns += 1;
                    self.report.max_consec_cycle_overruns = self
                        .report
                        .max_consec_cycle_overruns
                        .max(self.num_consec_cycle_overruns);
                }
            }
        };

        self.report.exit_reason = Some(exit_reason);
        self.report.run_duration_s = run_start.elapsed().as_secs_f64();

        if let Some(e) = self.report.final_goal_error {
            info!(
                "Final error: x = {:.4} m, y = {:.4} m, heading = {:.4} rad",
                e.x_m, e.y_m, e.heading_rad
            );
        }

        Ok(self.report.clone())
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    fn publish(&mut self, cmd: VelocityCmd) {
        self.sink.publish(cmd);
        self.report.num_cmds_published += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        nav_ctrl::InitData,
        norm,
        sensor_state::{NewDataFlags, SensorMsg},
    };
    use comms_if::{
        eqpt::{
            marker::MarkerDetections,
            odom::{Displacement, Heading},
        },
        tc::goal::GoalCmd,
    };

    #[derive(Default)]
    struct Recorder(Vec<VelocityCmd>);

    impl VelocitySink for Recorder {
        fn publish(&mut self, cmd: VelocityCmd) {
            self.0.push(cmd);
        }
    }

    fn driver(goal: GoalCmd) -> (Driver<Recorder>, Arc<SensorState>) {
        let mut nc = NavCtrl::default();
        nc.init(
            InitData {
                goal,
                ..Default::default()
            },
            None,
        )
        .unwrap();

        let sensors = Arc::new(SensorState::new(&norm::Params::default()).unwrap());
        let d = Driver::new(
            nc,
            sensors.clone(),
            Recorder::default(),
            CancelToken::new(),
            &Params::default(),
        )
        .unwrap();

        (d, sensors)
    }

    #[test]
    fn test_skip_cycle_integrity() {
        let (mut d, sensors) = driver(GoalCmd::new(1.0, 0.0, 0.0));

        // Nothing arrived
        assert_eq!(d.cycle().unwrap(), CycleResult::Skipped);
        assert!(d.sink().0.is_empty());
        assert_eq!(sensors.new_data_flags(), NewDataFlags::default());

        // Only half of the dead reckoning pair, which is used up by the skipped cycle
        sensors.push_displacement(&Displacement::new([0.0; 3])).unwrap();
        assert_eq!(d.cycle().unwrap(), CycleResult::Skipped);
        assert!(d.sink().0.is_empty());
        assert_eq!(sensors.new_data_flags(), NewDataFlags::default());

        // The other half arriving on a later cycle does not pair with the stale displacement
        sensors.push_heading(&Heading::from_yaw(0.0)).unwrap();
        assert_eq!(d.cycle().unwrap(), CycleResult::Skipped);
        assert!(d.sink().0.is_empty());
        assert!(!sensors.new_data_flags().heading);

        // Both arriving in the same cycle produces a demand
        sensors.push_displacement(&Displacement::new([0.0; 3])).unwrap();
        sensors.push_heading(&Heading::from_yaw(0.0)).unwrap();
        assert!(matches!(d.cycle().unwrap(), CycleResult::Commanded(_)));
        assert_eq!(d.sink().0.len(), 1);
        assert_eq!(d.report().num_skipped_cycles, 3);
    }

    #[test]
    fn test_alternating_dead_reckoning_never_commands() {
        let (mut d, sensors) = driver(GoalCmd::new(1.0, 0.0, 0.0));

        for i in 0..20 {
            sensors.push(SensorMsg::Marker(MarkerDetections::none())).unwrap();
            let msg = match i % 2 {
                0 => SensorMsg::Displacement(Displacement::new([0.0; 3])),
                _ => SensorMsg::Heading(Heading::from_yaw(0.0)),
            };
            sensors.push(msg).unwrap();

            assert_eq!(d.cycle().unwrap(), CycleResult::Skipped);
        }

        assert!(d.sink().0.is_empty());
        assert_eq!(d.report().num_skipped_cycles, 20);
    }

    #[test]
    fn test_goal_reached_publishes_stop() {
        let (mut d, sensors) = driver(GoalCmd::new(0.01, 0.0, 0.0));
        sensors.push_displacement(&Displacement::new([0.0; 3])).unwrap();
        sensors.push_heading(&Heading::from_yaw(0.0)).unwrap();

        let report = d.run().unwrap();
        assert_eq!(report.exit_reason, Some(ExitReason::GoalReached));
        assert_eq!(report.num_cmds_published, 2);

        let cmds = &d.sink().0;
        assert_eq!(cmds.len(), 2);
        assert!(!cmds[0].is_stop());
        assert!(cmds[1].is_stop());
    }

    #[test]
    fn test_cancel_publishes_stop() {
        let (mut d, sensors) = driver(GoalCmd::new(1.0, 0.0, 0.0));
        sensors.push(SensorMsg::Marker(MarkerDetections::none())).unwrap();

        d.cancel_token().cancel();
        let report = d.run().unwrap();

        assert_eq!(report.exit_reason, Some(ExitReason::Cancelled));
        assert_eq!(report.num_cycles, 0);
        assert_eq!(d.sink().0, vec![VelocityCmd::stop()]);
    }

    #[test]
    fn test_max_run_duration() {
        let (d, _) = driver(GoalCmd::new(1.0, 0.0, 0.0));
        let mut d = Driver {
            max_run_duration: Some(Duration::from_millis(250)),
            ..d
        };

        // No data ever arrives so only the watchdog can end the run
        let report = d.run().unwrap();
        assert_eq!(report.exit_reason, Some(ExitReason::Cancelled));
        assert!(report.num_cycles >= 2);
        assert_eq!(report.num_skipped_cycles, report.num_cycles);
        assert_eq!(d.sink().0, vec![VelocityCmd::stop()]);
    }

    #[test]
    fn test_invalid_params() {
        let new = |params: Params| {
            Driver::new(
                NavCtrl::default(),
                Arc::new(SensorState::new(&norm::Params::default()).unwrap()),
                Recorder::default(),
                CancelToken::new(),
                &params,
            )
        };

        let res = new(Params {
            cycle_period_s: 0.0,
            ..Params::default()
        });
        assert!(matches!(res, Err(NavCtrlError::InvalidCyclePeriod(_))));

        // Finite but too long to be held in a Duration
        let res = new(Params {
            cycle_period_s: 1e30,
            ..Params::default()
        });
        assert!(matches!(res, Err(NavCtrlError::InvalidCyclePeriod(_))));

        let res = new(Params {
            max_run_duration_s: Some(1e30),
            ..Params::default()
        });
        assert!(matches!(res, Err(NavCtrlError::InvalidMaxRunDuration(_))));
    }
}
