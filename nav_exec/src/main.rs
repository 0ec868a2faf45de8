//! Main navigation executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Load parameters and the goal
//!     - Initialise the shared sensor state and NavCtrl
//!     - Start the sensor sources
//!     - Main loop, run by the `Driver`:
//!         - Snapshot the sensor state
//!         - Pose fusion
//!         - Polar control
//!         - Convergence check
//!     - Archive the run report
//!
//! # Usage
//!
//! ```text
//! nav_exec <x_m> <y_m> <heading_deg>
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::info;
use std::{path::PathBuf, sync::Arc};
use structopt::StructOpt;

// Internal
use comms_if::tc::goal::GoalCmd;
use nav_lib::{
    nav_ctrl::{CancelToken, Driver, InitData, NavCtrl},
    params::NavExecParams,
    sensor_state::SensorState,
    sim_client::SimClient,
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive the robot to a goal pose.
#[derive(Debug, StructOpt)]
#[structopt(name = "nav_exec")]
struct Opt {
    #[structopt(flatten)]
    goal: GoalCmd,

    /// Parameter file to use instead of `$NAV_SW_ROOT/params/nav_exec.toml`.
    #[structopt(long, parse(from_os_str))]
    params: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("nav_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Navigation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    if !opt.goal.is_valid() {
        return Err(eyre!("The goal must be finite, found {:?}", opt.goal));
    }

    info!(
        "Goal: x = {} m, y = {} m, heading = {} deg",
        opt.goal.x_m, opt.goal.y_m, opt.goal.heading_deg
    );

    // ---- LOAD PARAMETERS ----

    let params: NavExecParams = match opt.params {
        Some(ref p) => util::params::load_from_path(p),
        None => util::params::load("nav_exec.toml"),
    }
    .wrap_err("Could not load nav_exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let sensors =
        Arc::new(SensorState::new(&params.norm).wrap_err("Failed to initialise the sensor state")?);

    let mut nav_ctrl = NavCtrl::default();
    nav_ctrl
        .init(
            InitData {
                calib: params.calib.clone(),
                fuser: params.fuser.clone(),
                polar_ctrl: params.polar_ctrl,
                thresholds: params.nav_ctrl.thresholds,
                goal: opt.goal,
            },
            Some(&session),
        )
        .wrap_err("Failed to initialise NavCtrl")?;
    info!("NavCtrl init complete");

    let (mut sim_client, sink) =
        SimClient::start(&params.sim, sensors.clone()).wrap_err("Failed to start the SimClient")?;
    info!("SimClient initialised");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    let mut driver = Driver::new(nav_ctrl, sensors, sink, CancelToken::new(), &params.nav_ctrl)
        .wrap_err("Failed to initialise the driver")?;

    let report = driver.run().wrap_err("Error in the control loop")?;

    // ---- SHUTDOWN ----

    sim_client.stop();
    info!("Simulated robot finished at {:?}", sim_client.true_pose());
    info!(
        "Run ended after {} cycles ({} skipped): {:?}",
        report.num_cycles, report.num_skipped_cycles, report.exit_reason
    );

    session.save("run_report.json", report);
    session.exit();

    info!("End of execution");

    Ok(())
}
