//! # Navigation Executable Parameters
//!
//! All parameters of the navigation executable, loaded from `nav_exec.toml`. Every section is
//! optional and falls back on the reference rig's values.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::{calib, fuser, nav_ctrl, norm, polar_ctrl};
#[cfg(feature = "sim")]
use crate::sim_client::SimParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct NavExecParams {
    pub calib: calib::Params,
    pub norm: norm::Params,
    pub fuser: fuser::Params,
    pub polar_ctrl: polar_ctrl::Params,
    pub nav_ctrl: nav_ctrl::Params,

    #[cfg(feature = "sim")]
    pub sim: SimParams,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_params() {
        let params: NavExecParams = util::params::from_str(
            r#"
            [polar_ctrl]
            k_rho = 0.3
            k_alpha = 0.8

            [nav_ctrl]
            cycle_period_s = 0.05
            max_run_duration_s = 60.0

            [nav_ctrl.thresholds]
            linear_tol_m = 0.02

            [norm.marker_axis_remap]
            axes = [0, 1, 2]
            signs = [1.0, 1.0, 1.0]
            "#,
        )
        .unwrap();

        assert_eq!(params.polar_ctrl.k_rho, 0.3);
        assert_eq!(params.polar_ctrl.k_beta, -0.15);
        assert_eq!(params.nav_ctrl.cycle_period_s, 0.05);
        assert_eq!(params.nav_ctrl.max_run_duration_s, Some(60.0));
        assert_eq!(params.nav_ctrl.thresholds.linear_tol_m, 0.02);
        assert_eq!(params.nav_ctrl.thresholds.angular_tol_rad, 0.1);
        assert_eq!(params.norm.marker_axis_remap, norm::AxisRemap::identity());
        assert_eq!(params.calib, calib::Params::default());
    }

    #[test]
    fn test_params_file() {
        let params: NavExecParams = util::params::load_from_path(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../params/nav_exec.toml"
        ))
        .unwrap();

        assert!(params.polar_ctrl.validate().is_ok());
        assert!(params.nav_ctrl.validate().is_ok());
        assert!(norm::MarkerNormaliser::new(&params.norm).is_ok());
    }
}
