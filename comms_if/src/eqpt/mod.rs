//! # Equipment Interface
//!
//! This module defines the interface structures which are sent by sensors and to actuators.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod drive;
pub mod marker;
pub mod odom;
