//! # Telecommand module

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod goal;
