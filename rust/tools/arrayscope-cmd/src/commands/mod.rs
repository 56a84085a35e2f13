//! Command implementations for arrayscope-cmd

pub mod grow;
pub mod inspect;
