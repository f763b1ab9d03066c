//! # Task Tracker Worker Library
//!
//! Background maintenance for the session store.
//!
//! ## Modules
//!
//! - `config`: Worker configuration
//! - `schedule`: Daily wall-clock schedule
//! - `purge`: Scheduled purge of expired refresh tokens

pub mod config;
pub mod purge;
pub mod schedule;
