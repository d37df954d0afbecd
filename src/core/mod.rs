//! Core module - configuration, errors and events

pub mod config;
pub mod error;
pub mod events;
