//! padmapper: gamepad to keyboard/mouse translation for applications
//! without native controller support

pub mod config;
pub mod controller;
pub mod mapping;
pub mod persistence;
