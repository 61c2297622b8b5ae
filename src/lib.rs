//! Set Audio Device - pick default playback/recording endpoints by name

pub mod app;
pub mod command;
pub mod core;
pub mod device;
