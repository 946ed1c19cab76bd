pub mod app;
pub mod audio;
pub mod catalog;
pub mod core;
pub mod model;
pub mod sequencer;
pub mod ui;
