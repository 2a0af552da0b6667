pub mod app;
pub mod config;
pub mod display;
pub mod host;
pub mod playback;
pub mod theme;
