pub mod action_dispatcher;
pub mod press_classifier;
pub mod press_engine;
pub mod serial_listener;

pub use action_dispatcher::{press_channel, ActionDispatcher};
pub use press_engine::PressEngine;
pub use serial_listener::create_serial_listener;
