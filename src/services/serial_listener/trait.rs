use crate::config::Config;
use crate::error::Result;
use crate::services::PressEngine;
use std::sync::Arc;

/// Trait for serial listeners that can run in different modes
#[async_trait::async_trait]
pub trait SerialListenerTrait {
    /// Run the listener until the transport fails
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Factory function to create an appropriate serial listener based on the dry_run flag
pub fn create_serial_listener(
    config: Arc<Config>,
    engine: Arc<PressEngine>,
    dry_run: bool,
) -> Result<Box<dyn SerialListenerTrait + Send>> {
    if dry_run {
        Ok(Box::new(super::dry_serial_listener::DryRunSerialListener::new(
            config, engine,
        )?))
    } else {
        Ok(Box::new(super::serial_listener::RealSerialListener::new(
            config, engine,
        )?))
    }
}
