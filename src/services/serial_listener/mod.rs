mod dry_serial_listener;
mod line_decoder;
mod serial_listener;
mod r#trait;

pub use self::line_decoder::LineDecoder;
pub use self::r#trait::{create_serial_listener, SerialListenerTrait};
