pub mod button;
pub mod press;

pub use button::{ButtonId, Edge, Transition};
pub use press::{PressEvent, PressKind};
