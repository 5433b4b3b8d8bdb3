pub mod commands;
pub mod types;

pub use commands::{RenderCommand, TextAlign};
pub use types::{Color, ColorParseError, Point, Rect, Viewport};
