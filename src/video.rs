//! Minimal packed-pixel drawing surface for the scope grid.

pub mod bitmaps;
pub mod font;
pub mod framebuffer;
pub mod palette;

pub use framebuffer::{Framebuffer, FrameworkStyle, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use palette::{PaletteColor, Rgb};
