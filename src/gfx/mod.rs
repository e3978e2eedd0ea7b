//! Monochrome framebuffer, 8x8 tiles and the 5x8 font

pub mod font;
pub mod framebuffer;
pub mod tile;

pub use framebuffer::FrameBuffer;
pub use tile::Tile;
