//! GIF89a serialization: variable-width LZW compression of palette-index
//! streams and the surrounding container blocks.

pub mod lzw;
pub mod writer;

pub use writer::Gif89aWriter;
