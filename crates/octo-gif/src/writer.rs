use common_types::{EncodeError, Palette};
use tracing::debug;

use crate::lzw;

/// Bits per palette index with the 256-entry global color table.
const COLOR_DEPTH: u8 = 8;

/// Logical Screen Descriptor packed field: global color table present,
/// color resolution 7, 256-entry table.
const LSD_PACKED: u8 = 0xF7;

/// Serializes the shared palette and per-frame index streams into a
/// GIF89a byte stream. Blocks are emitted strictly in container order:
/// signature, screen descriptor, global color table, loop extension, then
/// per frame a graphic control extension, image descriptor, and LZW data.
pub struct Gif89aWriter {
    out: Vec<u8>,
    width: u16,
    height: u16,
}

impl Gif89aWriter {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            out: Vec::new(),
            width,
            height,
        }
    }

    /// Signature, logical screen descriptor, 768-byte global color table,
    /// and the NETSCAPE2.0 loop extension.
    pub fn write_preamble(&mut self, palette: &Palette, loop_count: u16, background: Option<[u8; 3]>) {
        self.out.extend_from_slice(b"GIF89a");

        self.write_u16(self.width);
        self.write_u16(self.height);
        self.out.push(LSD_PACKED);
        let background_index = background.map_or(0, |[r, g, b]| palette.nearest(r, g, b));
        self.out.push(background_index);
        self.out.push(0); // pixel aspect ratio

        self.out.extend_from_slice(&palette.color_table());

        self.write_netscape_loop(loop_count);

        debug!(
            width = self.width,
            height = self.height,
            colors = palette.len(),
            loop_count,
            "preamble written"
        );
    }

    fn write_netscape_loop(&mut self, loop_count: u16) {
        self.out.push(0x21); // extension introducer
        self.out.push(0xFF); // application extension
        self.out.push(11);
        self.out.extend_from_slice(b"NETSCAPE2.0");
        self.out.push(3); // sub-block size
        self.out.push(1); // loop sub-block id
        self.write_u16(loop_count);
        self.out.push(0);
    }

    /// Graphic control extension, image descriptor, and compressed index
    /// data for one frame. Every index must resolve inside the palette.
    pub fn write_frame(
        &mut self,
        frame_index: usize,
        indices: &[u8],
        delay_cs: u16,
        disposal_bits: u8,
        palette: &Palette,
    ) -> Result<(), EncodeError> {
        if let Some(&bad) = indices.iter().find(|&&i| usize::from(i) >= palette.len()) {
            return Err(EncodeError::IndexOutOfRange {
                frame_index,
                index: bad,
                palette_len: palette.len(),
            });
        }

        // Graphic control extension, 4-byte payload
        self.out.push(0x21);
        self.out.push(0xF9);
        self.out.push(4);
        self.out.push((disposal_bits & 0x07) << 2);
        self.write_u16(delay_cs);
        self.out.push(0); // transparent color index, unused
        self.out.push(0); // block terminator

        // Image descriptor: full frame at the top-left, no local color table
        self.out.push(0x2C);
        self.write_u16(0);
        self.write_u16(0);
        self.write_u16(self.width);
        self.write_u16(self.height);
        self.out.push(0x00);

        lzw::compress_indices(indices, COLOR_DEPTH, &mut self.out);

        debug!(frame = frame_index, delay_cs, "frame written");
        Ok(())
    }

    /// Trailer byte; returns the finished stream.
    pub fn finish(mut self) -> Vec<u8> {
        self.out.push(0x3B);
        self.out
    }

    fn write_u16(&mut self, value: u16) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }
}
