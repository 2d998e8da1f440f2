use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Hard cap on palette size imposed by the GIF global color table.
pub const MAX_PALETTE_COLORS: usize = 256;

/// Size of the flat global color table: 256 RGB triplets, zero-padded.
pub const COLOR_TABLE_BYTES: usize = MAX_PALETTE_COLORS * 3;

/// How a frame is disposed of before the next one is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Disposal {
    #[default]
    Unspecified,
    Keep,
    Background,
    Previous,
}

impl Disposal {
    /// Disposal method bits as they appear in the Graphic Control Extension.
    pub fn method_bits(self) -> u8 {
        match self {
            Disposal::Unspecified => 0,
            Disposal::Keep => 1,
            Disposal::Background => 2,
            Disposal::Previous => 3,
        }
    }
}

/// One input frame: tightly packed RGBA bytes plus presentation metadata.
/// Frames are immutable once appended to a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub rgba: Vec<u8>,
    pub delay_ms: u32,
    pub disposal: Disposal,
}

impl Frame {
    pub fn new(width: u16, height: u16, rgba: Vec<u8>, delay_ms: u32) -> Self {
        Self {
            width,
            height,
            rgba,
            delay_ms,
            disposal: Disposal::default(),
        }
    }

    pub fn with_disposal(mut self, disposal: Disposal) -> Self {
        self.disposal = disposal;
        self
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Delay in GIF centiseconds, rounded to the nearest tick.
    pub fn delay_cs(&self) -> u16 {
        ((self.delay_ms + 5) / 10).min(u16::MAX as u32) as u16
    }
}

/// Options for one encoding job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOptions {
    /// Palette sampling aggressiveness, 1 (densest) to 30 (coarsest).
    pub quality: u8,
    /// Output width; defaults to the first frame's width.
    pub width: Option<u16>,
    /// Output height; defaults to the first frame's height.
    pub height: Option<u16>,
    /// NETSCAPE2.0 loop count, 0 loops forever.
    pub loop_count: u16,
    /// Floyd-Steinberg error diffusion when mapping frames to the palette.
    pub dither: bool,
    /// Logical screen background color, resolved to the nearest palette entry.
    pub background: Option<[u8; 3]>,
    /// Reserved: accepted for API compatibility, never written to the stream.
    pub transparent: Option<[u8; 3]>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            quality: 10,
            width: None,
            height: None,
            loop_count: 0,
            dither: false,
            background: None,
            transparent: None,
        }
    }
}

impl JobOptions {
    /// Quality clamped to the supported 1..=30 range.
    pub fn clamped_quality(&self) -> u8 {
        self.quality.clamp(1, 30)
    }
}

/// Immutable global palette shared by every frame of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    colors: Vec<[u8; 3]>,
}

impl Palette {
    pub fn new(colors: Vec<[u8; 3]>) -> Self {
        Self { colors }
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Index of the closest color by squared RGB distance.
    ///
    /// Linear scan with an exact-match short circuit. The palette is capped
    /// at 256 entries, so the scan cost is bounded per pixel.
    pub fn nearest(&self, r: u8, g: u8, b: u8) -> u8 {
        let mut min_dist = u32::MAX;
        let mut min_index = 0usize;

        for (i, c) in self.colors.iter().enumerate() {
            let dr = r as i32 - c[0] as i32;
            let dg = g as i32 - c[1] as i32;
            let db = b as i32 - c[2] as i32;
            let dist = (dr * dr + dg * dg + db * db) as u32;

            if dist < min_dist {
                min_dist = dist;
                min_index = i;
                if dist == 0 {
                    break;
                }
            }
        }

        min_index as u8
    }

    /// Flat RGB table, zero-padded to exactly 768 bytes.
    pub fn color_table(&self) -> [u8; COLOR_TABLE_BYTES] {
        let mut table = [0u8; COLOR_TABLE_BYTES];
        for (i, c) in self.colors.iter().take(MAX_PALETTE_COLORS).enumerate() {
            table[i * 3..i * 3 + 3].copy_from_slice(c);
        }
        table
    }
}

/// Finished output: the GIF89a byte stream plus the palette it was built on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedGif {
    pub bytes: Vec<u8>,
    pub palette: Palette,
}

/// Structured error taxonomy with stable codes.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum EncodeError {
    #[error("E_INPUT_EMPTY: no frames supplied")]
    NoFrames,

    #[error("E_INPUT_FRAME: frame {frame_index}: buffer is {actual} bytes, expected {expected}")]
    FrameSizeMismatch {
        frame_index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("E_INPUT_DIMENSIONS: frame {frame_index} is {actual_width}x{actual_height}, job is {width}x{height}")]
    DimensionMismatch {
        frame_index: usize,
        width: u16,
        height: u16,
        actual_width: u16,
        actual_height: u16,
    },

    #[error("E_QUANT_PALETTE: quantization produced an empty palette")]
    EmptyPalette,

    #[error("E_GIF_INDEX: frame {frame_index}: pixel index {index} outside palette of {palette_len} colors")]
    IndexOutOfRange {
        frame_index: usize,
        index: u8,
        palette_len: usize,
    },
}

impl EncodeError {
    /// Stable error code for logging and monitoring.
    pub fn code(&self) -> &'static str {
        match self {
            EncodeError::NoFrames => "E_INPUT_EMPTY",
            EncodeError::FrameSizeMismatch { .. } => "E_INPUT_FRAME",
            EncodeError::DimensionMismatch { .. } => "E_INPUT_DIMENSIONS",
            EncodeError::EmptyPalette => "E_QUANT_PALETTE",
            EncodeError::IndexOutOfRange { .. } => "E_GIF_INDEX",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_rounding() {
        assert_eq!(Frame::new(1, 1, vec![0; 4], 100).delay_cs(), 10);
        assert_eq!(Frame::new(1, 1, vec![0; 4], 104).delay_cs(), 10);
        assert_eq!(Frame::new(1, 1, vec![0; 4], 105).delay_cs(), 11);
        assert_eq!(Frame::new(1, 1, vec![0; 4], 0).delay_cs(), 0);
    }

    #[test]
    fn test_color_table_is_padded() {
        let palette = Palette::new(vec![[255, 0, 0], [0, 0, 255]]);
        let table = palette.color_table();

        assert_eq!(table.len(), COLOR_TABLE_BYTES);
        assert_eq!(&table[0..6], &[255, 0, 0, 0, 0, 255]);
        assert!(table[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_nearest_exact_and_closest() {
        let palette = Palette::new(vec![[0, 0, 0], [255, 0, 0], [0, 0, 255]]);

        assert_eq!(palette.nearest(255, 0, 0), 1);
        assert_eq!(palette.nearest(200, 10, 10), 1);
        assert_eq!(palette.nearest(10, 10, 200), 2);
        assert_eq!(palette.nearest(1, 2, 3), 0);
    }

    #[test]
    fn test_quality_clamping() {
        let mut options = JobOptions::default();
        options.quality = 0;
        assert_eq!(options.clamped_quality(), 1);
        options.quality = 200;
        assert_eq!(options.clamped_quality(), 30);
        options.quality = 10;
        assert_eq!(options.clamped_quality(), 10);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(EncodeError::NoFrames.code(), "E_INPUT_EMPTY");
        assert_eq!(EncodeError::EmptyPalette.code(), "E_QUANT_PALETTE");
        let err = EncodeError::IndexOutOfRange {
            frame_index: 3,
            index: 9,
            palette_len: 4,
        };
        assert_eq!(err.code(), "E_GIF_INDEX");
        assert!(err.to_string().starts_with("E_GIF_INDEX"));
    }
}
