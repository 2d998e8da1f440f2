//! The encoding job: frames in, one GIF89a byte stream out.
//!
//! A job runs synchronously inside one `render` call with a fixed
//! happens-before order: every frame is sampled into the quantizer and the
//! global palette is finalized before the first frame is indexed; frames
//! are then indexed and stream-encoded strictly in append order.

use common_types::{
    Disposal, EncodeError, EncodedGif, Frame, JobOptions, Palette, MAX_PALETTE_COLORS,
};
use octo_gif::Gif89aWriter;
use octo_quant::{index_frame, sample_frame, sampling_stride, OctreeQuantizer};
use tracing::{debug, info, span, Level};

/// Progress observer, called once per encoded frame with `done / total`.
pub type ProgressFn = Box<dyn FnMut(f32) + Send>;

/// One encoding job: options plus the ordered frame list.
///
/// `render` consumes the job, so a second render while one is in flight and
/// reuse after a failure are both unrepresentable. Exactly one `Ok` or one
/// `Err` comes out of every started job.
pub struct EncodeJob {
    options: JobOptions,
    frames: Vec<Frame>,
    on_progress: Option<ProgressFn>,
}

impl EncodeJob {
    pub fn new(options: JobOptions) -> Self {
        Self {
            options,
            frames: Vec::new(),
            on_progress: None,
        }
    }

    /// Append one frame in presentation order.
    pub fn add_frame(&mut self, width: u16, height: u16, rgba: Vec<u8>, delay_ms: u32) -> &mut Self {
        self.frames.push(Frame::new(width, height, rgba, delay_ms));
        self
    }

    /// Append one frame with an explicit disposal method.
    pub fn add_frame_with_disposal(
        &mut self,
        width: u16,
        height: u16,
        rgba: Vec<u8>,
        delay_ms: u32,
        disposal: Disposal,
    ) -> &mut Self {
        self.frames
            .push(Frame::new(width, height, rgba, delay_ms).with_disposal(disposal));
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Register a progress observer.
    pub fn on_progress(&mut self, callback: impl FnMut(f32) + Send + 'static) -> &mut Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Run the full pipeline: validate, build the shared palette, index
    /// every frame against it, and serialize the GIF89a stream.
    pub fn render(mut self) -> Result<EncodedGif, EncodeError> {
        let span = span!(Level::INFO, "render", frames = self.frames.len());
        let _guard = span.enter();

        let (width, height) = self.dimensions()?;
        self.validate_frames(width, height)?;

        info!(
            width,
            height,
            frames = self.frames.len(),
            quality = self.options.clamped_quality(),
            dither = self.options.dither,
            "starting encode"
        );

        let palette = self.build_palette();
        if palette.is_empty() {
            return Err(EncodeError::EmptyPalette);
        }
        info!(colors = palette.len(), "global palette built");

        let mut writer = Gif89aWriter::new(width, height);
        writer.write_preamble(&palette, self.options.loop_count, self.options.background);

        let total = self.frames.len();
        for (i, frame) in self.frames.iter().enumerate() {
            let indices = index_frame(
                &frame.rgba,
                width as usize,
                height as usize,
                &palette,
                self.options.dither,
            );
            writer.write_frame(
                i,
                &indices,
                frame.delay_cs(),
                frame.disposal.method_bits(),
                &palette,
            )?;
            debug!(frame = i, "frame encoded");

            if let Some(callback) = self.on_progress.as_mut() {
                callback((i + 1) as f32 / total as f32);
            }
        }

        let bytes = writer.finish();
        info!(bytes = bytes.len(), "encode finished");

        Ok(EncodedGif { bytes, palette })
    }

    /// Output dimensions: job options first, then the first frame.
    fn dimensions(&self) -> Result<(u16, u16), EncodeError> {
        let first = self.frames.first().ok_or(EncodeError::NoFrames)?;
        let width = self.options.width.unwrap_or(first.width);
        let height = self.options.height.unwrap_or(first.height);
        Ok((width, height))
    }

    /// Fail fast before any encoding work begins.
    fn validate_frames(&self, width: u16, height: u16) -> Result<(), EncodeError> {
        for (frame_index, frame) in self.frames.iter().enumerate() {
            if frame.width != width || frame.height != height {
                return Err(EncodeError::DimensionMismatch {
                    frame_index,
                    width,
                    height,
                    actual_width: frame.width,
                    actual_height: frame.height,
                });
            }

            let expected = frame.pixel_count() * 4;
            if frame.rgba.len() != expected {
                return Err(EncodeError::FrameSizeMismatch {
                    frame_index,
                    expected,
                    actual: frame.rgba.len(),
                });
            }
        }
        Ok(())
    }

    /// Sample every frame into one octree, then finalize the palette.
    fn build_palette(&self) -> Palette {
        let quality = self.options.clamped_quality();
        let mut octree = OctreeQuantizer::new(MAX_PALETTE_COLORS);

        for frame in &self.frames {
            let stride = sampling_stride(frame.pixel_count(), quality);
            sample_frame(&mut octree, &frame.rgba, stride);
        }

        octree.build_palette(MAX_PALETTE_COLORS)
    }
}
