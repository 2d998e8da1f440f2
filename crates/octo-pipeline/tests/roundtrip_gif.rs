use common_types::JobOptions;
use octo_pipeline::EncodeJob;

#[test]
fn test_two_frame_red_blue_animation() {
    let mut job = EncodeJob::new(JobOptions::default());
    job.add_frame(2, 2, solid_rgba(2, 2, [255, 0, 0]), 100);
    job.add_frame(2, 2, solid_rgba(2, 2, [0, 0, 255]), 100);

    let encoded = job.render().unwrap();
    let bytes = &encoded.bytes;

    // Byte-exact signature and trailer
    assert_eq!(&bytes[0..6], &[0x47, 0x49, 0x46, 0x38, 0x39, 0x61]);
    assert_eq!(*bytes.last().unwrap(), 0x3B);
    // Infinite loop extension present
    assert!(contains(bytes, b"NETSCAPE2.0"));
    // Graphic control delay field: 10 centiseconds
    assert!(contains(bytes, &[0x21, 0xF9, 4, 0, 0x0A, 0x00]));

    // Both colors survive quantization exactly
    assert!(encoded.palette.colors().contains(&[255, 0, 0]));
    assert!(encoded.palette.colors().contains(&[0, 0, 255]));

    let frames = decode_rgba(bytes);
    assert_eq!(frames.len(), 2);
    for (delay, buffer) in &frames {
        assert_eq!(*delay, 10);
        assert_eq!(buffer.len(), 2 * 2 * 4);
    }
    assert!(frames[0].1.chunks_exact(4).all(|px| px == [255, 0, 0, 255]));
    assert!(frames[1].1.chunks_exact(4).all(|px| px == [0, 0, 255, 255]));
}

#[test]
fn test_byte_identical_reruns() {
    use sha2::{Digest, Sha256};

    let render = || {
        let mut job = EncodeJob::new(JobOptions::default());
        for f in 0..4u16 {
            job.add_frame(16, 16, gradient_rgba(16, 16, f as usize), 80);
        }
        job.render().unwrap().bytes
    };

    let a = render();
    let b = render();
    assert_eq!(a, b);

    let hash_a = Sha256::digest(&a);
    let hash_b = Sha256::digest(&b);
    assert_eq!(hash_a, hash_b);
}

#[test]
fn test_single_solid_color_frame() {
    let mut job = EncodeJob::new(JobOptions::default());
    job.add_frame(8, 8, solid_rgba(8, 8, [17, 130, 201]), 50);

    let encoded = job.render().unwrap();
    assert_eq!(encoded.palette.len(), 1);
    assert_eq!(encoded.palette.colors()[0], [17, 130, 201]);

    let frames = decode_rgba(&encoded.bytes);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].0, 5);
    assert!(frames[0]
        .1
        .chunks_exact(4)
        .all(|px| px == [17, 130, 201, 255]));
}

#[test]
fn test_decoded_size_and_palette_bound() {
    let mut job = EncodeJob::new(JobOptions::default());
    for f in 0..3u16 {
        job.add_frame(32, 24, gradient_rgba(32, 24, f as usize), 100);
    }

    let encoded = job.render().unwrap();
    assert!(encoded.palette.len() <= 256);

    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options
        .read_info(std::io::Cursor::new(encoded.bytes.clone()))
        .unwrap();
    assert_eq!(decoder.width(), 32);
    assert_eq!(decoder.height(), 24);

    let table = decoder.global_palette().unwrap().to_vec();
    assert_eq!(table.len(), 768);

    // Every decoded pixel index resolves inside the palette
    let limit = encoded.palette.len();
    let mut frames = 0;
    while let Some(frame) = decoder.read_next_frame().unwrap() {
        frames += 1;
        assert!(frame.buffer.iter().all(|&i| (i as usize) < limit));
    }
    assert_eq!(frames, 3);
}

#[test]
fn test_dithered_output_decodes_cleanly() {
    let mut options = JobOptions::default();
    options.dither = true;

    let mut job = EncodeJob::new(options);
    job.add_frame(64, 64, gradient_rgba(64, 64, 0), 100);

    let encoded = job.render().unwrap();
    let frames = decode_rgba(&encoded.bytes);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].1.len(), 64 * 64 * 4);

    // Every decoded pixel must be one of the palette colors
    let colors = encoded.palette.colors();
    assert!(frames[0]
        .1
        .chunks_exact(4)
        .all(|px| colors.contains(&[px[0], px[1], px[2]])));
}

#[test]
fn test_code_table_overflow_still_decodes() {
    // Enough noise to exhaust the 4096-entry LZW table mid-frame
    let width = 256u16;
    let height = 128u16;
    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
    let mut state = 0x9E3779B9u32;
    for _ in 0..width as usize * height as usize {
        state = state.wrapping_mul(1664525).wrapping_add(1013904223);
        rgba.extend_from_slice(&[(state >> 24) as u8, (state >> 16) as u8, (state >> 8) as u8, 255]);
    }

    let mut job = EncodeJob::new(JobOptions::default());
    job.add_frame(width, height, rgba, 100);

    let encoded = job.render().unwrap();
    let frames = decode_rgba(&encoded.bytes);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].1.len(), width as usize * height as usize * 4);
}

#[test]
fn test_finite_loop_count_is_written() {
    let mut options = JobOptions::default();
    options.loop_count = 5;

    let mut job = EncodeJob::new(options);
    job.add_frame(2, 2, solid_rgba(2, 2, [0, 255, 0]), 100);

    let encoded = job.render().unwrap();
    assert!(contains(&encoded.bytes, b"NETSCAPE2.0"));
    // Loop sub-block: size 3, id 1, count 5 little-endian
    assert!(contains(&encoded.bytes, &[3, 1, 5, 0, 0]));
}

#[test]
fn test_delay_rounds_to_nearest_centisecond() {
    let mut job = EncodeJob::new(JobOptions::default());
    job.add_frame(2, 2, solid_rgba(2, 2, [200, 10, 10]), 105);

    let encoded = job.render().unwrap();
    let frames = decode_rgba(&encoded.bytes);
    assert_eq!(frames[0].0, 11);
}

// Helper functions

fn solid_rgba(width: u16, height: u16, rgb: [u8; 3]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
    for _ in 0..width as usize * height as usize {
        rgba.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
    }
    rgba
}

fn gradient_rgba(width: u16, height: u16, phase: usize) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height as usize {
        for x in 0..width as usize {
            let r = ((x * 255 / width.max(1) as usize) + phase * 11) as u8;
            let g = (y * 255 / height.max(1) as usize) as u8;
            let b = ((x + y + phase * 31) % 256) as u8;
            rgba.extend_from_slice(&[r, g, b, 255]);
        }
    }
    rgba
}

/// Decode with the reference decoder; returns (delay_cs, rgba_buffer) per frame.
fn decode_rgba(bytes: &[u8]) -> Vec<(u16, Vec<u8>)> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options.read_info(std::io::Cursor::new(bytes.to_vec())).unwrap();

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame().unwrap() {
        frames.push((frame.delay, frame.buffer.to_vec()));
    }
    frames
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
