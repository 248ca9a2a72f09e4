//! Firing-sequence animation.
//!
//! Orders holes by ascending delay and renders one GIF frame per hole, the
//! firing hole highlighted. Rendering is a pure function of the pattern and
//! the options: the same inputs always produce the same bytes. The encoder
//! writes through a named temp file (removed on every exit path, including
//! errors) and the finished artifact is returned as plain bytes for the
//! caller to download or store.

use std::io::{Read, Seek, SeekFrom, Write};
use std::time::Duration;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, Rgba, RgbaImage};

use crate::core::deadline::Deadline;
use crate::core::domain::Pattern;
use crate::error::{BlastError, BlastResult};

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const HOLE: Rgba<u8> = Rgba([200, 30, 30, 255]);
const FIRING: Rgba<u8> = Rgba([50, 220, 50, 255]);
const HOLE_RADIUS: i64 = 7;
const MARGIN_PX: u32 = 40;

/// Render parameters for the timing GIF.
#[derive(Debug, Clone)]
pub struct AnimationOptions {
    /// Frames per second; sets the frame duration when `frame_duration_ms`
    /// is not given.
    pub fps: u32,
    /// Explicit per-frame duration in milliseconds.
    pub frame_duration_ms: Option<u32>,
    /// Square canvas edge in pixels.
    pub canvas_px: u32,
    /// Optional wall-clock budget for the render.
    pub budget: Option<Duration>,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            fps: 2,
            frame_duration_ms: None,
            canvas_px: 600,
            budget: None,
        }
    }
}

impl AnimationOptions {
    fn frame_ms(&self) -> u32 {
        self.frame_duration_ms
            .unwrap_or_else(|| 1000 / self.fps.max(1))
    }
}

/// Hole indices in firing order: ascending delay, ties broken by table
/// index. Total over NaN via `total_cmp`, so the order is deterministic for
/// any input.
pub fn firing_order(pattern: &Pattern) -> Vec<usize> {
    let points = pattern.points();
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&i, &j| {
        points[i]
            .delay
            .total_cmp(&points[j].delay)
            .then(i.cmp(&j))
    });
    order
}

/// Render the firing-sequence GIF: one frame per hole, holes drawn in place,
/// the currently firing hole highlighted.
pub fn render_timing_gif(pattern: &Pattern, options: &AnimationOptions) -> BlastResult<Vec<u8>> {
    if pattern.is_empty() {
        return Err(BlastError::EmptyPattern("timing animation"));
    }
    let deadline = Deadline::new(options.budget);

    let order = firing_order(pattern);
    let transform = WorldToPixel::fit(pattern, options.canvas_px);
    let frame_ms = options.frame_ms();

    // Encode through a scoped temp file (the GIF encoder wants a writer);
    // the file is unlinked when `tmp` drops, on success and on error alike.
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| BlastError::Codec(format!("temp file: {}", e)))?;
    {
        let mut encoder = GifEncoder::new(tmp.as_file_mut());
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| BlastError::Codec(format!("gif repeat: {}", e)))?;

        for &firing in &order {
            deadline.check()?;
            let mut canvas = RgbaImage::from_pixel(
                options.canvas_px,
                options.canvas_px,
                BACKGROUND,
            );
            for (i, p) in pattern.iter().enumerate() {
                let (px, py) = transform.apply(p.x, p.y);
                let color = if i == firing { FIRING } else { HOLE };
                draw_disc(&mut canvas, px, py, HOLE_RADIUS, color);
            }
            let frame = Frame::from_parts(
                canvas,
                0,
                0,
                Delay::from_numer_denom_ms(frame_ms, 1),
            );
            encoder
                .encode_frame(frame)
                .map_err(|e| BlastError::Codec(format!("gif frame: {}", e)))?;
        }
    }

    let file = tmp.as_file_mut();
    file.flush()
        .and_then(|_| file.seek(SeekFrom::Start(0)))
        .map_err(|e| BlastError::Codec(format!("temp file: {}", e)))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| BlastError::Codec(format!("temp file: {}", e)))?;

    log::debug!(
        "rendered timing gif: {} frames, {} ms/frame, {} bytes",
        order.len(),
        frame_ms,
        bytes.len()
    );
    Ok(bytes)
}

/// Aspect-preserving world-to-pixel transform centering the pattern on the
/// canvas.
struct WorldToPixel {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    canvas_px: u32,
}

impl WorldToPixel {
    fn fit(pattern: &Pattern, canvas_px: u32) -> Self {
        let bb = pattern.bounding_box().expect("non-empty pattern");
        let usable = f64::from(canvas_px.saturating_sub(2 * MARGIN_PX).max(1));
        let extent = bb.width().max(bb.height());
        // A single hole (or coincident holes) has no extent; pin it to the
        // canvas center instead of dividing by zero.
        let scale = if extent > 0.0 { usable / extent } else { 1.0 };

        // Center the pattern within the canvas.
        let offset_x = (f64::from(canvas_px) - bb.width() * scale) / 2.0 - bb.min_x * scale;
        let offset_y = (f64::from(canvas_px) - bb.height() * scale) / 2.0 - bb.min_y * scale;
        Self {
            scale,
            offset_x,
            offset_y,
            canvas_px,
        }
    }

    fn apply(&self, x: f64, y: f64) -> (i64, i64) {
        let px = x * self.scale + self.offset_x;
        // Image rows grow downward; world y grows upward.
        let py = f64::from(self.canvas_px) - (y * self.scale + self.offset_y);
        (px.round() as i64, py.round() as i64)
    }
}

fn draw_disc(canvas: &mut RgbaImage, cx: i64, cy: i64, radius: i64, color: Rgba<u8>) {
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && x < w && y >= 0 && y < h {
                canvas.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}
