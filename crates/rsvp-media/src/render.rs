//! Frame renderer: display unit + settings -> deterministic bitmap.
//!
//! The ORP character's horizontal center is pinned to the exact canvas
//! center so the eye never moves between units; a short fixation tick is
//! drawn above the text at the centerline.

use std::collections::HashMap;
use std::path::Path;

use image::{Rgb as ImageRgb, RgbImage};
use rsvp_models::{DisplayUnit, Rgb, Settings};

use crate::error::MediaResult;
use crate::font::load_font;

/// Fixed output canvas width.
pub const CANVAS_WIDTH: u32 = 1920;
/// Fixed output canvas height.
pub const CANVAS_HEIGHT: u32 = 1080;

/// Length of the fixation tick above the text, in pixels.
const TICK_HEIGHT: u32 = 10;
/// Gap between the tick and the top of the text.
const TICK_GAP: u32 = 20;

/// A rendered bitmap plus its target display duration.
///
/// Transient: frames are handed to the encoder and dropped.
pub struct Frame {
    pub image: RgbImage,
    pub duration_ms: u64,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Raw RGB24 pixel data, row-major.
    pub fn data(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// Renders display units for one job.
///
/// The font is loaded once at construction (fatal for the job if the family
/// is unavailable). The glyph cache is per-renderer and therefore per-job;
/// no layout state leaks between jobs, and the same (unit, settings) input
/// always yields pixel-identical output.
pub struct FrameRenderer {
    font: fontdue::Font,
    font_size: f32,
    text_color: Rgb,
    bg_color: Rgb,
    highlight_color: Rgb,
    glyph_cache: HashMap<char, (fontdue::Metrics, Vec<u8>)>,
}

impl FrameRenderer {
    /// Create a renderer for one job's settings.
    pub fn new(settings: &Settings, font_dir: Option<&Path>) -> MediaResult<Self> {
        let font = load_font(settings.font, font_dir)?;
        Ok(Self {
            font,
            font_size: (CANVAS_WIDTH.min(CANVAS_HEIGHT) / 8) as f32,
            text_color: settings.text_color,
            bg_color: settings.bg_color,
            highlight_color: settings.highlight_color,
            glyph_cache: HashMap::new(),
        })
    }

    /// Render one display unit to a full canvas frame.
    pub fn render(&mut self, unit: &DisplayUnit) -> Frame {
        let mut image = RgbImage::from_pixel(
            CANVAS_WIDTH,
            CANVAS_HEIGHT,
            ImageRgb(self.bg_color.as_bytes()),
        );

        let chars: Vec<char> = unit.text.chars().collect();
        let advances: Vec<f32> = chars
            .iter()
            .map(|&c| self.font.metrics(c, self.font_size).advance_width)
            .collect();

        // Pin the ORP character's center to the canvas center.
        let orp = unit.orp_index.min(chars.len().saturating_sub(1));
        let orp_center: f32 =
            advances[..orp].iter().sum::<f32>() + advances.get(orp).copied().unwrap_or(0.0) / 2.0;
        let start_x = CANVAS_WIDTH as f32 / 2.0 - orp_center;

        let (ascent, descent) = self.line_extents();
        let text_top = (CANVAS_HEIGHT as f32 - (ascent - descent)) / 2.0;
        let baseline = (text_top + ascent).round() as i32;

        let mut pen_x = start_x;
        for (i, &c) in chars.iter().enumerate() {
            let color = if i == orp {
                self.highlight_color
            } else {
                self.text_color
            };
            self.blend_glyph(&mut image, c, pen_x.round() as i32, baseline, color);
            pen_x += advances[i];
        }

        self.draw_fixation_tick(&mut image, text_top.round() as i32);

        Frame {
            image,
            duration_ms: unit.duration_ms,
        }
    }

    /// Ascent and descent of the face at the configured size.
    fn line_extents(&self) -> (f32, f32) {
        match self.font.horizontal_line_metrics(self.font_size) {
            Some(m) => (m.ascent, m.descent),
            // Degenerate faces without horizontal metrics
            None => (self.font_size * 0.8, -(self.font_size * 0.2)),
        }
    }

    /// Alpha-blend one glyph's coverage bitmap at (pen_x, baseline).
    fn blend_glyph(&mut self, image: &mut RgbImage, c: char, pen_x: i32, baseline: i32, color: Rgb) {
        let font = &self.font;
        let size = self.font_size;
        let (metrics, bitmap) = self
            .glyph_cache
            .entry(c)
            .or_insert_with(|| font.rasterize(c, size));

        if metrics.width == 0 || metrics.height == 0 {
            return;
        }

        let left = pen_x + metrics.xmin;
        let top = baseline - metrics.height as i32 - metrics.ymin;

        for row in 0..metrics.height {
            let y = top + row as i32;
            if y < 0 || y >= CANVAS_HEIGHT as i32 {
                continue;
            }
            for col in 0..metrics.width {
                let x = left + col as i32;
                if x < 0 || x >= CANVAS_WIDTH as i32 {
                    continue;
                }
                let coverage = bitmap[row * metrics.width + col] as u16;
                if coverage == 0 {
                    continue;
                }
                let pixel = image.get_pixel_mut(x as u32, y as u32);
                for (channel, &src) in pixel.0.iter_mut().zip(color.as_bytes().iter()) {
                    let dst = *channel as u16;
                    *channel = ((src as u16 * coverage + dst * (255 - coverage)) / 255) as u8;
                }
            }
        }
    }

    /// Vertical tick at the canvas centerline, just above the text.
    fn draw_fixation_tick(&self, image: &mut RgbImage, text_top: i32) {
        let center_x = CANVAS_WIDTH as i32 / 2;
        let tick_bottom = text_top - TICK_GAP as i32;
        let tick_top = tick_bottom - TICK_HEIGHT as i32;
        let color = ImageRgb(self.highlight_color.as_bytes());

        for y in tick_top..tick_bottom {
            if y < 0 || y >= CANVAS_HEIGHT as i32 {
                continue;
            }
            for x in (center_x - 1)..=(center_x + 1) {
                if x < 0 || x >= CANVAS_WIDTH as i32 {
                    continue;
                }
                image.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::find_font_file;
    use rsvp_models::FontFamily;

    fn test_unit(text: &str, orp_index: usize) -> DisplayUnit {
        DisplayUnit {
            index: 0,
            text: text.to_string(),
            orp_index,
            duration_ms: 200,
            trailing_punctuation: false,
        }
    }

    fn test_settings() -> Settings {
        Settings {
            text_color: Rgb::new(10, 20, 30),
            bg_color: Rgb::new(250, 250, 240),
            highlight_color: Rgb::new(200, 0, 0),
            ..Default::default()
        }
    }

    fn have_font() -> bool {
        find_font_file(FontFamily::Sans, None).is_some()
    }

    #[test]
    fn test_canvas_size_and_background() {
        if !have_font() {
            return;
        }
        let mut renderer = FrameRenderer::new(&test_settings(), None).unwrap();
        let frame = renderer.render(&test_unit("hi", 0));

        assert_eq!(frame.width(), CANVAS_WIDTH);
        assert_eq!(frame.height(), CANVAS_HEIGHT);
        assert_eq!(frame.data().len(), (CANVAS_WIDTH * CANVAS_HEIGHT * 3) as usize);
        // Corners are untouched background
        assert_eq!(frame.image.get_pixel(0, 0).0, [250, 250, 240]);
        assert_eq!(
            frame.image.get_pixel(CANVAS_WIDTH - 1, CANVAS_HEIGHT - 1).0,
            [250, 250, 240]
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        if !have_font() {
            return;
        }
        let settings = test_settings();
        let unit = test_unit("SPEED", 1);

        let a = FrameRenderer::new(&settings, None).unwrap().render(&unit);
        let b = FrameRenderer::new(&settings, None).unwrap().render(&unit);
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn test_highlight_and_text_colors_present() {
        if !have_font() {
            return;
        }
        let settings = test_settings();
        let mut renderer = FrameRenderer::new(&settings, None).unwrap();
        let frame = renderer.render(&test_unit("SPEED", 1));

        let highlight = settings.highlight_color.as_bytes();
        let text = settings.text_color.as_bytes();
        let pixels: Vec<[u8; 3]> = frame.image.pixels().map(|p| p.0).collect();
        assert!(pixels.iter().any(|&p| p == highlight));
        assert!(pixels.iter().any(|&p| p == text));
    }

    #[test]
    fn test_duration_carried_through() {
        if !have_font() {
            return;
        }
        let mut renderer = FrameRenderer::new(&test_settings(), None).unwrap();
        let mut unit = test_unit("word", 1);
        unit.duration_ms = 450;
        assert_eq!(renderer.render(&unit).duration_ms, 450);
    }
}
