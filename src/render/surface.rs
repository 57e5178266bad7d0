use image::{Pixel, Rgba, RgbaImage};

use super::color::Color;

/// Axis-aligned rectangle in pixel space, origin at the top left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Something frames can be drawn on.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn clear(&mut self, color: Color);
    /// Fills `rect`, blending when `color` is translucent.
    fn fill_rect(&mut self, rect: Rect, color: Color);
    /// Outlines `rect` with a line centered on its edges.
    fn stroke_rect(&mut self, rect: Rect, line_width: f64, color: Color);
    /// The current frame as tightly packed RGBA bytes, row-major.
    fn frame(&self) -> &[u8];
}

pub struct ImageSurface {
    image: RgbaImage,
}

impl ImageSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let [r, g, b, a] = self.image.get_pixel(x, y).0;
        Color::rgba(r, g, b, a)
    }

    // Pixel span covered by [start, start + len), clamped to [0, limit).
    fn span(start: f64, len: f64, limit: u32) -> Option<(u32, u32)> {
        let lo = start.round().max(0.0);
        let hi = (start + len).round().min(limit as f64);
        (hi > lo).then_some((lo as u32, hi as u32))
    }
}

fn to_rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, color.a])
}

impl Surface for ImageSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn clear(&mut self, color: Color) {
        let fill = to_rgba(color);
        self.image.pixels_mut().for_each(|p| *p = fill);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if color.a == 0 {
            return;
        }
        let Some((x0, x1)) = Self::span(rect.x, rect.width, self.image.width()) else {
            return;
        };
        let Some((y0, y1)) = Self::span(rect.y, rect.height, self.image.height()) else {
            return;
        };

        let src = to_rgba(color);
        for y in y0..y1 {
            for x in x0..x1 {
                let dst = self.image.get_pixel_mut(x, y);
                if color.a == u8::MAX {
                    *dst = src;
                } else {
                    let opaque = dst.0[3] == u8::MAX;
                    dst.blend(&src);
                    // blend rounds opaque-over-opaque down to 254
                    if opaque {
                        dst.0[3] = u8::MAX;
                    }
                }
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, line_width: f64, color: Color) {
        let lw = line_width.max(1.0);
        let half = lw / 2.0;
        let Rect {
            x,
            y,
            width,
            height,
        } = rect;

        self.fill_rect(Rect::new(x - half, y - half, width + lw, lw), color);
        self.fill_rect(Rect::new(x - half, y + height - half, width + lw, lw), color);
        self.fill_rect(Rect::new(x - half, y + half, lw, height - lw), color);
        self.fill_rect(Rect::new(x + width - half, y + half, lw, height - lw), color);
    }

    fn frame(&self) -> &[u8] {
        self.image.as_raw()
    }
}
