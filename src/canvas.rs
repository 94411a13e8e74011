//! Single-page drawing surface over pdf-writer's content stream
//!
//! Coordinates are PDF user space: origin bottom-left, y grows upward.
//! The canvas also keeps the bounding box of everything drawn so layout can
//! be checked without parsing the output.

use pdf_writer::{Content, Name, Str};

use crate::fonts::{FontSet, FontWeight};
use crate::image_embed::DecodedImage;
use crate::types::{Color, Margins, Rect, Size};
use crate::winansi;

/// Canvas state for graphics operations
#[derive(Clone)]
struct CanvasState {
    fill_color: Color,
    stroke_color: Color,
    line_width: f64,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            fill_color: Color::black(),
            stroke_color: Color::black(),
            line_width: 1.0,
        }
    }
}

/// An image registered on the page, written as an XObject at serialization.
pub struct PlacedImage {
    pub name: String,
    pub image: DecodedImage,
}

pub struct PageCanvas {
    size: Size,
    margins: Margins,
    fonts: FontSet,
    content: Content,
    state: CanvasState,
    state_stack: Vec<CanvasState>,
    images: Vec<PlacedImage>,
    drawn: Vec<Rect>,
}

impl PageCanvas {
    pub fn new(size: Size, margins: Margins, fonts: FontSet) -> Self {
        Self {
            size,
            margins,
            fonts,
            content: Content::new(),
            state: CanvasState::default(),
            state_stack: Vec::new(),
            images: Vec::new(),
            drawn: Vec::new(),
        }
    }

    /// Page minus margins; all drawing is expected to stay inside it.
    pub fn content_rect(&self) -> Rect {
        Rect::new(
            self.margins.left,
            self.margins.bottom,
            self.size.width - self.margins.left - self.margins.right,
            self.size.height - self.margins.top - self.margins.bottom,
        )
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    pub fn measure(&self, text: &str, size: f64, weight: FontWeight) -> f64 {
        self.fonts.measure(text, size, weight)
    }

    /// Bounding boxes of every drawing operation so far.
    pub fn drawn_bounds(&self) -> &[Rect] {
        &self.drawn
    }

    // ===== State Management =====

    pub fn save_state(&mut self) {
        self.state_stack.push(self.state.clone());
        self.content.save_state();
    }

    pub fn restore_state(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.state = state;
            self.content.restore_state();
        }
    }

    // ===== Colors and line style =====

    pub fn set_fill_color(&mut self, color: Color) {
        self.state.fill_color = color;
        self.content
            .set_fill_rgb(color.r as f32, color.g as f32, color.b as f32);
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.state.stroke_color = color;
        self.content
            .set_stroke_rgb(color.r as f32, color.g as f32, color.b as f32);
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
        self.content.set_line_width(width as f32);
    }

    // ===== Drawing =====

    pub fn rect(&mut self, rect: Rect, fill: bool, stroke: bool) {
        self.content.rect(
            rect.x as f32,
            rect.y as f32,
            rect.width as f32,
            rect.height as f32,
        );
        match (fill, stroke) {
            (true, true) => self.content.fill_nonzero_and_stroke(),
            (true, false) => self.content.fill_nonzero(),
            (false, true) => self.content.stroke(),
            (false, false) => self.content.end_path(),
        };
        self.drawn.push(rect);
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.content.move_to(x1 as f32, y1 as f32);
        self.content.line_to(x2 as f32, y2 as f32);
        self.content.stroke();
        self.drawn.push(Rect::new(
            x1.min(x2),
            y1.min(y2),
            (x2 - x1).abs(),
            (y2 - y1).abs(),
        ));
    }

    // ===== Text =====

    /// Show `text` with its baseline at `y`. Returns the drawn width.
    pub fn draw_string(&mut self, x: f64, y: f64, text: &str, size: f64, weight: FontWeight) -> f64 {
        let width = self.measure(text, size, weight);
        let encoded = winansi::encode(text);
        self.content.begin_text();
        self.content.set_font(weight.resource_name(), size as f32);
        self.content.next_line(x as f32, y as f32);
        self.content.show(Str(&encoded));
        self.content.end_text();
        // Glyph box: descenders reach ~0.21 em below the baseline.
        self.drawn
            .push(Rect::new(x, y - size * 0.21, width, size * 0.93));
        width
    }

    // ===== Images =====

    /// Register an image for this page and return its resource name.
    pub fn register_image(&mut self, image: DecodedImage) -> String {
        let name = format!("Im{}", self.images.len() + 1);
        self.images.push(PlacedImage {
            name: name.clone(),
            image,
        });
        name
    }

    /// Paint a registered image with its bottom-left corner at (x, y).
    pub fn draw_image(&mut self, name: &str, x: f64, y: f64, width: f64, height: f64) {
        self.content.save_state();
        // Images are 1x1 unit squares; the matrix scales and places them.
        self.content
            .transform([width as f32, 0.0, 0.0, height as f32, x as f32, y as f32]);
        self.content.x_object(Name(name.as_bytes()));
        self.content.restore_state();
        self.drawn.push(Rect::new(x, y, width, height));
    }

    /// Consume the canvas into its content stream and registered images.
    pub fn finish(self) -> (Vec<u8>, Vec<PlacedImage>, FontSet, Size) {
        (self.content.finish(), self.images, self.fonts, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> PageCanvas {
        PageCanvas::new(Size::new(200.0, 100.0), Margins::uniform(10.0), FontSet::builtin())
    }

    #[test]
    fn test_content_rect() {
        assert_eq!(canvas().content_rect(), Rect::new(10.0, 10.0, 180.0, 80.0));
    }

    #[test]
    fn test_state_stack_is_balanced() {
        let mut c = canvas();
        c.restore_state();
        c.save_state();
        c.set_fill_color(Color::gray(0.5));
        c.restore_state();
        assert!(c.state_stack.is_empty());
        assert_eq!(c.state.fill_color, Color::black());
    }

    #[test]
    fn test_operations_record_bounds() {
        let mut c = canvas();
        c.rect(Rect::new(20.0, 20.0, 10.0, 5.0), true, false);
        c.line(50.0, 60.0, 40.0, 30.0);
        let w = c.draw_string(15.0, 40.0, "Note", 10.0, FontWeight::Bold);
        assert!(w > 0.0);
        let name = c.register_image(DecodedImage {
            width: 1,
            height: 1,
            pixels: crate::image_embed::ImagePixels::Gray(vec![0]),
        });
        assert_eq!(name, "Im1");
        c.draw_image(&name, 100.0, 20.0, 30.0, 30.0);
        let bounds = c.drawn_bounds();
        assert_eq!(bounds.len(), 4);
        assert_eq!(bounds[1], Rect::new(40.0, 30.0, 10.0, 30.0));
        let (content, images, _, _) = c.finish();
        assert!(!content.is_empty());
        assert_eq!(images.len(), 1);
    }
}
