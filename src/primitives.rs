//! Draw operations used by the composers
//!
//! Each primitive takes the canvas explicitly and brackets its work in a
//! save/restore pair, so calls never leak color or line state into each
//! other.

use crate::canvas::PageCanvas;
use crate::fonts::{FontSet, FontWeight};
use crate::image_embed::DecodedImage;
use crate::types::{Color, Rect};

/// Vertical gap added between wrapped lines.
pub const LINE_GAP: f64 = 2.0;

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy)]
pub struct TextOptions {
    pub size: f64,
    pub weight: FontWeight,
    pub color: Color,
    pub max_width: Option<f64>,
    pub align: Align,
    pub wrap: bool,
    /// Cap on wrapped lines; the last kept line ends in an ellipsis.
    pub max_lines: Option<usize>,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            size: 10.0,
            weight: FontWeight::Regular,
            color: Color::black(),
            max_width: None,
            align: Align::Left,
            wrap: false,
            max_lines: None,
        }
    }
}

impl TextOptions {
    pub fn sized(size: f64) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = FontWeight::Bold;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn within(mut self, max_width: f64, align: Align) -> Self {
        self.max_width = Some(max_width);
        self.align = align;
        self
    }

    pub fn wrapped(mut self) -> Self {
        self.wrap = true;
        self
    }

    pub fn max_lines(mut self, lines: usize) -> Self {
        self.max_lines = Some(lines.max(1));
        self
    }
}

/// Space used by a text draw.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
    pub lines: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RectStyle {
    pub fill: Option<Color>,
    pub border: Option<Color>,
    pub border_width: f64,
}

impl RectStyle {
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(color),
            ..Self::default()
        }
    }

    pub fn outlined(color: Color, width: f64) -> Self {
        Self {
            fill: None,
            border: Some(color),
            border_width: width,
        }
    }

    pub fn with_border(mut self, color: Color, width: f64) -> Self {
        self.border = Some(color);
        self.border_width = width;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LineStyle {
    pub color: Color,
    pub thickness: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Color::black(),
            thickness: 0.5,
        }
    }
}

/// Greedy word wrap: no returned line is wider than `max_width` unless a
/// single character already is. Over-long words are split by character.
pub fn wrap_lines(fonts: &FontSet, text: &str, size: f64, weight: FontWeight, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if fonts.measure(&candidate, size, weight) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if fonts.measure(word, size, weight) <= max_width {
            current = word.to_string();
            continue;
        }
        for ch in word.chars() {
            let mut next = current.clone();
            next.push(ch);
            if !current.is_empty() && fonts.measure(&next, size, weight) > max_width {
                lines.push(std::mem::take(&mut current));
                current.push(ch);
            } else {
                current = next;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Shorten `text` with a trailing ellipsis until it fits `max_width`.
pub fn truncate_to_width(fonts: &FontSet, text: &str, size: f64, weight: FontWeight, max_width: f64) -> String {
    if fonts.measure(text, size, weight) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate = format!("{}{}", chars.iter().collect::<String>().trim_end(), ELLIPSIS);
        if fonts.measure(&candidate, size, weight) <= max_width {
            return candidate;
        }
    }
    String::new()
}

fn aligned_x(x: f64, line_width: f64, options: &TextOptions) -> f64 {
    match (options.align, options.max_width) {
        (Align::Center, Some(max)) => x + (max - line_width) / 2.0,
        (Align::Right, Some(max)) => x + max - line_width,
        _ => x,
    }
}

/// Draw text with its first baseline at `y`.
///
/// With `wrap` and a `max_width`, lines advance downward by
/// `size + LINE_GAP`; without `wrap`, text wider than `max_width` is
/// truncated with an ellipsis. Empty text draws nothing.
pub fn draw_text(canvas: &mut PageCanvas, text: &str, x: f64, y: f64, options: &TextOptions) -> TextExtent {
    let text = text.trim();
    if text.is_empty() {
        return TextExtent::default();
    }

    let lines = match (options.wrap, options.max_width) {
        (true, Some(max)) => {
            let mut lines = wrap_lines(canvas.fonts(), text, options.size, options.weight, max);
            if let Some(cap) = options.max_lines.filter(|cap| lines.len() > *cap) {
                let rest = lines.split_off(cap - 1).join(" ");
                lines.push(truncate_to_width(canvas.fonts(), &rest, options.size, options.weight, max));
            }
            lines
        }
        (false, Some(max)) => vec![truncate_to_width(canvas.fonts(), text, options.size, options.weight, max)],
        _ => vec![text.to_string()],
    };

    canvas.save_state();
    canvas.set_fill_color(options.color);
    let mut width: f64 = 0.0;
    let mut baseline = y;
    for line in &lines {
        let line_width = canvas.measure(line, options.size, options.weight);
        let line_x = aligned_x(x, line_width, options);
        canvas.draw_string(line_x, baseline, line, options.size, options.weight);
        width = width.max(line_width);
        baseline -= options.size + LINE_GAP;
    }
    canvas.restore_state();

    TextExtent {
        width,
        height: lines.len() as f64 * (options.size + LINE_GAP),
        lines: lines.len(),
    }
}

pub fn draw_rect(canvas: &mut PageCanvas, rect: Rect, style: &RectStyle) {
    if style.fill.is_none() && style.border.is_none() {
        return;
    }
    canvas.save_state();
    if let Some(fill) = style.fill {
        canvas.set_fill_color(fill);
    }
    if let Some(border) = style.border {
        canvas.set_stroke_color(border);
        canvas.set_line_width(style.border_width);
    }
    canvas.rect(rect, style.fill.is_some(), style.border.is_some());
    canvas.restore_state();
}

pub fn draw_line(canvas: &mut PageCanvas, x1: f64, y1: f64, x2: f64, y2: f64, style: &LineStyle) {
    canvas.save_state();
    canvas.set_stroke_color(style.color);
    canvas.set_line_width(style.thickness);
    canvas.line(x1, y1, x2, y2);
    canvas.restore_state();
}

/// Place a decoded image with its bottom-left corner at (x, y).
pub fn draw_image(canvas: &mut PageCanvas, image: DecodedImage, x: f64, y: f64, width: f64, height: f64) {
    if width <= 0.0 || height <= 0.0 {
        return;
    }
    let name = canvas.register_image(image);
    canvas.draw_image(&name, x, y, width, height);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Margins, Size};

    fn canvas() -> PageCanvas {
        PageCanvas::new(Size::new(400.0, 400.0), Margins::uniform(20.0), FontSet::builtin())
    }

    #[test]
    fn test_empty_text_is_noop() {
        let mut c = canvas();
        let extent = draw_text(&mut c, "   ", 30.0, 300.0, &TextOptions::default());
        assert_eq!(extent, TextExtent::default());
        assert!(c.drawn_bounds().is_empty());
    }

    #[test]
    fn test_wrapped_lines_fit_and_advance() {
        let fonts = FontSet::builtin();
        let text = "Travail serieux et regulier, continuez ainsi pour le prochain trimestre";
        let lines = wrap_lines(&fonts, text, 10.0, FontWeight::Regular, 120.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(fonts.measure(line, 10.0, FontWeight::Regular) <= 120.0);
        }

        let mut c = canvas();
        let extent = draw_text(&mut c, text, 30.0, 300.0, &TextOptions::sized(10.0).within(120.0, Align::Left).wrapped());
        assert_eq!(extent.lines, lines.len());
        assert_eq!(extent.height, lines.len() as f64 * (10.0 + LINE_GAP));
    }

    #[test]
    fn test_wrapped_lines_are_capped() {
        let fonts = FontSet::builtin();
        let text = "Travail serieux et regulier, continuez ainsi pour le prochain trimestre";
        let mut c = canvas();
        let options = TextOptions::sized(10.0).within(120.0, Align::Left).wrapped().max_lines(2);
        let extent = draw_text(&mut c, text, 30.0, 300.0, &options);
        assert_eq!(extent.lines, 2);
        assert_eq!(c.drawn_bounds().len(), 2);
        for drawn in c.drawn_bounds() {
            assert!(drawn.width <= 120.0);
        }
        let short = wrap_lines(&fonts, "Bon travail", 10.0, FontWeight::Regular, 120.0);
        let mut c = canvas();
        assert_eq!(draw_text(&mut c, "Bon travail", 30.0, 300.0, &options).lines, short.len());
    }

    #[test]
    fn test_long_word_is_split() {
        let fonts = FontSet::builtin();
        let lines = wrap_lines(&fonts, "Anticonstitutionnellement", 12.0, FontWeight::Bold, 40.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "Anticonstitutionnellement");
    }

    #[test]
    fn test_alignment_offsets() {
        let mut c = canvas();
        let options = TextOptions::sized(10.0).within(200.0, Align::Right);
        let extent = draw_text(&mut c, "Total", 50.0, 200.0, &options);
        let drawn = c.drawn_bounds()[0];
        assert!((drawn.right() - 250.0).abs() < 1e-9);
        assert!((drawn.width - extent.width).abs() < 1e-9);

        let mut c = canvas();
        draw_text(&mut c, "Total", 50.0, 200.0, &TextOptions::sized(10.0).within(200.0, Align::Center));
        let drawn = c.drawn_bounds()[0];
        assert!(((drawn.left() - 50.0) - (250.0 - drawn.right())).abs() < 1e-9);
    }

    #[test]
    fn test_truncation_fits() {
        let fonts = FontSet::builtin();
        let t = truncate_to_width(&fonts, "Sciences de la Vie et de la Terre", 9.0, FontWeight::Regular, 60.0);
        assert!(t.ends_with("..."));
        assert!(fonts.measure(&t, 9.0, FontWeight::Regular) <= 60.0);
    }

    #[test]
    fn test_rect_without_paint_is_noop() {
        let mut c = canvas();
        draw_rect(&mut c, Rect::new(30.0, 30.0, 10.0, 10.0), &RectStyle::default());
        assert!(c.drawn_bounds().is_empty());
        draw_rect(&mut c, Rect::new(30.0, 30.0, 10.0, 10.0), &RectStyle::filled(Color::gray(0.9)));
        assert_eq!(c.drawn_bounds().len(), 1);
    }
}
