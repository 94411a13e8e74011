//! Geometry and color primitives shared by the canvas and the composers

use serde::{Deserialize, Serialize};

/// Rectangle with position and size, origin at the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    pub fn bottom(&self) -> f64 {
        self.y
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// True when `other` lies entirely inside this rectangle (with a small epsilon).
    pub fn contains(&self, other: &Rect) -> bool {
        const EPS: f64 = 1e-6;
        other.left() >= self.left() - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() >= self.bottom() - EPS
            && other.top() <= self.top() + EPS
    }
}

/// Size with width and height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Margins
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Margins {
    pub fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self { top, bottom, left, right }
    }

    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }
}

/// RGB color with components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    pub const fn gray(level: f64) -> Self {
        Self::rgb(level, level, level)
    }
}

/// Physical page formats, sizes in PDF points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PageFormat {
    pub fn portrait_size(self) -> Size {
        match self {
            PageFormat::A4 => Size::new(595.28, 841.89),
            PageFormat::Letter => Size::new(612.0, 792.0),
            PageFormat::Legal => Size::new(612.0, 1008.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Resolve the page size for a format and orientation.
pub fn page_size(format: PageFormat, orientation: Orientation) -> Size {
    let size = format.portrait_size();
    match orientation {
        Orientation::Portrait => size,
        Orientation::Landscape => Size::new(size.height, size.width),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landscape_swaps_dimensions() {
        let s = page_size(PageFormat::A4, Orientation::Landscape);
        assert_eq!(s.width, 841.89);
        assert_eq!(s.height, 595.28);
    }

    #[test]
    fn test_rect_contains() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains(&Rect::new(10.0, 10.0, 80.0, 90.0)));
        assert!(!outer.contains(&Rect::new(10.0, 10.0, 95.0, 10.0)));
    }
}
