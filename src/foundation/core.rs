pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// How artboard-space content is scaled into the target frame.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FitType {
    /// Stretch independently on both axes.
    Fill,
    /// Uniform scale so the content fits entirely inside the frame.
    #[default]
    Contain,
    /// Uniform scale so the content covers the whole frame.
    Cover,
    /// Uniform scale matching the frame width.
    FitWidth,
    /// Uniform scale matching the frame height.
    FitHeight,
    /// No scaling.
    None,
    /// Like `Contain`, but never scales up.
    ScaleDown,
}

/// Named alignment presets; see [`Alignment::to_vec2`] for the numeric form.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Alignment {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    #[default]
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Alignment {
    /// Alignment vector with each axis in `[-1, 1]` (`-1` = left/top).
    pub fn to_vec2(self) -> Vec2 {
        match self {
            Self::TopLeft => Vec2::new(-1.0, -1.0),
            Self::TopCenter => Vec2::new(0.0, -1.0),
            Self::TopRight => Vec2::new(1.0, -1.0),
            Self::CenterLeft => Vec2::new(-1.0, 0.0),
            Self::Center => Vec2::new(0.0, 0.0),
            Self::CenterRight => Vec2::new(1.0, 0.0),
            Self::BottomLeft => Vec2::new(-1.0, 1.0),
            Self::BottomCenter => Vec2::new(0.0, 1.0),
            Self::BottomRight => Vec2::new(1.0, 1.0),
        }
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::from_rgba8(0, 0, 0, 0);

    /// Build from channel values.
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels as an array, `[r, g, b, a]`.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Color {
    fn from(v: [u8; 4]) -> Self {
        Self::from_rgba8(v[0], v[1], v[2], v[3])
    }
}

/// Size of a 2D surface in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Extent {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Extent {
    /// Build an extent.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Frame rectangle at the origin, `(0, 0, width, height)`.
    pub fn to_rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// `true` when either side is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
