use crate::foundation::core::{Affine, BezPath, Color, FitType, Vec2};
use crate::render::arena::ArtboardId;

#[derive(Clone, Debug, PartialEq)]
/// One queued device operation. Commands execute in issue order.
pub enum RenderCommand {
    /// Push the device transform and clip state.
    Save,
    /// Pop the device transform and clip state.
    Restore,
    /// Concatenate an affine transform.
    Transform(Affine),
    /// Draw an artboard instance with the current transform.
    DrawArtboard(ArtboardId),
    /// Fill a path.
    DrawPath {
        /// Path geometry.
        path: BezPath,
        /// Fill color.
        color: Color,
    },
    /// Intersect the clip with a path.
    ClipPath(BezPath),
    /// Concatenate the fit/alignment transform of an artboard into the target frame.
    AlignArtboard {
        /// Fit policy.
        fit: FitType,
        /// Alignment vector, each axis in `[-1, 1]`.
        alignment: Vec2,
        /// Artboard whose bounds are aligned.
        artboard: ArtboardId,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
/// Payload-free discriminant of a [`RenderCommand`].
#[allow(missing_docs)]
pub enum RenderCommandType {
    Save,
    Restore,
    Transform,
    DrawArtboard,
    DrawPath,
    ClipPath,
    AlignArtboard,
}

impl RenderCommand {
    /// Discriminant of this command.
    pub fn kind(&self) -> RenderCommandType {
        match self {
            Self::Save => RenderCommandType::Save,
            Self::Restore => RenderCommandType::Restore,
            Self::Transform(_) => RenderCommandType::Transform,
            Self::DrawArtboard(_) => RenderCommandType::DrawArtboard,
            Self::DrawPath { .. } => RenderCommandType::DrawPath,
            Self::ClipPath(_) => RenderCommandType::ClipPath,
            Self::AlignArtboard { .. } => RenderCommandType::AlignArtboard,
        }
    }
}
