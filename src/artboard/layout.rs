use crate::foundation::core::{Affine, Extent, FitType, Rect, Vec2};

/// Transform placing `content` (artboard space) inside `frame` (target space).
///
/// The content is centered on its alignment anchor, scaled per `fit`, then moved to
/// the matching anchor of the frame. Empty content yields the identity.
pub fn compute_alignment(fit: FitType, alignment: Vec2, frame: Rect, content: Rect) -> Affine {
    let (cw, ch) = (content.width(), content.height());
    if cw <= 0.0 || ch <= 0.0 {
        return Affine::IDENTITY;
    }
    let (fw, fh) = (frame.width(), frame.height());

    let x = -content.x0 - cw / 2.0 - alignment.x * cw / 2.0;
    let y = -content.y0 - ch / 2.0 - alignment.y * ch / 2.0;

    let (sx, sy) = match fit {
        FitType::Fill => (fw / cw, fh / ch),
        FitType::Contain => {
            let s = (fw / cw).min(fh / ch);
            (s, s)
        }
        FitType::Cover => {
            let s = (fw / cw).max(fh / ch);
            (s, s)
        }
        FitType::FitHeight => (fh / ch, fh / ch),
        FitType::FitWidth => (fw / cw, fw / cw),
        FitType::None => (1.0, 1.0),
        FitType::ScaleDown => {
            let s = (fw / cw).min(fh / ch).min(1.0);
            (s, s)
        }
    };

    let tx = frame.x0 + fw / 2.0 + alignment.x * fw / 2.0;
    let ty = frame.y0 + fh / 2.0 + alignment.y * fh / 2.0;

    Affine::translate(Vec2::new(tx, ty))
        * Affine::scale_non_uniform(sx, sy)
        * Affine::translate(Vec2::new(x, y))
}

/// Inverse of `affine`, or the identity when it is singular.
pub fn invert_or_identity(affine: Affine) -> Affine {
    let det = affine.determinant();
    if det.abs() <= f64::EPSILON || !det.is_finite() {
        return Affine::IDENTITY;
    }
    affine.inverse()
}

/// Map a target-space point back into artboard space.
pub fn target_to_artboard(
    position: Vec2,
    fit: FitType,
    alignment: Vec2,
    target: Extent,
    bounds: Rect,
) -> Vec2 {
    let xf = compute_alignment(fit, alignment, target.to_rect(), bounds);
    (invert_or_identity(xf) * position.to_point()).to_vec2()
}

/// Rescale `position`, given in a space where the target is drawn at `extents`, into
/// target-texture space. Degenerate extents keep a ratio of 1.
pub fn extents_to_target(position: Vec2, extents: Rect, target: Extent) -> Vec2 {
    let relative = position - Vec2::new(extents.x0, extents.y0);
    let ratio = |texture: u32, span: f64| {
        if span.abs() <= f64::EPSILON {
            1.0
        } else {
            f64::from(texture) / span
        }
    };
    Vec2::new(
        relative.x * ratio(target.width, extents.width()),
        relative.y * ratio(target.height, extents.height()),
    )
}

/// Extents of a texture "contained" (uniformly scaled, centered) in a viewport.
pub fn contained_extents(texture: Vec2, viewport: Vec2) -> Rect {
    if texture.x <= 0.0 || texture.y <= 0.0 {
        return Rect::ZERO;
    }
    let scale = (viewport.x / texture.x).min(viewport.y / texture.y);
    let size = texture * scale;
    let min = (viewport - size) / 2.0;
    Rect::new(min.x, min.y, min.x + size.x, min.y + size.y)
}

#[cfg(test)]
#[path = "../../tests/unit/artboard/layout.rs"]
mod tests;
