//! Per-operation filter stage builders (ffmpeg filter syntax)

use std::f64::consts::PI;

use tracing::warn;

use crate::domain::model::{FilterKind, FilterSet, FilterStage, MediaInfo, StageKind};

/// Weighted luma matrix for `colorchannelmixer`
const GRAYSCALE_MATRIX: &str = "colorchannelmixer=.3:.4:.3:0:.3:.4:.3:0:.3:.4:.3";
/// Classic sepia matrix for `colorchannelmixer`
const SEPIA_MATRIX: &str = "colorchannelmixer=.393:.769:.189:0:.349:.686:.168:0:.272:.534:.131";
/// Passthrough used when a filter set resolves to no visible change
const NULL_FILTER: &str = "null";

/// `scale=w:h`, explicit dimensions only
pub fn scale(width: u32, height: u32) -> FilterStage {
    FilterStage::new(StageKind::Scale, format!("scale={}:{}", width, height))
}

/// Normalize degrees into `(-180, 180]`
pub fn normalize_angle(angle: f64) -> f64 {
    let mut normalized = angle % 360.0;
    if normalized <= -180.0 {
        normalized += 360.0;
    } else if normalized > 180.0 {
        normalized -= 360.0;
    }
    // Fold -0.0 so that equal rotations render identically
    if normalized == 0.0 {
        0.0
    } else {
        normalized
    }
}

/// Rotation in radians with the output canvas grown to fit the rotated frame.
///
/// Canvas sides are truncated to even values for 4:2:0 encoders.
pub fn rotate(angle: f64) -> FilterStage {
    let radians = normalize_angle(angle) * PI / 180.0;
    let r = format!("{:.6}", radians);
    FilterStage::new(
        StageKind::Rotate,
        format!("rotate={r}:ow='trunc(rotw({r})/2)*2':oh='trunc(roth({r})/2)*2'"),
    )
}

/// Size of the frame entering the next stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSize {
    Exact { width: u32, height: u32 },
    /// Only the engine knows the size, after a rotation by a free angle
    Engine,
}

impl FrameSize {
    pub fn of(source: &MediaInfo) -> Self {
        Self::Exact {
            width: source.width,
            height: source.height,
        }
    }

    /// Size after a [`rotate`] stage
    pub fn rotated(self, angle: f64) -> Self {
        let Self::Exact { width, height } = self else {
            return Self::Engine;
        };
        let angle = normalize_angle(angle);
        if angle == 0.0 || angle == 180.0 {
            Self::Exact {
                width: even_floor(width),
                height: even_floor(height),
            }
        } else if angle.abs() == 90.0 {
            Self::Exact {
                width: even_floor(height),
                height: even_floor(width),
            }
        } else {
            Self::Engine
        }
    }
}

/// Pixel rectangle resolved from a percentage crop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Clamp `x+width` and `y+height` to 100%
fn clamp_to_frame(x: f64, y: f64, width: f64, height: f64) -> (f64, f64) {
    let clamped_width = width.min(100.0 - x);
    let clamped_height = height.min(100.0 - y);
    if clamped_width < width || clamped_height < height {
        warn!(
            requested_width = width,
            requested_height = height,
            clamped_width,
            clamped_height,
            "Clamping crop to the frame edge"
        );
    }
    (clamped_width, clamped_height)
}

/// Clamp to the frame and convert to pixels of a `frame_width` x `frame_height` frame
pub fn resolve_crop(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    frame_width: u32,
    frame_height: u32,
) -> CropRect {
    let (width, height) = clamp_to_frame(x, y, width, height);
    let (px_x, px_width) = to_pixels(x, width, frame_width);
    let (px_y, px_height) = to_pixels(y, height, frame_height);
    CropRect {
        x: px_x,
        y: px_y,
        width: px_width,
        height: px_height,
    }
}

/// Offset and even extent in pixels along one axis, kept inside `[0, extent]`
fn to_pixels(offset_pct: f64, size_pct: f64, extent: u32) -> (u32, u32) {
    let extent_f = f64::from(extent);
    let raw = ((size_pct / 100.0) * extent_f).round().max(1.0).min(extent_f) as u32;
    let size = even_floor(raw.max(2).min(extent));
    let offset = ((offset_pct / 100.0) * extent_f).round().max(0.0) as u32;
    (offset.min(extent - size), size)
}

/// Largest even value not above `value`; 0 and 1 stay as they are
fn even_floor(value: u32) -> u32 {
    if value > 1 {
        value & !1
    } else {
        value
    }
}

/// Crop stage for the current frame, plus the frame size it leaves behind
pub fn crop(x: f64, y: f64, width: f64, height: f64, frame: FrameSize) -> (FilterStage, FrameSize) {
    match frame {
        FrameSize::Exact {
            width: frame_width,
            height: frame_height,
        } => {
            let rect = resolve_crop(x, y, width, height, frame_width, frame_height);
            let stage = FilterStage::new(
                StageKind::Crop,
                format!("crop={}:{}:{}:{}", rect.width, rect.height, rect.x, rect.y),
            );
            let next = FrameSize::Exact {
                width: rect.width,
                height: rect.height,
            };
            (stage, next)
        }
        FrameSize::Engine => {
            let (width, height) = clamp_to_frame(x, y, width, height);
            let stage = FilterStage::new(
                StageKind::Crop,
                format!(
                    "crop=trunc(iw*{w:.4}/2)*2:trunc(ih*{h:.4}/2)*2:trunc(iw*{x:.4}):trunc(ih*{y:.4})",
                    w = width / 100.0,
                    h = height / 100.0,
                    x = x / 100.0,
                    y = y / 100.0,
                ),
            );
            (stage, FrameSize::Engine)
        }
    }
}

/// All adjustments of a filter set merged into one stage, in canonical order.
///
/// Brightness is a channel multiplier, contrast and saturation share one `eq` pass, the
/// color matrices only apply above zero intensity, blur radius is `intensity / 10`.
pub fn color(filters: &FilterSet) -> FilterStage {
    let mut parts: Vec<String> = Vec::new();
    let mut eq: Vec<String> = Vec::new();

    for kind in FilterKind::CANONICAL_ORDER {
        let Some(intensity) = filters.get(kind) else {
            continue;
        };
        let factor = f64::from(intensity) / 100.0;
        match kind {
            FilterKind::Brightness => parts.push(format!(
                "colorchannelmixer=rr={f:.2}:gg={f:.2}:bb={f:.2}",
                f = factor
            )),
            FilterKind::Contrast => eq.push(format!("contrast={:.2}", factor)),
            FilterKind::Saturate => eq.push(format!("saturation={:.2}", factor)),
            FilterKind::Grayscale | FilterKind::Sepia => {
                // eq must precede the matrices to keep the canonical order
                flush_eq(&mut parts, &mut eq);
                if intensity > 0 {
                    let matrix = if kind == FilterKind::Grayscale {
                        GRAYSCALE_MATRIX
                    } else {
                        SEPIA_MATRIX
                    };
                    parts.push(matrix.to_string());
                }
            }
            FilterKind::Blur => {
                flush_eq(&mut parts, &mut eq);
                parts.push(format!("boxblur={:.1}", f64::from(intensity) / 10.0));
            }
        }
    }
    flush_eq(&mut parts, &mut eq);

    let descriptor = if parts.is_empty() {
        NULL_FILTER.to_string()
    } else {
        parts.join(",")
    };
    FilterStage::new(StageKind::Color, descriptor)
}

fn flush_eq(parts: &mut Vec<String>, eq: &mut Vec<String>) {
    if !eq.is_empty() {
        parts.push(format!("eq={}", eq.join(":")));
        eq.clear();
    }
}
