//! Clip export: JSON (verbatim clip) and a BVH-style hierarchical motion text.
//!
//! 2D data maps onto BVH as a flat hierarchy: every joint is a direct child of one
//! root, and only the Z rotation channel carries data.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::{Clip, Vec2};
use crate::error::{AnimationError, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Bvh,
}

impl FromStr for ExportFormat {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "bvh" => Ok(ExportFormat::Bvh),
            _ => Err(AnimationError::UnsupportedExportFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// Serialize `clip` as `format`. No clip yields an empty string.
pub fn export(clip: Option<&Clip>, format: ExportFormat) -> Result<String> {
    let Some(clip) = clip else {
        return Ok(String::new());
    };
    match format {
        ExportFormat::Json => export_json(clip),
        ExportFormat::Bvh => Ok(export_bvh(clip)),
    }
}

pub fn export_json(clip: &Clip) -> Result<String> {
    Ok(serde_json::to_string_pretty(clip)?)
}

/// BVH text: `HIERARCHY` (root + one `JOINT` per clip joint, offsets from the first
/// keyframe) followed by `MOTION` (frame count, frame time, one line per keyframe).
pub fn export_bvh(clip: &Clip) -> String {
    let first = clip.keyframes.first();
    let mut out = String::new();

    out.push_str("HIERARCHY\n");
    out.push_str("ROOT root\n{\n");
    out.push_str("  OFFSET 0.00 0.00 0.00\n");
    out.push_str("  CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation\n");
    for (j, name) in clip.joints.iter().enumerate() {
        let offset = first
            .and_then(|kf| kf.poses.get(j))
            .map(|p| p.position)
            .unwrap_or(Vec2::ZERO);
        out.push_str(&format!("  JOINT {name}\n"));
        out.push_str("  {\n");
        out.push_str(&format!("    OFFSET {:.2} {:.2} 0.00\n", offset.x, offset.y));
        out.push_str("    CHANNELS 3 Zrotation Xrotation Yrotation\n");
        out.push_str("  }\n");
    }
    out.push_str("}\n");

    out.push_str("MOTION\n");
    out.push_str(&format!("Frames: {}\n", clip.keyframes.len()));
    out.push_str(&format!("Frame Time: {:.6}\n", 1.0 / clip.fps));
    for kf in &clip.keyframes {
        out.push_str("0.00 0.00 0.00 0.00 0.00 0.00");
        for pose in &kf.poses {
            out.push_str(&format!(" {:.4} 0.00 0.00", pose.rotation));
        }
        out.push('\n');
    }
    out
}
