//! Detection geometry payloads.
//!
//! The backend has shipped two shapes for `detection_points` over time and
//! both stay supported:
//!
//! * legacy: `[{class_name, contour_normalized: [[x, y], ...]}, ...]`
//! * current: `{lixo_detections: [{lixo_contour, sub_classes?}], class_counts}`
//!
//! The current shape is recognised by its `lixo_detections` key, the legacy
//! one by being an array. Anything else is treated as "no geometry".

use crate::models::WasteCategory;
use geo::{Area, Coord, LineString, MapCoords, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Colour of outer (whole pile) contours.
pub const OUTER_CONTOUR_COLOR: &str = "#8a13cfff";
/// Colour of classes without a dedicated colour.
pub const FALLBACK_CONTOUR_COLOR: &str = "#0078FF";
/// Class name used for outer contours.
pub const OUTER_CONTOUR_CLASS: &str = "lixo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyContour {
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub contour_normalized: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubClassContour {
    pub class_name: String,
    #[serde(default)]
    pub contour: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteDetection {
    #[serde(default)]
    pub lixo_contour: Vec<[f64; 2]>,
    #[serde(default)]
    pub sub_classes: Vec<SubClassContour>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentGeometry {
    pub lixo_detections: Vec<WasteDetection>,
    #[serde(default)]
    pub class_counts: HashMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", content = "payload", rename_all = "lowercase")]
pub enum DetectionGeometry {
    Legacy(Vec<LegacyContour>),
    Current(CurrentGeometry),
}

impl DetectionGeometry {
    /// Sniffs the payload shape. Unrecognised or malformed payloads yield
    /// `None` with a warning rather than an error.
    pub fn from_payload(payload: &serde_json::Value) -> Option<Self> {
        let parsed = match payload {
            serde_json::Value::Object(map) if map.contains_key("lixo_detections") => {
                serde_json::from_value(payload.clone()).map(DetectionGeometry::Current)
            }
            serde_json::Value::Array(_) => {
                serde_json::from_value(payload.clone()).map(DetectionGeometry::Legacy)
            }
            serde_json::Value::Null => return None,
            _ => {
                tracing::warn!("Unrecognised detection geometry payload, ignoring");
                return None;
            }
        };

        match parsed {
            Ok(geometry) => Some(geometry),
            Err(e) => {
                tracing::warn!("Malformed detection geometry payload: {}", e);
                None
            }
        }
    }

    /// Contours to draw over the photo. A current-format detection with
    /// sub-classes contributes only its sub-class contours; otherwise its
    /// outer contour is drawn. Empty contours are skipped.
    pub fn overlay_contours(&self) -> Vec<OverlayContour> {
        match self {
            DetectionGeometry::Legacy(entries) => entries
                .iter()
                .filter(|e| !e.contour_normalized.is_empty())
                .map(|e| {
                    let class_name = if e.class_name.is_empty() {
                        OUTER_CONTOUR_CLASS.to_string()
                    } else {
                        e.class_name.clone()
                    };
                    let color = if class_name == OUTER_CONTOUR_CLASS {
                        OUTER_CONTOUR_COLOR
                    } else {
                        FALLBACK_CONTOUR_COLOR
                    };
                    OverlayContour {
                        class_name,
                        color: color.to_string(),
                        points: e.contour_normalized.clone(),
                    }
                })
                .collect(),
            DetectionGeometry::Current(current) => current
                .lixo_detections
                .iter()
                .flat_map(|detection| {
                    if detection.sub_classes.is_empty() {
                        vec![OverlayContour {
                            class_name: OUTER_CONTOUR_CLASS.to_string(),
                            color: OUTER_CONTOUR_COLOR.to_string(),
                            points: detection.lixo_contour.clone(),
                        }]
                    } else {
                        detection
                            .sub_classes
                            .iter()
                            .map(|sub| OverlayContour {
                                class_name: sub.class_name.clone(),
                                color: sub
                                    .class_name
                                    .parse::<WasteCategory>()
                                    .map(|c| c.color())
                                    .unwrap_or(FALLBACK_CONTOUR_COLOR)
                                    .to_string(),
                                points: sub.contour.clone(),
                            })
                            .collect()
                    }
                })
                .filter(|c| !c.points.is_empty())
                .collect(),
        }
    }
}

/// A contour in normalized image space ([0, 1] on both axes).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayContour {
    pub class_name: String,
    pub color: String,
    pub points: Vec<[f64; 2]>,
}

impl OverlayContour {
    /// Polygon in pixel space for an image of the given size
    pub fn to_pixel_polygon(&self, width: f64, height: f64) -> Polygon<f64> {
        let exterior: LineString<f64> = self
            .points
            .iter()
            .map(|&[x, y]| Coord { x, y })
            .collect();
        Polygon::new(exterior, vec![]).map_coords(|Coord { x, y }| Coord {
            x: x * width,
            y: y * height,
        })
    }

    /// SVG `points` attribute for an image of the given size
    pub fn svg_points(&self, width: f64, height: f64) -> String {
        self.points
            .iter()
            .map(|[x, y]| format!("{},{}", x * width, y * height))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The contour scaled onto a `width` x `height` photo
    pub fn to_pixel_contour(&self, width: f64, height: f64) -> PixelContour {
        PixelContour {
            class_name: self.class_name.clone(),
            color: self.color.clone(),
            points: self.svg_points(width, height),
            area_px: self.to_pixel_polygon(width, height).unsigned_area(),
        }
    }
}

/// Overlay contour in image pixels, ready for an SVG `<polygon>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixelContour {
    pub class_name: String,
    pub color: String,
    pub points: String,
    pub area_px: f64,
}
