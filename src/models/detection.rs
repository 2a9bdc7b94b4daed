use crate::constants::PHOTO_PLACEHOLDER;
use crate::models::{DetectionGeometry, Waypoint};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime};

/// Waste categories the classifier reports. Declaration order is the
/// display order of every normalized class list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WasteCategory {
    #[serde(rename = "papel")]
    Paper,
    #[serde(rename = "plastico")]
    Plastic,
    #[serde(rename = "vidro")]
    Glass,
    #[serde(rename = "metal")]
    Metal,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 4] = [
        WasteCategory::Paper,
        WasteCategory::Plastic,
        WasteCategory::Glass,
        WasteCategory::Metal,
    ];

    /// Wire name used by the backend and in the `classes` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteCategory::Paper => "papel",
            WasteCategory::Plastic => "plastico",
            WasteCategory::Glass => "vidro",
            WasteCategory::Metal => "metal",
        }
    }

    /// Capitalized label for filter menus
    pub fn label(&self) -> &'static str {
        match self {
            WasteCategory::Paper => "Papel",
            WasteCategory::Plastic => "Plastico",
            WasteCategory::Glass => "Vidro",
            WasteCategory::Metal => "Metal",
        }
    }

    /// Overlay stroke colour for sub-class contours
    pub fn color(&self) -> &'static str {
        match self {
            WasteCategory::Paper => "#4A90E2",
            WasteCategory::Plastic => "#D0021B",
            WasteCategory::Glass => "#7ED321",
            WasteCategory::Metal => "#f5e023ff",
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WasteCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "papel" | "paper" => Ok(WasteCategory::Paper),
            "plastico" | "plástico" | "plastic" => Ok(WasteCategory::Plastic),
            "vidro" | "glass" => Ok(WasteCategory::Glass),
            "metal" => Ok(WasteCategory::Metal),
            _ => Err(format!("Invalid waste category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassCount {
    #[serde(rename = "nome")]
    pub category: WasteCategory,
    #[serde(rename = "quantidade")]
    pub count: u32,
}

/// Class entry as the backend sends it, before normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawClassCount {
    pub nome: String,
    #[serde(default)]
    pub quantidade: u32,
}

/// Returns exactly one entry per [`WasteCategory`], in declaration order.
/// Missing categories get a zero count; unknown names are dropped. When a
/// category repeats, the last entry wins.
pub fn normalize_classes(raw: &[RawClassCount]) -> Vec<ClassCount> {
    let mut counts = [0u32; 4];
    for entry in raw {
        match entry.nome.parse::<WasteCategory>() {
            Ok(category) => counts[category as usize] = entry.quantidade,
            Err(_) => tracing::debug!(name = %entry.nome, "Dropping unknown waste class"),
        }
    }

    WasteCategory::ALL
        .iter()
        .zip(counts)
        .map(|(&category, count)| ClassCount { category, count })
        .collect()
}

/// Turns whatever the backend stored as a photo into something an `<img>` can load.
pub fn normalize_photo(foto: &str) -> String {
    if foto.is_empty() {
        return PHOTO_PLACEHOLDER.to_string();
    }
    if foto.starts_with("data:") || foto.starts_with("http://") || foto.starts_with("https://")
    {
        return foto.to_string();
    }
    if foto.starts_with('/') && foto.contains('.') {
        return foto.to_string();
    }
    format!("data:image/jpeg;base64,{}", foto)
}

/// A reported waste point. Collector activity records are detections with
/// `status` and, once collected, `collected_at`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Detection {
    pub id: String,
    pub position: Waypoint,
    pub photo: String,
    pub classes: Vec<ClassCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<DetectionGeometry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<String>,
}

impl Detection {
    /// Sum of all class counts
    pub fn total_count(&self) -> u32 {
        self.classes.iter().map(|c| c.count).sum()
    }

    pub fn count_of(&self, category: WasteCategory) -> u32 {
        self.classes
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    /// Categories with a positive count, in fixed order
    pub fn present_categories(&self) -> impl Iterator<Item = WasteCategory> + '_ {
        self.classes
            .iter()
            .filter(|c| c.count > 0)
            .map(|c| c.category)
    }

    /// Calendar date of collection, if the record has a parseable one
    pub fn collected_date(&self) -> Option<Date> {
        self.collected_at.as_deref().and_then(parse_timestamp_date)
    }
}

/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS[.fff]` and bare dates.
pub fn parse_timestamp_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(dt.date());
    }
    let naive_formats = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ];
    if let Some(dt) = naive_formats
        .into_iter()
        .find_map(|format| PrimitiveDateTime::parse(raw, format).ok())
    {
        return Some(dt.date());
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

/// Month number (1-12) of a `time::Month`
pub fn month_number(month: Month) -> u8 {
    month as u8
}

/// Detection as served by `GET /detections/map/status/{status}` and
/// `GET /collector/activity/{id}`. Every field is optional so that one bad
/// record does not fail the whole batch.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDetection {
    pub id: Option<serde_json::Value>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub foto: Option<String>,
    pub classes: Option<Vec<RawClassCount>>,
    #[serde(default)]
    pub detection_points: Option<serde_json::Value>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "dataColetado")]
    pub data_coletado: Option<String>,
}

impl RawDetection {
    /// Validates and normalizes the record. Returns `None` for records
    /// without an id, numeric coordinates, or a class list.
    pub fn into_detection(self) -> Option<Detection> {
        let id = match self.id {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                tracing::warn!("Dropping detection without id");
                return None;
            }
        };

        let (lat, lng, classes) = match (self.lat, self.lng, self.classes) {
            (Some(lat), Some(lng), Some(classes)) => (lat, lng, classes),
            _ => {
                tracing::warn!(id = %id, "Dropping detection {} with missing coordinates or classes", id);
                return None;
            }
        };

        let position = match Waypoint::new(lat, lng) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(id = %id, "Dropping detection {}: {}", id, e);
                return None;
            }
        };

        let geometry = self
            .detection_points
            .as_ref()
            .and_then(DetectionGeometry::from_payload);

        Some(Detection {
            id,
            position,
            photo: normalize_photo(self.foto.as_deref().unwrap_or_default()),
            classes: normalize_classes(&classes),
            geometry,
            detected_at: self.date,
            status: self.status,
            collected_at: self.data_coletado,
        })
    }
}
