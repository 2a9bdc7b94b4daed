//! Filter facets and filtering for the map and history views.

use crate::models::detection::month_number;
use crate::models::{Detection, WasteCategory, Waypoint};
use crate::planning::pagination::PAGE_PARAM;
use crate::planning::QueryState;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const CLASSES_PARAM: &str = "classes";
pub const DISTANCE_PARAM: &str = "distance";
pub const STATUS_PARAM: &str = "status";
pub const MONTH_PARAM: &str = "month";
pub const YEAR_PARAM: &str = "year";

/// Status value meaning "no status filter"
pub const ALL_STATUSES: &str = "all";

const MONTH_LABELS: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Distance range in kilometres from the device. Both bounds are
/// inclusive; `max_km: None` is the open-ended `N+` bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistanceBucket {
    pub min_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_km: Option<f64>,
}

impl DistanceBucket {
    pub const fn new(min_km: f64, max_km: Option<f64>) -> Self {
        DistanceBucket { min_km, max_km }
    }

    pub fn contains(&self, distance_km: f64) -> bool {
        distance_km >= self.min_km && self.max_km.map_or(true, |max| distance_km <= max)
    }

    /// Query-string key, e.g. `10-20` or `50+`
    pub fn key(&self) -> String {
        self.to_string()
    }

    pub fn label(&self) -> String {
        format!("{} km", self)
    }
}

impl fmt::Display for DistanceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_km {
            Some(max) => write!(f, "{}-{}", self.min_km, max),
            None => write!(f, "{}+", self.min_km),
        }
    }
}

impl FromStr for DistanceBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .ok()
                .filter(|km| km.is_finite() && *km >= 0.0)
                .ok_or_else(|| format!("Invalid distance bucket: '{}'", s))
        };

        if let Some(min) = s.strip_suffix('+') {
            return Ok(DistanceBucket::new(parse(min)?, None));
        }
        let (min, max) = s
            .split_once('-')
            .ok_or_else(|| format!("Invalid distance bucket: '{}'", s))?;
        let (min, max) = (parse(min)?, parse(max)?);
        if min > max {
            return Err(format!("Invalid distance bucket: '{}' (min > max)", s));
        }
        Ok(DistanceBucket::new(min, Some(max)))
    }
}

/// Buckets offered in the distance menu
pub const DISTANCE_BUCKETS: [DistanceBucket; 5] = [
    DistanceBucket::new(0.0, Some(5.0)),
    DistanceBucket::new(5.0, Some(10.0)),
    DistanceBucket::new(10.0, Some(20.0)),
    DistanceBucket::new(20.0, Some(50.0)),
    DistanceBucket::new(50.0, None),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterCriteria {
    pub classes: BTreeSet<WasteCategory>,
    pub distance: Option<DistanceBucket>,
    pub status: Option<String>,
    pub month: Option<u8>,
    pub year: Option<i32>,
}

impl FilterCriteria {
    /// Reads filters from the query. Unparseable values are ignored, the
    /// same as an absent parameter.
    pub fn from_query(query: &QueryState) -> Self {
        let classes: BTreeSet<WasteCategory> = query
            .get(CLASSES_PARAM)
            .map(|raw| {
                raw.split(',')
                    .filter(|s| !s.trim().is_empty())
                    .filter_map(|s| match s.parse::<WasteCategory>() {
                        Ok(c) => Some(c),
                        Err(e) => {
                            tracing::debug!("Ignoring class filter: {}", e);
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let distance = query
            .get(DISTANCE_PARAM)
            .filter(|s| !s.is_empty())
            .and_then(|s| match s.parse::<DistanceBucket>() {
                Ok(bucket) => Some(bucket),
                Err(e) => {
                    tracing::debug!("Ignoring distance filter: {}", e);
                    None
                }
            });

        let status = query
            .get(STATUS_PARAM)
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != ALL_STATUSES)
            .map(str::to_string);

        let month = query
            .get(MONTH_PARAM)
            .and_then(|s| s.trim().parse::<u8>().ok())
            .filter(|m| (1..=12).contains(m));

        let year = query.get(YEAR_PARAM).and_then(|s| s.trim().parse::<i32>().ok());

        FilterCriteria {
            classes,
            distance,
            status,
            month,
            year,
        }
    }

    /// Writes every filter parameter, deleting absent ones. Any filter
    /// change sends the history view back to its first page, so `page` is
    /// dropped too.
    pub fn write_to(&self, query: &mut QueryState) {
        if self.classes.is_empty() {
            query.delete(CLASSES_PARAM);
        } else {
            let joined = self
                .classes
                .iter()
                .map(WasteCategory::as_str)
                .collect::<Vec<_>>()
                .join(",");
            query.set(CLASSES_PARAM, joined);
        }
        set_or_delete(query, DISTANCE_PARAM, self.distance.map(|d| d.key()));
        set_or_delete(query, STATUS_PARAM, self.status.clone());
        set_or_delete(query, MONTH_PARAM, self.month.map(|m| m.to_string()));
        set_or_delete(query, YEAR_PARAM, self.year.map(|y| y.to_string()));
        query.delete(PAGE_PARAM);
    }

    pub fn is_empty(&self) -> bool {
        self == &FilterCriteria::default()
    }

    /// Distance filtering needs the device position.
    pub fn requires_position(&self) -> bool {
        self.distance.is_some()
    }

    pub fn matches(&self, detection: &Detection, position: Option<&Waypoint>) -> bool {
        if !self.classes.is_empty()
            && !detection
                .present_categories()
                .any(|c| self.classes.contains(&c))
        {
            return false;
        }

        if let Some(bucket) = &self.distance {
            match position {
                Some(origin) => {
                    if !bucket.contains(origin.distance_to(&detection.position)) {
                        return false;
                    }
                }
                None => return false,
            }
        }

        if let Some(status) = &self.status {
            if detection.status.as_deref() != Some(status.as_str()) {
                return false;
            }
        }

        if self.month.is_some() || self.year.is_some() {
            let Some(date) = detection.collected_date() else {
                return false;
            };
            if self.month.is_some_and(|m| m != month_number(date.month())) {
                return false;
            }
            if self.year.is_some_and(|y| y != date.year()) {
                return false;
            }
        }

        true
    }
}

fn set_or_delete(query: &mut QueryState, key: &str, value: Option<String>) {
    match value {
        Some(v) => query.set(key, v),
        None => query.delete(key),
    }
}

/// Detections matching every active criterion, in input order. Without a
/// position an active distance filter matches nothing.
pub fn apply_filters(
    detections: &[Detection],
    criteria: &FilterCriteria,
    position: Option<&Waypoint>,
) -> Vec<Detection> {
    detections
        .iter()
        .filter(|d| criteria.matches(d, position))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthFacet {
    pub value: u8,
    pub label: &'static str,
}

impl MonthFacet {
    pub fn new(value: u8) -> Option<Self> {
        let label = *MONTH_LABELS.get(usize::from(value).checked_sub(1)?)?;
        Some(MonthFacet { value, label })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Facets {
    /// Categories with a positive count somewhere in the data, fixed order
    pub classes: Vec<WasteCategory>,
    /// Months of collection dates, ascending
    pub months: Vec<MonthFacet>,
    /// Years of collection dates, ascending
    pub years: Vec<i32>,
}

pub fn derive_facets(detections: &[Detection]) -> Facets {
    let classes = WasteCategory::ALL
        .into_iter()
        .filter(|&c| detections.iter().any(|d| d.count_of(c) > 0))
        .collect();

    let dates: Vec<_> = detections.iter().filter_map(Detection::collected_date).collect();
    let months: BTreeSet<u8> = dates.iter().map(|d| month_number(d.month())).collect();
    let years: BTreeSet<i32> = dates.iter().map(|d| d.year()).collect();

    Facets {
        classes,
        months: months.into_iter().filter_map(MonthFacet::new).collect(),
        years: years.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::detection::{normalize_classes, RawClassCount};

    fn detection(id: &str, classes: &[(&str, u32)], position: Waypoint) -> Detection {
        let raw: Vec<RawClassCount> = classes
            .iter()
            .map(|(nome, quantidade)| RawClassCount {
                nome: nome.to_string(),
                quantidade: *quantidade,
            })
            .collect();
        Detection {
            id: id.to_string(),
            position,
            photo: String::new(),
            classes: normalize_classes(&raw),
            geometry: None,
            detected_at: None,
            status: None,
            collected_at: None,
        }
    }

    fn origin() -> Waypoint {
        Waypoint { lat: 0.0, lng: 0.0 }
    }

    /// Point due north of the origin at the given distance
    fn north_km(km: f64) -> Waypoint {
        Waypoint {
            lat: (km / crate::constants::EARTH_RADIUS_KM).to_degrees(),
            lng: 0.0,
        }
    }

    #[test]
    fn test_empty_criteria_is_identity() {
        let data = vec![
            detection("1", &[("papel", 1)], origin()),
            detection("2", &[], north_km(100.0)),
        ];
        let filtered = apply_filters(&data, &FilterCriteria::default(), None);
        assert_eq!(filtered, data);
    }

    #[test]
    fn test_class_filter_with_no_matches_is_empty() {
        let data = vec![
            detection("1", &[("papel", 1)], origin()),
            detection("2", &[("vidro", 2), ("metal", 0)], origin()),
        ];
        let criteria = FilterCriteria {
            classes: [WasteCategory::Metal].into_iter().collect(),
            ..Default::default()
        };
        assert!(apply_filters(&data, &criteria, None).is_empty());

        let criteria = FilterCriteria {
            classes: [WasteCategory::Glass, WasteCategory::Plastic].into_iter().collect(),
            ..Default::default()
        };
        let ids: Vec<_> = apply_filters(&data, &criteria, None)
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn test_distance_bucket_bounds_are_closed() {
        let bucket: DistanceBucket = "10-20".parse().unwrap();
        assert!(bucket.contains(10.0));
        assert!(bucket.contains(20.0));
        assert!(!bucket.contains(20.01));
        assert!(!bucket.contains(9.99));

        let open: DistanceBucket = "50+".parse().unwrap();
        assert!(open.contains(50.0));
        assert!(open.contains(10_000.0));
        assert!(!open.contains(49.9));
    }

    #[test]
    fn test_distance_filter_uses_haversine() {
        let data = vec![
            detection("near-10", &[], north_km(10.001)),
            detection("near-20", &[], north_km(19.999)),
            detection("past-20", &[], north_km(20.01)),
            detection("under-10", &[], north_km(9.99)),
        ];
        let criteria = FilterCriteria {
            distance: Some("10-20".parse().unwrap()),
            ..Default::default()
        };
        let ids: Vec<_> = apply_filters(&data, &criteria, Some(&origin()))
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["near-10", "near-20"]);

        assert!(apply_filters(&data, &criteria, None).is_empty());
    }

    #[test]
    fn test_bucket_parse_and_display() {
        assert_eq!("0-5".parse::<DistanceBucket>().unwrap(), DISTANCE_BUCKETS[0]);
        assert!("5-1".parse::<DistanceBucket>().is_err());
        assert!("abc".parse::<DistanceBucket>().is_err());
        assert!("-5+".parse::<DistanceBucket>().is_err());
        let keys: Vec<_> = DISTANCE_BUCKETS.iter().map(|b| b.key()).collect();
        assert_eq!(keys, vec!["0-5", "5-10", "10-20", "20-50", "50+"]);
        assert_eq!(DISTANCE_BUCKETS[4].label(), "50+ km");
    }

    #[test]
    fn test_status_and_date_filters() {
        let mut collected = detection("1", &[("papel", 1)], origin());
        collected.status = Some("Coletado".into());
        collected.collected_at = Some("2025-08-15T16:45:00".into());

        let mut not_found = detection("2", &[("papel", 1)], origin());
        not_found.status = Some("NEncontrado".into());

        let data = vec![collected, not_found];

        let by_status = FilterCriteria {
            status: Some("NEncontrado".into()),
            ..Default::default()
        };
        assert_eq!(apply_filters(&data, &by_status, None)[0].id, "2");

        let by_month = FilterCriteria {
            month: Some(8),
            ..Default::default()
        };
        let filtered = apply_filters(&data, &by_month, None);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "1");

        let wrong_year = FilterCriteria {
            year: Some(2024),
            ..Default::default()
        };
        assert!(apply_filters(&data, &wrong_year, None).is_empty());
    }

    #[test]
    fn test_query_round_trip_and_page_reset() {
        let q = QueryState::parse(
            "classes=vidro,papel,entulho&distance=5-10&status=all&month=13&year=2025&page=3&markers=a",
        );
        let criteria = FilterCriteria::from_query(&q);
        assert_eq!(
            criteria.classes.iter().copied().collect::<Vec<_>>(),
            vec![WasteCategory::Paper, WasteCategory::Glass]
        );
        assert_eq!(criteria.distance, Some(DISTANCE_BUCKETS[1]));
        assert!(criteria.status.is_none());
        assert!(criteria.month.is_none());
        assert_eq!(criteria.year, Some(2025));
        assert!(criteria.requires_position());

        let mut out = q.clone();
        criteria.write_to(&mut out);
        assert!(!out.has(PAGE_PARAM));
        assert!(!out.has(STATUS_PARAM));
        assert!(!out.has(MONTH_PARAM));
        assert_eq!(out.get(CLASSES_PARAM), Some("papel,vidro"));
        assert_eq!(out.get("markers"), Some("a"));
        assert_eq!(FilterCriteria::from_query(&out), criteria);
    }

    #[test]
    fn test_derive_facets() {
        let mut a = detection("1", &[("papel", 2), ("metal", 0)], origin());
        a.collected_at = Some("2025-09-01T10:45:00".into());
        let mut b = detection("2", &[("vidro", 1)], origin());
        b.collected_at = Some("2024-08-20T11:30:00Z".into());
        let c = detection("3", &[], origin());

        let facets = derive_facets(&[a, b, c]);
        assert_eq!(facets.classes, vec![WasteCategory::Paper, WasteCategory::Glass]);
        assert_eq!(
            facets.months,
            vec![MonthFacet::new(8).unwrap(), MonthFacet::new(9).unwrap()]
        );
        assert_eq!(facets.months[0].label, "Agosto");
        assert_eq!(facets.years, vec![2024, 2025]);
        assert!(MonthFacet::new(0).is_none());
        assert!(MonthFacet::new(13).is_none());
    }
}
