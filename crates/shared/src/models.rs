use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
#[cfg(feature = "uuid-support")]
use uuid::Uuid;

use crate::geo::LngLat;

/// Property tag stamped on features built from track points.
pub const TRACK_POINT_FEATURE_ID: &str = "transport";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Subway,
    Bus,
    Car,
    Airplane,
    /// Unclassified transport; also absorbs tags this build does not know.
    #[default]
    #[serde(other)]
    Transport,
}

impl TransportKind {
    pub const ALL: [TransportKind; 5] = [
        TransportKind::Subway,
        TransportKind::Bus,
        TransportKind::Car,
        TransportKind::Airplane,
        TransportKind::Transport,
    ];

    /// Wire tag, as serialized.
    pub fn tag(&self) -> &'static str {
        match self {
            TransportKind::Subway => "subway",
            TransportKind::Bus => "bus",
            TransportKind::Car => "car",
            TransportKind::Airplane => "airplane",
            TransportKind::Transport => "transport",
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Subway => write!(f, "Subway"),
            TransportKind::Bus => write!(f, "Bus"),
            TransportKind::Car => write!(f, "Car"),
            TransportKind::Airplane => write!(f, "Airplane"),
            TransportKind::Transport => write!(f, "Transport"),
        }
    }
}

fn feature_type() -> String {
    "Feature".to_string()
}

fn point_type() -> String {
    "Point".to_string()
}

fn collection_type() -> String {
    "FeatureCollection".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default = "point_type")]
    pub kind: String,
    /// Kept loosely typed so a malformed feature is skipped rather than failing the document.
    #[serde(default)]
    pub coordinates: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A GeoJSON point feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default)]
    pub properties: FeatureProperties,
    pub geometry: Geometry,
}

impl Feature {
    pub fn point(position: LngLat) -> Self {
        Feature {
            kind: feature_type(),
            properties: FeatureProperties::default(),
            geometry: Geometry {
                kind: point_type(),
                coordinates: serde_json::json!([position.lng, position.lat]),
            },
        }
    }

    pub fn from_track_point(tp: &TrackPoint) -> Self {
        let mut feature = Feature::point(LngLat::new(tp.lon, tp.lat));
        feature.properties = FeatureProperties {
            id: Some(serde_json::Value::String(TRACK_POINT_FEATURE_ID.to_string())),
            time: Some(tp.time.clone()),
            latitude: Some(tp.lat),
            longitude: Some(tp.lon),
            extra: BTreeMap::new(),
        };
        feature
    }

    /// `[longitude, latitude, ...]` from the geometry, or `None` if it is not a usable point.
    pub fn lng_lat(&self) -> Option<LngLat> {
        let coords = self.geometry.coordinates.as_array()?;
        let lng = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;
        let p = LngLat::new(lng, lat);
        p.is_finite().then_some(p)
    }

    /// The `properties.id` tag rendered as text.
    pub fn id(&self) -> Option<String> {
        match self.properties.id.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl Default for FeatureCollection {
    fn default() -> Self {
        FeatureCollection {
            kind: collection_type(),
            features: Vec::new(),
        }
    }
}

impl FeatureCollection {
    pub fn from_track_points(points: &[TrackPoint]) -> Self {
        FeatureCollection {
            kind: collection_type(),
            features: points.iter().map(Feature::from_track_point).collect(),
        }
    }

    pub fn positions(&self) -> Vec<LngLat> {
        self.features.iter().filter_map(Feature::lng_lat).collect()
    }
}

/// One sampled location of a recorded trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub time: String,
}

/// An ordered group of features forming one drawn route.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub key: String,
    pub kind: TransportKind,
    pub features: Vec<Feature>,
    /// Estimated emissions, when the source knows them.
    pub carbon_kg: Option<f64>,
}

impl Collection {
    pub fn positions(&self) -> Vec<LngLat> {
        self.features.iter().filter_map(Feature::lng_lat).collect()
    }
}

/// A route as returned by the transports endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: TransportKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_kg: Option<f64>,
    pub geojson: FeatureCollection,
}

impl RouteObject {
    pub fn into_collection(self, index: usize) -> Collection {
        Collection {
            key: self.id.unwrap_or_else(|| route_key(index)),
            kind: self.kind,
            features: self.geojson.features,
            carbon_kg: self.carbon_kg,
        }
    }
}

/// Fallback identity for routes that carry no id.
pub fn route_key(index: usize) -> String {
    format!("route-{index}")
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported route document: expected a route array, {{\"points\": [...]}} or a FeatureCollection")]
    UnsupportedShape,
}

/// Route documents seen in the wild. The route array is canonical.
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Routes(Vec<RouteObject>),
    Grouped { points: Vec<FeatureCollection> },
    Single(FeatureCollection),
}

/// Parse any supported route document into drawable collections.
pub fn parse_payload(text: &str) -> Result<Vec<Collection>, PayloadError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let payload: Payload =
        serde_json::from_value(value).map_err(|_| PayloadError::UnsupportedShape)?;

    let collections = match payload {
        Payload::Routes(routes) => routes
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.into_collection(i))
            .collect(),
        Payload::Grouped { points } => points
            .into_iter()
            .enumerate()
            .map(|(i, fc)| Collection {
                key: route_key(i),
                kind: TransportKind::Transport,
                features: fc.features,
                carbon_kg: None,
            })
            .collect(),
        Payload::Single(fc) => vec![Collection {
            key: route_key(0),
            kind: TransportKind::Transport,
            features: fc.features,
            carbon_kg: None,
        }],
    };
    Ok(collections)
}

/// A stored trip.
#[cfg(feature = "uuid-support")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transport {
    pub id: Uuid,
    pub kind: TransportKind,
    /// `YYYY-MM-DD` of the start time.
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    pub carbon_kg: Option<f64>,
    pub geojson: FeatureCollection,
}

#[cfg(feature = "uuid-support")]
impl Transport {
    pub fn to_route_object(&self) -> RouteObject {
        RouteObject {
            id: Some(self.id.to_string()),
            kind: self.kind,
            date: Some(self.date.clone()),
            start_time: Some(self.start_time.clone()),
            end_time: Some(self.end_time.clone()),
            distance: Some(self.distance),
            duration: Some(self.duration),
            carbon_kg: self.carbon_kg,
            geojson: self.geojson.clone(),
        }
    }
}
