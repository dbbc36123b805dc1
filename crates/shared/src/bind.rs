//! Keyed enter/update/exit binding of route data to overlay elements.
//!
//! The layer keeps one [`RouteElement`] per collection (drawn as a path) and
//! one [`WaypointElement`] per feature (drawn as a circle). Each element
//! remembers the geographic datum it was bound to, so a viewport change
//! only needs [`OverlayLayer::reproject`], while new data goes through
//! [`OverlayLayer::bind`].

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::geo::LngLat;
use crate::models::{Collection, Feature, TransportKind};
use crate::projection::{OverlayFrame, PixelBounds, Point, ViewportTransform};

/// Circle radius for route waypoints, in pixels.
pub const WAYPOINT_RADIUS: f64 = 3.0;

/// Outcome of reconciling existing keys against incoming keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation<K> {
    /// New keys, in incoming order.
    pub entered: Vec<K>,
    /// Keys present on both sides, in incoming order.
    pub updated: Vec<K>,
    /// Keys no longer present, in existing order.
    pub exited: Vec<K>,
}

impl<K> Reconciliation<K> {
    /// True when the key set is unchanged.
    pub fn is_stable(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

/// Three-way set reconciliation. A key repeated in `incoming` counts once.
pub fn reconcile<'a, K>(
    existing: impl IntoIterator<Item = &'a K>,
    incoming: impl IntoIterator<Item = &'a K>,
) -> Reconciliation<K>
where
    K: Eq + Hash + Clone + 'a,
{
    let existing: Vec<&K> = existing.into_iter().collect();
    let existing_set: HashSet<&K> = existing.iter().copied().collect();

    let mut seen = HashSet::new();
    let mut entered = Vec::new();
    let mut updated = Vec::new();
    for key in incoming {
        if !seen.insert(key) {
            continue;
        }
        if existing_set.contains(key) {
            updated.push(key.clone());
        } else {
            entered.push(key.clone());
        }
    }

    let exited = existing
        .into_iter()
        .filter(|k| !seen.contains(k))
        .cloned()
        .collect();

    Reconciliation {
        entered,
        updated,
        exited,
    }
}

/// Identity of a feature inside its route: its timestamp, else its position in the sequence.
pub fn feature_key(feature: &Feature, ordinal: usize) -> String {
    match &feature.properties.time {
        Some(time) => time.clone(),
        None => format!("#{ordinal}"),
    }
}

/// Keys for every feature of a route, unique within it.
///
/// Fixes that share a timestamp are told apart by occurrence: the first
/// keeps the bare time, later ones get `time#1`, `time#2` and so on.
pub fn feature_keys(features: &[Feature]) -> Vec<String> {
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    features
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let key = feature_key(f, i);
            let n = occurrences.entry(key.clone()).or_insert(0);
            let unique = if *n == 0 { key } else { format!("{key}#{n}") };
            *n += 1;
            unique
        })
        .collect()
}

/// Linear SVG path through `points`.
pub fn path_data(points: &[Point]) -> String {
    let mut d = String::with_capacity(points.len() * 16);
    for (i, p) in points.iter().enumerate() {
        d.push(if i == 0 { 'M' } else { 'L' });
        d.push_str(&format!("{},{}", p.x, p.y));
    }
    d
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaypointElement {
    pub key: String,
    pub datum: LngLat,
    pub center: Point,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteElement {
    pub key: String,
    pub kind: TransportKind,
    pub waypoints: Vec<WaypointElement>,
    /// Projected path vertices, one per waypoint.
    pub path: Vec<Point>,
    /// `None` while the route has no drawable point.
    pub frame: Option<OverlayFrame>,
}

impl RouteElement {
    fn new(key: &str, kind: TransportKind) -> Self {
        RouteElement {
            key: key.to_string(),
            kind,
            waypoints: Vec::new(),
            path: Vec::new(),
            frame: None,
        }
    }

    fn bind_features(&mut self, features: &[Feature], vt: &ViewportTransform) -> Reconciliation<String> {
        let mut seen = HashSet::new();
        let incoming: Vec<(String, LngLat)> = features
            .iter()
            .zip(feature_keys(features))
            .filter_map(|(f, key)| f.lng_lat().map(|p| (key, p)))
            .filter(|(key, _)| seen.insert(key.clone()))
            .collect();

        let existing: Vec<String> = self.waypoints.iter().map(|w| w.key.clone()).collect();
        let diff = reconcile(existing.iter(), incoming.iter().map(|(k, _)| k));

        let mut previous: HashMap<String, WaypointElement> = self
            .waypoints
            .drain(..)
            .map(|w| (w.key.clone(), w))
            .collect();

        self.waypoints = incoming
            .into_iter()
            .map(|(key, datum)| {
                let mut el = previous.remove(&key).unwrap_or_else(|| WaypointElement {
                    key,
                    datum,
                    center: Point::default(),
                    radius: WAYPOINT_RADIUS,
                });
                el.datum = datum;
                el
            })
            .collect();

        self.reproject(vt);
        diff
    }

    fn reproject(&mut self, vt: &ViewportTransform) {
        for w in &mut self.waypoints {
            w.center = vt.project(&w.datum);
        }
        self.path = self.waypoints.iter().map(|w| w.center).collect();
        self.frame = PixelBounds::from_points(&self.path).map(|b| OverlayFrame::around(&b));
    }

    pub fn path_data(&self) -> String {
        path_data(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BindSummary {
    pub routes: Reconciliation<String>,
    pub waypoints_entered: usize,
    pub waypoints_updated: usize,
    pub waypoints_exited: usize,
}

/// Screen elements for every bound route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayLayer {
    routes: Vec<RouteElement>,
}

impl OverlayLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile the layer with `collections` and position every surviving element.
    pub fn bind(&mut self, collections: &[Collection], vt: &ViewportTransform) -> BindSummary {
        let existing: Vec<String> = self.routes.iter().map(|r| r.key.clone()).collect();
        let routes = reconcile(existing.iter(), collections.iter().map(|c| &c.key));

        let mut previous: HashMap<String, RouteElement> = self
            .routes
            .drain(..)
            .map(|r| (r.key.clone(), r))
            .collect();

        let mut waypoints_entered = 0;
        let mut waypoints_updated = 0;
        let mut waypoints_exited = 0;
        let mut seen = HashSet::new();
        let mut next = Vec::with_capacity(collections.len());

        for c in collections {
            if !seen.insert(c.key.as_str()) {
                continue;
            }
            let mut el = previous
                .remove(&c.key)
                .unwrap_or_else(|| RouteElement::new(&c.key, c.kind));
            el.kind = c.kind;
            let diff = el.bind_features(&c.features, vt);
            waypoints_entered += diff.entered.len();
            waypoints_updated += diff.updated.len();
            waypoints_exited += diff.exited.len();
            next.push(el);
        }

        waypoints_exited += previous.values().map(|r| r.waypoints.len()).sum::<usize>();
        self.routes = next;

        BindSummary {
            routes,
            waypoints_entered,
            waypoints_updated,
            waypoints_exited,
        }
    }

    /// Re-run the projector for every element after a viewport change.
    pub fn reproject(&mut self, vt: &ViewportTransform) {
        for r in &mut self.routes {
            r.reproject(vt);
        }
    }

    pub fn routes(&self) -> &[RouteElement] {
        &self.routes
    }

    pub fn route(&self, key: &str) -> Option<&RouteElement> {
        self.routes.iter().find(|r| r.key == key)
    }

    pub fn circle_count(&self) -> usize {
        self.routes.iter().map(|r| r.waypoints.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
