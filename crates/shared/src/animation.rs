//! Looping marker animation along a route path.

use std::collections::HashMap;

use crate::bind::{BindSummary, RouteElement};
use crate::projection::Point;

/// Time for a marker to travel a whole route once.
pub const DEFAULT_LOOP_MS: f64 = 6000.0;

/// Point at fraction `t` of the path's length. `t` is clamped to `[0, 1]`.
pub fn point_along(path: &[Point], t: f64) -> Option<Point> {
    let first = *path.first()?;
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    if path.len() == 1 {
        return Some(first);
    }
    if t >= 1.0 {
        return path.last().copied();
    }

    let total: f64 = path.windows(2).map(|w| w[0].distance_to(w[1])).sum();
    if total <= 0.0 {
        return Some(first);
    }

    let mut remaining = total * t;
    for w in path.windows(2) {
        let seg = w[0].distance_to(w[1]);
        if seg > 0.0 && remaining <= seg {
            let f = remaining / seg;
            return Some(Point::new(
                w[0].x + (w[1].x - w[0].x) * f,
                w[0].y + (w[1].y - w[0].y) * f,
            ));
        }
        remaining -= seg;
    }
    path.last().copied()
}

/// One marker cycling over its route forever, until cancelled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerLoop {
    pub started_at_ms: f64,
    pub duration_ms: f64,
    cancelled: bool,
}

impl MarkerLoop {
    pub fn new(started_at_ms: f64, duration_ms: f64) -> Self {
        MarkerLoop {
            started_at_ms,
            duration_ms: duration_ms.max(1.0),
            cancelled: false,
        }
    }

    /// Fraction of the current cycle in `[0, 1)`.
    pub fn progress(&self, now_ms: f64) -> f64 {
        let elapsed = (now_ms - self.started_at_ms).max(0.0);
        (elapsed % self.duration_ms) / self.duration_ms
    }

    /// Completed cycles so far.
    pub fn cycle(&self, now_ms: f64) -> u64 {
        ((now_ms - self.started_at_ms).max(0.0) / self.duration_ms) as u64
    }

    pub fn position(&self, now_ms: f64, path: &[Point]) -> Option<Point> {
        if self.cancelled {
            return None;
        }
        point_along(path, self.progress(now_ms))
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Marker loops keyed by route, kept in step with the overlay layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLoops {
    duration_ms: f64,
    loops: HashMap<String, MarkerLoop>,
}

impl Default for MarkerLoops {
    fn default() -> Self {
        MarkerLoops::new(DEFAULT_LOOP_MS)
    }
}

impl MarkerLoops {
    pub fn new(duration_ms: f64) -> Self {
        MarkerLoops {
            duration_ms,
            loops: HashMap::new(),
        }
    }

    /// Start loops for routes that gained an element and cancel loops whose
    /// route was removed. Returns the cancelled route keys.
    pub fn sync(&mut self, summary: &BindSummary, now_ms: f64) -> Vec<String> {
        let mut cancelled = Vec::new();
        for key in &summary.routes.exited {
            if let Some(mut l) = self.loops.remove(key) {
                l.cancel();
                cancelled.push(key.clone());
            }
        }
        for key in summary.routes.entered.iter().chain(&summary.routes.updated) {
            let duration = self.duration_ms;
            self.loops
                .entry(key.clone())
                .or_insert_with(|| MarkerLoop::new(now_ms, duration));
        }
        cancelled
    }

    pub fn get(&self, key: &str) -> Option<&MarkerLoop> {
        self.loops.get(key)
    }

    /// Marker position for `route` at `now_ms`, if it has a live loop and a path.
    pub fn position(&self, route: &RouteElement, now_ms: f64) -> Option<Point> {
        self.loops.get(&route.key)?.position(now_ms, &route.path)
    }

    /// Stop every loop; used when the owning view goes away.
    pub fn cancel_all(&mut self) {
        self.loops.clear();
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}
