use commute_shared::animation::MarkerLoops;
use commute_shared::basemap::{self, TileRef, ATTRIBUTION};
use commute_shared::bind::OverlayLayer;
use commute_shared::models::{Collection, TransportKind};
use commute_shared::projection::{Point, ViewportTransform};
use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::logger::tracing::debug;
use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

use crate::coords;

const MAP_CONTAINER_ID: &str = "route-map-container";

/// Drag threshold in pixels; movement below this is treated as a click.
const DRAG_THRESHOLD: f64 = 3.0;

/// Zoom levels per wheel notch.
const WHEEL_ZOOM_STEP: f64 = 0.25;

/// Marker redraw interval, roughly one frame.
const FRAME_INTERVAL_MS: u32 = 16;

const MARKER_RADIUS: f64 = 6.0;

pub fn kind_color(kind: TransportKind) -> &'static str {
    match kind {
        TransportKind::Subway => "#e2574c",
        TransportKind::Bus => "#2d9cdb",
        TransportKind::Car => "#f2a93b",
        TransportKind::Airplane => "#9b51e0",
        TransportKind::Transport => "#4f5d75",
    }
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

/// Zoom change for one wheel event; scrolling up zooms in.
fn wheel_zoom_delta(delta_y: f64) -> f64 {
    if delta_y < 0.0 {
        WHEEL_ZOOM_STEP
    } else if delta_y > 0.0 {
        -WHEEL_ZOOM_STEP
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// SVG builders
// ---------------------------------------------------------------------------

/// One positioned `<svg>` per route, each sized to its own pixel bounds.
fn build_routes_svg(layer: &OverlayLayer) -> String {
    let mut svg = String::with_capacity(4096);
    for route in layer.routes() {
        let Some(frame) = route.frame else {
            continue;
        };
        let color = kind_color(route.kind);
        let tag = route.kind.tag();
        svg.push_str(&format!(
            r#"<svg class="route route-{tag}" width="{}" height="{}" style="position:absolute;left:{}px;top:{}px;overflow:visible;">"#,
            frame.width, frame.height, frame.left, frame.top
        ));
        svg.push_str(&format!(
            r#"<g transform="translate({},{})">"#,
            frame.translate_x, frame.translate_y
        ));
        // A lone vertex still gets its `M` path
        if !route.path.is_empty() {
            svg.push_str(&format!(
                r#"<path class="route-path" d="{}" fill="none" stroke="{color}" stroke-width="3" stroke-opacity="0.8"/>"#,
                route.path_data()
            ));
        }
        for w in &route.waypoints {
            svg.push_str(&format!(
                r#"<circle class="waypoint" cx="{}" cy="{}" r="{}" fill="white" stroke="{color}" stroke-width="1.5"/>"#,
                w.center.x, w.center.y, w.radius
            ));
        }
        svg.push_str("</g></svg>");
    }
    svg
}

/// Animated markers, drawn in container pixels above every route.
fn build_markers_svg(layer: &OverlayLayer, loops: &MarkerLoops, now_ms: f64) -> String {
    let mut svg = String::from(
        r#"<svg xmlns="http://www.w3.org/2000/svg" style="position:absolute;top:0;left:0;width:100%;height:100%;overflow:visible;pointer-events:none;">"#,
    );
    for route in layer.routes() {
        let Some(p) = loops.position(route, now_ms) else {
            continue;
        };
        let color = kind_color(route.kind);
        svg.push_str(&format!(
            r#"<circle class="marker" cx="{}" cy="{}" r="{MARKER_RADIUS}" fill="{color}" stroke="white" stroke-width="2"/>"#,
            p.x, p.y
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn tile_style(tile: &TileRef) -> String {
    format!(
        "position:absolute;left:{}px;top:{}px;width:{}px;height:{}px;",
        tile.left, tile.top, tile.size, tile.size
    )
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

#[component]
pub fn MapView(
    collections: ReadSignal<Vec<Collection>>,
    viewport: Signal<ViewportTransform>,
) -> Element {
    let mut layer = use_signal(OverlayLayer::new);
    let mut loops = use_signal(MarkerLoops::default);
    let mut clock = use_signal(coords::now_ms);

    // New data: reconcile screen elements, then start or cancel marker loops
    use_effect(move || {
        let data = collections.read();
        let vt = *viewport.peek();
        let summary = layer.write().bind(&data, &vt);
        let cancelled = loops.write().sync(&summary, coords::now_ms());
        debug!(
            entered = summary.routes.entered.len(),
            updated = summary.routes.updated.len(),
            exited = summary.routes.exited.len(),
            waypoints_entered = summary.waypoints_entered,
            waypoints_exited = summary.waypoints_exited,
            cancelled_loops = cancelled.len(),
            "Bound route overlay"
        );
    });

    // Any viewport change re-runs the projector before the next paint
    let projected = use_memo(move || {
        let vt = *viewport.read();
        let mut l = layer.read().clone();
        l.reproject(&vt);
        l
    });

    let routes_html = use_memo(move || build_routes_svg(&projected.read()));

    // One repeating ticker drives every marker; stopped when the view goes away
    let ticker = use_hook(move || {
        spawn(async move {
            loop {
                TimeoutFuture::new(FRAME_INTERVAL_MS).await;
                clock.set(coords::now_ms());
            }
        })
    });
    use_drop(move || {
        ticker.cancel();
        if let Ok(mut l) = loops.try_write() {
            l.cancel_all();
        }
    });

    // Drag state
    let mut drag_origin = use_signal(|| None::<(Point, ViewportTransform)>);
    let mut did_drag = use_signal(|| false);

    let markers_html = build_markers_svg(&projected.read(), &loops.read(), clock());
    let vt = viewport();
    let tiles = basemap::visible_tiles(&vt);
    let dragging = *did_drag.read() && drag_origin.read().is_some();
    let container_class = if dragging {
        "map-surface dragging"
    } else {
        "map-surface"
    };

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "{container_class}",

            onresize: move |evt: Event<ResizeData>| {
                if let Ok(size) = evt.data().get_border_box_size() {
                    let current = *viewport.peek();
                    if size.width != current.width || size.height != current.height {
                        viewport.set(current.resized(size.width, size.height));
                    }
                }
            },

            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();
                let step = wheel_zoom_delta(wheel_delta_y(evt.data().delta()));
                if step == 0.0 {
                    return;
                }
                let client = evt.data().client_coordinates();
                let Some(cursor) = coords::pointer_in_container(client.x, client.y, MAP_CONTAINER_ID) else {
                    return;
                };
                let current = *viewport.peek();
                viewport.set(current.zoomed_at(cursor, current.zoom + step));
            },

            onmousedown: move |evt: Event<MouseData>| {
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                let client = evt.client_coordinates();
                drag_origin.set(Some((Point::new(client.x, client.y), *viewport.peek())));
                did_drag.set(false);
            },

            onmousemove: move |evt: Event<MouseData>| {
                let Some((start, start_vt)) = *drag_origin.read() else {
                    return;
                };
                let client = evt.client_coordinates();
                let dx = client.x - start.x;
                let dy = client.y - start.y;

                if !*did_drag.read() && (dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD) {
                    did_drag.set(true);
                }
                if *did_drag.read() {
                    viewport.set(start_vt.panned_by(dx, dy));
                }
            },

            onmouseup: move |_| {
                drag_origin.set(None);
            },

            onmouseleave: move |_| {
                drag_origin.set(None);
            },

            ondoubleclick: move |evt: Event<MouseData>| {
                evt.prevent_default();
                let client = evt.client_coordinates();
                let current = *viewport.peek();
                let cursor = coords::pointer_in_container(client.x, client.y, MAP_CONTAINER_ID)
                    .unwrap_or(Point::new(current.width / 2.0, current.height / 2.0));
                viewport.set(current.zoomed_at(cursor, current.zoom + 1.0));
            },

            div { class: "tile-layer",
                for tile in tiles {
                    img {
                        key: "{tile.z}/{tile.x}/{tile.y}/{tile.left}",
                        class: "tile",
                        src: basemap::tile_url(&tile),
                        style: tile_style(&tile),
                        draggable: "false",
                        alt: "",
                    }
                }
            }

            div {
                class: "overlay-layer",
                dangerous_inner_html: "{routes_html}",
            }

            div {
                class: "marker-layer",
                dangerous_inner_html: "{markers_html}",
            }

            div { class: "attribution", "{ATTRIBUTION}" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commute_shared::geo::LngLat;
    use commute_shared::models::Feature;

    fn vt() -> ViewportTransform {
        ViewportTransform::new(LngLat::new(-73.99, 40.72), 13.0, 800.0, 600.0)
    }

    fn collection(key: &str, kind: TransportKind, points: &[(f64, f64)]) -> Collection {
        Collection {
            key: key.to_string(),
            kind,
            features: points
                .iter()
                .map(|&(lng, lat)| Feature::point(LngLat::new(lng, lat)))
                .collect(),
            carbon_kg: None,
        }
    }

    fn bound(collections: &[Collection]) -> (OverlayLayer, MarkerLoops) {
        let mut layer = OverlayLayer::new();
        let mut loops = MarkerLoops::new(1000.0);
        let summary = layer.bind(collections, &vt());
        loops.sync(&summary, 0.0);
        (layer, loops)
    }

    // --- build_routes_svg tests ---

    #[test]
    fn test_routes_svg_one_frame_per_route() {
        let (layer, _) = bound(&[
            collection("a", TransportKind::Bus, &[(-73.99, 40.72), (-73.98, 40.73)]),
            collection("b", TransportKind::Car, &[(-74.0, 40.70), (-73.99, 40.71), (-73.97, 40.71)]),
        ]);
        let svg = build_routes_svg(&layer);
        assert_eq!(svg.matches("<svg").count(), 2);
        assert_eq!(svg.matches("<path").count(), 2);
        assert_eq!(svg.matches("<circle").count(), layer.circle_count());
        assert!(svg.contains("route-bus"));
        assert!(svg.contains(kind_color(TransportKind::Car)));
    }

    #[test]
    fn test_routes_svg_frame_matches_bounds() {
        let (layer, _) = bound(&[collection(
            "a",
            TransportKind::Subway,
            &[(-73.99, 40.72), (-73.98, 40.73)],
        )]);
        let frame = layer.routes()[0].frame.unwrap();
        let svg = build_routes_svg(&layer);
        assert!(svg.contains(&format!("left:{}px;top:{}px;", frame.left, frame.top)));
        assert!(svg.contains(&format!(
            "translate({},{})",
            frame.translate_x, frame.translate_y
        )));
    }

    #[test]
    fn test_single_point_route_has_path_and_circle() {
        let (layer, _) = bound(&[collection("a", TransportKind::Bus, &[(-73.99, 40.72)])]);
        let route = &layer.routes()[0];
        let svg = build_routes_svg(&layer);
        assert_eq!(svg.matches("<circle").count(), 1);
        assert_eq!(svg.matches("<path").count(), 1);
        assert!(svg.contains(&format!(r#"d="{}""#, route.path_data())));
        assert!(route.path_data().starts_with('M'));
        assert!(!route.path_data().contains('L'));
    }

    #[test]
    fn test_routes_svg_skips_routes_without_points() {
        let (layer, _) = bound(&[collection("empty", TransportKind::Bus, &[])]);
        assert_eq!(layer.routes().len(), 1);
        assert!(build_routes_svg(&layer).is_empty());
    }

    #[test]
    fn test_identical_coordinates_share_position() {
        let (layer, _) = bound(&[
            collection("a", TransportKind::Bus, &[(0.0, 0.0), (1.0, 1.0)]),
            collection("b", TransportKind::Car, &[(0.0, 0.0)]),
        ]);
        let a = &layer.routes()[0].waypoints;
        let b = &layer.routes()[1].waypoints;
        assert_ne!(a[0].center, a[1].center);
        assert_eq!(a[0].center, b[0].center);
    }

    // --- build_markers_svg tests ---

    #[test]
    fn test_markers_start_at_path_start() {
        let (layer, loops) = bound(&[collection(
            "a",
            TransportKind::Bus,
            &[(-73.99, 40.72), (-73.98, 40.73)],
        )]);
        let start = layer.routes()[0].path[0];
        let svg = build_markers_svg(&layer, &loops, 0.0);
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(svg.contains(&format!(r#"cx="{}" cy="{}""#, start.x, start.y)));
    }

    #[test]
    fn test_markers_dropped_with_their_route() {
        let (mut layer, mut loops) = bound(&[
            collection("a", TransportKind::Bus, &[(-73.99, 40.72), (-73.98, 40.73)]),
            collection("b", TransportKind::Car, &[(-73.97, 40.72), (-73.96, 40.73)]),
        ]);
        assert_eq!(build_markers_svg(&layer, &loops, 10.0).matches("<circle").count(), 2);

        let summary = layer.bind(
            &[collection("b", TransportKind::Car, &[(-73.97, 40.72), (-73.96, 40.73)])],
            &vt(),
        );
        loops.sync(&summary, 20.0);
        assert_eq!(build_markers_svg(&layer, &loops, 30.0).matches("<circle").count(), 1);
    }

    // --- input helpers ---

    #[test]
    fn test_wheel_zoom_direction() {
        assert_eq!(wheel_zoom_delta(-120.0), WHEEL_ZOOM_STEP);
        assert_eq!(wheel_zoom_delta(53.0), -WHEEL_ZOOM_STEP);
        assert_eq!(wheel_zoom_delta(0.0), 0.0);
    }

    #[test]
    fn test_tile_style_places_tile() {
        let tile = TileRef {
            x: 1,
            y: 2,
            z: 3,
            left: -12.5,
            top: 40.0,
            size: 256.0,
        };
        assert_eq!(
            tile_style(&tile),
            "position:absolute;left:-12.5px;top:40px;width:256px;height:256px;"
        );
    }
}
