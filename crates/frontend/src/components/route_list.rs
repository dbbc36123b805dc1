use commute_shared::dates::parse_timestamp;
use commute_shared::geo::path_length_meters;
use commute_shared::models::{Collection, TransportKind};
use dioxus::prelude::*;

use crate::components::map_view::kind_color;

/// What the side panel shows for one route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub key: String,
    pub kind: TransportKind,
    pub points: usize,
    pub distance_m: f64,
    pub start: Option<String>,
    pub end: Option<String>,
    pub carbon_kg: Option<f64>,
}

fn clock_time(ts: &str) -> Option<String> {
    parse_timestamp(ts).map(|dt| dt.format("%H:%M").to_string())
}

pub fn route_summary(collection: &Collection) -> RouteSummary {
    let positions = collection.positions();
    let mut times = collection
        .features
        .iter()
        .filter_map(|f| f.properties.time.as_deref())
        .filter_map(clock_time);
    let start = times.next();
    let end = times.last().or_else(|| start.clone());

    RouteSummary {
        key: collection.key.clone(),
        kind: collection.kind,
        points: positions.len(),
        distance_m: path_length_meters(&positions),
        start,
        end,
        carbon_kg: collection.carbon_kg,
    }
}

pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{:.0} m", meters)
    }
}

pub fn format_carbon(kg: f64) -> String {
    format!("{:.2} kg CO\u{2082}", kg)
}

/// Sum of the known estimates; `None` when no route has one.
pub fn total_carbon(summaries: &[RouteSummary]) -> Option<f64> {
    summaries
        .iter()
        .filter_map(|s| s.carbon_kg)
        .fold(None, |acc, kg| Some(acc.unwrap_or(0.0) + kg))
}

#[component]
pub fn RouteList(collections: ReadSignal<Vec<Collection>>) -> Element {
    let summaries: Vec<RouteSummary> = collections.read().iter().map(route_summary).collect();

    if summaries.is_empty() {
        return rsx! {
            div { class: "panel",
                h3 { "Routes" }
                p { style: "color: var(--text-dim); font-size: 13px;",
                    "No transport recorded."
                }
            }
        };
    }

    let total: f64 = summaries.iter().map(|s| s.distance_m).sum();
    let carbon = total_carbon(&summaries);

    rsx! {
        div { class: "panel",
            h3 { "Routes" }
            for s in summaries {
                div {
                    key: "{s.key}",
                    class: "route-row",
                    span {
                        class: "route-swatch",
                        style: "background: {kind_color(s.kind)};",
                    }
                    span { class: "route-kind", "{s.kind}" }
                    span { class: "route-distance", "{format_distance(s.distance_m)}" }
                    if let (Some(start), Some(end)) = (&s.start, &s.end) {
                        span { class: "route-times", "{start}\u{2013}{end}" }
                    }
                    span { class: "route-points", "{s.points} pts" }
                    if let Some(kg) = s.carbon_kg {
                        span { class: "route-carbon", "{format_carbon(kg)}" }
                    }
                }
            }
            div { class: "route-total",
                "Total: {format_distance(total)}"
                if let Some(kg) = carbon {
                    ", {format_carbon(kg)}"
                }
            }
        }
    }
}
