use commute_shared::dates::parse_timestamp;
use commute_shared::geo::{path_length_meters, LngLat};
use commute_shared::models::TransportKind;
use serde::{Deserialize, Serialize};

// --- Moves storyline export types ---

#[derive(Deserialize, Debug)]
pub struct StorylineDay {
    /// Moves sends `null` for days without movement.
    pub segments: Option<Vec<Segment>>,
}

#[derive(Deserialize, Debug)]
pub struct Segment {
    pub activities: Option<Vec<Activity>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub activity: String,
    pub group: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub duration: Option<f64>,
    pub distance: Option<f64>,
    #[serde(default)]
    pub track_points: Vec<MovesTrackPoint>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MovesTrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub time: String,
}

// --- importTransports input ---

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TrackPointPayload {
    pub lat: f64,
    pub lon: f64,
    pub time: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransportPayload {
    /// GraphQL enum value, e.g. `SUBWAY`.
    pub kind: String,
    pub start_time: String,
    pub end_time: String,
    pub distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub track_points: Vec<TrackPointPayload>,
}

/// Kind of a Moves activity, or `None` when it is not a transport.
pub fn transport_kind(activity: &str, group: Option<&str>) -> Option<TransportKind> {
    match activity {
        "subway" | "underground" | "train" | "tram" => Some(TransportKind::Subway),
        "bus" => Some(TransportKind::Bus),
        "car" | "taxi" => Some(TransportKind::Car),
        "airplane" => Some(TransportKind::Airplane),
        "transport" => Some(TransportKind::Transport),
        _ if group == Some("transport") => Some(TransportKind::Transport),
        _ => None,
    }
}

/// Moves compact timestamps (and RFC3339) to RFC3339.
pub fn to_rfc3339(ts: &str) -> Result<String, String> {
    parse_timestamp(ts)
        .map(|dt| dt.to_rfc3339())
        .ok_or_else(|| format!("Invalid timestamp: {ts}"))
}

fn to_payload(activity: &Activity, kind: TransportKind) -> Result<TransportPayload, String> {
    if activity.track_points.len() < 2 {
        return Err(format!(
            "only {} track point(s)",
            activity.track_points.len()
        ));
    }

    let track_points = activity
        .track_points
        .iter()
        .map(|tp| {
            Ok(TrackPointPayload {
                lat: tp.lat,
                lon: tp.lon,
                time: to_rfc3339(&tp.time)?,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    let distance = activity.distance.unwrap_or_else(|| {
        let positions: Vec<LngLat> = activity
            .track_points
            .iter()
            .map(|tp| LngLat::new(tp.lon, tp.lat))
            .collect();
        path_length_meters(&positions)
    });

    Ok(TransportPayload {
        kind: kind.tag().to_uppercase(),
        start_time: to_rfc3339(&activity.start_time)?,
        end_time: to_rfc3339(&activity.end_time)?,
        distance,
        duration: activity.duration,
        track_points,
    })
}

#[derive(Debug, Default)]
pub struct Extraction {
    pub transports: Vec<TransportPayload>,
    /// Transport activities that could not be imported, with the reason.
    pub skipped: Vec<String>,
}

/// Pull every transport activity out of a storyline export.
pub fn extract_transports(days: &[StorylineDay]) -> Extraction {
    let mut out = Extraction::default();

    let activities = days
        .iter()
        .filter_map(|d| d.segments.as_ref())
        .flatten()
        .filter_map(|s| s.activities.as_ref())
        .flatten();

    for activity in activities {
        let Some(kind) = transport_kind(&activity.activity, activity.group.as_deref()) else {
            continue;
        };
        match to_payload(activity, kind) {
            Ok(p) => out.transports.push(p),
            Err(e) => out
                .skipped
                .push(format!("{} at {}: {}", activity.activity, activity.start_time, e)),
        }
    }

    out
}
