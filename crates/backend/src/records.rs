use chrono::{DateTime, FixedOffset};
use commute_shared::dates::{parse_timestamp, DATE_FORMAT};
use commute_shared::geo::path_length_meters;
use commute_shared::models::{FeatureCollection, RouteObject, Transport, TransportKind};
use uuid::Uuid;

/// A transport as submitted, before its derived fields are filled in.
#[derive(Debug, Clone)]
pub struct TransportDraft {
    pub id: Option<Uuid>,
    pub kind: TransportKind,
    pub start_time: String,
    pub end_time: Option<String>,
    pub distance: Option<f64>,
    pub duration: Option<f64>,
    pub carbon_kg: Option<f64>,
    pub geojson: FeatureCollection,
}

impl TransportDraft {
    /// Validate the draft and derive date, distance and duration.
    pub fn into_transport(self) -> Result<Transport, String> {
        let positions = self.geojson.positions();
        if positions.len() < 2 {
            return Err(format!(
                "Transport needs at least two track points, got {}",
                positions.len()
            ));
        }

        let start: DateTime<FixedOffset> = parse_timestamp(&self.start_time)
            .ok_or_else(|| format!("Invalid start time: {}", self.start_time))?;
        let end: DateTime<FixedOffset> = match &self.end_time {
            Some(ts) => parse_timestamp(ts).ok_or_else(|| format!("Invalid end time: {}", ts))?,
            None => start,
        };
        if end < start {
            return Err(format!(
                "End time {} is before start time {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            ));
        }

        Ok(Transport {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            kind: self.kind,
            date: start.date_naive().format(DATE_FORMAT).to_string(),
            start_time: start.to_rfc3339(),
            end_time: end.to_rfc3339(),
            distance: self
                .distance
                .unwrap_or_else(|| path_length_meters(&positions)),
            duration: self
                .duration
                .unwrap_or_else(|| (end - start).num_seconds() as f64),
            carbon_kg: self.carbon_kg,
            geojson: self.geojson,
        })
    }
}

impl TryFrom<RouteObject> for TransportDraft {
    type Error = String;

    fn try_from(route: RouteObject) -> Result<Self, Self::Error> {
        // Routes without explicit times fall back to their first and last
        // readable fixes
        let feature_time = |first: bool| {
            let mut times = route
                .geojson
                .features
                .iter()
                .filter_map(|f| f.properties.time.clone())
                .filter(|t| parse_timestamp(t).is_some());
            if first {
                times.next()
            } else {
                times.last()
            }
        };
        let start_time = route
            .start_time
            .clone()
            .or_else(|| feature_time(true))
            .ok_or_else(|| "Route has no start time".to_string())?;
        let end_time = route.end_time.clone().or_else(|| feature_time(false));

        Ok(TransportDraft {
            id: route.id.as_deref().and_then(|s| Uuid::parse_str(s).ok()),
            kind: route.kind,
            start_time,
            end_time,
            distance: route.distance,
            duration: route.duration,
            carbon_kg: route.carbon_kg,
            geojson: route.geojson,
        })
    }
}
