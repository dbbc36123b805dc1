use std::collections::BTreeMap;
use std::sync::Arc;

use async_graphql::{Context, Enum, InputObject, Json, Object, SimpleObject, ID};
use commute_shared::{
    dates,
    models::{self, FeatureCollection, TrackPoint, TransportKind},
};

use crate::records::TransportDraft;
use crate::storage::Storage;

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
pub enum GqlTransportKind {
    Subway,
    Bus,
    Car,
    Airplane,
    Transport,
}

impl From<TransportKind> for GqlTransportKind {
    fn from(k: TransportKind) -> Self {
        match k {
            TransportKind::Subway => GqlTransportKind::Subway,
            TransportKind::Bus => GqlTransportKind::Bus,
            TransportKind::Car => GqlTransportKind::Car,
            TransportKind::Airplane => GqlTransportKind::Airplane,
            TransportKind::Transport => GqlTransportKind::Transport,
        }
    }
}

impl From<GqlTransportKind> for TransportKind {
    fn from(k: GqlTransportKind) -> Self {
        match k {
            GqlTransportKind::Subway => TransportKind::Subway,
            GqlTransportKind::Bus => TransportKind::Bus,
            GqlTransportKind::Car => TransportKind::Car,
            GqlTransportKind::Airplane => TransportKind::Airplane,
            GqlTransportKind::Transport => TransportKind::Transport,
        }
    }
}

// GraphQL output types

#[derive(SimpleObject)]
pub struct GqlTransport {
    pub id: ID,
    pub kind: GqlTransportKind,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub distance: f64,
    pub duration: f64,
    pub carbon_kg: Option<f64>,
    pub geojson: Json<FeatureCollection>,
}

impl From<models::Transport> for GqlTransport {
    fn from(t: models::Transport) -> Self {
        GqlTransport {
            id: ID(t.id.to_string()),
            kind: t.kind.into(),
            date: t.date,
            start_time: t.start_time,
            end_time: t.end_time,
            distance: t.distance,
            duration: t.duration,
            carbon_kg: t.carbon_kg,
            geojson: Json(t.geojson),
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlKindStat {
    pub kind: GqlTransportKind,
    pub count: u64,
    /// Meters.
    pub distance: f64,
    /// Sum over trips with a known estimate.
    pub carbon_kg: f64,
}

#[derive(SimpleObject)]
pub struct GqlStats {
    pub total_transports: u64,
    pub db_size_bytes: u64,
    pub total_carbon_kg: f64,
    pub by_kind: Vec<GqlKindStat>,
}

// Input types

#[derive(InputObject)]
pub struct TrackPointInput {
    pub lat: f64,
    pub lon: f64,
    pub time: String,
}

#[derive(InputObject)]
pub struct TransportInput {
    pub kind: GqlTransportKind,
    pub start_time: String,
    pub end_time: Option<String>,
    pub distance: Option<f64>,
    pub duration: Option<f64>,
    pub carbon_kg: Option<f64>,
    pub track_points: Vec<TrackPointInput>,
}

impl From<TransportInput> for TransportDraft {
    fn from(input: TransportInput) -> Self {
        let points: Vec<TrackPoint> = input
            .track_points
            .into_iter()
            .map(|p| TrackPoint {
                lat: p.lat,
                lon: p.lon,
                time: p.time,
            })
            .collect();
        TransportDraft {
            id: None,
            kind: input.kind.into(),
            start_time: input.start_time,
            end_time: input.end_time,
            distance: input.distance,
            duration: input.duration,
            carbon_kg: input.carbon_kg,
            geojson: FeatureCollection::from_track_points(&points),
        }
    }
}

fn check_date(date: &str) -> async_graphql::Result<()> {
    match dates::parse_date(date) {
        Some(_) => Ok(()),
        None => Err(async_graphql::Error::new(format!(
            "Invalid date: {} (expected YYYY-MM-DD)",
            date
        ))),
    }
}

// Query root

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Transports that started on `date`, in start order.
    async fn transports(
        &self,
        ctx: &Context<'_>,
        date: String,
    ) -> async_graphql::Result<Vec<GqlTransport>> {
        check_date(&date)?;
        let storage = ctx.data::<Arc<Storage>>()?;
        let day = storage
            .transports_on(&date)
            .map_err(async_graphql::Error::new)?;
        Ok(day.into_iter().map(GqlTransport::from).collect())
    }

    async fn transport(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<Option<GqlTransport>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let transport = storage
            .get_transport(&id)
            .map_err(async_graphql::Error::new)?;
        Ok(transport.map(GqlTransport::from))
    }

    /// Days that have data, ascending.
    async fn dates(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<String>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        storage.dates().map_err(async_graphql::Error::new)
    }

    async fn stats(&self, ctx: &Context<'_>) -> async_graphql::Result<GqlStats> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let total_transports = storage
            .count_transports()
            .map_err(async_graphql::Error::new)?;
        let db_size_bytes = storage.db_size_bytes().map_err(async_graphql::Error::new)?;

        let mut totals: BTreeMap<&'static str, (TransportKind, u64, f64, f64)> = BTreeMap::new();
        for t in storage
            .all_transports()
            .map_err(async_graphql::Error::new)?
        {
            let entry = totals.entry(t.kind.tag()).or_insert((t.kind, 0, 0.0, 0.0));
            entry.1 += 1;
            entry.2 += t.distance;
            entry.3 += t.carbon_kg.unwrap_or(0.0);
        }

        let by_kind: Vec<GqlKindStat> = totals
            .into_values()
            .map(|(kind, count, distance, carbon_kg)| GqlKindStat {
                kind: kind.into(),
                count,
                distance,
                carbon_kg,
            })
            .collect();

        Ok(GqlStats {
            total_transports,
            db_size_bytes,
            total_carbon_kg: by_kind.iter().map(|k| k.carbon_kg).sum(),
            by_kind,
        })
    }
}

// Mutation root

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Store a batch of transports. Nothing is stored if any item is invalid.
    async fn import_transports(
        &self,
        ctx: &Context<'_>,
        input: Vec<TransportInput>,
    ) -> async_graphql::Result<Vec<GqlTransport>> {
        let storage = ctx.data::<Arc<Storage>>()?;

        let transports = input
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                TransportDraft::from(item)
                    .into_transport()
                    .map_err(|e| format!("Transport {}: {}", i, e))
            })
            .collect::<Result<Vec<_>, String>>()
            .map_err(async_graphql::Error::new)?;

        storage
            .save_transports(&transports)
            .map_err(async_graphql::Error::new)?;
        tracing::info!(count = transports.len(), "Imported transports");

        Ok(transports.into_iter().map(GqlTransport::from).collect())
    }

    async fn delete_transport(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let storage = ctx.data::<Arc<Storage>>()?;
        storage
            .delete_transport(&id)
            .map_err(async_graphql::Error::new)
    }
}

pub type Schema = async_graphql::Schema<QueryRoot, MutationRoot, async_graphql::EmptySubscription>;

pub fn build_schema(storage: Arc<Storage>) -> Schema {
    async_graphql::Schema::build(QueryRoot, MutationRoot, async_graphql::EmptySubscription)
        .data(storage)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::{temp_storage, transport};

    const IMPORT: &str = r#"
        mutation {
            importTransports(input: [
                {
                    kind: SUBWAY,
                    startTime: "20140512T083000-0400",
                    endTime: "20140512T085000-0400",
                    carbonKg: 0.2,
                    trackPoints: [
                        { lat: 40.72, lon: -73.99, time: "20140512T083000-0400" },
                        { lat: 40.75, lon: -73.98, time: "20140512T085000-0400" }
                    ]
                }
            ]) { id date duration kind }
        }
    "#;

    #[tokio::test]
    async fn test_import_then_query_day() {
        let (_dir, storage) = temp_storage();
        let schema = build_schema(storage.clone());

        let resp = schema.execute(IMPORT).await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        let data = resp.data.into_json().unwrap();
        let imported = &data["importTransports"][0];
        assert_eq!(imported["date"], "2014-05-12");
        assert_eq!(imported["duration"], 1200.0);
        assert_eq!(imported["kind"], "SUBWAY");

        let resp = schema
            .execute(r#"{ transports(date: "2014-05-12") { kind geojson } }"#)
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        let data = resp.data.into_json().unwrap();
        let features = data["transports"][0]["geojson"]["features"]
            .as_array()
            .unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["properties"]["id"], "transport");
    }

    #[tokio::test]
    async fn test_import_is_all_or_nothing() {
        let (_dir, storage) = temp_storage();
        let schema = build_schema(storage.clone());

        let resp = schema
            .execute(
                r#"mutation {
                    importTransports(input: [
                        { kind: BUS, startTime: "20140512T083000Z",
                          trackPoints: [
                            { lat: 1.0, lon: 1.0, time: "a" },
                            { lat: 1.1, lon: 1.0, time: "b" }
                          ] },
                        { kind: CAR, startTime: "20140512T090000Z", trackPoints: [] }
                    ]) { id }
                }"#,
            )
            .await;
        assert_eq!(resp.errors.len(), 1);
        assert!(resp.errors[0].message.starts_with("Transport 1:"));
        assert_eq!(storage.count_transports().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_transports_rejects_bad_date() {
        let (_dir, storage) = temp_storage();
        let schema = build_schema(storage);
        let resp = schema
            .execute(r#"{ transports(date: "12/05/2014") { id } }"#)
            .await;
        assert_eq!(resp.errors.len(), 1);
        assert!(resp.errors[0].message.contains("Invalid date"));
    }

    #[tokio::test]
    async fn test_dates_and_stats() {
        let (_dir, storage) = temp_storage();
        storage
            .save_transports(&[
                transport(TransportKind::Car, "2014-05-12T08:00:00Z"),
                transport(TransportKind::Car, "2014-05-13T08:00:00Z"),
                transport(TransportKind::Bus, "2014-05-13T09:00:00Z"),
            ])
            .unwrap();
        let schema = build_schema(storage);

        let resp = schema
            .execute("{ dates stats { totalTransports dbSizeBytes byKind { kind count distance } } }")
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        let data = resp.data.into_json().unwrap();
        assert_eq!(data["dates"], serde_json::json!(["2014-05-12", "2014-05-13"]));
        assert_eq!(data["stats"]["totalTransports"], 3);
        let by_kind = data["stats"]["byKind"].as_array().unwrap();
        assert_eq!(by_kind.len(), 2);
        // Grouped in tag order: bus before car
        assert_eq!(by_kind[0]["kind"], "BUS");
        assert_eq!(by_kind[1]["count"], 2);
        assert_eq!(by_kind[1]["distance"], 2800.0);
    }

    #[tokio::test]
    async fn test_stats_sum_carbon() {
        let (_dir, storage) = temp_storage();
        let mut a = transport(TransportKind::Car, "2014-05-12T08:00:00Z");
        a.carbon_kg = Some(1.5);
        let mut b = transport(TransportKind::Car, "2014-05-12T17:00:00Z");
        b.carbon_kg = Some(0.5);
        let mut c = transport(TransportKind::Bus, "2014-05-12T12:00:00Z");
        c.carbon_kg = Some(0.25);
        let d = transport(TransportKind::Bus, "2014-05-13T12:00:00Z");
        storage.save_transports(&[a, b, c, d]).unwrap();
        let schema = build_schema(storage);

        let resp = schema
            .execute("{ stats { totalCarbonKg byKind { kind carbonKg } } }")
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        let data = resp.data.into_json().unwrap();
        assert_eq!(data["stats"]["totalCarbonKg"], 2.25);
        let by_kind = data["stats"]["byKind"].as_array().unwrap();
        assert_eq!(by_kind[0]["kind"], "BUS");
        assert_eq!(by_kind[0]["carbonKg"], 0.25);
        assert_eq!(by_kind[1]["carbonKg"], 2.0);
    }

    #[tokio::test]
    async fn test_transport_by_id_and_delete() {
        let (_dir, storage) = temp_storage();
        let t = transport(TransportKind::Airplane, "2014-05-12T08:00:00Z");
        storage.save_transport(&t).unwrap();
        let schema = build_schema(storage);

        let query = format!(r#"{{ transport(id: "{}") {{ kind distance }} }}"#, t.id);
        let data = schema.execute(query.as_str()).await.data.into_json().unwrap();
        assert_eq!(data["transport"]["kind"], "AIRPLANE");

        let mutation = format!(r#"mutation {{ deleteTransport(id: "{}") }}"#, t.id);
        let data = schema.execute(mutation.as_str()).await.data.into_json().unwrap();
        assert_eq!(data["deleteTransport"], true);

        let data = schema.execute(query.as_str()).await.data.into_json().unwrap();
        assert!(data["transport"].is_null());
    }
}
