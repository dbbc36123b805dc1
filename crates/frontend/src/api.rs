use commute_shared::models::{parse_payload, Collection};
use serde::{Deserialize, Serialize};

/// Static sample shown when no day is selected.
pub const SAMPLE_PATH: &str = "/static/data/routes.json";

#[derive(Debug, Clone, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

fn origin() -> Result<String, String> {
    // In production, same origin. In dev, might be different.
    web_sys::window()
        .ok_or_else(|| "No window".to_string())?
        .location()
        .origin()
        .map_err(|_| "Cannot read page origin".to_string())
}

/// URL of the day endpoint for `date`, with the date form-encoded.
pub fn transports_url(origin: &str, date: &str) -> Result<reqwest::Url, String> {
    let mut url = reqwest::Url::parse(&format!("{}/transports", origin))
        .map_err(|e| format!("Invalid origin {}: {}", origin, e))?;
    url.query_pairs_mut().append_pair("date", date);
    Ok(url)
}

async fn query<T: for<'de> Deserialize<'de>>(
    query_str: &str,
    variables: Option<serde_json::Value>,
) -> Result<T, String> {
    let req = GraphQLRequest {
        query: query_str.to_string(),
        variables,
    };

    let resp = reqwest::Client::new()
        .post(format!("{}/graphql", origin()?))
        .json(&req)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let gql_resp: GraphQLResponse<T> = resp.json().await.map_err(|e| e.to_string())?;

    if let Some(errors) = gql_resp.errors {
        if !errors.is_empty() {
            return Err(errors[0].message.clone());
        }
    }

    gql_resp.data.ok_or_else(|| "No data returned".to_string())
}

/// Turn a route document response into drawable collections.
///
/// Error bodies of the form `{"error": "..."}` surface their message.
pub fn decode_routes(status: u16, body: &str) -> Result<Vec<Collection>, String> {
    if !(200..300).contains(&status) {
        return Err(match serde_json::from_str::<ErrorBody>(body) {
            Ok(e) => e.error,
            Err(_) => format!("Request failed with status {}", status),
        });
    }
    parse_payload(body).map_err(|e| e.to_string())
}

async fn fetch_routes(url: impl reqwest::IntoUrl) -> Result<Vec<Collection>, String> {
    let resp = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let status = resp.status().as_u16();
    let body = resp.text().await.map_err(|e| e.to_string())?;
    decode_routes(status, &body)
}

// API functions

/// Routes recorded on `date`.
pub async fn fetch_transports(date: &str) -> Result<Vec<Collection>, String> {
    fetch_routes(transports_url(&origin()?, date)?).await
}

pub async fn fetch_sample() -> Result<Vec<Collection>, String> {
    fetch_routes(format!("{}{}", origin()?, SAMPLE_PATH)).await
}

#[derive(Deserialize)]
pub struct DatesResponse {
    pub dates: Vec<String>,
}

/// Days that have data, ascending.
pub async fn fetch_dates() -> Result<Vec<String>, String> {
    let resp: DatesResponse = query(r#"query { dates }"#, None).await?;
    Ok(resp.dates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use commute_shared::models::TransportKind;

    // --- GraphQL request serialization ---

    #[test]
    fn test_graphql_request_omits_null_variables() {
        let req = GraphQLRequest {
            query: "query { dates }".to_string(),
            variables: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["query"], "query { dates }");
        assert!(json.get("variables").is_none());
    }

    // --- Response deserialization ---

    #[test]
    fn test_dates_response_deserializes() {
        let json = r#"{"dates":["2014-05-12","2014-05-13"]}"#;
        let resp: DatesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.dates, vec!["2014-05-12", "2014-05-13"]);
    }

    #[test]
    fn test_graphql_error_response() {
        let json = r#"{"data":null,"errors":[{"message":"Invalid date: x"}]}"#;
        let resp: GraphQLResponse<DatesResponse> = serde_json::from_str(json).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.errors.unwrap()[0].message, "Invalid date: x");
    }

    // --- Route documents ---

    #[test]
    fn test_decode_routes_array() {
        let body = r#"[{"id":"a","type":"bus","geojson":{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"time":"t1"},"geometry":{"type":"Point","coordinates":[-73.99,40.72]}}
        ]}}]"#;
        let collections = decode_routes(200, body).unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].key, "a");
        assert_eq!(collections[0].kind, TransportKind::Bus);
    }

    #[test]
    fn test_decode_routes_empty_day() {
        assert!(decode_routes(200, "[]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_routes_error_body() {
        let err = decode_routes(400, r#"{"error":"Invalid date: nope (expected YYYY-MM-DD)"}"#)
            .unwrap_err();
        assert!(err.starts_with("Invalid date"));
    }

    #[test]
    fn test_decode_routes_opaque_error() {
        let err = decode_routes(502, "<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(err, "Request failed with status 502");
    }

    #[test]
    fn test_decode_routes_malformed_document() {
        assert!(decode_routes(200, r#"{"unexpected": true}"#).is_err());
        assert!(decode_routes(200, "not json").is_err());
    }

    // --- URL builder ---

    #[test]
    fn test_transports_url() {
        assert_eq!(
            transports_url("http://localhost:3000", "2014-05-12").unwrap().as_str(),
            "http://localhost:3000/transports?date=2014-05-12"
        );
    }

    #[test]
    fn test_transports_url_encodes_date() {
        let url = transports_url("http://localhost:3000", "2014-05-12 x&y#z").unwrap();
        assert_eq!(url.query(), Some("date=2014-05-12+x%26y%23z"));
        assert!(url.fragment().is_none());
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("date".to_string(), "2014-05-12 x&y#z".to_string())]);
    }

    #[test]
    fn test_transports_url_rejects_bad_origin() {
        assert!(transports_url("not an origin", "2014-05-12").is_err());
    }
}
