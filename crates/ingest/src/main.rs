mod moves;

use serde::Deserialize;

use crate::moves::{extract_transports, StorylineDay, TransportPayload};

const DEFAULT_GRAPHQL_URL: &str = "http://localhost:3000/graphql";

const USAGE: &str =
    "Usage: cargo run -p commute-ingest -- --file storyline.json [--url http://host/graphql] [--dry-run]";

const IMPORT_MUTATION: &str = "mutation Import($input: [TransportInput!]!) { importTransports(input: $input) { id date kind } }";

// --- GraphQL response types ---

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlData {
    import_transports: Vec<ImportedTransport>,
}

#[derive(Deserialize)]
struct ImportedTransport {
    id: String,
    date: String,
    kind: String,
}

fn import_request(transports: &[TransportPayload]) -> serde_json::Value {
    serde_json::json!({
        "query": IMPORT_MUTATION,
        "variables": { "input": transports },
    })
}

fn get_arg(flag: &str) -> Option<String> {
    std::env::args()
        .skip_while(|a| a != flag)
        .nth(1)
}

fn has_flag(flag: &str) -> bool {
    std::env::args().any(|a| a == flag)
}

fn main() {
    let file = get_arg("--file").unwrap_or_else(|| {
        eprintln!("Error: --file <storyline.json> is required");
        eprintln!("{USAGE}");
        std::process::exit(1);
    });

    let graphql_url = get_arg("--url").unwrap_or_else(|| DEFAULT_GRAPHQL_URL.to_string());
    let dry_run = has_flag("--dry-run");

    eprintln!("Reading storyline from {file}...");
    let text = std::fs::read_to_string(&file).unwrap_or_else(|e| {
        eprintln!("Failed to read {file}: {e}");
        std::process::exit(1);
    });

    let days: Vec<StorylineDay> = serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Failed to parse storyline: {e}");
        std::process::exit(1);
    });

    let extraction = extract_transports(&days);
    for reason in &extraction.skipped {
        eprintln!("Warning: skipped {reason}");
    }
    eprintln!(
        "Found {} transport(s) across {} day(s)",
        extraction.transports.len(),
        days.len()
    );

    if extraction.transports.is_empty() {
        eprintln!("Nothing to import.");
        return;
    }

    let request = import_request(&extraction.transports);

    if dry_run {
        match serde_json::to_string_pretty(&request) {
            Ok(body) => println!("{body}"),
            Err(e) => {
                eprintln!("Failed to encode payload: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    eprintln!("Posting to {graphql_url}...");
    let client = reqwest::blocking::Client::new();
    let resp = client
        .post(&graphql_url)
        .json(&request)
        .send()
        .unwrap_or_else(|e| {
            eprintln!("Failed to post transports: {e}");
            std::process::exit(1);
        });

    let body: GraphQlResponse = resp.json().unwrap_or_else(|e| {
        eprintln!("Failed to parse import response: {e}");
        std::process::exit(1);
    });

    if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
        for e in errors {
            eprintln!("Import failed: {}", e.message);
        }
        std::process::exit(1);
    }

    let imported = body.data.map(|d| d.import_transports).unwrap_or_default();
    for t in &imported {
        println!("{}\t{}\t{}", t.date, t.kind, t.id);
    }
    eprintln!("Imported {} transport(s).", imported.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::TrackPointPayload;

    #[test]
    fn test_import_request_shape() {
        let transports = vec![TransportPayload {
            kind: "BUS".to_string(),
            start_time: "2014-05-12T08:00:00+00:00".to_string(),
            end_time: "2014-05-12T08:10:00+00:00".to_string(),
            distance: 1200.0,
            duration: None,
            track_points: vec![TrackPointPayload {
                lat: 40.72,
                lon: -73.99,
                time: "2014-05-12T08:00:00+00:00".to_string(),
            }],
        }];
        let req = import_request(&transports);
        assert!(req["query"].as_str().unwrap().contains("importTransports"));
        let input = &req["variables"]["input"][0];
        assert_eq!(input["kind"], "BUS");
        assert!(input.get("duration").is_none());
    }

    #[test]
    fn test_error_response_parses() {
        let body = r#"{"data":null,"errors":[{"message":"Transport 0: Invalid start time: x"}]}"#;
        let resp: GraphQlResponse = serde_json::from_str(body).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.errors.unwrap()[0].message, "Transport 0: Invalid start time: x");
    }

    #[test]
    fn test_success_response_parses() {
        let body = r#"{"data":{"importTransports":[{"id":"abc","date":"2014-05-12","kind":"SUBWAY"}]}}"#;
        let resp: GraphQlResponse = serde_json::from_str(body).unwrap();
        let data = resp.data.unwrap();
        assert_eq!(data.import_transports[0].kind, "SUBWAY");
    }
}
