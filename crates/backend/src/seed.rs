use commute_shared::models::{RouteObject, Transport};
use std::path::Path;

use crate::records::TransportDraft;
use crate::storage::Storage;

/// Read a route array from disk. Records that fail validation are skipped.
pub fn load(seed_file: &Path) -> Result<Vec<Transport>, String> {
    let data = std::fs::read_to_string(seed_file)
        .map_err(|e| format!("Failed to read {}: {}", seed_file.display(), e))?;
    let routes: Vec<RouteObject> = serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse {}: {}", seed_file.display(), e))?;

    let mut transports = Vec::with_capacity(routes.len());
    for (i, route) in routes.into_iter().enumerate() {
        match TransportDraft::try_from(route).and_then(TransportDraft::into_transport) {
            Ok(t) => transports.push(t),
            Err(e) => tracing::warn!(index = i, error = %e, "Skipping seed record"),
        }
    }
    Ok(transports)
}

/// Import the seed file when storage holds nothing yet. Returns how many were stored.
pub fn seed_if_empty(storage: &Storage, seed_file: &Path) -> Result<usize, String> {
    if storage.count_transports()? > 0 {
        return Ok(0);
    }
    if !seed_file.exists() {
        tracing::debug!(path = %seed_file.display(), "No seed file");
        return Ok(0);
    }

    let transports = load(seed_file)?;
    storage.save_transports(&transports)?;
    tracing::info!(
        count = transports.len(),
        path = %seed_file.display(),
        "Seeded transports"
    );
    Ok(transports.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::{temp_storage, transport};
    use commute_shared::models::TransportKind;

    const SEED: &str = r#"[
        {
            "type": "subway",
            "startTime": "2014-05-12T08:30:00-04:00",
            "endTime": "2014-05-12T08:50:00-04:00",
            "geojson": {"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"time": "20140512T083000-0400"},
                 "geometry": {"type": "Point", "coordinates": [-73.99, 40.72]}},
                {"type": "Feature", "properties": {"time": "20140512T085000-0400"},
                 "geometry": {"type": "Point", "coordinates": [-73.98, 40.75]}}
            ]}
        },
        {
            "type": "bus",
            "startTime": "2014-05-12T09:00:00-04:00",
            "geojson": {"type": "FeatureCollection", "features": []}
        }
    ]"#;

    fn seed_file(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn test_load_skips_invalid_records() {
        let file = seed_file(SEED);
        let transports = load(file.path()).unwrap();
        assert_eq!(transports.len(), 1);
        assert_eq!(transports[0].kind, TransportKind::Subway);
        assert_eq!(transports[0].date, "2014-05-12");
    }

    #[test]
    fn test_load_rejects_non_array() {
        let file = seed_file(r#"{"points": []}"#);
        assert!(load(file.path()).is_err());
    }

    #[test]
    fn test_seed_only_when_empty() {
        let file = seed_file(SEED);
        let (_dir, storage) = temp_storage();
        assert_eq!(seed_if_empty(&storage, file.path()).unwrap(), 1);
        assert_eq!(seed_if_empty(&storage, file.path()).unwrap(), 0);
        assert_eq!(storage.count_transports().unwrap(), 1);
    }

    #[test]
    fn test_seed_skipped_when_data_exists() {
        let file = seed_file(SEED);
        let (_dir, storage) = temp_storage();
        storage
            .save_transport(&transport(TransportKind::Car, "2014-01-01T08:00:00Z"))
            .unwrap();
        assert_eq!(seed_if_empty(&storage, file.path()).unwrap(), 0);
    }

    #[test]
    fn test_missing_seed_file_is_not_an_error() {
        let (dir, storage) = temp_storage();
        let missing = dir.path().join("nope.json");
        assert_eq!(seed_if_empty(&storage, &missing).unwrap(), 0);
    }
}
