use commute_shared::dates::parse_timestamp;
use commute_shared::models::Transport;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const TRANSPORTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("transports");
/// `{date}|{id}` -> id, so a day is one range scan.
const DAY_INDEX_TABLE: TableDefinition<&str, &str> = TableDefinition::new("transports_by_day");

fn day_key(date: &str, id: &str) -> String {
    format!("{date}|{id}")
}

/// Bounds covering every index key of `date`. `}` sorts right after `|`.
fn day_range(date: &str) -> (String, String) {
    (format!("{date}|"), format!("{date}}}"))
}

pub struct Storage {
    db: Database,
    path: PathBuf,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Arc<Self>, String> {
        let db = Database::create(path)
            .map_err(|e| format!("Failed to open database at {}: {}", path.display(), e))?;

        // Ensure tables exist
        let write_txn = db.begin_write().map_err(|e| e.to_string())?;
        {
            let table = write_txn
                .open_table(TRANSPORTS_TABLE)
                .map_err(|e| e.to_string())?;
            let mut index = write_txn
                .open_table(DAY_INDEX_TABLE)
                .map_err(|e| e.to_string())?;

            // Databases written before the day index existed
            if index.is_empty().map_err(|e| e.to_string())?
                && !table.is_empty().map_err(|e| e.to_string())?
            {
                let mut indexed = 0usize;
                for entry in table.iter().map_err(|e| e.to_string())? {
                    let (id, value) = entry.map_err(|e| e.to_string())?;
                    let transport: Transport =
                        serde_json::from_slice(value.value()).map_err(|e| e.to_string())?;
                    index
                        .insert(day_key(&transport.date, id.value()).as_str(), id.value())
                        .map_err(|e| e.to_string())?;
                    indexed += 1;
                }
                tracing::info!(indexed, "Rebuilt day index");
            }
        }
        write_txn.commit().map_err(|e| e.to_string())?;

        Ok(Arc::new(Storage {
            db,
            path: path.to_path_buf(),
        }))
    }

    pub fn save_transport(&self, transport: &Transport) -> Result<(), String> {
        self.save_transports(std::slice::from_ref(transport))
    }

    /// Store a batch in a single write transaction.
    pub fn save_transports(&self, transports: &[Transport]) -> Result<(), String> {
        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        {
            let mut table = write_txn
                .open_table(TRANSPORTS_TABLE)
                .map_err(|e| e.to_string())?;
            let mut index = write_txn
                .open_table(DAY_INDEX_TABLE)
                .map_err(|e| e.to_string())?;
            for transport in transports {
                let json = serde_json::to_vec(transport).map_err(|e| e.to_string())?;
                let id_str = transport.id.to_string();
                let previous = table
                    .insert(id_str.as_str(), json.as_slice())
                    .map_err(|e| e.to_string())?;

                // A re-save may move the trip to another day
                if let Some(old) = previous {
                    let old: Transport =
                        serde_json::from_slice(old.value()).map_err(|e| e.to_string())?;
                    index
                        .remove(day_key(&old.date, &id_str).as_str())
                        .map_err(|e| e.to_string())?;
                }
                index
                    .insert(day_key(&transport.date, &id_str).as_str(), id_str.as_str())
                    .map_err(|e| e.to_string())?;
            }
        }
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn get_transport(&self, id: &str) -> Result<Option<Transport>, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn
            .open_table(TRANSPORTS_TABLE)
            .map_err(|e| e.to_string())?;

        match table.get(id).map_err(|e| e.to_string())? {
            Some(value) => {
                let transport: Transport =
                    serde_json::from_slice(value.value()).map_err(|e| e.to_string())?;
                Ok(Some(transport))
            }
            None => Ok(None),
        }
    }

    /// Every stored transport, in key order.
    pub fn all_transports(&self) -> Result<Vec<Transport>, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn
            .open_table(TRANSPORTS_TABLE)
            .map_err(|e| e.to_string())?;

        let mut out = Vec::new();
        for entry in table.iter().map_err(|e| e.to_string())? {
            let (_, value) = entry.map_err(|e| e.to_string())?;
            let transport: Transport =
                serde_json::from_slice(value.value()).map_err(|e| e.to_string())?;
            out.push(transport);
        }
        Ok(out)
    }

    /// Transports whose local start day is `date`, ordered by start time.
    pub fn transports_on(&self, date: &str) -> Result<Vec<Transport>, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn
            .open_table(TRANSPORTS_TABLE)
            .map_err(|e| e.to_string())?;
        let index = read_txn
            .open_table(DAY_INDEX_TABLE)
            .map_err(|e| e.to_string())?;

        let (lo, hi) = day_range(date);
        let mut day = Vec::new();
        for entry in index
            .range(lo.as_str()..hi.as_str())
            .map_err(|e| e.to_string())?
        {
            let (_, id) = entry.map_err(|e| e.to_string())?;
            let Some(value) = table.get(id.value()).map_err(|e| e.to_string())? else {
                tracing::warn!(id = id.value(), date, "Day index points at a missing transport");
                continue;
            };
            let transport: Transport =
                serde_json::from_slice(value.value()).map_err(|e| e.to_string())?;
            day.push(transport);
        }
        day.sort_by_key(|t| parse_timestamp(&t.start_time));
        Ok(day)
    }

    /// Distinct days that have at least one transport, ascending.
    pub fn dates(&self) -> Result<Vec<String>, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let index = read_txn
            .open_table(DAY_INDEX_TABLE)
            .map_err(|e| e.to_string())?;

        let mut days = BTreeSet::new();
        for entry in index.iter().map_err(|e| e.to_string())? {
            let (key, _) = entry.map_err(|e| e.to_string())?;
            if let Some((date, _)) = key.value().split_once('|') {
                days.insert(date.to_string());
            }
        }
        Ok(days.into_iter().collect())
    }

    pub fn count_transports(&self) -> Result<u64, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn
            .open_table(TRANSPORTS_TABLE)
            .map_err(|e| e.to_string())?;
        table.len().map_err(|e| e.to_string())
    }

    pub fn db_size_bytes(&self) -> Result<u64, String> {
        std::fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| e.to_string())
    }

    pub fn delete_transport(&self, id: &str) -> Result<bool, String> {
        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        let removed = {
            let mut table = write_txn
                .open_table(TRANSPORTS_TABLE)
                .map_err(|e| e.to_string())?;
            let mut index = write_txn
                .open_table(DAY_INDEX_TABLE)
                .map_err(|e| e.to_string())?;
            let removed = match table.remove(id).map_err(|e| e.to_string())? {
                Some(old) => {
                    let old: Transport =
                        serde_json::from_slice(old.value()).map_err(|e| e.to_string())?;
                    index
                        .remove(day_key(&old.date, id).as_str())
                        .map_err(|e| e.to_string())?;
                    true
                }
                None => false,
            };
            removed
        };
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(removed)
    }
}
