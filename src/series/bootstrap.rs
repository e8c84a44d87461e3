use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{DashError, Result};
use crate::series::epoch_record::EpochRecord;

/// Either a plain list of records, or the epoch-number keyed object the
/// training callback stores (`{"0": {...}, "1": {...}}`).
#[derive(Deserialize)]
#[serde(untagged)]
enum EpochsDocument {
    List(Vec<EpochRecord>),
    Keyed(BTreeMap<String, EpochRecord>),
}

/// Parses the initial epochs document into records in epoch order.
///
/// Keyed documents are ordered by numeric key; a run logged every other
/// epoch (`0`, `2`, `4`) still yields consecutive positions.
pub fn parse_epochs(json: &str) -> Result<Vec<EpochRecord>> {
    let value: Value = serde_json::from_str(json)?;
    if value.is_null() {
        return Err(DashError::Bootstrap("no epochs to load".into()));
    }

    let doc: EpochsDocument = serde_json::from_value(value)
        .map_err(|e| DashError::Bootstrap(e.to_string()))?;

    match doc {
        EpochsDocument::List(records) => Ok(records),
        EpochsDocument::Keyed(map) => {
            let mut keyed = map
                .into_iter()
                .map(|(k, rec)| {
                    k.trim()
                        .parse::<u64>()
                        .map(|n| (n, rec))
                        .map_err(|_| DashError::Bootstrap(format!("epoch key '{}' is not a number", k)))
                })
                .collect::<Result<Vec<_>>>()?;
            keyed.sort_by_key(|(n, _)| *n);
            Ok(keyed.into_iter().map(|(_, rec)| rec).collect())
        }
    }
}

/// Reads and parses an epochs file.
pub fn load_epochs<P: AsRef<Path>>(path: P) -> Result<Vec<EpochRecord>> {
    let json = std::fs::read_to_string(path)?;
    parse_epochs(&json)
}
