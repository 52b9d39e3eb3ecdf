// Player pool ingestion and normalization.
//
// Reads scored player pools from CSV or JSON, coerces every record through
// `Player::try_from`, and keeps going past bad rows: a malformed or invalid
// record is logged and reported, never fatal to the batch.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{InvalidRecord, Player, PlayerRecord};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The outcome of normalizing a batch of raw records.
#[derive(Debug, Clone, Default)]
pub struct NormalizedPool {
    /// Records that survived coercion, in input order.
    pub players: Vec<Player>,
    /// Records that were rejected, with the reason.
    pub rejected: Vec<InvalidRecord>,
}

impl NormalizedPool {
    /// Look up a player by id.
    pub fn find(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Coerce raw records into players.
///
/// Invalid records are collected in `rejected` and the rest of the batch is
/// kept. A repeated id keeps the first occurrence; later duplicates are
/// dropped with a warning so selection never sees the same player twice.
pub fn normalize(records: impl IntoIterator<Item = PlayerRecord>) -> NormalizedPool {
    normalize_rows(records.into_iter().map(Ok))
}

/// Like [`normalize`], but rows that could not even be read as a record
/// arrive as `Err` and go straight to `rejected`, in input order.
fn normalize_rows(
    rows: impl IntoIterator<Item = Result<PlayerRecord, InvalidRecord>>,
) -> NormalizedPool {
    let mut pool = NormalizedPool::default();
    let mut seen: HashSet<String> = HashSet::new();

    for row in rows {
        match row.and_then(Player::try_from) {
            Ok(player) => {
                if !seen.insert(player.id.clone()) {
                    warn!("duplicate player id '{}', keeping first occurrence", player.id);
                    continue;
                }
                pool.players.push(player);
            }
            Err(reason) => {
                warn!("rejecting player record: {}", reason);
                pool.rejected.push(reason);
            }
        }
    }

    pool
}

// ---------------------------------------------------------------------------
// Reader-based loaders (enable testing without temp files)
// ---------------------------------------------------------------------------

fn records_from_csv<R: Read>(
    rdr: R,
) -> Result<Vec<Result<PlayerRecord, InvalidRecord>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut rows = Vec::new();
    for (row, result) in reader.deserialize::<PlayerRecord>().enumerate() {
        match result {
            Ok(raw) => rows.push(Ok(raw)),
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => rows.push(Err(InvalidRecord::Malformed {
                row: row + 1,
                message: e.to_string(),
            })),
        }
    }
    Ok(rows)
}

/// JSON pools are either a bare array or `{"players": [...]}`. Each element
/// is converted on its own so one bad record cannot sink the file.
fn records_from_json<R: Read>(
    rdr: R,
) -> Result<Vec<Result<PlayerRecord, InvalidRecord>>, serde_json::Error> {
    let value: Value = serde_json::from_reader(rdr)?;
    let elements = match value {
        Value::Array(elements) => elements,
        Value::Object(mut map) => match map.remove("players") {
            Some(Value::Array(elements)) => elements,
            _ => {
                return Err(serde::de::Error::custom(
                    "expected a `players` array in the top-level object",
                ))
            }
        },
        _ => {
            return Err(serde::de::Error::custom(
                "expected an array of players or an object with a `players` array",
            ))
        }
    };

    Ok(elements
        .into_iter()
        .enumerate()
        .map(|(row, element)| {
            PlayerRecord::deserialize(element).map_err(|e| InvalidRecord::Malformed {
                row: row + 1,
                message: e.to_string(),
            })
        })
        .collect())
}

/// Normalize a CSV pool from any reader. Rows that do not deserialize are
/// rejected one at a time; only I/O failures abort the load.
pub fn load_csv_from_reader<R: Read>(rdr: R) -> Result<NormalizedPool, csv::Error> {
    records_from_csv(rdr).map(normalize_rows)
}

/// Normalize a JSON pool from any reader.
pub fn load_json_from_reader<R: Read>(rdr: R) -> Result<NormalizedPool, serde_json::Error> {
    records_from_json(rdr).map(normalize_rows)
}

// ---------------------------------------------------------------------------
// Public path-based loader
// ---------------------------------------------------------------------------

/// Load and normalize a player pool. The format is chosen by extension:
/// `.json` is parsed as JSON, anything else as CSV.
///
/// Fails only when the file cannot be read/parsed as a whole, or when no
/// record survives normalization.
pub fn load_pool(path: &Path) -> Result<NormalizedPool, PoolError> {
    let shown = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| PoolError::Io {
        path: shown.clone(),
        source: e,
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let pool = if is_json {
        load_json_from_reader(file).map_err(|e| PoolError::Json {
            path: shown.clone(),
            source: e,
        })?
    } else {
        load_csv_from_reader(file).map_err(|e| PoolError::Csv {
            path: shown.clone(),
            source: e,
        })?
    };

    if pool.players.is_empty() {
        return Err(PoolError::Validation(format!(
            "{shown} produced zero valid players ({} rejected)",
            pool.rejected.len()
        )));
    }

    info!(
        "Loaded {} players from {} ({} rejected)",
        pool.players.len(),
        shown,
        pool.rejected.len()
    );
    Ok(pool)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
