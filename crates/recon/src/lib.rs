//! `tankgauge-recon`: bulk cadastral and measurement import.
//!
//! Takes a calibration snapshot plus raw `BALSA;`/`TANQUE;`/`CALIBRACAO;`/
//! `MEDICAO;` text and returns a new snapshot, the measurement logs it
//! produced and a summary of what changed. Bad records are collected, never
//! fatal. Measurement history goes through an injected repository.

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod history;
pub mod model;
pub mod record;
pub mod split;
pub mod summary;

pub use engine::{reconcile, Importer};
pub use error::{HistoryError, ImportError, RecordError};
pub use history::{
    append_logs, history_key, merge_history, HistoryRepository, InMemoryHistory, JsonFileHistory,
    DEFAULT_HISTORY_PREFIX,
};
pub use model::{ImportOutcome, ImportRecord, ImportSummary, RecordTag};
