//! CSV export of scored session history.

use crate::scoring::score_session;
use crate::{Result, ScoringConstants, SessionRecord};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    recorded_at: String,
    volume_liters: f64,
    thc_concentration: f64,
    inhalation_seconds: f64,
    strain: String,
    frequency: String,
    body_weight_kg: f64,
    raw_score: f64,
}

impl CsvRow {
    fn scored(session: &SessionRecord, constants: &ScoringConstants) -> Result<Self> {
        Ok(CsvRow {
            id: session.id.to_string(),
            recorded_at: session.recorded_at.to_rfc3339(),
            volume_liters: session.volume_liters,
            thc_concentration: session.thc_concentration,
            inhalation_seconds: session.inhalation_seconds,
            strain: session.strain.to_string(),
            frequency: session.frequency.to_string(),
            body_weight_kg: session.body_weight_kg,
            raw_score: score_session(session, constants)?,
        })
    }
}

/// Write every session with its raw score to `csv_path`, replacing the file
///
/// All rows are scored before the file is touched, so an invalid session
/// leaves any existing export in place. Returns the number of rows written.
pub fn export_sessions(
    sessions: &[SessionRecord],
    constants: &ScoringConstants,
    csv_path: &Path,
) -> Result<usize> {
    let rows = sessions
        .iter()
        .map(|s| CsvRow::scored(s, constants))
        .collect::<Result<Vec<_>>>()?;

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(csv_path)?;

    // Header written explicitly so an empty export still has one
    writer.write_record([
        "id",
        "recorded_at",
        "volume_liters",
        "thc_concentration",
        "inhalation_seconds",
        "strain",
        "frequency",
        "body_weight_kg",
        "raw_score",
    ])?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    tracing::info!("Exported {} sessions to {:?}", rows.len(), csv_path);
    Ok(rows.len())
}
