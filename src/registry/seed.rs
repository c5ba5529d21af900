use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;

use super::store::{MaliciousAddressEntry, RiskLevel};

/// Parse a blocklist CSV.
///
/// Expected columns: `address, reason, risk_level, verified`. Only the address is
/// required; a missing or out-of-range risk level falls back to 3. Rows for the
/// same address (case-insensitive) collapse into one entry keeping the highest level.
pub fn parse_blocklist_csv(path: impl AsRef<Path>) -> eyre::Result<Vec<MaliciousAddressEntry>> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("Failed to open blocklist CSV '{}': {}", path.display(), e))?;

    parse_records(reader)
}

fn parse_records<R: std::io::Read>(
    mut reader: csv::Reader<R>,
) -> eyre::Result<Vec<MaliciousAddressEntry>> {
    let now = Utc::now();
    let mut by_address: HashMap<String, MaliciousAddressEntry> = HashMap::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = result?;
        let address = record.get(0).unwrap_or("").to_lowercase();
        if address.is_empty() {
            skipped += 1;
            continue;
        }

        let reason = match record.get(1) {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => "Imported blocklist".to_string(),
        };
        let risk_level = record
            .get(2)
            .and_then(|r| r.parse::<u8>().ok())
            .and_then(|r| RiskLevel::new(r).ok())
            .unwrap_or_default();
        let verified = record
            .get(3)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let entry = by_address
            .entry(address.clone())
            .or_insert_with(|| MaliciousAddressEntry::new(&address, &reason, risk_level, now));
        if risk_level > entry.risk_level {
            entry.risk_level = risk_level;
            entry.report_reason = reason;
        }
        entry.verified |= verified;
        entry.reported_by = Some("blocklist".to_string());
    }

    if skipped > 0 {
        tracing::warn!(skipped, "Blocklist rows without an address were skipped");
    }

    let mut entries: Vec<_> = by_address.into_values().collect();
    entries.sort_by(|a, b| a.address.cmp(&b.address));
    tracing::info!(entries = entries.len(), "Parsed blocklist entries");
    Ok(entries)
}
