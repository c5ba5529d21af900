use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::{Result, ShieldError};

use super::store::{AddressStore, MaliciousAddressEntry, RiskLevel};

type EntryRow = (
    String,
    String,
    String,
    i16,
    bool,
    Option<String>,
    Option<String>,
    DateTime<Utc>,
);

/// Remote store backed by the shared PostgreSQL database.
pub struct PgAddressStore {
    pool: PgPool,
}

impl PgAddressStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_entry(row: EntryRow) -> Result<MaliciousAddressEntry> {
    let (address, blockchain, report_reason, risk_level, verified, reported_by, evidence, created_at) =
        row;
    let level = u8::try_from(risk_level).map_err(|_| ShieldError::InvalidRiskLevel(0))?;

    Ok(MaliciousAddressEntry {
        address,
        blockchain,
        report_reason,
        risk_level: RiskLevel::new(level)?,
        verified,
        reported_by,
        evidence,
        created_at,
    })
}

#[async_trait]
impl AddressStore for PgAddressStore {
    async fn get(&self, address: &str) -> Result<Option<MaliciousAddressEntry>> {
        let row: Option<EntryRow> = sqlx::query_as(
            "SELECT address, blockchain, report_reason, risk_level, verified, reported_by, evidence, created_at
             FROM malicious_addresses
             WHERE address = $1",
        )
        .bind(address.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_entry).transpose()
    }

    async fn list(&self) -> Result<Vec<MaliciousAddressEntry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            "SELECT address, blockchain, report_reason, risk_level, verified, reported_by, evidence, created_at
             FROM malicious_addresses
             ORDER BY address",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            match row_to_entry(row) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(error = %e, "Skipping malformed malicious address row"),
            }
        }
        Ok(entries)
    }

    /// Upsert the address and append the report to `address_reports`.
    async fn insert(&self, entry: &MaliciousAddressEntry) -> Result<()> {
        let address = entry.address.to_lowercase();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO malicious_addresses
                 (address, blockchain, report_reason, risk_level, verified, reported_by, evidence, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (address) DO UPDATE
             SET report_reason = $3,
                 risk_level = GREATEST(malicious_addresses.risk_level, $4),
                 evidence = COALESCE($7, malicious_addresses.evidence)",
        )
        .bind(&address)
        .bind(&entry.blockchain)
        .bind(&entry.report_reason)
        .bind(entry.risk_level.get() as i16)
        .bind(entry.verified)
        .bind(&entry.reported_by)
        .bind(&entry.evidence)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO address_reports (address, reason, risk_level, evidence, reported_by, reported_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&address)
        .bind(&entry.report_reason)
        .bind(entry.risk_level.get() as i16)
        .bind(&entry.evidence)
        .bind(&entry.reported_by)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
