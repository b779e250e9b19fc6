//! PostgreSQL implementation of the fingerprint repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{Fingerprint, NewFingerprint};
use crate::domain::repositories::FingerprintRepository;
use crate::error::AppError;

#[derive(Debug, FromRow)]
struct FingerprintRow {
    id: i64,
    fingerprint_id: String,
    ip_address: String,
    user_agent: String,
    referral_public_id: String,
    referral_code: String,
    created_at: DateTime<Utc>,
}

impl From<FingerprintRow> for Fingerprint {
    fn from(row: FingerprintRow) -> Self {
        Fingerprint {
            sequence_id: row.id,
            fingerprint_id: row.fingerprint_id,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            referral_public_id: row.referral_public_id,
            referral_code: row.referral_code,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL repository for link-open fingerprints.
pub struct PgFingerprintRepository {
    pool: Arc<PgPool>,
}

impl PgFingerprintRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FingerprintRepository for PgFingerprintRepository {
    async fn create(&self, new_fingerprint: NewFingerprint) -> Result<Fingerprint, AppError> {
        let row: FingerprintRow = sqlx::query_as(
            r#"
            INSERT INTO fingerprints
                (fingerprint_id, ip_address, user_agent, referral_public_id, referral_code, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, fingerprint_id, ip_address, user_agent,
                      referral_public_id, referral_code, created_at
            "#,
        )
        .bind(&new_fingerprint.fingerprint_id)
        .bind(&new_fingerprint.ip_address)
        .bind(&new_fingerprint.user_agent)
        .bind(&new_fingerprint.referral_public_id)
        .bind(&new_fingerprint.referral_code)
        .bind(new_fingerprint.created_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_fingerprint_id(
        &self,
        fingerprint_id: &str,
    ) -> Result<Option<Fingerprint>, AppError> {
        let row: Option<FingerprintRow> = sqlx::query_as(
            r#"
            SELECT id, fingerprint_id, ip_address, user_agent,
                   referral_public_id, referral_code, created_at
            FROM fingerprints
            WHERE fingerprint_id = $1
            "#,
        )
        .bind(fingerprint_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Fingerprint::from))
    }

    async fn list_by_referral(&self, public_id: &str) -> Result<Vec<Fingerprint>, AppError> {
        let rows: Vec<FingerprintRow> = sqlx::query_as(
            r#"
            SELECT id, fingerprint_id, ip_address, user_agent,
                   referral_public_id, referral_code, created_at
            FROM fingerprints
            WHERE referral_public_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(public_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Fingerprint::from).collect())
    }
}
