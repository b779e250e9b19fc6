//! PostgreSQL implementation of the referral repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{NewReferral, Referral, ReferralFilter, ReferralStatus};
use crate::domain::repositories::ReferralRepository;
use crate::error::AppError;

const REFERRAL_COLUMNS: &str =
    "id, public_id, code, referrer_id, referee_id, status, created_at";

#[derive(Debug, FromRow)]
struct ReferralRow {
    id: i64,
    public_id: String,
    code: String,
    referrer_id: String,
    referee_id: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReferralRow> for Referral {
    type Error = AppError;

    fn try_from(row: ReferralRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<ReferralStatus>().map_err(|e| {
            AppError::internal(
                "Corrupt referral row",
                json!({ "id": row.id, "reason": e.to_string() }),
            )
        })?;

        Ok(Referral {
            sequence_id: row.id,
            public_id: row.public_id,
            code: row.code,
            referrer_id: row.referrer_id,
            referee_id: row.referee_id,
            status,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL repository for referrals.
///
/// The sequence value is reserved with `nextval` on the identity column's
/// sequence, so the public id is written in the same insert as the record.
pub struct PgReferralRepository {
    pool: Arc<PgPool>,
}

impl PgReferralRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferralRepository for PgReferralRepository {
    async fn next_sequence_id(&self) -> Result<i64, AppError> {
        let id: i64 =
            sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('referrals', 'id'))")
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(id)
    }

    async fn create(&self, new_referral: NewReferral) -> Result<Referral, AppError> {
        let row: ReferralRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO referrals (id, public_id, code, referrer_id, status, created_at)
            VALUES ($1, $2, $3, $4, 'pending', $5)
            RETURNING {REFERRAL_COLUMNS}
            "#
        ))
        .bind(new_referral.sequence_id)
        .bind(&new_referral.public_id)
        .bind(&new_referral.code)
        .bind(&new_referral.referrer_id)
        .bind(new_referral.created_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<Referral>, AppError> {
        let row: Option<ReferralRow> = sqlx::query_as(&format!(
            "SELECT {REFERRAL_COLUMNS} FROM referrals WHERE public_id = $1"
        ))
        .bind(public_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Referral::try_from).transpose()
    }

    async fn complete(
        &self,
        public_id: &str,
        referee_id: &str,
    ) -> Result<Option<Referral>, AppError> {
        let row: Option<ReferralRow> = sqlx::query_as(&format!(
            r#"
            UPDATE referrals
            SET referee_id = $2, status = 'completed'
            WHERE public_id = $1
            RETURNING {REFERRAL_COLUMNS}
            "#
        ))
        .bind(public_id)
        .bind(referee_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Referral::try_from).transpose()
    }

    async fn list_by_owner(
        &self,
        referrer_id: &str,
        filter: ReferralFilter,
    ) -> Result<Vec<Referral>, AppError> {
        let rows: Vec<ReferralRow> = sqlx::query_as(&format!(
            r#"
            SELECT {REFERRAL_COLUMNS}
            FROM referrals
            WHERE referrer_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR code = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(referrer_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.code.as_deref())
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(Referral::try_from).collect()
    }

    async fn count_by_owner(
        &self,
        referrer_id: &str,
        filter: ReferralFilter,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM referrals
            WHERE referrer_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR code = $3)
            "#,
        )
        .bind(referrer_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.code.as_deref())
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
