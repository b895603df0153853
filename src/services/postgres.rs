use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{
    ActivityRecord, DeliveryStatus, FounderInvestorMatch, FundingRequest, MatchCounts,
    NewFundingRequest,
};
use crate::services::store::{FundingStore, StoreError};

/// Partial unique index holding the one-active-request-per-founder invariant
const ONE_ACTIVE_PER_FOUNDER: &str = "funding_requests_one_active_per_founder";
const ONE_MATCH_PER_INVESTOR: &str = "founder_investor_matches_request_investor_key";

/// PostgreSQL-backed funding request store
///
/// Funding requests and match rows live here rather than in the profile
/// document store so the active-request invariant and batch match inserts can
/// lean on real constraints and transactions.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

/// Translate constraint violations into their domain meaning
fn map_constraint(err: sqlx::Error, on_active: impl FnOnce() -> StoreError) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint() == Some(ONE_ACTIVE_PER_FOUNDER) {
            return on_active();
        }
    }
    StoreError::SqlxError(err)
}

fn funding_request_from_row(row: &PgRow) -> FundingRequest {
    FundingRequest {
        id: row.get("id"),
        founder_id: row.get("founder_id"),
        funding_stage: row.get("funding_stage"),
        use_of_funds: row.get("use_of_funds"),
        business_plan: row.get("business_plan"),
        financial_projections: row.get("financial_projections"),
        additional_notes: row.get("additional_notes"),
        status: row.get("status"),
        refresh_count: row.get("refresh_count"),
        created_at: row.get("created_at"),
    }
}

const FUNDING_REQUEST_COLUMNS: &str = "id, founder_id, funding_stage, use_of_funds, business_plan, \
     financial_projections, additional_notes, status, refresh_count, created_at";

#[async_trait]
impl FundingStore for PostgresClient {
    async fn find_active_request(
        &self,
        founder_id: &str,
    ) -> Result<Option<FundingRequest>, StoreError> {
        let query = format!(
            "SELECT {} FROM funding_requests \
             WHERE founder_id = $1 AND status IN ('open', 'allotted') \
             LIMIT 1",
            FUNDING_REQUEST_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(founder_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(funding_request_from_row))
    }

    /// Single constrained insert; the partial unique index rejects a second
    /// active request for the same founder no matter how calls interleave.
    async fn insert_funding_request(
        &self,
        request: NewFundingRequest,
    ) -> Result<FundingRequest, StoreError> {
        let request = request.into_request(Utc::now());

        let query = r#"
            INSERT INTO funding_requests (
                id, founder_id, funding_stage, use_of_funds, business_plan,
                financial_projections, additional_notes, status, refresh_count, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#;

        sqlx::query(query)
            .bind(request.id)
            .bind(&request.founder_id)
            .bind(request.funding_stage)
            .bind(&request.use_of_funds)
            .bind(&request.business_plan)
            .bind(&request.financial_projections)
            .bind(&request.additional_notes)
            .bind(request.status)
            .bind(request.refresh_count)
            .bind(request.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_constraint(e, || {
                    StoreError::ActiveRequestExists(request.founder_id.clone())
                })
            })?;

        tracing::debug!(
            "Inserted funding request {} for founder {}",
            request.id,
            request.founder_id
        );

        Ok(request)
    }

    async fn get_funding_request(&self, id: Uuid) -> Result<Option<FundingRequest>, StoreError> {
        let query = format!(
            "SELECT {} FROM funding_requests WHERE id = $1",
            FUNDING_REQUEST_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(funding_request_from_row))
    }

    async fn close_funding_request(&self, id: Uuid) -> Result<bool, StoreError> {
        let query = r#"
            UPDATE funding_requests
            SET status = 'closed'
            WHERE id = $1 AND status IN ('open', 'allotted')
        "#;

        let result = sqlx::query(query).bind(id).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_matches(&self, matches: &[FounderInvestorMatch]) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO founder_investor_matches (
                id, funding_request_id, founder_id, investor_id, assigned_by,
                method, status, delivery_status, contacted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#;

        let mut tx = self.pool.begin().await?;

        for m in matches {
            let inserted = sqlx::query(query)
                .bind(m.id)
                .bind(m.funding_request_id)
                .bind(&m.founder_id)
                .bind(&m.investor_id)
                .bind(&m.assigned_by)
                .bind(m.method)
                .bind(m.status)
                .bind(m.delivery_status)
                .bind(m.contacted_at)
                .execute(&mut *tx)
                .await;

            if let Err(err) = inserted {
                // Dropping the transaction rolls back every row of the batch
                if let sqlx::Error::Database(db_err) = &err {
                    if db_err.constraint() == Some(ONE_MATCH_PER_INVESTOR) {
                        return Err(StoreError::DuplicateMatch {
                            funding_request_id: m.funding_request_id,
                            investor_id: m.investor_id.clone(),
                        });
                    }
                }
                return Err(err.into());
            }
        }

        tx.commit().await?;

        tracing::debug!("Inserted {} match rows", matches.len());

        Ok(())
    }

    async fn update_delivery_status(
        &self,
        funding_request_id: Uuid,
        investor_ids: &[String],
        status: DeliveryStatus,
    ) -> Result<u64, StoreError> {
        let query = r#"
            UPDATE founder_investor_matches
            SET delivery_status = $3
            WHERE funding_request_id = $1 AND investor_id = ANY($2)
        "#;

        let result = sqlx::query(query)
            .bind(funding_request_id)
            .bind(investor_ids)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_matches(
        &self,
        funding_request_id: Uuid,
    ) -> Result<Vec<FounderInvestorMatch>, StoreError> {
        let query = r#"
            SELECT id, funding_request_id, founder_id, investor_id, assigned_by,
                   method, status, delivery_status, contacted_at
            FROM founder_investor_matches
            WHERE funding_request_id = $1
            ORDER BY contacted_at ASC
        "#;

        let rows = sqlx::query(query)
            .bind(funding_request_id)
            .fetch_all(&self.pool)
            .await?;

        let matches = rows
            .iter()
            .map(|row| FounderInvestorMatch {
                id: row.get("id"),
                funding_request_id: row.get("funding_request_id"),
                founder_id: row.get("founder_id"),
                investor_id: row.get("investor_id"),
                assigned_by: row.get("assigned_by"),
                method: row.get("method"),
                status: row.get("status"),
                delivery_status: row.get("delivery_status"),
                contacted_at: row.get("contacted_at"),
            })
            .collect();

        Ok(matches)
    }

    async fn match_counts(&self, funding_request_id: Uuid) -> Result<MatchCounts, StoreError> {
        let query = r#"
            SELECT
                COUNT(DISTINCT investor_id) FILTER (WHERE delivery_status = 'sent') AS contacted_investors,
                COUNT(*) FILTER (WHERE delivery_status = 'sent') AS emails_sent
            FROM founder_investor_matches
            WHERE funding_request_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(funding_request_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(MatchCounts {
            contacted_investors: row.get("contacted_investors"),
            emails_sent: row.get("emails_sent"),
        })
    }

    async fn record_activity(&self, record: &ActivityRecord) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO activity_log (
                id, actor_id, action, funding_request_id, success, message, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#;

        sqlx::query(query)
            .bind(record.id)
            .bind(&record.actor_id)
            .bind(&record.action)
            .bind(record.funding_request_id)
            .bind(record.success)
            .bind(&record.message)
            .bind(record.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
