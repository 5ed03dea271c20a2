//! Ride history access
//!
//! The training-data supplier: completed rides with non-null, strictly
//! positive distance and non-null fare, most recent first, plus aggregate
//! fare statistics for the stats endpoint.

use crate::models::{round_to_cents, FareStats, RideSample};
use async_trait::async_trait;
use thiserror::Error;
use tokio_postgres::NoTls;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),
    #[error("history unavailable: {0}")]
    Unavailable(String),
}

/// Source of completed-ride data
#[async_trait]
pub trait RideHistory: Send + Sync {
    /// Up to `limit` most recent completed rides with usable distance and fare
    async fn recent_completed(&self, limit: usize) -> Result<Vec<RideSample>, HistoryError>;

    /// Aggregate fare statistics over all completed rides
    async fn fare_stats(&self) -> Result<FareStats, HistoryError>;
}

/// Postgres connection settings
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "postgres".to_string(),
            port: 5432,
            dbname: "rides_db".to_string(),
            user: "rides".to_string(),
            password: "rides".to_string(),
        }
    }
}

impl DbConfig {
    fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.dbname, self.user, self.password
        )
    }
}

const RECENT_COMPLETED_SQL: &str = "\
    SELECT distance_km::float8, final_fare::float8 \
    FROM rides \
    WHERE status = 'completed' \
      AND distance_km IS NOT NULL \
      AND final_fare IS NOT NULL \
      AND distance_km > 0 \
    ORDER BY completed_at DESC \
    LIMIT $1";

const FARE_STATS_SQL: &str = "\
    SELECT COUNT(*), \
           AVG(final_fare)::float8, \
           MIN(final_fare)::float8, \
           MAX(final_fare)::float8, \
           AVG(distance_km)::float8 \
    FROM rides \
    WHERE status = 'completed' \
      AND final_fare IS NOT NULL";

/// Postgres-backed ride history
pub struct PgRideHistory {
    config: DbConfig,
}

impl PgRideHistory {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    /// Open a fresh connection; the driver task ends when the client drops.
    async fn connect(&self) -> Result<tokio_postgres::Client, HistoryError> {
        let (client, connection) =
            tokio_postgres::connect(&self.config.connection_string(), NoTls).await?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                error!(error = %err, "Database connection error");
            }
        });
        Ok(client)
    }
}

#[async_trait]
impl RideHistory for PgRideHistory {
    async fn recent_completed(&self, limit: usize) -> Result<Vec<RideSample>, HistoryError> {
        let client = self.connect().await?;
        let rows = client
            .query(RECENT_COMPLETED_SQL, &[&(limit as i64)])
            .await?;

        let samples: Vec<RideSample> = rows
            .iter()
            .map(|row| RideSample {
                distance_km: row.get(0),
                fare: row.get(1),
            })
            .collect();

        debug!(count = samples.len(), "Loaded completed rides for training");
        Ok(samples)
    }

    async fn fare_stats(&self) -> Result<FareStats, HistoryError> {
        let client = self.connect().await?;
        let row = client.query_one(FARE_STATS_SQL, &[]).await?;

        // Aggregates are NULL when no rows match
        Ok(FareStats {
            total_rides: row.get(0),
            avg_fare: round_to_cents(row.get::<_, Option<f64>>(1).unwrap_or(0.0)),
            min_fare: round_to_cents(row.get::<_, Option<f64>>(2).unwrap_or(0.0)),
            max_fare: round_to_cents(row.get::<_, Option<f64>>(3).unwrap_or(0.0)),
            avg_distance: round_to_cents(row.get::<_, Option<f64>>(4).unwrap_or(0.0)),
        })
    }
}
