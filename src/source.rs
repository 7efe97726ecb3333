use std::time::Instant;

use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::airtable::AirtableClient;
use crate::cache::TableCache;
use crate::db;
use crate::mock::MockData;
use crate::models::{
    parse_activity, parse_goals, parse_working_days, ActivityRecord, GoalRecord, Row, WorkingDays,
};
use crate::period::recruiters;

/// The four logical tables the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    DailyMetrics,
    WeeklyMetrics,
    WeeklyGoals,
    WorkingDays,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::DailyMetrics,
        Table::WeeklyMetrics,
        Table::WeeklyGoals,
        Table::WorkingDays,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::DailyMetrics => "metricas_diarias",
            Table::WeeklyMetrics => "metricas_semanales",
            Table::WeeklyGoals => "metas_semanales",
            Table::WorkingDays => "config_dias_laborables",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Table::ALL.into_iter().find(|table| table.name() == name)
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("table {table} returned HTTP {status}: {body}")]
    Status {
        table: String,
        status: u16,
        body: String,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("could not decode table payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Where table rows come from.
pub enum TableSource {
    Airtable(AirtableClient),
    Postgres(PgPool),
    Mock(MockData),
}

impl TableSource {
    pub fn describe(&self) -> &'static str {
        match self {
            TableSource::Airtable(_) => "airtable",
            TableSource::Postgres(_) => "postgres",
            TableSource::Mock(_) => "mock",
        }
    }

    pub async fn fetch(&self, table: Table) -> Result<Vec<Row>, SourceError> {
        match self {
            TableSource::Airtable(client) => client.fetch_all(table.name()).await,
            TableSource::Postgres(pool) => Ok(db::fetch_rows(pool, table).await?),
            TableSource::Mock(data) => Ok(data.rows(table)),
        }
    }
}

/// Snapshot of every table for one render cycle.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub daily: Vec<ActivityRecord>,
    pub weekly: Vec<ActivityRecord>,
    pub goals: Vec<GoalRecord>,
    pub working_days: Vec<WorkingDays>,
    /// Fetch failures to show inline; the affected tables are empty.
    pub errors: Vec<String>,
}

impl Dataset {
    pub fn recruiters(&self) -> Vec<String> {
        recruiters(&self.daily)
    }

    /// Why nothing can be rendered from this snapshot, if anything.
    pub fn halt_reason(&self) -> Option<String> {
        if self.daily.is_empty() {
            return Some("No data could be loaded. Check the data store connection.".to_string());
        }
        if self.recruiters().is_empty() {
            return Some("No recruiters found in the data store.".to_string());
        }
        None
    }
}

/// Fetches tables through the cache, one table at a time.
pub struct Loader {
    source: TableSource,
    cache: TableCache,
}

impl Loader {
    pub fn new(source: TableSource, cache: TableCache) -> Self {
        Self { source, cache }
    }

    /// Drops every cached table so the next load fetches again.
    pub fn refresh(&mut self) {
        info!(tables = self.cache.len(), "cache invalidated");
        self.cache.invalidate_all();
    }

    pub async fn load(&mut self) -> Dataset {
        let mut errors = Vec::new();
        let daily = self.table(Table::DailyMetrics, &mut errors).await;
        let weekly = self.table(Table::WeeklyMetrics, &mut errors).await;
        let goals = self.table(Table::WeeklyGoals, &mut errors).await;
        let working_days = self.table(Table::WorkingDays, &mut errors).await;

        Dataset {
            daily: parse_activity(&daily),
            weekly: parse_activity(&weekly),
            goals: parse_goals(&goals),
            working_days: parse_working_days(&working_days),
            errors,
        }
    }

    /// Failed fetches degrade to an empty table and are not cached.
    async fn table(&mut self, table: Table, errors: &mut Vec<String>) -> Vec<Row> {
        if let Some(rows) = self.cache.get(table, Instant::now()) {
            return rows.to_vec();
        }

        match self.source.fetch(table).await {
            Ok(rows) => {
                info!(
                    table = table.name(),
                    rows = rows.len(),
                    source = self.source.describe(),
                    "fetched table"
                );
                if rows.is_empty() {
                    warn!(table = table.name(), "table is empty");
                }
                self.cache.insert(table, rows.clone(), Instant::now());
                rows
            }
            Err(err) => {
                error!(table = table.name(), error = %err, "failed to fetch table");
                errors.push(format!("Error loading {}: {err}", table.name()));
                Vec::new()
            }
        }
    }
}
