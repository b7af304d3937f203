//! SQLite-backed store for the AQI pipeline.
//!
//! Holds every table the system touches: regions, data sources, raw ingest
//! payloads, normalized pollution/climate metrics, predictions, model
//! explanations, and training-run metadata. The schema is created
//! idempotently when the store is opened.

use crate::error::{DataError, Result};
use crate::store::DataStore;
use crate::types::{
    AttributionRecord, ClimateRow, MetricRecord, ModelRunMeta, PollutionRow, PredictionRecord,
    RawPayload, RegionSummary, StoreStats,
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

/// SQLite-backed implementation of [`DataStore`].
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store, useful for testing.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create all tables and indices if they do not exist.
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS regions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS data_sources (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                base_url TEXT
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS raw_ingest (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id INTEGER NOT NULL REFERENCES data_sources(id),
                payload TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                processed INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_raw_ingest_processed
             ON raw_ingest(processed, fetched_at)",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS pollution_metrics (
                region_id INTEGER NOT NULL REFERENCES regions(id),
                timestamp TEXT NOT NULL,
                pm25 REAL,
                pm10 REAL,
                no2 REAL,
                so2 REAL,
                co REAL,
                o3 REAL,
                aqi REAL,
                PRIMARY KEY (region_id, timestamp)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS climate_metrics (
                region_id INTEGER NOT NULL REFERENCES regions(id),
                timestamp TEXT NOT NULL,
                temperature REAL,
                humidity REAL,
                wind_speed REAL,
                wind_direction REAL,
                precipitation REAL,
                pressure REAL,
                PRIMARY KEY (region_id, timestamp)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS predictions (
                id TEXT PRIMARY KEY,
                region_id INTEGER NOT NULL REFERENCES regions(id),
                prediction_timestamp TEXT NOT NULL,
                target_timestamp TEXT NOT NULL,
                predicted_aqi REAL NOT NULL,
                confidence_score REAL,
                model_version TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS model_explanations (
                id TEXT PRIMARY KEY,
                prediction_id TEXT NOT NULL REFERENCES predictions(id),
                feature_name TEXT NOT NULL,
                feature_value REAL NOT NULL,
                contribution REAL NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_explanations_prediction
             ON model_explanations(prediction_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS model_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                model_version TEXT NOT NULL,
                trained_at TEXT NOT NULL,
                rmse REAL NOT NULL,
                mae REAL NOT NULL,
                artifact_path TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    fn count(&self, sql: &str) -> Result<u64> {
        let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DataError::TimeConversion(format!("{value}: {e}")))
}

impl DataStore for SqliteStore {
    fn training_records(&self, max_rows: Option<usize>) -> Result<Vec<MetricRecord>> {
        let limit = max_rows.map_or(-1, |n| n as i64);
        let mut stmt = self.conn.prepare(
            "SELECT p.region_id, p.timestamp,
                    p.pm25, p.pm10, p.no2, p.so2, p.co, p.o3, p.aqi,
                    c.temperature, c.humidity, c.wind_speed, c.wind_direction,
                    c.precipitation, c.pressure
             FROM pollution_metrics p
             JOIN climate_metrics c
               ON c.region_id = p.region_id AND c.timestamp = p.timestamp
             WHERE p.aqi IS NOT NULL
             ORDER BY p.region_id ASC, p.timestamp ASC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            let opt = |v: Option<f64>| v.unwrap_or(f64::NAN);
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                opt(row.get(2)?),
                opt(row.get(3)?),
                opt(row.get(4)?),
                opt(row.get(5)?),
                opt(row.get(6)?),
                opt(row.get(7)?),
                row.get::<_, f64>(8)?,
                opt(row.get(9)?),
                opt(row.get(10)?),
                opt(row.get(11)?),
                opt(row.get(12)?),
                opt(row.get(13)?),
                opt(row.get(14)?),
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (
                region_id,
                timestamp,
                pm25,
                pm10,
                no2,
                so2,
                co,
                o3,
                aqi,
                temperature,
                humidity,
                wind_speed,
                wind_direction,
                precipitation,
                pressure,
            ) = row?;
            records.push(MetricRecord {
                region_id,
                timestamp: parse_timestamp(&timestamp)?,
                pm25,
                pm10,
                no2,
                so2,
                co,
                o3,
                temperature,
                humidity,
                wind_speed,
                wind_direction,
                precipitation,
                pressure,
                aqi: Some(aqi),
            });
        }
        Ok(records)
    }

    fn upsert_region(&self, name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO regions (name) VALUES (?1)",
            params![name],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM regions WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn region_id_by_name(&self, name: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM regions WHERE LOWER(name) = LOWER(?1) LIMIT 1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn upsert_source(&self, name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO data_sources (name) VALUES (?1)",
            params![name],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM data_sources WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn put_raw_payloads(&self, source: &str, payloads: &[serde_json::Value]) -> Result<usize> {
        let source_id = self.upsert_source(source)?;
        let fetched_at = Utc::now().to_rfc3339();

        let tx = self.conn.unchecked_transaction()?;
        for payload in payloads {
            let body = serde_json::to_string(payload)?;
            tx.execute(
                "INSERT INTO raw_ingest (source_id, payload, fetched_at, processed)
                 VALUES (?1, ?2, ?3, 0)",
                params![source_id, body, fetched_at],
            )?;
        }
        tx.commit()?;
        Ok(payloads.len())
    }

    fn unprocessed_payloads(&self, limit: usize) -> Result<Vec<RawPayload>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, s.name, r.payload, r.fetched_at
             FROM raw_ingest r
             JOIN data_sources s ON s.id = r.source_id
             WHERE r.processed = 0
             ORDER BY r.fetched_at ASC, r.id ASC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut payloads = Vec::new();
        for row in rows {
            let (id, source, body, fetched_at) = row?;
            payloads.push(RawPayload {
                id,
                source,
                payload: serde_json::from_str(&body)?,
                fetched_at: parse_timestamp(&fetched_at)?,
            });
        }
        Ok(payloads)
    }

    fn mark_payloads_processed(&self, ids: &[i64]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for id in ids {
            tx.execute(
                "UPDATE raw_ingest SET processed = 1 WHERE id = ?1",
                params![id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn put_metric_rows(&self, pollution: &[PollutionRow], climate: &[ClimateRow]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for row in pollution {
            tx.execute(
                "INSERT OR REPLACE INTO pollution_metrics
                 (region_id, timestamp, pm25, pm10, no2, so2, co, o3, aqi)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    row.region_id,
                    row.timestamp.to_rfc3339(),
                    row.pm25,
                    row.pm10,
                    row.no2,
                    row.so2,
                    row.co,
                    row.o3,
                    row.aqi,
                ],
            )?;
        }
        for row in climate {
            tx.execute(
                "INSERT OR REPLACE INTO climate_metrics
                 (region_id, timestamp, temperature, humidity, wind_speed,
                  wind_direction, precipitation, pressure)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    row.region_id,
                    row.timestamp.to_rfc3339(),
                    row.temperature,
                    row.humidity,
                    row.wind_speed,
                    row.wind_direction,
                    row.precipitation,
                    row.pressure,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn put_run(
        &self,
        predictions: &[PredictionRecord],
        attributions: &[AttributionRecord],
    ) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for pred in predictions {
            tx.execute(
                "INSERT INTO predictions
                 (id, region_id, prediction_timestamp, target_timestamp,
                  predicted_aqi, confidence_score, model_version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    pred.id.to_string(),
                    pred.region_id,
                    pred.prediction_timestamp.to_rfc3339(),
                    pred.target_timestamp.to_rfc3339(),
                    pred.predicted_aqi,
                    pred.confidence_score,
                    pred.model_version,
                ],
            )?;
        }
        for attr in attributions {
            tx.execute(
                "INSERT INTO model_explanations
                 (id, prediction_id, feature_name, feature_value, contribution)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    attr.id.to_string(),
                    attr.prediction_id.to_string(),
                    attr.feature_name,
                    attr.feature_value,
                    attr.contribution,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn put_model_run(&self, run: &ModelRunMeta) -> Result<()> {
        self.conn.execute(
            "INSERT INTO model_runs (model_version, trained_at, rmse, mae, artifact_path)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run.model_version,
                run.trained_at.to_rfc3339(),
                run.rmse,
                run.mae,
                run.artifact_path,
            ],
        )?;
        Ok(())
    }

    fn region_summaries(&self) -> Result<Vec<RegionSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.name, COUNT(p.region_id)
             FROM regions r
             LEFT JOIN pollution_metrics p ON p.region_id = r.id
             GROUP BY r.id, r.name
             ORDER BY r.name ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(RegionSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                metric_rows: row.get::<_, i64>(2)? as u64,
            })
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }
        Ok(summaries)
    }

    fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            regions: self.count("SELECT COUNT(*) FROM regions")?,
            raw_payloads: self.count("SELECT COUNT(*) FROM raw_ingest")?,
            unprocessed_payloads: self
                .count("SELECT COUNT(*) FROM raw_ingest WHERE processed = 0")?,
            pollution_rows: self.count("SELECT COUNT(*) FROM pollution_metrics")?,
            climate_rows: self.count("SELECT COUNT(*) FROM climate_metrics")?,
            predictions: self.count("SELECT COUNT(*) FROM predictions")?,
            explanations: self.count("SELECT COUNT(*) FROM model_explanations")?,
        })
    }
}
