//! # Postgres Directory Module
//!
//! Postgres-backed implementations of the engine's collaborators: the
//! canonical ingredient directory, the measurement unit source and the
//! decision sink, plus the schema and seeding helpers they rely on.

use crate::decision_log::{DecisionRecord, DecisionSink};
use crate::directory::IngredientDirectory;
use crate::errors::{EngineError, EngineResult};
use crate::ingredient_model::{CanonicalIngredient, MeasureSystem, MeasurementUnit, UnitType};
use crate::unit_catalog::{standard_units, UnitSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

/// Initialize the directory schema
pub async fn init_directory_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing directory schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS canonical_ingredients (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            plural TEXT,
            aliases TEXT[] NOT NULL DEFAULT '{}',
            family TEXT
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create canonical_ingredients table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS canonical_ingredients_lower_name_idx
         ON canonical_ingredients (lower(name))",
    )
    .execute(pool)
    .await
    .context("Failed to create canonical_ingredients name index")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS measurement_units (
            unit_code TEXT PRIMARY KEY,
            display_singular TEXT NOT NULL,
            display_plural TEXT NOT NULL,
            unit_type TEXT NOT NULL,
            system TEXT,
            metric_g DOUBLE PRECISION,
            metric_ml DOUBLE PRECISION,
            aliases TEXT[] NOT NULL DEFAULT '{}'
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create measurement_units table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS ingredient_match_decisions (
            id BIGSERIAL PRIMARY KEY,
            raw_text TEXT NOT NULL,
            recipe_id TEXT,
            primary_name TEXT NOT NULL,
            alternative_names TEXT[] NOT NULL DEFAULT '{}',
            equivalent BOOLEAN NOT NULL,
            reasoning TEXT NOT NULL,
            recorded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create ingredient_match_decisions table")?;

    info!("Directory schema initialized successfully");
    Ok(())
}

/// Insert a canonical ingredient, returning its database id
///
/// The `id` on the argument is ignored; Postgres assigns one.
pub async fn insert_canonical_ingredient(pool: &PgPool, ingredient: &CanonicalIngredient) -> Result<i64> {
    let row = sqlx::query(
        "INSERT INTO canonical_ingredients (name, plural, aliases, family)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(&ingredient.name)
    .bind(&ingredient.plural)
    .bind(&ingredient.aliases)
    .bind(&ingredient.family)
    .fetch_one(pool)
    .await
    .with_context(|| format!("Failed to insert canonical ingredient '{}'", ingredient.name))?;

    let id: i64 = row.try_get("id")?;
    debug!("Canonical ingredient '{}' stored with ID {}", ingredient.name, id);
    Ok(id)
}

/// Insert a unit row; an existing unit code is left untouched
pub async fn insert_measurement_unit(pool: &PgPool, unit: &MeasurementUnit) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO measurement_units
            (unit_code, display_singular, display_plural, unit_type, system, metric_g, metric_ml, aliases)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (unit_code) DO NOTHING",
    )
    .bind(&unit.unit_code)
    .bind(&unit.display_singular)
    .bind(&unit.display_plural)
    .bind(unit.unit_type.as_str())
    .bind(unit.system.map(|s| s.as_str()))
    .bind(unit.metric_g)
    .bind(unit.metric_ml)
    .bind(&unit.aliases)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to insert measurement unit '{}'", unit.unit_code))?;

    Ok(result.rows_affected() > 0)
}

/// Seed the built-in unit table, returning how many rows were added
pub async fn seed_standard_units(pool: &PgPool) -> Result<usize> {
    let mut inserted = 0;
    for unit in standard_units() {
        if insert_measurement_unit(pool, &unit).await? {
            inserted += 1;
        }
    }
    info!("Seeded {} measurement units", inserted);
    Ok(inserted)
}

/// Most recent decision records, newest first
pub async fn list_recent_decisions(pool: &PgPool, limit: i64) -> Result<Vec<DecisionRecord>> {
    let rows = sqlx::query(
        "SELECT raw_text, recipe_id, primary_name, alternative_names, equivalent, reasoning, recorded_at
         FROM ingredient_match_decisions
         ORDER BY recorded_at DESC, id DESC
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list decision records")?;

    rows.iter()
        .map(|row| decision_from_row(row).context("Failed to read decision record"))
        .collect()
}

fn ingredient_from_row(row: &PgRow) -> Result<CanonicalIngredient, sqlx::Error> {
    Ok(CanonicalIngredient {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        plural: row.try_get("plural")?,
        aliases: row.try_get("aliases")?,
        family: row.try_get("family")?,
    })
}

fn unit_from_row(row: &PgRow) -> Result<MeasurementUnit, sqlx::Error> {
    let unit_type: String = row.try_get("unit_type")?;
    let system: Option<String> = row.try_get("system")?;
    Ok(MeasurementUnit {
        unit_code: row.try_get("unit_code")?,
        display_singular: row.try_get("display_singular")?,
        display_plural: row.try_get("display_plural")?,
        unit_type: UnitType::from_code(&unit_type),
        system: system.as_deref().and_then(MeasureSystem::from_code),
        metric_g: row.try_get("metric_g")?,
        metric_ml: row.try_get("metric_ml")?,
        aliases: row.try_get("aliases")?,
    })
}

fn decision_from_row(row: &PgRow) -> Result<DecisionRecord, sqlx::Error> {
    let recorded_at: DateTime<Utc> = row.try_get("recorded_at")?;
    Ok(DecisionRecord {
        raw_text: row.try_get("raw_text")?,
        recipe_id: row.try_get("recipe_id")?,
        primary_name: row.try_get("primary_name")?,
        alternative_names: row.try_get("alternative_names")?,
        equivalent: row.try_get("equivalent")?,
        reasoning: row.try_get("reasoning")?,
        recorded_at,
    })
}

/// Canonical ingredient directory stored in Postgres
#[derive(Debug, Clone)]
pub struct PgIngredientDirectory {
    pool: PgPool,
}

impl PgIngredientDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IngredientDirectory for PgIngredientDirectory {
    async fn lookup_candidates(&self, normalized_name: &str) -> EngineResult<Vec<CanonicalIngredient>> {
        if normalized_name.is_empty() {
            return Ok(Vec::new());
        }

        // Substring either way on name, plural and aliases, or a shared 3-letter prefix
        let rows = sqlx::query(
            "SELECT id, name, plural, aliases, family
             FROM canonical_ingredients
             WHERE name ILIKE '%' || $1 || '%'
                OR $1 ILIKE '%' || name || '%'
                OR plural ILIKE '%' || $1 || '%'
                OR $1 ILIKE '%' || plural || '%'
                OR EXISTS (
                    SELECT 1 FROM unnest(aliases) AS alias
                    WHERE alias ILIKE '%' || $1 || '%' OR $1 ILIKE '%' || alias || '%'
                )
                OR (length($1) >= 3 AND left(lower(name), 3) = left(lower($1), 3))
             ORDER BY id",
        )
        .bind(normalized_name)
        .fetch_all(&self.pool)
        .await?;

        let candidates = rows
            .iter()
            .map(ingredient_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Postgres lookup '{}' returned {} candidates",
            normalized_name,
            candidates.len()
        );
        Ok(candidates)
    }
}

/// Measurement unit rows stored in Postgres
#[derive(Debug, Clone)]
pub struct PgUnitSource {
    pool: PgPool,
}

impl PgUnitSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitSource for PgUnitSource {
    async fn load_units(&self) -> EngineResult<Vec<MeasurementUnit>> {
        let rows = sqlx::query(
            "SELECT unit_code, display_singular, display_plural, unit_type, system,
                    metric_g, metric_ml, aliases
             FROM measurement_units
             ORDER BY unit_code",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::UnitDirectoryUnavailable(e.to_string()))?;

        rows.iter()
            .map(unit_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EngineError::InvalidData(e.to_string()))
    }
}

/// Decision sink writing to `ingredient_match_decisions`
#[derive(Debug, Clone)]
pub struct PgDecisionSink {
    pool: PgPool,
}

impl PgDecisionSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DecisionSink for PgDecisionSink {
    async fn write(&self, record: &DecisionRecord) -> EngineResult<()> {
        sqlx::query(
            "INSERT INTO ingredient_match_decisions
                (raw_text, recipe_id, primary_name, alternative_names, equivalent, reasoning, recorded_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&record.raw_text)
        .bind(&record.recipe_id)
        .bind(&record.primary_name)
        .bind(&record.alternative_names)
        .bind(record.equivalent)
        .bind(&record.reasoning)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
