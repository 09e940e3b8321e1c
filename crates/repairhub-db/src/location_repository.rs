use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};

use repairhub_core::error::AppError;
use repairhub_core::models::{
    City, CityUpdate, NewCity, NewRegion, Region, RegionUpdate, RegionWithCities,
};
use repairhub_core::pagination::{Page, PageParams};

use crate::sql::{contains_pattern, db_error};

/// Repository for regions and cities.
#[derive(Clone)]
pub struct LocationRepository {
    pool: Pool<Postgres>,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---------------------------------------------------------------------
    // Regions
    // ---------------------------------------------------------------------

    pub async fn list_regions(&self, params: PageParams) -> Result<Page<Region>, AppError> {
        let params = params.normalized();
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM regions")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        let rows = sqlx::query_as::<_, RegionRow>(
            "SELECT * FROM regions ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, params))
    }

    pub async fn search_regions(
        &self,
        keyword: &str,
        params: PageParams,
    ) -> Result<Page<Region>, AppError> {
        let params = params.normalized();
        let pattern = contains_pattern(keyword);
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM regions WHERE name ILIKE $1")
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        let rows = sqlx::query_as::<_, RegionRow>(
            "SELECT * FROM regions WHERE name ILIKE $1 ORDER BY name LIMIT $2 OFFSET $3",
        )
        .bind(&pattern)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, params))
    }

    pub async fn get_region(&self, id: i64) -> Result<Option<Region>, AppError> {
        let row = sqlx::query_as::<_, RegionRow>("SELECT * FROM regions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    pub async fn require_region(&self, id: i64) -> Result<Region, AppError> {
        self.get_region(id)
            .await?
            .ok_or_else(|| AppError::not_found("Region", id))
    }

    async fn region_name_taken(&self, name: &str, except: Option<i64>) -> Result<bool, AppError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM regions WHERE LOWER(name) = LOWER($1) AND id IS DISTINCT FROM $2)",
        )
        .bind(name)
        .bind(except)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    pub async fn create_region(&self, region: &NewRegion) -> Result<Region, AppError> {
        region.validate()?;
        if self.region_name_taken(&region.name, None).await? {
            return Err(AppError::BadRequest(format!(
                "Region '{}' already exists",
                region.name
            )));
        }
        let row = sqlx::query_as::<_, RegionRow>(
            "INSERT INTO regions (name) VALUES ($1) RETURNING *",
        )
        .bind(region.name.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn update_region(&self, id: i64, update: &RegionUpdate) -> Result<Region, AppError> {
        self.require_region(id).await?;
        if let Some(name) = &update.name
            && self.region_name_taken(name, Some(id)).await?
        {
            return Err(AppError::BadRequest(format!("Region '{name}' already exists")));
        }
        let row = sqlx::query_as::<_, RegionRow>(
            r#"
            UPDATE regions SET name = COALESCE($2, name), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn delete_region(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM regions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Region", id));
        }
        Ok(())
    }

    pub async fn region_with_cities(&self, id: i64) -> Result<RegionWithCities, AppError> {
        let region = self.require_region(id).await?;
        let cities = sqlx::query_as::<_, CityRow>(
            "SELECT * FROM cities WHERE region_id = $1 ORDER BY name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(RegionWithCities {
            region,
            cities: cities.into_iter().map(Into::into).collect(),
        })
    }

    // ---------------------------------------------------------------------
    // Cities
    // ---------------------------------------------------------------------

    pub async fn list_cities(&self, params: PageParams) -> Result<Page<City>, AppError> {
        self.search_cities(None, None, params).await
    }

    pub async fn cities_by_region(
        &self,
        region_id: i64,
        params: PageParams,
    ) -> Result<Page<City>, AppError> {
        self.require_region(region_id).await?;
        self.search_cities(None, Some(region_id), params).await
    }

    /// Cities whose name contains `keyword` (case-insensitive), optionally
    /// restricted to a region.
    pub async fn search_cities(
        &self,
        keyword: Option<&str>,
        region_id: Option<i64>,
        params: PageParams,
    ) -> Result<Page<City>, AppError> {
        let params = params.normalized();
        let pattern = contains_pattern(keyword.unwrap_or_default());
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cities WHERE name ILIKE $1 AND ($2::BIGINT IS NULL OR region_id = $2)",
        )
        .bind(&pattern)
        .bind(region_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        let rows = sqlx::query_as::<_, CityRow>(
            r#"
            SELECT * FROM cities
            WHERE name ILIKE $1 AND ($2::BIGINT IS NULL OR region_id = $2)
            ORDER BY name
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&pattern)
        .bind(region_id)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, params))
    }

    /// Cities ordered by population, largest first.
    pub async fn largest_cities(&self, limit: i64) -> Result<Vec<City>, AppError> {
        let rows = sqlx::query_as::<_, CityRow>(
            "SELECT * FROM cities ORDER BY population DESC, name LIMIT $1",
        )
        .bind(limit.clamp(0, 100))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Exact, case-insensitive lookup by name.
    pub async fn find_city_by_name(&self, name: &str) -> Result<Option<City>, AppError> {
        let row = sqlx::query_as::<_, CityRow>(
            "SELECT * FROM cities WHERE LOWER(name) = LOWER($1) ORDER BY population DESC LIMIT 1",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    pub async fn get_city(&self, id: i64) -> Result<Option<City>, AppError> {
        let row = sqlx::query_as::<_, CityRow>("SELECT * FROM cities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    pub async fn require_city(&self, id: i64) -> Result<City, AppError> {
        self.get_city(id)
            .await?
            .ok_or_else(|| AppError::not_found("City", id))
    }

    pub async fn create_city(&self, city: &NewCity) -> Result<City, AppError> {
        city.validate()?;
        self.require_region(city.region_id).await?;
        let row = sqlx::query_as::<_, CityRow>(
            "INSERT INTO cities (name, region_id, population) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(city.name.trim())
        .bind(city.region_id)
        .bind(city.population)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn update_city(&self, id: i64, update: &CityUpdate) -> Result<City, AppError> {
        self.require_city(id).await?;
        if let Some(region_id) = update.region_id {
            self.require_region(region_id).await?;
        }
        let row = sqlx::query_as::<_, CityRow>(
            r#"
            UPDATE cities SET
                name = COALESCE($2, name),
                region_id = COALESCE($3, region_id),
                population = COALESCE($4, population),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(update.region_id)
        .bind(update.population)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn delete_city(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM cities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("City", id));
        }
        Ok(())
    }
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct RegionRow {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RegionRow> for Region {
    fn from(row: RegionRow) -> Self {
        Region {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CityRow {
    id: i64,
    name: String,
    region_id: i64,
    population: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CityRow> for City {
    fn from(row: CityRow) -> Self {
        City {
            id: row.id,
            name: row.name,
            region_id: row.region_id,
            population: row.population,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
