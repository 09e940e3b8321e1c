use sqlx::{PgPool, Pool, Postgres};

use repairhub_core::error::AppError;
use repairhub_core::models::{
    BrandWithModels, DeviceBrand, DeviceBrandUpdate, DeviceModel, DeviceModelUpdate, DeviceType,
    NewDeviceBrand, NewDeviceModel,
};
use repairhub_core::pagination::{Page, PageParams};

use crate::sql::{contains_pattern, db_error, parse_column};

/// Repository for device brands and models.
#[derive(Clone)]
pub struct DeviceRepository {
    pool: Pool<Postgres>,
}

impl DeviceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---------------------------------------------------------------------
    // Brands
    // ---------------------------------------------------------------------

    pub async fn list_brands(&self, params: PageParams) -> Result<Page<DeviceBrand>, AppError> {
        self.search_brands("", params).await
    }

    pub async fn search_brands(
        &self,
        keyword: &str,
        params: PageParams,
    ) -> Result<Page<DeviceBrand>, AppError> {
        let params = params.normalized();
        let pattern = contains_pattern(keyword);
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM device_brands WHERE name ILIKE $1")
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;
        let rows = sqlx::query_as::<_, BrandRow>(
            "SELECT id, name FROM device_brands WHERE name ILIKE $1 ORDER BY name LIMIT $2 OFFSET $3",
        )
        .bind(&pattern)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, params))
    }

    pub async fn get_brand(&self, id: i64) -> Result<Option<DeviceBrand>, AppError> {
        let row = sqlx::query_as::<_, BrandRow>("SELECT id, name FROM device_brands WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    pub async fn require_brand(&self, id: i64) -> Result<DeviceBrand, AppError> {
        self.get_brand(id)
            .await?
            .ok_or_else(|| AppError::not_found("Device brand", id))
    }

    async fn brand_name_taken(&self, name: &str, except: Option<i64>) -> Result<bool, AppError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM device_brands WHERE LOWER(name) = LOWER($1) AND id IS DISTINCT FROM $2)",
        )
        .bind(name.trim())
        .bind(except)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    pub async fn create_brand(&self, brand: &NewDeviceBrand) -> Result<DeviceBrand, AppError> {
        brand.validate()?;
        if self.brand_name_taken(&brand.name, None).await? {
            return Err(AppError::BadRequest(format!(
                "Brand '{}' already exists",
                brand.name
            )));
        }
        let row = sqlx::query_as::<_, BrandRow>(
            "INSERT INTO device_brands (name) VALUES ($1) RETURNING id, name",
        )
        .bind(brand.name.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn update_brand(
        &self,
        id: i64,
        update: &DeviceBrandUpdate,
    ) -> Result<DeviceBrand, AppError> {
        self.require_brand(id).await?;
        if let Some(name) = &update.name
            && self.brand_name_taken(name, Some(id)).await?
        {
            return Err(AppError::BadRequest(format!("Brand '{name}' already exists")));
        }
        let row = sqlx::query_as::<_, BrandRow>(
            "UPDATE device_brands SET name = COALESCE($2, name) WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn delete_brand(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM device_brands WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Device brand", id));
        }
        Ok(())
    }

    pub async fn brand_with_models(&self, id: i64) -> Result<BrandWithModels, AppError> {
        let brand = self.require_brand(id).await?;
        let rows = sqlx::query_as::<_, ModelRow>(
            "SELECT * FROM device_models WHERE device_brand_id = $1 ORDER BY name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        let models = rows
            .into_iter()
            .map(DeviceModel::try_from)
            .collect::<Result<_, _>>()?;
        Ok(BrandWithModels { brand, models })
    }

    // ---------------------------------------------------------------------
    // Models
    // ---------------------------------------------------------------------

    pub async fn list_models(&self, params: PageParams) -> Result<Page<DeviceModel>, AppError> {
        self.search_models(None, None, params).await
    }

    pub async fn models_by_brand(
        &self,
        brand_id: i64,
        params: PageParams,
    ) -> Result<Page<DeviceModel>, AppError> {
        self.require_brand(brand_id).await?;
        self.search_models(None, Some(brand_id), params).await
    }

    pub async fn search_models(
        &self,
        keyword: Option<&str>,
        brand_id: Option<i64>,
        params: PageParams,
    ) -> Result<Page<DeviceModel>, AppError> {
        let params = params.normalized();
        let pattern = contains_pattern(keyword.unwrap_or_default());
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM device_models WHERE name ILIKE $1 AND ($2::BIGINT IS NULL OR device_brand_id = $2)",
        )
        .bind(&pattern)
        .bind(brand_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        let rows = sqlx::query_as::<_, ModelRow>(
            r#"
            SELECT * FROM device_models
            WHERE name ILIKE $1 AND ($2::BIGINT IS NULL OR device_brand_id = $2)
            ORDER BY name
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&pattern)
        .bind(brand_id)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        let items = rows
            .into_iter()
            .map(DeviceModel::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Page::new(items, total, params))
    }

    pub async fn get_model(&self, id: i64) -> Result<Option<DeviceModel>, AppError> {
        let row = sqlx::query_as::<_, ModelRow>("SELECT * FROM device_models WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.map(DeviceModel::try_from).transpose()
    }

    pub async fn require_model(&self, id: i64) -> Result<DeviceModel, AppError> {
        self.get_model(id)
            .await?
            .ok_or_else(|| AppError::not_found("Device model", id))
    }

    /// Exact, case-insensitive lookup by model name.
    pub async fn find_model_by_name(&self, name: &str) -> Result<Option<DeviceModel>, AppError> {
        let row = sqlx::query_as::<_, ModelRow>(
            "SELECT * FROM device_models WHERE LOWER(name) = LOWER($1) ORDER BY id LIMIT 1",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(DeviceModel::try_from).transpose()
    }

    pub async fn create_model(&self, model: &NewDeviceModel) -> Result<DeviceModel, AppError> {
        model.validate()?;
        self.require_brand(model.device_brand_id).await?;
        let row = sqlx::query_as::<_, ModelRow>(
            r#"
            INSERT INTO device_models
                (device_brand_id, name, type, release_year, display_size, processor, ram, storage)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(model.device_brand_id)
        .bind(model.name.trim())
        .bind(model.device_type.as_str())
        .bind(model.release_year)
        .bind(model.display_size)
        .bind(&model.processor)
        .bind(model.ram)
        .bind(model.storage)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        row.try_into()
    }

    pub async fn update_model(
        &self,
        id: i64,
        update: &DeviceModelUpdate,
    ) -> Result<DeviceModel, AppError> {
        self.require_model(id).await?;
        if let Some(brand_id) = update.device_brand_id {
            self.require_brand(brand_id).await?;
        }
        let row = sqlx::query_as::<_, ModelRow>(
            r#"
            UPDATE device_models SET
                device_brand_id = COALESCE($2, device_brand_id),
                name = COALESCE($3, name),
                type = COALESCE($4, type),
                release_year = COALESCE($5, release_year),
                display_size = COALESCE($6, display_size),
                processor = COALESCE($7, processor),
                ram = COALESCE($8, ram),
                storage = COALESCE($9, storage)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.device_brand_id)
        .bind(&update.name)
        .bind(update.device_type.map(|t| t.as_str()))
        .bind(update.release_year)
        .bind(update.display_size)
        .bind(&update.processor)
        .bind(update.ram)
        .bind(update.storage)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        row.try_into()
    }

    pub async fn delete_model(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM device_models WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Device model", id));
        }
        Ok(())
    }
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct BrandRow {
    id: i64,
    name: String,
}

impl From<BrandRow> for DeviceBrand {
    fn from(row: BrandRow) -> Self {
        DeviceBrand {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ModelRow {
    id: i64,
    device_brand_id: i64,
    name: String,
    #[sqlx(rename = "type")]
    device_type: String,
    release_year: Option<i32>,
    display_size: Option<f64>,
    processor: Option<String>,
    ram: Option<i32>,
    storage: Option<i32>,
}

impl TryFrom<ModelRow> for DeviceModel {
    type Error = AppError;

    fn try_from(row: ModelRow) -> Result<Self, Self::Error> {
        Ok(DeviceModel {
            id: row.id,
            device_brand_id: row.device_brand_id,
            name: row.name,
            device_type: parse_column::<DeviceType>("type", &row.device_type)?,
            release_year: row.release_year,
            display_size: row.display_size,
            processor: row.processor,
            ram: row.ram,
            storage: row.storage,
        })
    }
}
