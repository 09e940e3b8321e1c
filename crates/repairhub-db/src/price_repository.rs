use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres, Transaction};

use repairhub_core::error::AppError;
use repairhub_core::models::{
    ModelRepair, ModelRepairUpdate, NewModelRepair, NewPrice, NewRepairPrice, Price,
    PriceAnalytic, PriceComparison, PriceStatistics, PriceUpdate, RepairPrice, RepairPriceUpdate,
    ServiceCenterPrice,
};
use repairhub_core::pagination::{Page, PageParams};

use crate::sql::db_error;

/// Repository for model repairs, reference repair prices and per-center
/// prices. Every price a center sets is also recorded in `price_analytics`.
#[derive(Clone)]
pub struct PriceRepository {
    pool: Pool<Postgres>,
}

impl PriceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn require_exists(&self, table: &str, entity: &str, id: i64) -> Result<(), AppError> {
        let exists: bool =
            sqlx::query_scalar(&format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)"))
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;
        if exists {
            Ok(())
        } else {
            Err(AppError::not_found(entity, id))
        }
    }

    // ---------------------------------------------------------------------
    // Model repairs
    // ---------------------------------------------------------------------

    pub async fn model_repairs_by_model(
        &self,
        model_id: i64,
        params: PageParams,
    ) -> Result<Page<ModelRepair>, AppError> {
        self.model_repairs_where("model_id", model_id, params).await
    }

    pub async fn model_repairs_by_repair_type(
        &self,
        repair_type_id: i64,
        params: PageParams,
    ) -> Result<Page<ModelRepair>, AppError> {
        self.model_repairs_where("repair_type_id", repair_type_id, params)
            .await
    }

    async fn model_repairs_where(
        &self,
        column: &str,
        id: i64,
        params: PageParams,
    ) -> Result<Page<ModelRepair>, AppError> {
        let params = params.normalized();
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM model_repairs WHERE {column} = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        let rows = sqlx::query_as::<_, ModelRepairRow>(&format!(
            "SELECT * FROM model_repairs WHERE {column} = $1 ORDER BY id LIMIT $2 OFFSET $3"
        ))
        .bind(id)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, params))
    }

    pub async fn get_model_repair(&self, id: i64) -> Result<Option<ModelRepair>, AppError> {
        let row = sqlx::query_as::<_, ModelRepairRow>("SELECT * FROM model_repairs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    pub async fn require_model_repair(&self, id: i64) -> Result<ModelRepair, AppError> {
        self.get_model_repair(id)
            .await?
            .ok_or_else(|| AppError::not_found("Model repair", id))
    }

    async fn model_repair_pair_taken(
        &self,
        model_id: i64,
        repair_type_id: i64,
        except: Option<i64>,
    ) -> Result<bool, AppError> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM model_repairs
                WHERE model_id = $1 AND repair_type_id = $2 AND id IS DISTINCT FROM $3
            )
            "#,
        )
        .bind(model_id)
        .bind(repair_type_id)
        .bind(except)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    pub async fn create_model_repair(
        &self,
        entry: &NewModelRepair,
    ) -> Result<ModelRepair, AppError> {
        self.require_exists("device_models", "Device model", entry.model_id)
            .await?;
        self.require_exists("repair_types", "Repair type", entry.repair_type_id)
            .await?;
        if self
            .model_repair_pair_taken(entry.model_id, entry.repair_type_id, None)
            .await?
        {
            return Err(AppError::BadRequest(
                "This repair type is already linked to the model".into(),
            ));
        }
        let row = sqlx::query_as::<_, ModelRepairRow>(
            r#"
            INSERT INTO model_repairs (model_id, repair_type_id, complexity, estimated_time)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(entry.model_id)
        .bind(entry.repair_type_id)
        .bind(&entry.complexity)
        .bind(entry.estimated_time)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn update_model_repair(
        &self,
        id: i64,
        update: &ModelRepairUpdate,
    ) -> Result<ModelRepair, AppError> {
        let current = self.require_model_repair(id).await?;
        let model_id = update.model_id.unwrap_or(current.model_id);
        let repair_type_id = update.repair_type_id.unwrap_or(current.repair_type_id);
        if update.model_id.is_some() {
            self.require_exists("device_models", "Device model", model_id)
                .await?;
        }
        if update.repair_type_id.is_some() {
            self.require_exists("repair_types", "Repair type", repair_type_id)
                .await?;
        }
        if self
            .model_repair_pair_taken(model_id, repair_type_id, Some(id))
            .await?
        {
            return Err(AppError::BadRequest(
                "This repair type is already linked to the model".into(),
            ));
        }
        let row = sqlx::query_as::<_, ModelRepairRow>(
            r#"
            UPDATE model_repairs SET
                model_id = $2,
                repair_type_id = $3,
                complexity = COALESCE($4, complexity),
                estimated_time = COALESCE($5, estimated_time)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(model_id)
        .bind(repair_type_id)
        .bind(&update.complexity)
        .bind(update.estimated_time)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn delete_model_repair(&self, id: i64) -> Result<(), AppError> {
        self.delete_from("model_repairs", "Model repair", id).await
    }

    // ---------------------------------------------------------------------
    // Repair prices
    // ---------------------------------------------------------------------

    pub async fn repair_prices_by_model(
        &self,
        device_model_id: i64,
        params: PageParams,
    ) -> Result<Page<RepairPrice>, AppError> {
        self.repair_prices_where("device_model_id", device_model_id, params)
            .await
    }

    pub async fn repair_prices_by_repair(
        &self,
        repair_id: i64,
        params: PageParams,
    ) -> Result<Page<RepairPrice>, AppError> {
        self.repair_prices_where("repair_id", repair_id, params).await
    }

    async fn repair_prices_where(
        &self,
        column: &str,
        id: i64,
        params: PageParams,
    ) -> Result<Page<RepairPrice>, AppError> {
        let params = params.normalized();
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM repair_prices WHERE {column} = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        let rows = sqlx::query_as::<_, RepairPriceRow>(&format!(
            "SELECT * FROM repair_prices WHERE {column} = $1 ORDER BY id LIMIT $2 OFFSET $3"
        ))
        .bind(id)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, params))
    }

    /// Aggregates reference prices, optionally filtered by repair and model.
    /// Entries without a price are ignored.
    pub async fn repair_price_statistics(
        &self,
        repair_id: Option<i64>,
        device_model_id: Option<i64>,
    ) -> Result<PriceStatistics, AppError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT
                COALESCE(AVG(price), 0)::DOUBLE PRECISION AS avg_price,
                COALESCE(MIN(price), 0)::DOUBLE PRECISION AS min_price,
                COALESCE(MAX(price), 0)::DOUBLE PRECISION AS max_price,
                COUNT(price) AS count
            FROM repair_prices
            WHERE ($1::BIGINT IS NULL OR repair_id = $1)
              AND ($2::BIGINT IS NULL OR device_model_id = $2)
            "#,
        )
        .bind(repair_id)
        .bind(device_model_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn get_repair_price(&self, id: i64) -> Result<Option<RepairPrice>, AppError> {
        let row = sqlx::query_as::<_, RepairPriceRow>("SELECT * FROM repair_prices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    pub async fn require_repair_price(&self, id: i64) -> Result<RepairPrice, AppError> {
        self.get_repair_price(id)
            .await?
            .ok_or_else(|| AppError::not_found("Repair price", id))
    }

    pub async fn find_repair_price(
        &self,
        device_model_id: i64,
        repair_id: i64,
    ) -> Result<Option<RepairPrice>, AppError> {
        let row = sqlx::query_as::<_, RepairPriceRow>(
            "SELECT * FROM repair_prices WHERE device_model_id = $1 AND repair_id = $2",
        )
        .bind(device_model_id)
        .bind(repair_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    async fn repair_price_pair_taken(
        &self,
        device_model_id: i64,
        repair_id: i64,
        except: Option<i64>,
    ) -> Result<bool, AppError> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM repair_prices
                WHERE device_model_id = $1 AND repair_id = $2 AND id IS DISTINCT FROM $3
            )
            "#,
        )
        .bind(device_model_id)
        .bind(repair_id)
        .bind(except)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    pub async fn create_repair_price(
        &self,
        entry: &NewRepairPrice,
    ) -> Result<RepairPrice, AppError> {
        entry.validate()?;
        self.require_exists("device_models", "Device model", entry.device_model_id)
            .await?;
        self.require_exists("repairs", "Repair", entry.repair_id)
            .await?;
        if self
            .repair_price_pair_taken(entry.device_model_id, entry.repair_id, None)
            .await?
        {
            return Err(AppError::BadRequest(
                "A price for this repair on this model already exists".into(),
            ));
        }
        let row = sqlx::query_as::<_, RepairPriceRow>(
            "INSERT INTO repair_prices (device_model_id, repair_id, price) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(entry.device_model_id)
        .bind(entry.repair_id)
        .bind(entry.price)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn update_repair_price(
        &self,
        id: i64,
        update: &RepairPriceUpdate,
    ) -> Result<RepairPrice, AppError> {
        update.validate()?;
        let current = self.require_repair_price(id).await?;
        let device_model_id = update.device_model_id.unwrap_or(current.device_model_id);
        let repair_id = update.repair_id.unwrap_or(current.repair_id);
        if update.device_model_id.is_some() {
            self.require_exists("device_models", "Device model", device_model_id)
                .await?;
        }
        if update.repair_id.is_some() {
            self.require_exists("repairs", "Repair", repair_id).await?;
        }
        if self
            .repair_price_pair_taken(device_model_id, repair_id, Some(id))
            .await?
        {
            return Err(AppError::BadRequest(
                "A price for this repair on this model already exists".into(),
            ));
        }
        let row = sqlx::query_as::<_, RepairPriceRow>(
            r#"
            UPDATE repair_prices SET
                device_model_id = $2,
                repair_id = $3,
                price = COALESCE($4, price)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(device_model_id)
        .bind(repair_id)
        .bind(update.price)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn delete_repair_price(&self, id: i64) -> Result<(), AppError> {
        self.delete_from("repair_prices", "Repair price", id).await
    }

    // ---------------------------------------------------------------------
    // Service center prices
    // ---------------------------------------------------------------------

    pub async fn prices_by_service_center(
        &self,
        service_center_id: i64,
        params: PageParams,
    ) -> Result<Page<Price>, AppError> {
        let params = params.normalized();
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM prices WHERE service_center_id = $1")
                .bind(service_center_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;
        let rows = sqlx::query_as::<_, PriceRow>(
            "SELECT * FROM prices WHERE service_center_id = $1 ORDER BY price, id LIMIT $2 OFFSET $3",
        )
        .bind(service_center_id)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, params))
    }

    /// Every price a center has set, cheapest first.
    pub async fn all_prices_for_center(&self, service_center_id: i64) -> Result<Vec<Price>, AppError> {
        let rows = sqlx::query_as::<_, PriceRow>(
            "SELECT * FROM prices WHERE service_center_id = $1 ORDER BY price, id",
        )
        .bind(service_center_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Center prices for the reference entry of a model/repair pair.
    pub async fn prices_by_model_and_repair(
        &self,
        device_model_id: i64,
        repair_id: i64,
        params: PageParams,
    ) -> Result<Page<Price>, AppError> {
        let params = params.normalized();
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM prices p
            JOIN repair_prices rp ON rp.id = p.repair_price_id
            WHERE rp.device_model_id = $1 AND rp.repair_id = $2
            "#,
        )
        .bind(device_model_id)
        .bind(repair_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        let rows = sqlx::query_as::<_, PriceRow>(
            r#"
            SELECT p.* FROM prices p
            JOIN repair_prices rp ON rp.id = p.repair_price_id
            WHERE rp.device_model_id = $1 AND rp.repair_id = $2
            ORDER BY p.price, p.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(device_model_id)
        .bind(repair_id)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, params))
    }

    /// Compares what each service center charges for a repair on a model,
    /// cheapest first. An unknown pair yields an empty comparison.
    pub async fn compare_prices(
        &self,
        device_model_id: i64,
        repair_id: i64,
    ) -> Result<PriceComparison, AppError> {
        let Some(repair_price) = self.find_repair_price(device_model_id, repair_id).await? else {
            return Ok(PriceComparison::default());
        };

        let stats = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT
                COALESCE(AVG(price), 0)::DOUBLE PRECISION AS avg_price,
                COALESCE(MIN(price), 0)::DOUBLE PRECISION AS min_price,
                COALESCE(MAX(price), 0)::DOUBLE PRECISION AS max_price,
                COUNT(price) AS count
            FROM prices
            WHERE repair_price_id = $1
            "#,
        )
        .bind(repair_price.id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        let centers = sqlx::query_as::<_, CenterPriceRow>(
            r#"
            SELECT p.service_center_id, sc.name AS service_center_name, p.price
            FROM prices p
            JOIN service_centers sc ON sc.id = p.service_center_id
            WHERE p.repair_price_id = $1
            ORDER BY p.price, sc.name
            "#,
        )
        .bind(repair_price.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(PriceComparison::new(
            stats.into(),
            centers.into_iter().map(Into::into).collect(),
        ))
    }

    pub async fn get_price(&self, id: i64) -> Result<Option<Price>, AppError> {
        let row = sqlx::query_as::<_, PriceRow>("SELECT * FROM prices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    pub async fn require_price(&self, id: i64) -> Result<Price, AppError> {
        self.get_price(id)
            .await?
            .ok_or_else(|| AppError::not_found("Price", id))
    }

    pub async fn create_price(&self, entry: &NewPrice) -> Result<Price, AppError> {
        entry.validate()?;
        self.require_exists("service_centers", "Service center", entry.service_center_id)
            .await?;
        self.require_exists("repair_prices", "Repair price", entry.repair_price_id)
            .await?;
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM prices WHERE service_center_id = $1 AND repair_price_id = $2)",
        )
        .bind(entry.service_center_id)
        .bind(entry.repair_price_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        if taken {
            return Err(AppError::BadRequest(
                "This service center already has a price for this repair".into(),
            ));
        }

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let row = sqlx::query_as::<_, PriceRow>(
            "INSERT INTO prices (service_center_id, repair_price_id, price) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(entry.service_center_id)
        .bind(entry.repair_price_id)
        .bind(entry.price)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;
        record_price_change(&mut tx, &row).await?;
        tx.commit().await.map_err(db_error)?;

        Ok(row.into())
    }

    pub async fn update_price(&self, id: i64, update: &PriceUpdate) -> Result<Price, AppError> {
        update.validate()?;
        let current = self.require_price(id).await?;

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let row = sqlx::query_as::<_, PriceRow>(
            "UPDATE prices SET price = COALESCE($2, price) WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(update.price)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;
        if row.price != current.price {
            record_price_change(&mut tx, &row).await?;
        }
        tx.commit().await.map_err(db_error)?;

        Ok(row.into())
    }

    pub async fn delete_price(&self, id: i64) -> Result<(), AppError> {
        self.delete_from("prices", "Price", id).await
    }

    /// Recorded price points for a center and repair price, newest first.
    pub async fn price_history(
        &self,
        repair_price_id: i64,
        service_center_id: i64,
    ) -> Result<Vec<PriceAnalytic>, AppError> {
        let rows = sqlx::query_as::<_, AnalyticRow>(
            r#"
            SELECT * FROM price_analytics
            WHERE repair_price_id = $1 AND service_center_id = $2
            ORDER BY change_date DESC, id DESC
            "#,
        )
        .bind(repair_price_id)
        .bind(service_center_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_from(&self, table: &str, entity: &str, id: i64) -> Result<(), AppError> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(entity, id));
        }
        Ok(())
    }
}

async fn record_price_change(
    tx: &mut Transaction<'_, Postgres>,
    price: &PriceRow,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO price_analytics (repair_price_id, service_center_id, price) VALUES ($1, $2, $3)",
    )
    .bind(price.repair_price_id)
    .bind(price.service_center_id)
    .bind(price.price)
    .execute(&mut **tx)
    .await
    .map_err(db_error)?;
    tracing::debug!(
        service_center_id = price.service_center_id,
        repair_price_id = price.repair_price_id,
        price = price.price,
        "Recorded price change"
    );
    Ok(())
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct ModelRepairRow {
    id: i64,
    model_id: i64,
    repair_type_id: i64,
    complexity: Option<String>,
    estimated_time: Option<i32>,
}

impl From<ModelRepairRow> for ModelRepair {
    fn from(row: ModelRepairRow) -> Self {
        ModelRepair {
            id: row.id,
            model_id: row.model_id,
            repair_type_id: row.repair_type_id,
            complexity: row.complexity,
            estimated_time: row.estimated_time,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RepairPriceRow {
    id: i64,
    device_model_id: i64,
    repair_id: i64,
    price: Option<f64>,
}

impl From<RepairPriceRow> for RepairPrice {
    fn from(row: RepairPriceRow) -> Self {
        RepairPrice {
            id: row.id,
            device_model_id: row.device_model_id,
            repair_id: row.repair_id,
            price: row.price,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PriceRow {
    id: i64,
    service_center_id: i64,
    repair_price_id: i64,
    price: f64,
}

impl From<PriceRow> for Price {
    fn from(row: PriceRow) -> Self {
        Price {
            id: row.id,
            service_center_id: row.service_center_id,
            repair_price_id: row.repair_price_id,
            price: row.price,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    avg_price: f64,
    min_price: f64,
    max_price: f64,
    count: i64,
}

impl From<StatsRow> for PriceStatistics {
    fn from(row: StatsRow) -> Self {
        PriceStatistics {
            avg_price: row.avg_price,
            min_price: row.min_price,
            max_price: row.max_price,
            count: row.count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CenterPriceRow {
    service_center_id: i64,
    service_center_name: String,
    price: f64,
}

impl From<CenterPriceRow> for ServiceCenterPrice {
    fn from(row: CenterPriceRow) -> Self {
        ServiceCenterPrice {
            service_center_id: row.service_center_id,
            service_center_name: row.service_center_name,
            price: row.price,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AnalyticRow {
    id: i64,
    repair_price_id: i64,
    service_center_id: i64,
    price: f64,
    change_date: DateTime<Utc>,
}

impl From<AnalyticRow> for PriceAnalytic {
    fn from(row: AnalyticRow) -> Self {
        PriceAnalytic {
            id: row.id,
            repair_price_id: row.repair_price_id,
            service_center_id: row.service_center_id,
            price: row.price,
            change_date: row.change_date,
        }
    }
}
