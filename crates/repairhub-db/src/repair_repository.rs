use sqlx::{PgPool, Pool, Postgres, Transaction};

use repairhub_core::error::AppError;
use repairhub_core::models::{
    NewPart, NewRepair, NewRepairPart, NewRepairType, Part, PartUpdate, Repair, RepairPart,
    RepairPartUpdate, RepairType, RepairTypeUpdate, RepairTypeWithParts, RepairUpdate,
    RepairWithTypes,
};
use repairhub_core::pagination::{Page, PageParams};

use crate::sql::{contains_pattern, db_error};

/// Repository for the repair catalog: repairs, repair types, parts and the
/// parts each repair type consumes.
#[derive(Clone)]
pub struct RepairRepository {
    pool: Pool<Postgres>,
}

impl RepairRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---------------------------------------------------------------------
    // Repairs
    // ---------------------------------------------------------------------

    pub async fn list_repairs(&self, params: PageParams) -> Result<Page<Repair>, AppError> {
        self.search_repairs("", params).await
    }

    /// Repairs whose name or description contains `keyword`.
    pub async fn search_repairs(
        &self,
        keyword: &str,
        params: PageParams,
    ) -> Result<Page<Repair>, AppError> {
        let params = params.normalized();
        let pattern = contains_pattern(keyword);
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM repairs WHERE name ILIKE $1 OR description ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        let rows = sqlx::query_as::<_, RepairRow>(
            r#"
            SELECT id, name, description FROM repairs
            WHERE name ILIKE $1 OR description ILIKE $1
            ORDER BY name
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, params))
    }

    pub async fn get_repair(&self, id: i64) -> Result<Option<Repair>, AppError> {
        let row = sqlx::query_as::<_, RepairRow>(
            "SELECT id, name, description FROM repairs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    pub async fn require_repair(&self, id: i64) -> Result<Repair, AppError> {
        self.get_repair(id)
            .await?
            .ok_or_else(|| AppError::not_found("Repair", id))
    }

    /// Exact, case-insensitive lookup by repair name.
    pub async fn find_repair_by_name(&self, name: &str) -> Result<Option<Repair>, AppError> {
        let row = sqlx::query_as::<_, RepairRow>(
            "SELECT id, name, description FROM repairs WHERE LOWER(name) = LOWER($1) ORDER BY id LIMIT 1",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    pub async fn create_repair(&self, repair: &NewRepair) -> Result<Repair, AppError> {
        repair.validate()?;
        for type_id in &repair.repair_type_ids {
            self.require_repair_type(*type_id).await?;
        }

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let row = sqlx::query_as::<_, RepairRow>(
            "INSERT INTO repairs (name, description) VALUES ($1, $2) RETURNING id, name, description",
        )
        .bind(repair.name.trim())
        .bind(&repair.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;
        link_repair_types(&mut tx, row.id, &repair.repair_type_ids).await?;
        tx.commit().await.map_err(db_error)?;

        Ok(row.into())
    }

    pub async fn update_repair(&self, id: i64, update: &RepairUpdate) -> Result<Repair, AppError> {
        self.require_repair(id).await?;
        if let Some(type_ids) = &update.repair_type_ids {
            for type_id in type_ids {
                self.require_repair_type(*type_id).await?;
            }
        }

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let row = sqlx::query_as::<_, RepairRow>(
            r#"
            UPDATE repairs SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, name, description
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;
        if let Some(type_ids) = &update.repair_type_ids {
            sqlx::query("DELETE FROM repair_type_repair WHERE repair_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            link_repair_types(&mut tx, id, type_ids).await?;
        }
        tx.commit().await.map_err(db_error)?;

        Ok(row.into())
    }

    pub async fn delete_repair(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM repairs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Repair", id));
        }
        Ok(())
    }

    pub async fn repair_with_types(&self, id: i64) -> Result<RepairWithTypes, AppError> {
        let repair = self.require_repair(id).await?;
        let types = sqlx::query_as::<_, RepairTypeRow>(
            r#"
            SELECT rt.id, rt.group_name, rt.name, rt.description
            FROM repair_types rt
            JOIN repair_type_repair rtr ON rtr.repair_type_id = rt.id
            WHERE rtr.repair_id = $1
            ORDER BY rt.group_name, rt.name
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(RepairWithTypes {
            repair,
            repair_types: types.into_iter().map(Into::into).collect(),
        })
    }

    // ---------------------------------------------------------------------
    // Repair types
    // ---------------------------------------------------------------------

    pub async fn list_repair_types(
        &self,
        params: PageParams,
    ) -> Result<Page<RepairType>, AppError> {
        self.search_repair_types("", None, params).await
    }

    pub async fn repair_types_by_group(
        &self,
        group_name: &str,
        params: PageParams,
    ) -> Result<Page<RepairType>, AppError> {
        self.search_repair_types("", Some(group_name), params).await
    }

    pub async fn search_repair_types(
        &self,
        keyword: &str,
        group_name: Option<&str>,
        params: PageParams,
    ) -> Result<Page<RepairType>, AppError> {
        let params = params.normalized();
        let pattern = contains_pattern(keyword);
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM repair_types
            WHERE (name ILIKE $1 OR description ILIKE $1)
              AND ($2::TEXT IS NULL OR group_name = $2)
            "#,
        )
        .bind(&pattern)
        .bind(group_name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        let rows = sqlx::query_as::<_, RepairTypeRow>(
            r#"
            SELECT id, group_name, name, description FROM repair_types
            WHERE (name ILIKE $1 OR description ILIKE $1)
              AND ($2::TEXT IS NULL OR group_name = $2)
            ORDER BY group_name, name
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&pattern)
        .bind(group_name)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, params))
    }

    pub async fn get_repair_type(&self, id: i64) -> Result<Option<RepairType>, AppError> {
        let row = sqlx::query_as::<_, RepairTypeRow>(
            "SELECT id, group_name, name, description FROM repair_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    pub async fn require_repair_type(&self, id: i64) -> Result<RepairType, AppError> {
        self.get_repair_type(id)
            .await?
            .ok_or_else(|| AppError::not_found("Repair type", id))
    }

    pub async fn create_repair_type(
        &self,
        repair_type: &NewRepairType,
    ) -> Result<RepairType, AppError> {
        repair_type.validate()?;
        let row = sqlx::query_as::<_, RepairTypeRow>(
            r#"
            INSERT INTO repair_types (group_name, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, group_name, name, description
            "#,
        )
        .bind(repair_type.group_name.trim())
        .bind(repair_type.name.trim())
        .bind(&repair_type.description)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn update_repair_type(
        &self,
        id: i64,
        update: &RepairTypeUpdate,
    ) -> Result<RepairType, AppError> {
        self.require_repair_type(id).await?;
        let row = sqlx::query_as::<_, RepairTypeRow>(
            r#"
            UPDATE repair_types SET
                group_name = COALESCE($2, group_name),
                name = COALESCE($3, name),
                description = COALESCE($4, description)
            WHERE id = $1
            RETURNING id, group_name, name, description
            "#,
        )
        .bind(id)
        .bind(&update.group_name)
        .bind(&update.name)
        .bind(&update.description)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn delete_repair_type(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM repair_types WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Repair type", id));
        }
        Ok(())
    }

    pub async fn repair_type_with_parts(&self, id: i64) -> Result<RepairTypeWithParts, AppError> {
        let repair_type = self.require_repair_type(id).await?;
        let repair_parts = self.repair_parts_by_type(id).await?;
        let parts = sqlx::query_as::<_, PartRow>(
            r#"
            SELECT DISTINCT p.* FROM parts p
            JOIN repair_parts rp ON rp.part_id = p.id
            WHERE rp.repair_type_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(RepairTypeWithParts {
            repair_type,
            repair_parts,
            parts: parts.into_iter().map(Into::into).collect(),
        })
    }

    // ---------------------------------------------------------------------
    // Parts
    // ---------------------------------------------------------------------

    pub async fn list_parts(&self, params: PageParams) -> Result<Page<Part>, AppError> {
        self.search_parts("", params).await
    }

    /// Parts whose name, SKU or manufacturer contains `keyword`.
    pub async fn search_parts(
        &self,
        keyword: &str,
        params: PageParams,
    ) -> Result<Page<Part>, AppError> {
        let params = params.normalized();
        let pattern = contains_pattern(keyword);
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM parts WHERE name ILIKE $1 OR sku ILIKE $1 OR manufacturer ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        let rows = sqlx::query_as::<_, PartRow>(
            r#"
            SELECT * FROM parts
            WHERE name ILIKE $1 OR sku ILIKE $1 OR manufacturer ILIKE $1
            ORDER BY name
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, params))
    }

    /// Parts priced within `[min_price, max_price]`; an absent upper bound
    /// means unbounded.
    pub async fn parts_by_price_range(
        &self,
        min_price: f64,
        max_price: Option<f64>,
        params: PageParams,
    ) -> Result<Page<Part>, AppError> {
        if let Some(max) = max_price
            && max < min_price
        {
            return Err(AppError::BadRequest(
                "max_price must not be less than min_price".into(),
            ));
        }
        let params = params.normalized();
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM parts WHERE retail_price >= $1 AND ($2::DOUBLE PRECISION IS NULL OR retail_price <= $2)",
        )
        .bind(min_price)
        .bind(max_price)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        let rows = sqlx::query_as::<_, PartRow>(
            r#"
            SELECT * FROM parts
            WHERE retail_price >= $1 AND ($2::DOUBLE PRECISION IS NULL OR retail_price <= $2)
            ORDER BY retail_price, name
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(min_price)
        .bind(max_price)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, params))
    }

    pub async fn get_part(&self, id: i64) -> Result<Option<Part>, AppError> {
        let row = sqlx::query_as::<_, PartRow>("SELECT * FROM parts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    pub async fn require_part(&self, id: i64) -> Result<Part, AppError> {
        self.get_part(id)
            .await?
            .ok_or_else(|| AppError::not_found("Part", id))
    }

    pub async fn part_by_sku(&self, sku: &str) -> Result<Option<Part>, AppError> {
        let row = sqlx::query_as::<_, PartRow>("SELECT * FROM parts WHERE sku = $1 LIMIT 1")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    pub async fn create_part(&self, part: &NewPart) -> Result<Part, AppError> {
        part.validate()?;
        let row = sqlx::query_as::<_, PartRow>(
            r#"
            INSERT INTO parts (name, retail_price, currency, manufacturer, sku, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(part.name.trim())
        .bind(part.retail_price)
        .bind(&part.currency)
        .bind(&part.manufacturer)
        .bind(&part.sku)
        .bind(&part.description)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn update_part(&self, id: i64, update: &PartUpdate) -> Result<Part, AppError> {
        update.validate()?;
        self.require_part(id).await?;
        let row = sqlx::query_as::<_, PartRow>(
            r#"
            UPDATE parts SET
                name = COALESCE($2, name),
                retail_price = COALESCE($3, retail_price),
                currency = COALESCE($4, currency),
                manufacturer = COALESCE($5, manufacturer),
                sku = COALESCE($6, sku),
                description = COALESCE($7, description)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(update.retail_price)
        .bind(&update.currency)
        .bind(&update.manufacturer)
        .bind(&update.sku)
        .bind(&update.description)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn delete_part(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM parts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Part", id));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Repair parts
    // ---------------------------------------------------------------------

    pub async fn repair_parts_by_type(
        &self,
        repair_type_id: i64,
    ) -> Result<Vec<RepairPart>, AppError> {
        let rows = sqlx::query_as::<_, RepairPartRow>(
            "SELECT * FROM repair_parts WHERE repair_type_id = $1 ORDER BY id",
        )
        .bind(repair_type_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_repair_part(&self, id: i64) -> Result<Option<RepairPart>, AppError> {
        let row = sqlx::query_as::<_, RepairPartRow>("SELECT * FROM repair_parts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    pub async fn require_repair_part(&self, id: i64) -> Result<RepairPart, AppError> {
        self.get_repair_part(id)
            .await?
            .ok_or_else(|| AppError::not_found("Repair part", id))
    }

    pub async fn create_repair_part(&self, entry: &NewRepairPart) -> Result<RepairPart, AppError> {
        entry.validate()?;
        self.require_repair_type(entry.repair_type_id).await?;
        self.require_part(entry.part_id).await?;
        let row = sqlx::query_as::<_, RepairPartRow>(
            "INSERT INTO repair_parts (repair_type_id, part_id, quantity) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(entry.repair_type_id)
        .bind(entry.part_id)
        .bind(entry.quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn update_repair_part(
        &self,
        id: i64,
        update: &RepairPartUpdate,
    ) -> Result<RepairPart, AppError> {
        update.validate()?;
        self.require_repair_part(id).await?;
        if let Some(part_id) = update.part_id {
            self.require_part(part_id).await?;
        }
        let row = sqlx::query_as::<_, RepairPartRow>(
            r#"
            UPDATE repair_parts SET
                part_id = COALESCE($2, part_id),
                quantity = COALESCE($3, quantity)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.part_id)
        .bind(update.quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn delete_repair_part(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM repair_parts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Repair part", id));
        }
        Ok(())
    }
}

async fn link_repair_types(
    tx: &mut Transaction<'_, Postgres>,
    repair_id: i64,
    type_ids: &[i64],
) -> Result<(), AppError> {
    for type_id in type_ids {
        sqlx::query(
            "INSERT INTO repair_type_repair (repair_type_id, repair_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(type_id)
        .bind(repair_id)
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;
    }
    Ok(())
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct RepairRow {
    id: i64,
    name: String,
    description: Option<String>,
}

impl From<RepairRow> for Repair {
    fn from(row: RepairRow) -> Self {
        Repair {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RepairTypeRow {
    id: i64,
    group_name: String,
    name: String,
    description: Option<String>,
}

impl From<RepairTypeRow> for RepairType {
    fn from(row: RepairTypeRow) -> Self {
        RepairType {
            id: row.id,
            group_name: row.group_name,
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PartRow {
    id: i64,
    name: String,
    retail_price: f64,
    currency: String,
    manufacturer: Option<String>,
    sku: Option<String>,
    description: Option<String>,
}

impl From<PartRow> for Part {
    fn from(row: PartRow) -> Self {
        Part {
            id: row.id,
            name: row.name,
            retail_price: row.retail_price,
            currency: row.currency,
            manufacturer: row.manufacturer,
            sku: row.sku,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RepairPartRow {
    id: i64,
    repair_type_id: i64,
    part_id: i64,
    quantity: i32,
}

impl From<RepairPartRow> for RepairPart {
    fn from(row: RepairPartRow) -> Self {
        RepairPart {
            id: row.id,
            repair_type_id: row.repair_type_id,
            part_id: row.part_id,
            quantity: row.quantity,
        }
    }
}
