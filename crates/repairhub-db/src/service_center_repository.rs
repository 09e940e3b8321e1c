use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};
use tracing::info;

use repairhub_core::error::AppError;
use repairhub_core::models::{
    ClaimRequest, LinkType, NewClaimRequest, NewReview, NewServiceCenter, NewServiceCenterAddress,
    NewServiceCenterLink, RatingSummary, RequestStatus, Review, ServiceCenter,
    ServiceCenterAddress, ServiceCenterAddressUpdate, ServiceCenterDetail, ServiceCenterLink,
    ServiceCenterLinkUpdate, ServiceCenterSummary, ServiceCenterUpdate,
};
use repairhub_core::pagination::{Page, PageParams};

use crate::location_repository::LocationRepository;
use crate::price_repository::PriceRepository;
use crate::sql::{contains_pattern, db_error, parse_column};
use crate::user_repository::UserRepository;

/// Rating aggregate and primary address joined onto each listed center.
const SUMMARY_SELECT: &str = r#"
    SELECT
        sc.id, sc.name, sc.city_id, sc.owner_id, sc.phone,
        (
            SELECT a.name FROM service_center_addresses a
            WHERE a.service_center_id = sc.id
            ORDER BY a.id
            LIMIT 1
        ) AS address,
        COALESCE(AVG(r.rating), 0)::DOUBLE PRECISION AS avg_rating,
        COUNT(r.id) AS reviews_count
    FROM service_centers sc
    LEFT JOIN reviews r ON r.service_center_id = sc.id
"#;

/// Repository for service centers and everything attached to them:
/// addresses, links, reviews and ownership claims.
#[derive(Clone)]
pub struct ServiceCenterRepository {
    pool: Pool<Postgres>,
}

impl ServiceCenterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---------------------------------------------------------------------
    // Service centers
    // ---------------------------------------------------------------------

    pub async fn list(&self, params: PageParams) -> Result<Page<ServiceCenterSummary>, AppError> {
        self.search("", None, params).await
    }

    /// Centers whose name contains `keyword`, optionally in one city,
    /// ordered by name.
    pub async fn search(
        &self,
        keyword: &str,
        city_id: Option<i64>,
        params: PageParams,
    ) -> Result<Page<ServiceCenterSummary>, AppError> {
        let params = params.normalized();
        let pattern = contains_pattern(keyword.trim());
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM service_centers WHERE name ILIKE $1 AND ($2::BIGINT IS NULL OR city_id = $2)",
        )
        .bind(&pattern)
        .bind(city_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        let rows = sqlx::query_as::<_, SummaryRow>(&format!(
            r#"{SUMMARY_SELECT}
            WHERE sc.name ILIKE $1 AND ($2::BIGINT IS NULL OR sc.city_id = $2)
            GROUP BY sc.id
            ORDER BY sc.name, sc.id
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(&pattern)
        .bind(city_id)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, params))
    }

    pub async fn by_city(
        &self,
        city_id: i64,
        params: PageParams,
    ) -> Result<Page<ServiceCenterSummary>, AppError> {
        self.search("", Some(city_id), params).await
    }

    pub async fn by_owner(
        &self,
        owner_id: i64,
        params: PageParams,
    ) -> Result<Page<ServiceCenterSummary>, AppError> {
        let params = params.normalized();
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM service_centers WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;
        let rows = sqlx::query_as::<_, SummaryRow>(&format!(
            r#"{SUMMARY_SELECT}
            WHERE sc.owner_id = $1
            GROUP BY sc.id
            ORDER BY sc.name, sc.id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner_id)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, params))
    }

    /// Centers with the highest average review rating.
    pub async fn top_rated(&self, limit: i64) -> Result<Vec<ServiceCenterSummary>, AppError> {
        let rows = sqlx::query_as::<_, SummaryRow>(&format!(
            r#"{SUMMARY_SELECT}
            GROUP BY sc.id
            ORDER BY avg_rating DESC, reviews_count DESC, sc.name
            LIMIT $1
            "#
        ))
        .bind(limit.clamp(0, 100))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get(&self, id: i64) -> Result<Option<ServiceCenter>, AppError> {
        let row = sqlx::query_as::<_, CenterRow>("SELECT * FROM service_centers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    pub async fn require(&self, id: i64) -> Result<ServiceCenter, AppError> {
        self.get(id)
            .await?
            .ok_or_else(|| AppError::not_found("Service center", id))
    }

    pub async fn summary(&self, id: i64) -> Result<ServiceCenterSummary, AppError> {
        let row = sqlx::query_as::<_, SummaryRow>(&format!(
            "{SUMMARY_SELECT} WHERE sc.id = $1 GROUP BY sc.id"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(Into::into)
            .ok_or_else(|| AppError::not_found("Service center", id))
    }

    /// Names are unique per city only; centers without a city are never
    /// considered duplicates.
    async fn name_taken_in_city(
        &self,
        name: &str,
        city_id: Option<i64>,
        except: Option<i64>,
    ) -> Result<bool, AppError> {
        let Some(city_id) = city_id else {
            return Ok(false);
        };
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM service_centers
                WHERE LOWER(name) = LOWER($1)
                  AND city_id = $2
                  AND id IS DISTINCT FROM $3
            )
            "#,
        )
        .bind(name.trim())
        .bind(city_id)
        .bind(except)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn check_references(
        &self,
        city_id: Option<i64>,
        owner_id: Option<i64>,
    ) -> Result<(), AppError> {
        if let Some(city_id) = city_id {
            LocationRepository::new(self.pool.clone())
                .require_city(city_id)
                .await?;
        }
        if let Some(owner_id) = owner_id {
            UserRepository::new(self.pool.clone())
                .require(owner_id)
                .await?;
        }
        Ok(())
    }

    pub async fn create(&self, center: &NewServiceCenter) -> Result<ServiceCenter, AppError> {
        center.validate()?;
        self.check_references(center.city_id, center.owner_id)
            .await?;
        if self
            .name_taken_in_city(&center.name, center.city_id, None)
            .await?
        {
            return Err(AppError::BadRequest(format!(
                "Service center '{}' already exists in this city",
                center.name.trim()
            )));
        }
        let row = sqlx::query_as::<_, CenterRow>(
            r#"
            INSERT INTO service_centers (name, city_id, owner_id, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(center.name.trim())
        .bind(center.city_id)
        .bind(center.owner_id)
        .bind(&center.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn update(
        &self,
        id: i64,
        update: &ServiceCenterUpdate,
    ) -> Result<ServiceCenter, AppError> {
        let current = self.require(id).await?;
        self.check_references(update.city_id, update.owner_id)
            .await?;
        let name = update.name.as_deref().unwrap_or(&current.name);
        let city_id = update.city_id.or(current.city_id);
        if self.name_taken_in_city(name, city_id, Some(id)).await? {
            return Err(AppError::BadRequest(format!(
                "Service center '{}' already exists in this city",
                name.trim()
            )));
        }
        let row = sqlx::query_as::<_, CenterRow>(
            r#"
            UPDATE service_centers SET
                name = COALESCE($2, name),
                city_id = COALESCE($3, city_id),
                owner_id = COALESCE($4, owner_id),
                phone = COALESCE($5, phone),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.city_id)
        .bind(update.owner_id)
        .bind(&update.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM service_centers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Service center", id));
        }
        Ok(())
    }

    /// The center with its city, owner, addresses, links, reviews, prices
    /// and rating summary.
    pub async fn detail(&self, id: i64) -> Result<ServiceCenterDetail, AppError> {
        let center = self.require(id).await?;
        let city = match center.city_id {
            Some(city_id) => {
                LocationRepository::new(self.pool.clone())
                    .get_city(city_id)
                    .await?
            }
            None => None,
        };
        let owner = match center.owner_id {
            Some(owner_id) => UserRepository::new(self.pool.clone()).get(owner_id).await?,
            None => None,
        };
        let addresses = self.addresses(id).await?;
        let links = self.links(id).await?;
        let reviews = self.all_reviews(id).await?;
        let prices = PriceRepository::new(self.pool.clone())
            .all_prices_for_center(id)
            .await?;
        let rating = self.rating(id).await?;
        let reviews_count = reviews.len() as i64;

        Ok(ServiceCenterDetail {
            center,
            city,
            owner,
            addresses,
            links,
            reviews,
            prices,
            avg_rating: rating.average_rating,
            reviews_count,
        })
    }

    // ---------------------------------------------------------------------
    // Addresses
    // ---------------------------------------------------------------------

    pub async fn addresses(&self, center_id: i64) -> Result<Vec<ServiceCenterAddress>, AppError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            "SELECT * FROM service_center_addresses WHERE service_center_id = $1 ORDER BY id",
        )
        .bind(center_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_address(&self, id: i64) -> Result<Option<ServiceCenterAddress>, AppError> {
        let row = sqlx::query_as::<_, AddressRow>(
            "SELECT * FROM service_center_addresses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    pub async fn require_address(&self, id: i64) -> Result<ServiceCenterAddress, AppError> {
        self.get_address(id)
            .await?
            .ok_or_else(|| AppError::not_found("Address", id))
    }

    pub async fn add_address(
        &self,
        address: &NewServiceCenterAddress,
    ) -> Result<ServiceCenterAddress, AppError> {
        address.validate()?;
        self.require(address.service_center_id).await?;
        let row = sqlx::query_as::<_, AddressRow>(
            r#"
            INSERT INTO service_center_addresses
                (service_center_id, name, street, building, apartment, postal_code, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(address.service_center_id)
        .bind(address.name.trim())
        .bind(&address.street)
        .bind(&address.building)
        .bind(&address.apartment)
        .bind(&address.postal_code)
        .bind(address.latitude)
        .bind(address.longitude)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn update_address(
        &self,
        id: i64,
        update: &ServiceCenterAddressUpdate,
    ) -> Result<ServiceCenterAddress, AppError> {
        self.require_address(id).await?;
        let row = sqlx::query_as::<_, AddressRow>(
            r#"
            UPDATE service_center_addresses SET
                name = COALESCE($2, name),
                street = COALESCE($3, street),
                building = COALESCE($4, building),
                apartment = COALESCE($5, apartment),
                postal_code = COALESCE($6, postal_code),
                latitude = COALESCE($7, latitude),
                longitude = COALESCE($8, longitude)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.street)
        .bind(&update.building)
        .bind(&update.apartment)
        .bind(&update.postal_code)
        .bind(update.latitude)
        .bind(update.longitude)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    pub async fn delete_address(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM service_center_addresses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Address", id));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Links
    // ---------------------------------------------------------------------

    pub async fn links(&self, center_id: i64) -> Result<Vec<ServiceCenterLink>, AppError> {
        let rows = sqlx::query_as::<_, LinkRow>(
            "SELECT * FROM service_center_links WHERE service_center_id = $1 ORDER BY id",
        )
        .bind(center_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.into_iter().map(ServiceCenterLink::try_from).collect()
    }

    pub async fn get_link(&self, id: i64) -> Result<Option<ServiceCenterLink>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>("SELECT * FROM service_center_links WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.map(ServiceCenterLink::try_from).transpose()
    }

    pub async fn require_link(&self, id: i64) -> Result<ServiceCenterLink, AppError> {
        self.get_link(id)
            .await?
            .ok_or_else(|| AppError::not_found("Link", id))
    }

    pub async fn add_link(&self, link: &NewServiceCenterLink) -> Result<ServiceCenterLink, AppError> {
        link.validate()?;
        self.require(link.service_center_id).await?;
        let row = sqlx::query_as::<_, LinkRow>(
            "INSERT INTO service_center_links (service_center_id, type, link) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(link.service_center_id)
        .bind(link.link_type.map(|t| t.as_str()))
        .bind(link.link.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        row.try_into()
    }

    pub async fn update_link(
        &self,
        id: i64,
        update: &ServiceCenterLinkUpdate,
    ) -> Result<ServiceCenterLink, AppError> {
        self.require_link(id).await?;
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            UPDATE service_center_links SET
                type = COALESCE($2, type),
                link = COALESCE($3, link)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.link_type.map(|t| t.as_str()))
        .bind(&update.link)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        row.try_into()
    }

    pub async fn delete_link(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM service_center_links WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Link", id));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Reviews
    // ---------------------------------------------------------------------

    /// Reviews of a center, newest first.
    pub async fn reviews(
        &self,
        center_id: i64,
        params: PageParams,
    ) -> Result<Page<Review>, AppError> {
        let params = params.normalized();
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE service_center_id = $1")
                .bind(center_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;
        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT * FROM reviews
            WHERE service_center_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(center_id)
        .bind(params.limit)
        .bind(params.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, params))
    }

    async fn all_reviews(&self, center_id: i64) -> Result<Vec<Review>, AppError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT * FROM reviews WHERE service_center_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(center_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn add_review(&self, review: &NewReview) -> Result<Review, AppError> {
        review.validate()?;
        self.require(review.service_center_id).await?;
        let row = sqlx::query_as::<_, ReviewRow>(
            "INSERT INTO reviews (service_center_id, author, rating, text) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(review.service_center_id)
        .bind(review.author.trim())
        .bind(review.rating)
        .bind(&review.text)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    /// Average of the rated reviews; 0/0 when none carry a rating.
    pub async fn rating(&self, center_id: i64) -> Result<RatingSummary, AppError> {
        let (average_rating, count): (f64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(AVG(rating), 0)::DOUBLE PRECISION, COUNT(rating)
            FROM reviews
            WHERE service_center_id = $1
            "#,
        )
        .bind(center_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(RatingSummary {
            average_rating,
            count,
        })
    }

    // ---------------------------------------------------------------------
    // Ownership claims
    // ---------------------------------------------------------------------

    pub async fn create_claim(&self, claim: &NewClaimRequest) -> Result<ClaimRequest, AppError> {
        claim.validate()?;
        let center = self.require(claim.service_center_id).await?;
        if center.owner_id.is_some() {
            return Err(AppError::BadRequest(format!(
                "Service center '{}' already has an owner",
                center.name
            )));
        }
        let row = sqlx::query_as::<_, ClaimRow>(
            r#"
            INSERT INTO service_claim_requests (service_center_id, telegram_id, message, contact)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(claim.service_center_id)
        .bind(claim.telegram_id)
        .bind(claim.message.trim())
        .bind(claim.contact.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        info!(
            claim_id = row.id,
            service_center_id = row.service_center_id,
            "Ownership claim created"
        );
        row.try_into()
    }

    pub async fn get_claim(&self, id: i64) -> Result<Option<ClaimRequest>, AppError> {
        let row = sqlx::query_as::<_, ClaimRow>(
            "SELECT * FROM service_claim_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(ClaimRequest::try_from).transpose()
    }

    pub async fn require_claim(&self, id: i64) -> Result<ClaimRequest, AppError> {
        self.get_claim(id)
            .await?
            .ok_or_else(|| AppError::not_found("Claim request", id))
    }

    /// Approves a pending claim. When `owner_id` names a user, that user
    /// becomes the center's owner and is promoted to service owner.
    pub async fn approve_claim(
        &self,
        id: i64,
        owner_id: Option<i64>,
    ) -> Result<ClaimRequest, AppError> {
        let claim = self.require_claim(id).await?;
        ensure_pending(&claim)?;
        if let Some(owner_id) = owner_id {
            UserRepository::new(self.pool.clone())
                .require(owner_id)
                .await?;
        }

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        if let Some(owner_id) = owner_id {
            sqlx::query(
                "UPDATE service_centers SET owner_id = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(claim.service_center_id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
            sqlx::query(
                "UPDATE users SET role = 'service_owner', updated_at = NOW() WHERE id = $1 AND role = 'user'",
            )
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }
        let row = set_claim_status(&mut tx, id, RequestStatus::Approved).await?;
        tx.commit().await.map_err(db_error)?;

        info!(claim_id = id, ?owner_id, "Ownership claim approved");
        row.try_into()
    }

    pub async fn reject_claim(&self, id: i64) -> Result<ClaimRequest, AppError> {
        let claim = self.require_claim(id).await?;
        ensure_pending(&claim)?;

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let row = set_claim_status(&mut tx, id, RequestStatus::Rejected).await?;
        tx.commit().await.map_err(db_error)?;

        info!(claim_id = id, "Ownership claim rejected");
        row.try_into()
    }
}

fn ensure_pending(claim: &ClaimRequest) -> Result<(), AppError> {
    if claim.status.is_terminal() {
        return Err(AppError::BadRequest(format!(
            "Claim request {} is already processed (status: {})",
            claim.id, claim.status
        )));
    }
    Ok(())
}

async fn set_claim_status(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    id: i64,
    status: RequestStatus,
) -> Result<ClaimRow, AppError> {
    sqlx::query_as::<_, ClaimRow>(
        r#"
        UPDATE service_claim_requests SET status = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_one(&mut **tx)
    .await
    .map_err(db_error)
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct CenterRow {
    id: i64,
    city_id: Option<i64>,
    owner_id: Option<i64>,
    name: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CenterRow> for ServiceCenter {
    fn from(row: CenterRow) -> Self {
        ServiceCenter {
            id: row.id,
            city_id: row.city_id,
            owner_id: row.owner_id,
            name: row.name,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: i64,
    name: String,
    city_id: Option<i64>,
    owner_id: Option<i64>,
    phone: Option<String>,
    address: Option<String>,
    avg_rating: f64,
    reviews_count: i64,
}

impl From<SummaryRow> for ServiceCenterSummary {
    fn from(row: SummaryRow) -> Self {
        ServiceCenterSummary {
            id: row.id,
            name: row.name,
            city_id: row.city_id,
            owner_id: row.owner_id,
            phone: row.phone,
            address: row.address,
            avg_rating: row.avg_rating,
            reviews_count: row.reviews_count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: i64,
    service_center_id: i64,
    name: String,
    street: Option<String>,
    building: Option<String>,
    apartment: Option<String>,
    postal_code: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl From<AddressRow> for ServiceCenterAddress {
    fn from(row: AddressRow) -> Self {
        ServiceCenterAddress {
            id: row.id,
            service_center_id: row.service_center_id,
            name: row.name,
            street: row.street,
            building: row.building,
            apartment: row.apartment,
            postal_code: row.postal_code,
            latitude: row.latitude,
            longitude: row.longitude,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    service_center_id: i64,
    #[sqlx(rename = "type")]
    link_type: Option<String>,
    link: String,
}

impl TryFrom<LinkRow> for ServiceCenterLink {
    type Error = AppError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        let link_type = row
            .link_type
            .as_deref()
            .map(|raw| parse_column::<LinkType>("type", raw))
            .transpose()?;
        Ok(ServiceCenterLink {
            id: row.id,
            service_center_id: row.service_center_id,
            link_type,
            link: row.link,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    service_center_id: i64,
    author: String,
    rating: Option<f64>,
    text: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            service_center_id: row.service_center_id,
            author: row.author,
            rating: row.rating,
            text: row.text,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ClaimRow {
    id: i64,
    service_center_id: i64,
    telegram_id: i64,
    message: String,
    contact: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ClaimRow> for ClaimRequest {
    type Error = AppError;

    fn try_from(row: ClaimRow) -> Result<Self, Self::Error> {
        Ok(ClaimRequest {
            id: row.id,
            service_center_id: row.service_center_id,
            telegram_id: row.telegram_id,
            message: row.message,
            contact: row.contact,
            status: parse_column::<RequestStatus>("status", &row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
