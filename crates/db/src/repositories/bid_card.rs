use async_trait::async_trait;
use instabids_core::domain::bid_card::{BidCard, BidCardId, HomeownerId};
use instabids_core::gateway::{missing_required_field, BidCardGateway, GatewayError};
use sqlx::{sqlite::SqliteRow, Row};
use tracing::{debug, warn};

use super::codec::{
    decode_photo_urls, decode_structured, encode_photo_urls, encode_structured,
    encode_timestamp, parse_status, parse_timestamp,
};
use super::RepositoryError;
use crate::DbPool;

const SELECT_COLUMNS: &str = "SELECT
        id,
        homeowner_id,
        project_name,
        project_type,
        project_scope,
        timeline,
        location,
        status,
        budget_range,
        materials_preferences,
        special_requirements,
        accessibility_needs,
        scheduling_constraints,
        photo_urls,
        image_analysis_results,
        created_at,
        updated_at
     FROM bid_cards";

pub struct SqlBidCardRepository {
    pool: DbPool,
}

impl SqlBidCardRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn upsert(
        &self,
        homeowner_id: &HomeownerId,
        record: &BidCard,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO bid_cards (
                id,
                homeowner_id,
                project_name,
                project_type,
                project_scope,
                timeline,
                location,
                status,
                budget_range,
                materials_preferences,
                special_requirements,
                accessibility_needs,
                scheduling_constraints,
                photo_urls,
                image_analysis_results,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                homeowner_id = excluded.homeowner_id,
                project_name = excluded.project_name,
                project_type = excluded.project_type,
                project_scope = excluded.project_scope,
                timeline = excluded.timeline,
                location = excluded.location,
                status = excluded.status,
                budget_range = excluded.budget_range,
                materials_preferences = excluded.materials_preferences,
                special_requirements = excluded.special_requirements,
                accessibility_needs = excluded.accessibility_needs,
                scheduling_constraints = excluded.scheduling_constraints,
                photo_urls = excluded.photo_urls,
                image_analysis_results = excluded.image_analysis_results,
                updated_at = excluded.updated_at",
        )
        .bind(&record.id.0)
        .bind(&homeowner_id.0)
        .bind(record.display_name())
        .bind(record.project_type.as_deref())
        .bind(record.project_scope.as_deref())
        .bind(encode_structured("timeline", record.timeline.as_ref())?)
        .bind(encode_structured("location", record.location.as_ref())?)
        .bind(record.status.as_str())
        .bind(encode_structured("budget_range", record.budget_range.as_ref())?)
        .bind(encode_structured("materials_preferences", record.materials_preferences.as_ref())?)
        .bind(record.special_requirements.as_deref())
        .bind(encode_structured("accessibility_needs", record.accessibility_needs.as_ref())?)
        .bind(encode_structured("scheduling_constraints", record.scheduling_constraints.as_ref())?)
        .bind(encode_photo_urls(record.photo_urls.as_ref())?)
        .bind(encode_structured("image_analysis_results", record.image_analysis_results.as_ref())?)
        .bind(encode_timestamp(&record.created_at))
        .bind(encode_timestamp(&record.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &BidCardId) -> Result<Option<BidCard>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(bid_card_from_row).transpose()
    }

    async fn find_by_homeowner(
        &self,
        homeowner_id: &HomeownerId,
    ) -> Result<Vec<BidCard>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE homeowner_id = ? ORDER BY created_at DESC, id ASC"
        ))
        .bind(&homeowner_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(bid_card_from_row).collect()
    }
}

#[async_trait]
impl BidCardGateway for SqlBidCardRepository {
    async fn save(
        &self,
        homeowner_id: &HomeownerId,
        record: &BidCard,
    ) -> Result<BidCardId, GatewayError> {
        if let Some(field) = missing_required_field(record) {
            warn!(
                event_name = "bid_card.gateway.rejected",
                bid_card_id = %record.id,
                field,
                "refusing to store bid card without required field"
            );
            return Err(GatewayError::MissingRequiredField(field));
        }

        self.upsert(homeowner_id, record).await.map_err(|error| {
            warn!(
                event_name = "bid_card.gateway.save_failed",
                bid_card_id = %record.id,
                error = %error,
                "bid card upsert failed"
            );
            GatewayError::from(error)
        })?;

        debug!(
            event_name = "bid_card.gateway.saved",
            bid_card_id = %record.id,
            homeowner_id = %homeowner_id,
            "bid card stored"
        );
        Ok(record.id.clone())
    }

    async fn fetch(&self, id: &BidCardId) -> Result<BidCard, GatewayError> {
        self.find_by_id(id).await?.ok_or_else(|| GatewayError::NotFound(id.clone()))
    }

    async fn list_for_homeowner(
        &self,
        homeowner_id: &HomeownerId,
    ) -> Result<Vec<BidCard>, GatewayError> {
        Ok(self.find_by_homeowner(homeowner_id).await?)
    }
}

fn bid_card_from_row(row: SqliteRow) -> Result<BidCard, RepositoryError> {
    let status_raw = row.try_get::<String, _>("status")?;

    Ok(BidCard {
        id: BidCardId(row.try_get("id")?),
        homeowner_id: Some(HomeownerId(row.try_get("homeowner_id")?)),
        project_name: row.try_get("project_name")?,
        project_type: row.try_get("project_type")?,
        project_scope: row.try_get("project_scope")?,
        timeline: decode_structured(row.try_get("timeline")?),
        location: decode_structured(row.try_get("location")?),
        status: parse_status(&status_raw)?,
        budget_range: decode_structured(row.try_get("budget_range")?),
        materials_preferences: decode_structured(row.try_get("materials_preferences")?),
        special_requirements: row.try_get("special_requirements")?,
        accessibility_needs: decode_structured(row.try_get("accessibility_needs")?),
        scheduling_constraints: decode_structured(row.try_get("scheduling_constraints")?),
        photo_urls: decode_photo_urls(row.try_get("photo_urls")?)?,
        image_analysis_results: decode_structured(row.try_get("image_analysis_results")?),
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}
