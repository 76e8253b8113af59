use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use crate::attachments::{AttachmentStore, StoredUpload};
use crate::error::{Error, Result};
use crate::models::{Location, Property, PropertyChanges, PropertyDraft, UpdateOutcome};
use crate::repository::traits::PropertyRepository;
use crate::store::codec::{decode_media, decode_tags, encode_media, encode_tags};
use crate::store::{BindValues, PropertyFilters, SqlValue};

const SELECT_PROPERTIES: &str = "SELECT id, property_type, price, barrio, street_type, city, \
     province, zonificacion, condition, situation, antiquity, surface, covered_surface, \
     urbanization, security, description, ambientes, services, media_urls, user_id, \
     created_at, updated_at FROM properties";

/// A `properties` row in storage shape.
#[derive(Debug, sqlx::FromRow)]
struct PropertyRow {
    id: i64,
    property_type: String,
    price: f64,
    barrio: String,
    street_type: Option<String>,
    city: String,
    province: String,
    zonificacion: Option<String>,
    condition: Option<String>,
    situation: Option<String>,
    antiquity: Option<i64>,
    surface: Option<f64>,
    covered_surface: Option<f64>,
    urbanization: Option<String>,
    security: Option<String>,
    description: Option<String>,
    ambientes: Option<String>,
    services: Option<String>,
    media_urls: Option<String>,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PropertyRow> for Property {
    fn from(row: PropertyRow) -> Self {
        Self {
            id: row.id,
            property_type: row.property_type,
            price: row.price,
            location: Location {
                barrio: row.barrio,
                street_type: row.street_type,
                city: row.city,
                province: row.province,
                zonificacion: row.zonificacion,
            },
            condition: row.condition,
            situation: row.situation,
            antiquity: row.antiquity,
            surface: row.surface,
            covered_surface: row.covered_surface,
            urbanization: row.urbanization,
            security: row.security,
            description: row.description,
            ambientes: decode_tags(row.ambientes.as_deref()),
            services: decode_tags(row.services.as_deref()),
            media_urls: decode_media(row.media_urls.as_deref()),
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// The fields a property cannot be created without.
struct Required {
    property_type: String,
    price: f64,
    barrio: String,
    city: String,
    province: String,
}

impl Required {
    fn take(draft: &mut PropertyDraft) -> Result<Self> {
        fn text(value: &mut Option<String>) -> Option<String> {
            value.take().filter(|v| !v.trim().is_empty())
        }

        let property_type = text(&mut draft.property_type);
        let barrio = text(&mut draft.barrio);
        let city = text(&mut draft.city);
        let province = text(&mut draft.province);

        match (property_type, draft.price, barrio, city, province) {
            (Some(property_type), Some(price), Some(barrio), Some(city), Some(province)) => {
                Ok(Self {
                    property_type,
                    price,
                    barrio,
                    city,
                    province,
                })
            }
            _ => Err(Error::validation(
                "Missing required fields: type, price, barrio, city, province.",
            )),
        }
    }
}

pub struct SqlitePropertyRepository {
    pool: SqlitePool,
    attachments: AttachmentStore,
}

impl SqlitePropertyRepository {
    pub fn new(pool: SqlitePool, attachments: AttachmentStore) -> Self {
        Self { pool, attachments }
    }

    async fn remove_attachments(&self, property_id: i64, urls: &[String]) {
        for url in urls {
            match self.attachments.remove_url(url).await {
                Ok(()) => debug!(property_id, url = %url, "removed attachment"),
                Err(e) => warn!(property_id, url = %url, error = %e, "failed to remove attachment"),
            }
        }
    }
}

#[async_trait]
impl PropertyRepository for SqlitePropertyRepository {
    async fn create(&self, mut draft: PropertyDraft, uploads: &[StoredUpload]) -> Result<i64> {
        let required = match Required::take(&mut draft) {
            Ok(required) => required,
            Err(e) => {
                self.attachments.discard(uploads).await;
                return Err(e);
            }
        };

        let media_urls: Vec<String> = uploads.iter().map(StoredUpload::public_url).collect();
        let now = Utc::now();

        let inserted = sqlx::query(
            "INSERT INTO properties (property_type, price, barrio, street_type, city, province, \
             zonificacion, condition, situation, antiquity, surface, covered_surface, \
             urbanization, security, description, ambientes, services, media_urls, user_id, \
             created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&required.property_type)
        .bind(required.price)
        .bind(&required.barrio)
        .bind(&draft.street_type)
        .bind(&required.city)
        .bind(&required.province)
        .bind(&draft.zonificacion)
        .bind(&draft.condition)
        .bind(&draft.situation)
        .bind(draft.antiquity)
        .bind(draft.surface)
        .bind(draft.covered_surface)
        .bind(&draft.urbanization)
        .bind(&draft.security)
        .bind(&draft.description)
        .bind(encode_tags(&draft.ambientes))
        .bind(encode_tags(&draft.services))
        .bind(encode_media(&media_urls))
        .bind(draft.user_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(done) => {
                let id = done.last_insert_rowid();
                info!(
                    property_id = id,
                    attachments = media_urls.len(),
                    "property created"
                );
                Ok(id)
            }
            Err(e) => {
                error!(error = %e, "failed to insert property");
                self.attachments.discard(uploads).await;
                Err(e.into())
            }
        }
    }

    async fn find_all(&self, filters: &PropertyFilters) -> Result<Vec<Property>> {
        let compiled = filters.compile();
        let sql = format!("{SELECT_PROPERTIES}{} ORDER BY id", compiled.where_sql());
        debug!(sql = %sql, params = compiled.params.len(), "listing properties");

        let rows = sqlx::query_as::<_, PropertyRow>(&sql)
            .bind_values(compiled.params)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Property::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Property>> {
        let sql = format!("{SELECT_PROPERTIES} WHERE id = ?");
        let row = sqlx::query_as::<_, PropertyRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Property::from))
    }

    async fn update(
        &self,
        id: i64,
        changes: PropertyChanges,
        uploads: &[StoredUpload],
    ) -> Result<UpdateOutcome> {
        let media = if !uploads.is_empty() {
            let urls: Vec<String> = uploads.iter().map(StoredUpload::public_url).collect();
            Some(encode_media(&urls))
        } else {
            changes
                .existing_media
                .as_deref()
                .map(|raw| encode_media(&decode_media(Some(raw))))
        };

        let candidates = [
            ("property_type", changes.property_type.map(SqlValue::Text)),
            ("price", changes.price.map(SqlValue::Real)),
            ("barrio", changes.barrio.map(SqlValue::Text)),
            ("street_type", changes.street_type.map(SqlValue::Text)),
            ("city", changes.city.map(SqlValue::Text)),
            ("province", changes.province.map(SqlValue::Text)),
            ("zonificacion", changes.zonificacion.map(SqlValue::Text)),
            ("condition", changes.condition.map(SqlValue::Text)),
            ("situation", changes.situation.map(SqlValue::Text)),
            ("antiquity", changes.antiquity.map(SqlValue::Integer)),
            ("surface", changes.surface.map(SqlValue::Real)),
            ("covered_surface", changes.covered_surface.map(SqlValue::Real)),
            ("urbanization", changes.urbanization.map(SqlValue::Text)),
            ("security", changes.security.map(SqlValue::Text)),
            ("description", changes.description.map(SqlValue::Text)),
            (
                "ambientes",
                changes.ambientes.map(|tags| SqlValue::Text(encode_tags(&tags))),
            ),
            (
                "services",
                changes.services.map(|tags| SqlValue::Text(encode_tags(&tags))),
            ),
            ("media_urls", media.map(SqlValue::Text)),
        ];
        let assignments: Vec<(&str, SqlValue)> = candidates
            .into_iter()
            .filter_map(|(column, value)| value.map(|v| (column, v)))
            .collect();

        if assignments.is_empty() {
            debug!(property_id = id, "update carried no fields");
            return Ok(UpdateOutcome::NotFoundOrUnchanged);
        }

        // Only rows where some assigned column actually differs count as affected.
        let set_sql: Vec<String> = assignments.iter().map(|(c, _)| format!("{c} = ?")).collect();
        let differs_sql: Vec<String> = assignments
            .iter()
            .map(|(c, _)| format!("{c} IS NOT ?"))
            .collect();
        let sql = format!(
            "UPDATE properties SET {}, updated_at = ? WHERE id = ? AND ({})",
            set_sql.join(", "),
            differs_sql.join(" OR ")
        );

        let values: Vec<SqlValue> = assignments.into_iter().map(|(_, v)| v).collect();
        let params = values
            .iter()
            .cloned()
            .chain([SqlValue::Timestamp(Utc::now()), SqlValue::Integer(id)])
            .chain(values.iter().cloned());

        let updated = sqlx::query(&sql)
            .bind_values(params)
            .execute(&self.pool)
            .await;

        match updated {
            Ok(done) if done.rows_affected() > 0 => {
                info!(property_id = id, "property updated");
                Ok(UpdateOutcome::Updated)
            }
            Ok(_) => {
                debug!(property_id = id, "property not found or unchanged");
                self.attachments.discard(uploads).await;
                Ok(UpdateOutcome::NotFoundOrUnchanged)
            }
            Err(e) => {
                error!(property_id = id, error = %e, "failed to update property");
                self.attachments.discard(uploads).await;
                Err(e.into())
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let Some(property) = self.find_by_id(id).await? else {
            return Ok(false);
        };

        let done = sqlx::query("DELETE FROM properties WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Ok(false);
        }

        self.remove_attachments(id, &property.media_urls).await;
        info!(property_id = id, "property deleted");
        Ok(true)
    }
}
