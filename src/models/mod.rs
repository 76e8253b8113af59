use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Location information for a property
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub barrio: String,
    pub street_type: Option<String>,
    pub city: String,
    pub province: String,
    pub zonificacion: Option<String>,
}

/// Core property data model, in wire shape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    #[serde(rename = "type")]
    pub property_type: String,
    pub price: f64,
    #[serde(flatten)]
    pub location: Location,
    pub condition: Option<String>,
    pub situation: Option<String>,
    pub antiquity: Option<i64>,
    pub surface: Option<f64>,
    pub covered_surface: Option<f64>,
    pub urbanization: Option<String>,
    pub security: Option<String>,
    pub description: Option<String>,
    pub ambientes: Vec<String>,
    pub services: Vec<String>,
    pub media_urls: Vec<String>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields received for a new property, already coerced to their types.
///
/// Requiredness (type, price, barrio, city, province) is checked by the repository before
/// anything is written.
#[derive(Debug, Clone, Default)]
pub struct PropertyDraft {
    pub property_type: Option<String>,
    pub price: Option<f64>,
    pub barrio: Option<String>,
    pub street_type: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub zonificacion: Option<String>,
    pub condition: Option<String>,
    pub situation: Option<String>,
    pub antiquity: Option<i64>,
    pub surface: Option<f64>,
    pub covered_surface: Option<f64>,
    pub urbanization: Option<String>,
    pub security: Option<String>,
    pub description: Option<String>,
    pub ambientes: Vec<String>,
    pub services: Vec<String>,
    pub user_id: i64,
}

/// Partial replacement for an existing property. `None` leaves the column untouched.
///
/// There is no owner field: the owner of a property never changes.
#[derive(Debug, Clone, Default)]
pub struct PropertyChanges {
    pub property_type: Option<String>,
    pub price: Option<f64>,
    pub barrio: Option<String>,
    pub street_type: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub zonificacion: Option<String>,
    pub condition: Option<String>,
    pub situation: Option<String>,
    pub antiquity: Option<i64>,
    pub surface: Option<f64>,
    pub covered_surface: Option<f64>,
    pub urbanization: Option<String>,
    pub security: Option<String>,
    pub description: Option<String>,
    pub ambientes: Option<Vec<String>>,
    pub services: Option<Vec<String>>,
    /// Existing attachment list as sent by the client (JSON text), kept verbatim when no new
    /// files accompany the update.
    pub existing_media: Option<String>,
}

/// Result of an update. The store cannot tell a missing id from an unchanged row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFoundOrUnchanged,
}

/// Stored user account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub user_type: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Account about to be inserted. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub user_type: String,
}
