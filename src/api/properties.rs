use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::api::error::ApiResult;
use crate::api::form::read_property_form;
use crate::api::AppState;
use crate::attachments::{MAX_FILES_PER_REQUEST, MAX_FILE_BYTES};
use crate::error::Error;
use crate::models::{Property, UpdateOutcome};
use crate::store::PropertyFilters;

/// Room for a full set of maximum-size files plus the text fields.
const BODY_LIMIT: usize = MAX_FILES_PER_REQUEST * MAX_FILE_BYTES + 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_property).get(list_properties))
        .route(
            "/{id}",
            get(get_property)
                .put(update_property)
                .patch(update_property)
                .delete(delete_property),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}

#[tracing::instrument(skip(state, multipart))]
async fn create_property(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let form = read_property_form(multipart, &state.attachments).await?;
    let draft = match form.fields.to_draft(state.default_owner_id) {
        Ok(draft) => draft,
        Err(e) => {
            state.attachments.discard(&form.uploads).await;
            return Err(e.into());
        }
    };

    let id = state.properties.create(draft, &form.uploads).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Property created successfully.",
            "propertyId": id,
        })),
    ))
}

#[tracing::instrument(skip(state))]
async fn list_properties(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<Property>>> {
    let filters = PropertyFilters::from_pairs(pairs);
    let properties = state.properties.find_all(&filters).await?;
    Ok(Json(properties))
}

#[tracing::instrument(skip(state))]
async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Property>> {
    state
        .properties
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::NotFound("Property not found.".to_string()).into())
}

#[tracing::instrument(skip(state, multipart))]
async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let form = read_property_form(multipart, &state.attachments).await?;
    let changes = match form.fields.to_changes() {
        Ok(changes) => changes,
        Err(e) => {
            state.attachments.discard(&form.uploads).await;
            return Err(e.into());
        }
    };

    match state.properties.update(id, changes, &form.uploads).await? {
        UpdateOutcome::Updated => Ok(Json(json!({
            "message": "Property updated successfully."
        }))),
        UpdateOutcome::NotFoundOrUnchanged => Err(Error::NotFound(
            "Property not found or no changes were made.".to_string(),
        )
        .into()),
    }
}

#[tracing::instrument(skip(state))]
async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    if state.properties.delete(id).await? {
        Ok(Json(json!({ "message": "Property deleted successfully." })))
    } else {
        Err(Error::NotFound("Property not found.".to_string()).into())
    }
}
