use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{PathRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    images::services::PictureUpload,
    offers::{
        dto::{OfferForm, OfferListParams, OfferListResponse},
        query::OfferQuery,
        repo_types::Offer,
        services,
    },
    state::AppState,
};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/offers", get(list_offers))
        .route("/offer/:id", get(get_offer))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/offer/publish", post(publish_offer))
        .route("/offer/update", put(update_offer))
        .route("/offer/delete/:id", delete(delete_offer))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Reads a publish/update body. Unknown fields are refused.
async fn read_offer_form(mut mp: Multipart) -> Result<OfferForm, AppError> {
    let mut form = OfferForm::default();
    while let Some(field) = mp.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "picture" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = field.bytes().await?;
                form.picture = Some(PictureUpload { body, content_type });
            }
            "id" => form.id = Some(field.text().await?),
            "product_name" => form.product_name = Some(field.text().await?),
            "product_description" => form.product_description = Some(field.text().await?),
            "product_price" => form.product_price = Some(field.text().await?),
            "product_details" => form.product_details = Some(field.text().await?),
            other => {
                return Err(AppError::validation(format!("Unexpected field `{other}`")));
            }
        }
    }
    Ok(form)
}

#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn publish_offer(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<Json<Offer>, AppError> {
    let form = read_offer_form(mp?).await?;
    Ok(Json(services::publish(&state, &user, form).await?))
}

#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn update_offer(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<Json<Offer>, AppError> {
    let form = read_offer_form(mp?).await?;
    Ok(Json(services::update(&state, &user, form).await?))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_offer(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<&'static str>, AppError> {
    let Path(id) = id?;
    services::delete(&state, &user, &id).await?;
    Ok(Json("Offer deleted"))
}

#[instrument(skip(state))]
pub async fn list_offers(
    State(state): State<AppState>,
    params: Result<Query<OfferListParams>, QueryRejection>,
) -> Result<Json<OfferListResponse>, AppError> {
    let Query(params) = params?;
    let query = OfferQuery::try_from(params)?;
    Ok(Json(services::list(&state, query).await?))
}

#[instrument(skip(state))]
pub async fn get_offer(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Offer>, AppError> {
    let Path(id) = id?;
    Ok(Json(services::fetch(&state, &id).await?))
}
