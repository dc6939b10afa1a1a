use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    error::AppError,
    images::services::{
        destroy_picture, discard_picture, is_supported_image, upload_offer_picture, PictureUpload,
    },
    offers::{
        dto::{NewOffer, OfferChanges, OfferForm, OfferListResponse},
        query::OfferQuery,
        repo_types::{Offer, OwnerSnapshot},
    },
    state::AppState,
};

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_PRICE: f64 = 100_000.0;

const NOT_FOUND: &str = "Offer not found";
const NOT_OWNER: &str = "Only the owner can modify this offer";

/// Postgres text and JSONB both refuse NUL.
fn has_nul(raw: &str) -> bool {
    raw.contains('\0')
}

fn json_has_nul(v: &serde_json::Value) -> bool {
    match v {
        serde_json::Value::String(s) => has_nul(s),
        serde_json::Value::Array(items) => items.iter().any(json_has_nul),
        serde_json::Value::Object(map) => map.iter().any(|(k, v)| has_nul(k) || json_has_nul(v)),
        _ => false,
    }
}

fn check_description(raw: &str) -> Result<String, AppError> {
    let n = raw.chars().count();
    if n == 0 || n > MAX_DESCRIPTION_LEN || has_nul(raw) {
        return Err(AppError::validation("Product description is not valid"));
    }
    Ok(raw.to_string())
}

fn check_name(raw: &str) -> Result<String, AppError> {
    let n = raw.chars().count();
    if n == 0 || n > MAX_NAME_LEN || has_nul(raw) {
        return Err(AppError::validation("Product name is not valid"));
    }
    Ok(raw.to_string())
}

fn check_price(raw: &str) -> Result<f64, AppError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && (0.0..=MAX_PRICE).contains(p))
        .ok_or_else(|| AppError::validation("Product price is not valid"))
}

fn check_details(raw: &str) -> Result<serde_json::Value, AppError> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(v @ serde_json::Value::Array(_)) if !json_has_nul(&v) => Ok(v),
        _ => Err(AppError::validation("Product details are not valid")),
    }
}

fn check_picture(picture: &PictureUpload) -> Result<(), AppError> {
    if picture.body.is_empty() || !is_supported_image(&picture.content_type) {
        return Err(AppError::validation("Picture is not valid"));
    }
    Ok(())
}

pub(crate) fn parse_offer_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::validation("Offer id is not valid"))
}

/// Validates a publish form. Nothing is written before this passes.
pub(crate) fn validate_new(form: &OfferForm) -> Result<(NewOffer, &PictureUpload), AppError> {
    let product_description = check_description(form.product_description.as_deref().unwrap_or(""))?;
    let product_name = check_name(form.product_name.as_deref().unwrap_or(""))?;
    let product_price = check_price(form.product_price.as_deref().unwrap_or(""))?;
    let product_details = match form.product_details.as_deref() {
        Some(raw) if !raw.trim().is_empty() => check_details(raw)?,
        _ => serde_json::Value::Array(Vec::new()),
    };
    let picture = form
        .picture
        .as_ref()
        .ok_or_else(|| AppError::validation("Picture is required"))?;
    check_picture(picture)?;

    Ok((
        NewOffer {
            product_name,
            product_description,
            product_price,
            product_details,
        },
        picture,
    ))
}

/// Validates the fields present in an update form; empty ones are skipped.
pub(crate) fn validate_changes(form: &OfferForm) -> Result<OfferChanges, AppError> {
    fn given(v: &Option<String>) -> Option<&str> {
        v.as_deref().filter(|s| !s.is_empty())
    }
    if let Some(picture) = &form.picture {
        check_picture(picture)?;
    }
    Ok(OfferChanges {
        product_description: given(&form.product_description)
            .map(check_description)
            .transpose()?,
        product_name: given(&form.product_name).map(check_name).transpose()?,
        product_price: given(&form.product_price).map(check_price).transpose()?,
        product_details: given(&form.product_details)
            .map(check_details)
            .transpose()?,
    })
}

pub async fn publish(st: &AppState, owner: &User, form: OfferForm) -> Result<Offer, AppError> {
    let (new, picture) =
        validate_new(&form).inspect_err(|e| warn!(reason = %e, "publish rejected"))?;

    let id = Uuid::new_v4();
    let product_image = upload_offer_picture(st, id, picture.clone()).await?;

    let offer = Offer {
        id,
        product_name: new.product_name,
        product_description: new.product_description,
        product_price: new.product_price,
        product_details: new.product_details,
        product_image,
        owner: OwnerSnapshot::from(owner),
        created_at: OffsetDateTime::now_utc(),
    };

    if let Err(e) = st.offers.insert(&offer).await {
        discard_picture(st, &offer.product_image.public_id).await;
        return Err(AppError::upstream(e));
    }

    info!(offer_id = %offer.id, owner_id = %owner.id, "offer published");
    Ok(offer)
}

async fn owned_offer(st: &AppState, caller: &User, id: Uuid) -> Result<Offer, AppError> {
    let offer = st
        .offers
        .find_by_id(id)
        .await
        .map_err(AppError::upstream)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    if offer.owner.id != caller.id {
        warn!(offer_id = %id, caller_id = %caller.id, "offer owned by someone else");
        return Err(AppError::Forbidden(NOT_OWNER.into()));
    }
    Ok(offer)
}

pub async fn update(st: &AppState, caller: &User, form: OfferForm) -> Result<Offer, AppError> {
    let id = parse_offer_id(
        form.id
            .as_deref()
            .ok_or_else(|| AppError::validation("Offer id is not valid"))?,
    )?;
    let changes = validate_changes(&form).inspect_err(|e| warn!(reason = %e, "update rejected"))?;
    let mut offer = owned_offer(st, caller, id).await?;

    if let Some(v) = changes.product_name {
        offer.product_name = v;
    }
    if let Some(v) = changes.product_description {
        offer.product_description = v;
    }
    if let Some(v) = changes.product_price {
        offer.product_price = v;
    }
    if let Some(v) = changes.product_details {
        offer.product_details = v;
    }
    if let Some(picture) = form.picture {
        // Same public id as before, so the old asset is overwritten in place.
        offer.product_image = upload_offer_picture(st, offer.id, picture).await?;
    }
    offer.owner = OwnerSnapshot::from(caller);

    st.offers.save(&offer).await.map_err(AppError::upstream)?;
    info!(offer_id = %offer.id, "offer updated");
    Ok(offer)
}

/// Destroys the picture first; the record survives a failed destroy so the
/// call can simply be retried.
pub async fn delete(st: &AppState, caller: &User, raw_id: &str) -> Result<(), AppError> {
    let id = parse_offer_id(raw_id)?;
    let offer = owned_offer(st, caller, id).await?;

    destroy_picture(st, &offer.product_image.public_id).await?;
    if !st.offers.delete(offer.id).await.map_err(AppError::upstream)? {
        return Err(AppError::not_found(NOT_FOUND));
    }
    info!(offer_id = %offer.id, "offer deleted");
    Ok(())
}

pub async fn fetch(st: &AppState, raw_id: &str) -> Result<Offer, AppError> {
    let id = parse_offer_id(raw_id)?;
    st.offers
        .find_by_id(id)
        .await
        .map_err(AppError::upstream)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

pub async fn list(st: &AppState, query: OfferQuery) -> Result<OfferListResponse, AppError> {
    debug!(
        filtered = !query.filter.is_empty(),
        sort = ?query.sort,
        page = query.window.page,
        limit = query.window.limit,
        "listing offers"
    );
    let offers = st.offers.list(&query).await.map_err(AppError::upstream)?;
    let count = st
        .offers
        .count(&query.filter)
        .await
        .map_err(AppError::upstream)?;
    Ok(OfferListResponse { count, offers })
}
