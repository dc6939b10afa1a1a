use anyhow::anyhow;
use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{error::AppError, state::AppState, storage::StoredImage};

/// A picture received from a client, not yet stored anywhere.
#[derive(Debug, Clone)]
pub struct PictureUpload {
    pub body: Bytes,
    pub content_type: String,
}

pub(crate) fn is_supported_image(content_type: &str) -> bool {
    matches!(
        content_type,
        "image/jpeg" | "image/jpg" | "image/png" | "image/webp" | "image/gif" | "image/heic"
    )
}

/// Public id of an offer's picture. Stable for the offer's lifetime so a
/// re-upload overwrites the previous asset.
pub(crate) fn offer_picture_id(folder: &str, offer_id: Uuid) -> String {
    format!("{}/{}", folder.trim_matches('/'), offer_id)
}

pub async fn upload_offer_picture(
    st: &AppState,
    offer_id: Uuid,
    picture: PictureUpload,
) -> Result<StoredImage, AppError> {
    let public_id = offer_picture_id(&st.config.images.folder, offer_id);
    let call = st
        .images
        .upload(&public_id, picture.body, &picture.content_type);
    let stored = tokio::time::timeout(st.config.images.timeout, call)
        .await
        .map_err(|_| AppError::upstream(anyhow!("image upload timed out for {public_id}")))?
        .map_err(AppError::upstream)?;
    debug!(%offer_id, public_id = %stored.public_id, "picture uploaded");
    Ok(stored)
}

pub async fn destroy_picture(st: &AppState, public_id: &str) -> Result<(), AppError> {
    let call = st.images.destroy(public_id);
    tokio::time::timeout(st.config.images.timeout, call)
        .await
        .map_err(|_| AppError::upstream(anyhow!("image destroy timed out for {public_id}")))?
        .map_err(AppError::upstream)?;
    debug!(%public_id, "picture destroyed");
    Ok(())
}

/// Compensation step: failures are logged, never surfaced.
pub async fn discard_picture(st: &AppState, public_id: &str) {
    if let Err(e) = destroy_picture(st, public_id).await {
        warn!(error = %e, %public_id, "orphaned picture left on image host");
    }
}
