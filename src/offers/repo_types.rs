use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{Account, User};
use crate::storage::StoredImage;

/// Copy of the owner's public profile, taken when the offer is written.
///
/// Later changes to the user record do not reach existing offers; the copy is
/// only refreshed when the owner updates the offer itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerSnapshot {
    pub id: Uuid,
    pub account: Account,
}

impl From<&User> for OwnerSnapshot {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            account: user.account(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Offer {
    pub id: Uuid,
    pub product_name: String,
    pub product_description: String,
    pub product_price: f64,
    pub product_details: serde_json::Value,
    pub product_image: StoredImage,
    pub owner: OwnerSnapshot,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// List projection of an offer; carries no id.
#[derive(Debug, Clone, Serialize)]
pub struct OfferSummary {
    pub product_name: String,
    pub product_price: f64,
    pub owner: OwnerSnapshot,
}

impl From<&Offer> for OfferSummary {
    fn from(o: &Offer) -> Self {
        Self {
            product_name: o.product_name.clone(),
            product_price: o.product_price,
            owner: o.owner.clone(),
        }
    }
}

#[derive(Debug, FromRow)]
pub struct OfferRow {
    pub id: Uuid,
    pub product_name: String,
    pub product_description: String,
    pub product_price: f64,
    pub product_details: serde_json::Value,
    pub image_secure_url: String,
    pub image_public_id: String,
    pub owner: Json<OwnerSnapshot>,
    pub created_at: OffsetDateTime,
}

impl From<OfferRow> for Offer {
    fn from(r: OfferRow) -> Self {
        Self {
            id: r.id,
            product_name: r.product_name,
            product_description: r.product_description,
            product_price: r.product_price,
            product_details: r.product_details,
            product_image: StoredImage {
                secure_url: r.image_secure_url,
                public_id: r.image_public_id,
            },
            owner: r.owner.0,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct OfferSummaryRow {
    pub product_name: String,
    pub product_price: f64,
    pub owner: Json<OwnerSnapshot>,
}

impl From<OfferSummaryRow> for OfferSummary {
    fn from(r: OfferSummaryRow) -> Self {
        Self {
            product_name: r.product_name,
            product_price: r.product_price,
            owner: r.owner.0,
        }
    }
}
