use serde::{Deserialize, Serialize};

use crate::images::services::PictureUpload;
use crate::offers::repo_types::OfferSummary;

/// Raw `GET /offers` query string. Values stay textual so malformed numbers
/// are reported with the parameter name.
#[derive(Debug, Default, Deserialize)]
pub struct OfferListParams {
    pub title: Option<String>,
    #[serde(rename = "priceMin")]
    pub price_min: Option<String>,
    #[serde(rename = "priceMax")]
    pub price_max: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OfferListResponse {
    pub count: u64,
    pub offers: Vec<OfferSummary>,
}

/// Fields of a publish/update multipart body, as sent.
#[derive(Debug, Default)]
pub struct OfferForm {
    pub id: Option<String>,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub product_price: Option<String>,
    pub product_details: Option<String>,
    pub picture: Option<PictureUpload>,
}

/// Validated content of a new offer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOffer {
    pub product_name: String,
    pub product_description: String,
    pub product_price: f64,
    pub product_details: serde_json::Value,
}

/// Validated subset of fields to overwrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferChanges {
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub product_price: Option<f64>,
    pub product_details: Option<serde_json::Value>,
}
