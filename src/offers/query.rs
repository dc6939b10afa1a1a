//! Translation of `GET /offers` parameters into a store query.
//!
//! Parameters are parsed strictly into an [`OfferQuery`]; the Postgres store
//! renders it with [`push_filter`] and [`SortOrder::order_by`].

use sqlx::{Postgres, QueryBuilder};

use crate::error::AppError;
use crate::offers::dto::OfferListParams;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// Conjunction of the optional sub-conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferFilter {
    /// Case-insensitive substring of `product_name`.
    pub title: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
}

impl OfferFilter {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.price_min.is_none() && self.price_max.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Insertion order.
    #[default]
    StoreDefault,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "price-asc" => Some(SortOrder::PriceAsc),
            "price-desc" => Some(SortOrder::PriceDesc),
            _ => None,
        }
    }

    /// ORDER BY clause body; ties fall back to id so pages never overlap.
    pub fn order_by(self) -> &'static str {
        match self {
            SortOrder::StoreDefault => "created_at ASC, id ASC",
            SortOrder::PriceAsc => "product_price ASC, id ASC",
            SortOrder::PriceDesc => "product_price DESC, id ASC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageWindow {
    pub fn skip(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn take(&self) -> u64 {
        u64::from(self.limit)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferQuery {
    pub filter: OfferFilter,
    pub sort: SortOrder,
    pub window: PageWindow,
}

impl TryFrom<OfferListParams> for OfferQuery {
    type Error = AppError;

    fn try_from(p: OfferListParams) -> Result<Self, Self::Error> {
        let filter = OfferFilter {
            title: search_title(p.title)?,
            price_min: present(p.price_min)
                .map(|v| parse_price(&v, "priceMin"))
                .transpose()?,
            price_max: present(p.price_max)
                .map(|v| parse_price(&v, "priceMax"))
                .transpose()?,
        };
        let sort = match present(p.sort) {
            None => SortOrder::StoreDefault,
            Some(raw) => SortOrder::parse(&raw)
                .ok_or_else(|| AppError::validation("sort is not valid"))?,
        };
        let window = PageWindow {
            page: present(p.page)
                .map(|v| parse_positive(&v, "page"))
                .transpose()?
                .unwrap_or(DEFAULT_PAGE),
            limit: present(p.limit)
                .map(|v| parse_positive(&v, "limit"))
                .transpose()?
                .unwrap_or(DEFAULT_LIMIT),
        };
        Ok(Self {
            filter,
            sort,
            window,
        })
    }
}

/// Empty query values count as absent.
fn present(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Blank titles count as absent; otherwise the raw text is matched as given.
/// Postgres text cannot hold NUL.
fn search_title(v: Option<String>) -> Result<Option<String>, AppError> {
    match v.filter(|s| !s.trim().is_empty()) {
        Some(t) if t.contains('\0') => Err(AppError::validation("title is not valid")),
        other => Ok(other),
    }
}

fn parse_price(raw: &str, name: &str) -> Result<f64, AppError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::validation(format!("{name} is not valid")))
}

fn parse_positive(raw: &str, name: &str) -> Result<u32, AppError> {
    raw.parse::<u32>()
        .ok()
        .filter(|v| *v >= 1)
        .ok_or_else(|| AppError::validation(format!("{name} is not valid")))
}

/// Escapes LIKE metacharacters so the title matches literally.
pub(crate) fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Appends ` WHERE ...` for the filter; nothing when the filter is empty.
pub fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &OfferFilter) {
    let mut sep = " WHERE ";
    if let Some(title) = &filter.title {
        qb.push(sep)
            .push("product_name ILIKE ")
            .push_bind(format!("%{}%", escape_like(title)));
        sep = " AND ";
    }
    if let Some(min) = filter.price_min {
        qb.push(sep).push("product_price >= ").push_bind(min);
        sep = " AND ";
    }
    if let Some(max) = filter.price_max {
        qb.push(sep).push("product_price <= ").push_bind(max);
    }
}
