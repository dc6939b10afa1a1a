use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::offers::query::{push_filter, OfferFilter, OfferQuery};
use crate::offers::repo_types::{Offer, OfferRow, OfferSummary, OfferSummaryRow};

/// Listing store.
#[async_trait]
pub trait OfferRepo: Send + Sync {
    async fn insert(&self, offer: &Offer) -> anyhow::Result<()>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Offer>>;
    /// Overwrites every mutable column of an existing offer.
    async fn save(&self, offer: &Offer) -> anyhow::Result<()>;
    /// Returns false when nothing was deleted.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    /// One filtered, sorted page of summaries.
    async fn list(&self, query: &OfferQuery) -> anyhow::Result<Vec<OfferSummary>>;
    /// Number of offers matching the filter, ignoring the page window.
    async fn count(&self, filter: &OfferFilter) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgOfferRepo {
    db: PgPool,
}

impl PgOfferRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

pub(crate) fn list_sql(query: &OfferQuery) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::new("SELECT product_name, product_price, owner FROM offers");
    push_filter(&mut qb, &query.filter);
    qb.push(" ORDER BY ").push(query.sort.order_by());
    qb.push(" LIMIT ")
        .push_bind(query.window.take() as i64)
        .push(" OFFSET ")
        .push_bind(i64::try_from(query.window.skip()).unwrap_or(i64::MAX));
    qb
}

pub(crate) fn count_sql(filter: &OfferFilter) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM offers");
    push_filter(&mut qb, filter);
    qb
}

#[async_trait]
impl OfferRepo for PgOfferRepo {
    async fn insert(&self, offer: &Offer) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO offers (id, product_name, product_description, product_price,
                                product_details, image_secure_url, image_public_id, owner, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(offer.id)
        .bind(&offer.product_name)
        .bind(&offer.product_description)
        .bind(offer.product_price)
        .bind(&offer.product_details)
        .bind(&offer.product_image.secure_url)
        .bind(&offer.product_image.public_id)
        .bind(Json(&offer.owner))
        .bind(offer.created_at)
        .execute(&self.db)
        .await
        .context("insert offer")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Offer>> {
        let row = sqlx::query_as::<_, OfferRow>(
            r#"
            SELECT id, product_name, product_description, product_price, product_details,
                   image_secure_url, image_public_id, owner, created_at
              FROM offers
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find offer by id")?;
        Ok(row.map(Offer::from))
    }

    async fn save(&self, offer: &Offer) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE offers
               SET product_name = $2,
                   product_description = $3,
                   product_price = $4,
                   product_details = $5,
                   image_secure_url = $6,
                   image_public_id = $7,
                   owner = $8
             WHERE id = $1
            "#,
        )
        .bind(offer.id)
        .bind(&offer.product_name)
        .bind(&offer.product_description)
        .bind(offer.product_price)
        .bind(&offer.product_details)
        .bind(&offer.product_image.secure_url)
        .bind(&offer.product_image.public_id)
        .bind(Json(&offer.owner))
        .execute(&self.db)
        .await
        .context("update offer")?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM offers WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete offer")?;
        Ok(res.rows_affected() > 0)
    }

    async fn list(&self, query: &OfferQuery) -> anyhow::Result<Vec<OfferSummary>> {
        let mut qb = list_sql(query);
        let rows = qb
            .build_query_as::<OfferSummaryRow>()
            .fetch_all(&self.db)
            .await
            .context("list offers")?;
        Ok(rows.into_iter().map(OfferSummary::from).collect())
    }

    async fn count(&self, filter: &OfferFilter) -> anyhow::Result<u64> {
        let mut qb = count_sql(filter);
        let n: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.db)
            .await
            .context("count offers")?;
        Ok(u64::try_from(n).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offers::query::{PageWindow, SortOrder};

    #[test]
    fn list_sql_orders_and_windows_after_filter() {
        let query = OfferQuery {
            filter: OfferFilter {
                title: Some("shirt".into()),
                ..Default::default()
            },
            sort: SortOrder::PriceAsc,
            window: PageWindow { page: 1, limit: 5 },
        };
        assert_eq!(
            list_sql(&query).sql(),
            "SELECT product_name, product_price, owner FROM offers \
             WHERE product_name ILIKE $1 ORDER BY product_price ASC, id ASC LIMIT $2 OFFSET $3"
        );
    }

    #[test]
    fn list_sql_default_order_without_filter() {
        let sql = list_sql(&OfferQuery::default()).sql().to_string();
        assert!(sql.ends_with("ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2"));
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn count_sql_ignores_window_and_sort() {
        let filter = OfferFilter {
            price_min: Some(10.0),
            price_max: Some(50.0),
            ..Default::default()
        };
        let sql = count_sql(&filter).sql().to_string();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM offers WHERE product_price >= $1 AND product_price <= $2"
        );
    }
}
