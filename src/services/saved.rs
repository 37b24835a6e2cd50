use crate::{
    error::{AppError, AppResult},
    models::{listing, saved, Listing, ListingModel, Saved},
    services::store::bounded,
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Statement, TransactionTrait,
};
use std::collections::HashMap;

const DELETE_SAVED_SQL: &str = "DELETE FROM saved WHERE user_id = $1 AND listing_id = $2";
const INSERT_SAVED_SQL: &str = "INSERT INTO saved (user_id, listing_id, created_at)
     VALUES ($1, $2, NOW())
     ON CONFLICT (user_id, listing_id) DO NOTHING";

pub struct SavedService {
    db: DatabaseConnection,
}

impl SavedService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Flips whether `user_id` has saved `listing_id` and returns the new state.
    ///
    /// Runs as one transaction: try the delete first; if nothing was there,
    /// insert under the `(user_id, listing_id)` key. An insert that hits the key
    /// means a concurrent toggle created the row between our two statements,
    /// so that row is removed instead.
    pub async fn toggle(&self, user_id: i32, listing_id: i32) -> AppResult<bool> {
        let saved = bounded("toggle_save", async {
            self.ensure_listing(listing_id).await?;
            let txn = self.db.begin().await?;

            let removed = txn
                .execute(pair_statement(DELETE_SAVED_SQL, user_id, listing_id))
                .await?
                .rows_affected();
            if removed > 0 {
                txn.commit().await?;
                return Ok(false);
            }

            let inserted = txn
                .execute(pair_statement(INSERT_SAVED_SQL, user_id, listing_id))
                .await?
                .rows_affected();
            if inserted > 0 {
                txn.commit().await?;
                return Ok(true);
            }

            txn.execute(pair_statement(DELETE_SAVED_SQL, user_id, listing_id))
                .await?;
            txn.commit().await?;
            Ok(false)
        })
        .await?;

        tracing::debug!(user_id, listing_id, saved, "save toggled");
        Ok(saved)
    }

    /// Idempotent: saving an already-saved listing is a no-op.
    pub async fn save(&self, user_id: i32, listing_id: i32) -> AppResult<()> {
        bounded("save_listing", async {
            self.ensure_listing(listing_id).await?;
            self.db
                .execute(pair_statement(INSERT_SAVED_SQL, user_id, listing_id))
                .await?;
            Ok(())
        })
        .await
    }

    pub async fn unsave(&self, user_id: i32, listing_id: i32) -> AppResult<()> {
        bounded("unsave_listing", async {
            let removed = self
                .db
                .execute(pair_statement(DELETE_SAVED_SQL, user_id, listing_id))
                .await?
                .rows_affected();
            if removed == 0 {
                return Err(AppError::not_found("Saved listing"));
            }
            Ok(())
        })
        .await
    }

    pub async fn is_saved(&self, user_id: i32, listing_id: i32) -> AppResult<bool> {
        bounded("is_saved", async {
            let row = Saved::find_by_id((user_id, listing_id))
                .one(&self.db)
                .await?;
            Ok(row.is_some())
        })
        .await
    }

    /// Saved listings, most recently saved first.
    pub async fn list_for_user(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ListingModel>, u64)> {
        bounded("list_saved", async {
            let paginator = Saved::find()
                .filter(saved::Column::UserId.eq(user_id))
                .order_by_desc(saved::Column::CreatedAt)
                .order_by_desc(saved::Column::ListingId)
                .paginate(&self.db, per_page);

            let total = paginator.num_items().await?;
            let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

            let listing_ids: Vec<i32> = rows.iter().map(|s| s.listing_id).collect();
            if listing_ids.is_empty() {
                return Ok((vec![], total));
            }

            let listings = Listing::find()
                .filter(listing::Column::Id.is_in(listing_ids.clone()))
                .all(&self.db)
                .await?;

            // Keep save order.
            let mut by_id: HashMap<i32, ListingModel> =
                listings.into_iter().map(|l| (l.id, l)).collect();
            let ordered = listing_ids
                .into_iter()
                .filter_map(|id| by_id.remove(&id))
                .collect();

            Ok((ordered, total))
        })
        .await
    }

    async fn ensure_listing(&self, listing_id: i32) -> AppResult<()> {
        Listing::find_by_id(listing_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Listing"))?;
        Ok(())
    }
}

fn pair_statement(sql: &str, user_id: i32, listing_id: i32) -> Statement {
    Statement::from_sql_and_values(
        DatabaseBackend::Postgres,
        sql,
        vec![user_id.into(), listing_id.into()],
    )
}
