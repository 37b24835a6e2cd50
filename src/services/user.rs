use crate::{
    error::{AppError, AppResult},
    models::{listing, user, Listing, User, UserModel},
    services::{
        cache::{listing_key, CacheService},
        store::bounded,
        verification::normalize_email,
        verification::VerificationService,
    },
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QuerySelect, SqlErr, TransactionTrait,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignUp {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(max = 50))]
    pub gender: String,
    #[validate(range(min = 0, max = 150))]
    pub age: i32,
    #[validate(url)]
    pub pfp: Option<String>,
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProfilePatch {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 50))]
    pub gender: Option<String>,
    #[validate(range(min = 0, max = 150))]
    pub age: Option<i32>,
    #[validate(url)]
    pub pfp: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.gender.is_none()
            && self.age.is_none()
            && self.pfp.is_none()
    }
}

pub struct UserService {
    db: DatabaseConnection,
    cache: Option<CacheService>,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, cache: None }
    }

    pub fn with_cache(mut self, cache: CacheService) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Local account for an identity. An account created before the identity
    /// was known (same email, no auth id yet) is linked on first sight.
    pub async fn resolve_identity(
        &self,
        auth_id: &str,
        email: &str,
    ) -> AppResult<Option<UserModel>> {
        if let Some(found) = self.find_by_auth_id(auth_id).await? {
            return Ok(Some(found));
        }

        let unlinked = User::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .filter(user::Column::AuthId.is_null())
            .one(&self.db)
            .await?;

        match unlinked {
            Some(existing) => {
                let mut active: user::ActiveModel = existing.into();
                active.auth_id = Set(Some(auth_id.to_string()));
                active.updated_at = Set(chrono::Utc::now().naive_utc());
                let linked = active.update(&self.db).await?;
                tracing::info!(user_id = linked.id, "identity linked to existing account");
                Ok(Some(linked))
            }
            None => Ok(None),
        }
    }

    /// Creates the local account for an identity whose email has passed
    /// verification.
    pub async fn sign_up(&self, auth_id: &str, email: &str, input: SignUp) -> AppResult<UserModel> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let email = normalize_email(email);

        let verified = VerificationService::new(self.db.clone())
            .is_email_verified(&email)
            .await?;
        if !verified {
            return Err(AppError::Forbidden(
                "Email address has not been verified".to_string(),
            ));
        }

        let created = bounded("sign_up", async {
            if self.find_by_auth_id(auth_id).await?.is_some()
                || self.find_by_email(&email).await?.is_some()
            {
                return Err(AppError::Conflict("Account already exists".to_string()));
            }

            let now = chrono::Utc::now().naive_utc();
            let inserted = user::ActiveModel {
                auth_id: Set(Some(auth_id.to_string())),
                email: Set(email.clone()),
                first_name: Set(input.first_name.trim().to_string()),
                last_name: Set(input.last_name.trim().to_string()),
                gender: Set(input.gender.trim().to_string()),
                age: Set(input.age),
                pfp: Set(input.pfp),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&self.db)
            .await;

            match inserted {
                Ok(model) => Ok(model),
                // Lost a race with a concurrent sign-up for the same identity.
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    Err(AppError::Conflict("Account already exists".to_string()))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await?;

        tracing::info!(user_id = created.id, "user signed up");
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn get_by_auth_id(&self, auth_id: &str) -> AppResult<UserModel> {
        self.find_by_auth_id(auth_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn get_by_email(&self, email: &str) -> AppResult<UserModel> {
        self.find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn update_profile(&self, user_id: i32, patch: ProfilePatch) -> AppResult<UserModel> {
        if patch.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }
        patch
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        bounded("update_profile", async {
            let existing = self.get_by_id(user_id).await?;

            let mut active: user::ActiveModel = existing.into();
            if let Some(first_name) = patch.first_name {
                active.first_name = Set(first_name.trim().to_string());
            }
            if let Some(last_name) = patch.last_name {
                active.last_name = Set(last_name.trim().to_string());
            }
            if let Some(gender) = patch.gender {
                active.gender = Set(gender.trim().to_string());
            }
            if let Some(age) = patch.age {
                active.age = Set(age);
            }
            if let Some(pfp) = patch.pfp {
                active.pfp = Set(Some(pfp));
            }
            active.updated_at = Set(chrono::Utc::now().naive_utc());

            Ok(active.update(&self.db).await?)
        })
        .await
    }

    /// Removes the account. Listings and saves go with it.
    /// Deletes the account. Its listings and saved rows go with it through
    /// the foreign keys, so their cache entries are evicted here.
    pub async fn delete(&self, user_id: i32) -> AppResult<()> {
        let listing_ids = bounded("delete_user", async {
            let txn = self.db.begin().await?;
            let listing_ids: Vec<i32> = Listing::find()
                .select_only()
                .column(listing::Column::Id)
                .filter(listing::Column::ListerId.eq(user_id))
                .into_tuple()
                .all(&txn)
                .await?;

            let result = User::delete_by_id(user_id).exec(&txn).await?;
            if result.rows_affected == 0 {
                return Err(AppError::not_found("User"));
            }
            txn.commit().await?;
            Ok(listing_ids)
        })
        .await?;

        if let Some(cache) = &self.cache {
            for id in &listing_ids {
                cache.invalidate(&listing_key(*id)).await;
            }
        }
        tracing::info!(user_id, listings = listing_ids.len(), "user deleted");
        Ok(())
    }

    async fn find_by_auth_id(&self, auth_id: &str) -> AppResult<Option<UserModel>> {
        Ok(User::find()
            .filter(user::Column::AuthId.eq(auth_id))
            .one(&self.db)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserModel>> {
        Ok(User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }
}
