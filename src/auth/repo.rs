use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::User;

/// Postgres' default name for the `UNIQUE` on `users.email`.
const EMAIL_UNIQUE: &str = "users_email_key";

#[derive(Debug, thiserror::Error)]
pub enum InsertUserError {
    #[error("email already used")]
    DuplicateEmail,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Credential store.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<User>>;
    async fn insert(&self, user: &User) -> Result<(), InsertUserError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const USER_COLUMNS: &str =
    "id, email, username, avatar, newsletter, password, salt, token, created_at";

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .context("find user by token")?;
        Ok(user)
    }

    async fn insert(&self, user: &User) -> Result<(), InsertUserError> {
        let res = sqlx::query(
            r#"
            INSERT INTO users (id, email, username, avatar, newsletter, password, salt, token, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.avatar)
        .bind(user.newsletter)
        .bind(&user.password)
        .bind(&user.salt)
        .bind(&user.token)
        .bind(user.created_at)
        .execute(&self.db)
        .await;

        res.map(|_| ()).map_err(insert_error)
    }
}

/// Only a clash on the email index is a duplicate signup; anything else,
/// including a token collision, is a store failure.
fn insert_error(e: sqlx::Error) -> InsertUserError {
    match e {
        sqlx::Error::Database(db)
            if db.is_unique_violation() && db.constraint() == Some(EMAIL_UNIQUE) =>
        {
            InsertUserError::DuplicateEmail
        }
        e => InsertUserError::Store(anyhow::Error::new(e).context("insert user")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::fmt;

    #[derive(Debug)]
    struct UniqueViolation {
        constraint: &'static str,
    }

    impl fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "duplicate key value violates unique constraint \"{}\"", self.constraint)
        }
    }

    impl std::error::Error for UniqueViolation {}

    impl DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.constraint)
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    fn violation(constraint: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(UniqueViolation { constraint }))
    }

    #[test]
    fn email_clash_is_a_duplicate_signup() {
        assert!(matches!(
            insert_error(violation("users_email_key")),
            InsertUserError::DuplicateEmail
        ));
    }

    #[test]
    fn token_clash_is_a_store_failure() {
        assert!(matches!(
            insert_error(violation("users_token_key")),
            InsertUserError::Store(_)
        ));
        assert!(matches!(
            insert_error(sqlx::Error::RowNotFound),
            InsertUserError::Store(_)
        ));
    }
}
