//! Read-only view of the external user directory.
//!
//! Owner accounts are provisioned by the identity system that shares the
//! `app_user` table; this service only checks that an owner id is known.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use notegraph_core::{Error, Result, UserDirectory};

/// PostgreSQL-backed user directory.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: Pool<Postgres>,
}

impl PgUserDirectory {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Provision a user row. Used by fixtures and local setups where no
    /// identity system writes to `app_user`.
    pub async fn provision(&self, username: &str) -> Result<i64> {
        sqlx::query_scalar("INSERT INTO app_user (username) VALUES ($1) RETURNING id")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn user_exists(&self, user_id: i64) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM app_user WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}
