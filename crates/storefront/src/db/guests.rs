//! Guest session repository implementation for [`PgStore`].

use async_trait::async_trait;
use chrono::{Duration, Utc};

use treadline_core::GuestToken;

use super::store::GuestSessionRepo;
use super::{PgStore, RepositoryError};
use crate::models::{GUEST_SESSION_TTL_DAYS, GuestSession};

impl PgStore {
    async fn find_session(
        &self,
        token: GuestToken,
    ) -> Result<Option<GuestSession>, RepositoryError> {
        let session = sqlx::query_as::<_, GuestSession>(
            r"
            SELECT token, expires_at, created_at
            FROM storefront.guest_session
            WHERE token = $1
            ",
        )
        .bind(token)
        .fetch_optional(self.pool())
        .await?;

        Ok(session)
    }

    async fn mint_session(&self) -> Result<GuestSession, RepositoryError> {
        let expires_at = Utc::now() + Duration::days(GUEST_SESSION_TTL_DAYS);

        let session = sqlx::query_as::<_, GuestSession>(
            r"
            INSERT INTO storefront.guest_session (token, expires_at)
            VALUES ($1, $2)
            RETURNING token, expires_at, created_at
            ",
        )
        .bind(GuestToken::mint())
        .bind(expires_at)
        .fetch_one(self.pool())
        .await?;

        Ok(session)
    }
}

#[async_trait]
impl GuestSessionRepo for PgStore {
    async fn get_or_create_session(
        &self,
        presented: Option<GuestToken>,
    ) -> Result<GuestSession, RepositoryError> {
        if let Some(token) = presented
            && let Some(session) = self.find_session(token).await?
        {
            if session.is_expired(Utc::now()) {
                self.delete_session(token).await?;
            } else {
                return Ok(session);
            }
        }

        self.mint_session().await
    }

    async fn delete_session(&self, token: GuestToken) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            DELETE FROM storefront.guest_session
            WHERE token = $1
            ",
        )
        .bind(token)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM storefront.guest_session
            WHERE expires_at <= now()
            ",
        )
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }
}
