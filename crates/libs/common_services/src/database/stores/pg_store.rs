use crate::database::DbError;
use crate::database::favorite::{FavoriteCount, FavoriteToggle, NewFavoriteToggle, ToggleOutcome};
use crate::database::favorite_store::FavoriteCountStore;
use crate::database::gallery::Gallery;
use crate::database::gallery_store::GalleryStore;
use crate::database::invite::invite::{
    Invite, InviteStatus, InviteUpdate, NewInvite, UsagePatch, UsageSnapshot,
};
use crate::database::invite_store::InviteStore;
use crate::database::visit_ledger::{VisitEntry, VisitLedger};
use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};

/// Postgres implementation of every store. Conditional writes are single statements or short
/// transactions, so atomicity comes from the database rather than from application locks.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn apply_usage<'e, E: PgExecutor<'e>>(
    executor: E,
    invite_id: i64,
    expected: UsageSnapshot,
    patch: UsagePatch,
) -> Result<Option<Invite>, DbError> {
    Ok(sqlx::query_as::<_, Invite>(
        r"
        UPDATE invite
        SET usage_count = $5, status = $6, version = version + 1, updated_at = now()
        WHERE id = $1
          AND usage_count = $2
          AND status = $3
          AND version = $4
          AND (max_usage IS NULL OR $5 <= max_usage)
        RETURNING *
        ",
    )
    .bind(invite_id)
    .bind(expected.usage_count)
    .bind(expected.status)
    .bind(expected.version)
    .bind(patch.usage_count)
    .bind(patch.status)
    .fetch_optional(executor)
    .await?)
}

#[async_trait]
impl InviteStore for PgStore {
    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_invite(&self, invite: &NewInvite) -> Result<Invite, DbError> {
        Ok(sqlx::query_as::<_, Invite>(
            r"
            INSERT INTO invite (
                code, gallery_id, client_email, invite_type, status, expires_at, max_usage,
                can_view, can_favorite, can_comment, can_download, can_request_purchase
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            ",
        )
        .bind(&invite.code)
        .bind(&invite.gallery_id)
        .bind(&invite.client_email)
        .bind(invite.invite_type)
        .bind(invite.status)
        .bind(invite.expires_at)
        .bind(invite.max_usage)
        .bind(invite.permissions.can_view)
        .bind(invite.permissions.can_favorite)
        .bind(invite.permissions.can_comment)
        .bind(invite.permissions.can_download)
        .bind(invite.permissions.can_request_purchase)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_invite_by_code(&self, code: &str) -> Result<Option<Invite>, DbError> {
        Ok(
            sqlx::query_as::<_, Invite>("SELECT * FROM invite WHERE code = $1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn get_invite_by_id(&self, invite_id: i64) -> Result<Option<Invite>, DbError> {
        Ok(
            sqlx::query_as::<_, Invite>("SELECT * FROM invite WHERE id = $1")
                .bind(invite_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn get_invite_with_ownership(
        &self,
        invite_id: i64,
        user_id: i32,
    ) -> Result<Option<Invite>, DbError> {
        Ok(sqlx::query_as::<_, Invite>(
            r"
            SELECT i.*
            FROM invite i
            JOIN gallery g ON g.id = i.gallery_id
            WHERE i.id = $1 AND g.owner_id = $2
            ",
        )
        .bind(invite_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_invites_for_gallery(&self, gallery_id: &str) -> Result<Vec<Invite>, DbError> {
        Ok(sqlx::query_as::<_, Invite>(
            "SELECT * FROM invite WHERE gallery_id = $1 ORDER BY created_at DESC",
        )
        .bind(gallery_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn conditional_update_invite(
        &self,
        invite_id: i64,
        expected: UsageSnapshot,
        patch: UsagePatch,
    ) -> Result<Option<Invite>, DbError> {
        apply_usage(&self.pool, invite_id, expected, patch).await
    }

    async fn update_invite(
        &self,
        invite_id: i64,
        expected: UsageSnapshot,
        update: &InviteUpdate,
    ) -> Result<Option<Invite>, DbError> {
        Ok(sqlx::query_as::<_, Invite>(
            r"
            UPDATE invite
            SET
                invite_type = $5,
                status = $6,
                expires_at = $7,
                max_usage = $8,
                client_email = $9,
                can_view = $10,
                can_favorite = $11,
                can_comment = $12,
                can_download = $13,
                can_request_purchase = $14,
                version = version + 1,
                updated_at = now()
            WHERE id = $1 AND usage_count = $2 AND status = $3 AND version = $4
            RETURNING *
            ",
        )
        .bind(invite_id)
        .bind(expected.usage_count)
        .bind(expected.status)
        .bind(expected.version)
        .bind(update.invite_type)
        .bind(update.status)
        .bind(update.expires_at)
        .bind(update.max_usage)
        .bind(&update.client_email)
        .bind(update.permissions.can_view)
        .bind(update.permissions.can_favorite)
        .bind(update.permissions.can_comment)
        .bind(update.permissions.can_download)
        .bind(update.permissions.can_request_purchase)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn mark_expired(&self, invite_id: i64) -> Result<(), DbError> {
        sqlx::query(
            r"
            UPDATE invite
            SET status = $2, version = version + 1, updated_at = now()
            WHERE id = $1 AND status IN ($3, $4)
            ",
        )
        .bind(invite_id)
        .bind(InviteStatus::Expired)
        .bind(InviteStatus::Pending)
        .bind(InviteStatus::Active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_invite(&self, invite_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM invite WHERE id = $1")
            .bind(invite_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl GalleryStore for PgStore {
    async fn get_gallery(&self, gallery_id: &str) -> Result<Option<Gallery>, DbError> {
        Ok(sqlx::query_as::<_, Gallery>(
            "SELECT id, title, owner_id FROM gallery WHERE id = $1",
        )
        .bind(gallery_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn get_owned_gallery(
        &self,
        gallery_id: &str,
        user_id: i32,
    ) -> Result<Option<Gallery>, DbError> {
        Ok(sqlx::query_as::<_, Gallery>(
            "SELECT id, title, owner_id FROM gallery WHERE id = $1 AND owner_id = $2",
        )
        .bind(gallery_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn photo_gallery_id(&self, photo_id: &str) -> Result<Option<String>, DbError> {
        Ok(
            sqlx::query_scalar::<_, String>("SELECT gallery_id FROM photo WHERE id = $1")
                .bind(photo_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn photos_in_gallery(
        &self,
        gallery_id: &str,
        photo_ids: &[String],
    ) -> Result<Vec<String>, DbError> {
        Ok(sqlx::query_scalar::<_, String>(
            r"
            SELECT ids.photo_id
            FROM UNNEST($1::TEXT[]) WITH ORDINALITY AS ids(photo_id, position)
            JOIN photo p ON p.id = ids.photo_id
            WHERE p.gallery_id = $2
            ORDER BY ids.position
            ",
        )
        .bind(photo_ids)
        .bind(gallery_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl VisitLedger for PgStore {
    async fn enter_visit(
        &self,
        invite_id: i64,
        visit_key: &str,
        expected: UsageSnapshot,
        patch: UsagePatch,
    ) -> Result<VisitEntry, DbError> {
        let mut tx = self.pool.begin().await?;

        // A concurrent entry of the same visit blocks here until the other transaction
        // finishes. If that one rolled back, this insert goes through.
        let inserted = sqlx::query(
            r"
            INSERT INTO invite_visit (invite_id, visit_key)
            VALUES ($1, $2)
            ON CONFLICT (invite_id, visit_key) DO NOTHING
            ",
        )
        .bind(invite_id)
        .bind(visit_key)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if !inserted {
            tx.rollback().await?;
            return Ok(VisitEntry::AlreadyEntered);
        }

        match apply_usage(&mut *tx, invite_id, expected, patch).await? {
            Some(updated) => {
                tx.commit().await?;
                Ok(VisitEntry::Entered(updated))
            }
            None => {
                tx.rollback().await?;
                Ok(VisitEntry::Stale)
            }
        }
    }

    async fn has_visit(&self, invite_id: i64, visit_key: &str) -> Result<bool, DbError> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM invite_visit WHERE invite_id = $1 AND visit_key = $2)",
        )
        .bind(invite_id)
        .bind(visit_key)
        .fetch_one(&self.pool)
        .await?)
    }
}

#[async_trait]
impl FavoriteCountStore for PgStore {
    async fn apply_favorite_toggle(
        &self,
        toggle: &NewFavoriteToggle,
    ) -> Result<ToggleOutcome, DbError> {
        let mut tx = self.pool.begin().await?;

        // A concurrent insert of the same toggle id blocks here until the other transaction
        // finishes, after which this one sees the conflict and replays.
        let inserted = sqlx::query(
            r"
            INSERT INTO favorite_toggle (toggle_id, invite_id, photo_id, favorited, favorite_count)
            VALUES ($1, $2, $3, $4, 0)
            ON CONFLICT (toggle_id) DO NOTHING
            ",
        )
        .bind(toggle.toggle_id)
        .bind(toggle.invite_id)
        .bind(&toggle.photo_id)
        .bind(toggle.favorited)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if !inserted {
            let recorded = sqlx::query_as::<_, FavoriteToggle>(
                "SELECT * FROM favorite_toggle WHERE toggle_id = $1",
            )
            .bind(toggle.toggle_id)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            return Ok(ToggleOutcome {
                toggle: recorded,
                replayed: true,
            });
        }

        let delta: i32 = if toggle.favorited { 1 } else { -1 };
        let favorite_count = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO photo_favorite_count (photo_id, favorite_count)
            VALUES ($1, GREATEST($2, 0))
            ON CONFLICT (photo_id) DO UPDATE
            SET favorite_count = GREATEST(photo_favorite_count.favorite_count + $2, 0)
            RETURNING favorite_count
            ",
        )
        .bind(&toggle.photo_id)
        .bind(delta)
        .fetch_one(&mut *tx)
        .await?;

        let applied = sqlx::query_as::<_, FavoriteToggle>(
            r"
            UPDATE favorite_toggle
            SET favorite_count = $2
            WHERE toggle_id = $1
            RETURNING *
            ",
        )
        .bind(toggle.toggle_id)
        .bind(favorite_count)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ToggleOutcome {
            toggle: applied,
            replayed: false,
        })
    }

    async fn get_favorite_counts(
        &self,
        photo_ids: &[String],
    ) -> Result<Vec<FavoriteCount>, DbError> {
        Ok(sqlx::query_as::<_, FavoriteCount>(
            r"
            SELECT ids.photo_id, COALESCE(c.favorite_count, 0) AS favorite_count
            FROM UNNEST($1::TEXT[]) WITH ORDINALITY AS ids(photo_id, position)
            LEFT JOIN photo_favorite_count c ON c.photo_id = ids.photo_id
            ORDER BY ids.position
            ",
        )
        .bind(photo_ids)
        .fetch_all(&self.pool)
        .await?)
    }
}
