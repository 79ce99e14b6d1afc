//! Postgres-backed credential store

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use taptosmile_shared::{AdminAccount, AdminId, AdminPatch, Role};

use super::{CredentialStore, StoreError};

const ADMIN_COLUMNS: &str = "id, email, password_hash, role, is_active, created_at, updated_at";

/// Credential store over the `admins` table
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Lock every active superadmin row for the rest of `tx` and report whether
/// `id` is the only one.
///
/// Concurrent demotions and deletions queue on these locks, so each one sees
/// the set as left by the previous commit.
async fn is_last_superadmin(
    tx: &mut Transaction<'_, Postgres>,
    id: AdminId,
) -> Result<bool, StoreError> {
    let active: Vec<AdminId> =
        sqlx::query_scalar("SELECT id FROM admins WHERE role = $1 AND is_active FOR UPDATE")
            .bind(Role::Superadmin)
            .fetch_all(&mut **tx)
            .await?;
    Ok(matches!(active.as_slice(), [only] if *only == id))
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            // PostgreSQL unique violation
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::Duplicate;
            }
        }
        StoreError::Backend(err.to_string())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminAccount>, StoreError> {
        let account = sqlx::query_as::<_, AdminAccount>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn find_by_id(&self, id: AdminId) -> Result<Option<AdminAccount>, StoreError> {
        let account = sqlx::query_as::<_, AdminAccount>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn insert(&self, account: AdminAccount) -> Result<AdminId, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO admins (id, email, password_hash, role, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role)
        .bind(account.is_active)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(account.id)
    }

    async fn update(
        &self,
        id: AdminId,
        patch: AdminPatch,
    ) -> Result<Option<AdminAccount>, StoreError> {
        let mut tx = self.pool.begin().await?;
        if patch.demotes_superadmin() && is_last_superadmin(&mut tx, id).await? {
            return Err(StoreError::LastSuperadmin);
        }

        let account = sqlx::query_as::<_, AdminAccount>(&format!(
            r#"
            UPDATE admins SET
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                role = COALESCE($4, role),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ADMIN_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.email)
        .bind(patch.password_hash)
        .bind(patch.role)
        .bind(patch.is_active)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(account)
    }

    async fn delete(&self, id: AdminId) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        if is_last_superadmin(&mut tx, id).await? {
            return Err(StoreError::LastSuperadmin);
        }

        let result = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn list_all(&self) -> Result<Vec<AdminAccount>, StoreError> {
        let accounts = sqlx::query_as::<_, AdminAccount>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn count_active_superadmins(&self) -> Result<u64, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM admins WHERE role = $1 AND is_active")
                .bind(Role::Superadmin)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
