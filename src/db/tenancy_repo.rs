// src/db/tenancy_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::TenantRole,
        tenancy::{Tenant, TenantSummary},
    },
};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Cria a empresa e já vincula o criador como ADMIN, na mesma transação.
    pub async fn create_tenant(&self, name: &str, owner_id: Uuid) -> Result<Tenant, AppError> {
        let mut tx = self.pool.begin().await?;

        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO tenant_users (tenant_id, user_id, role)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(tenant.id)
        .bind(owner_id)
        .bind(TenantRole::Admin)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(tenant)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<TenantSummary>, AppError> {
        let tenants = sqlx::query_as::<_, TenantSummary>(
            r#"
            SELECT t.id, t.name, tu.role
            FROM tenants t
            JOIN tenant_users tu ON tu.tenant_id = t.id
            WHERE tu.user_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tenants)
    }
}
