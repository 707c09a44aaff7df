// src/db/crm_repo.rs

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::crm::Customer};

const CUSTOMER_COLUMNS: &str = r#"
    id, tenant_id, full_name, email, phone, mobile,
    address, tags, notify_by_email, custom_data, created_at, updated_at
"#;

#[derive(Clone)]
pub struct CrmRepository {
    pool: PgPool,
}

impl CrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_customer(
        &self,
        tenant_id: Uuid,
        full_name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        mobile: Option<&str>,
        address: Option<&Value>,
        tags: Option<Vec<String>>,
        notify_by_email: bool,
        custom_data: &Value,
    ) -> Result<Customer, AppError> {
        let query = format!(
            r#"
            INSERT INTO customers (
                tenant_id, full_name, email, phone, mobile,
                address, tags, notify_by_email, custom_data
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );

        let customer = sqlx::query_as::<_, Customer>(&query)
            .bind(tenant_id)
            .bind(full_name)
            .bind(email)
            .bind(phone)
            .bind(mobile)
            .bind(address)
            .bind(tags)
            .bind(notify_by_email)
            .bind(custom_data)
            .fetch_one(&self.pool)
            .await?;

        Ok(customer)
    }

    pub async fn find_customer(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError> {
        let query = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE tenant_id = $1 AND id = $2"
        );

        let customer = sqlx::query_as::<_, Customer>(&query)
            .bind(tenant_id)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    pub async fn list_customers(&self, tenant_id: Uuid) -> Result<Vec<Customer>, AppError> {
        let query = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE tenant_id = $1 ORDER BY full_name"
        );

        let customers = sqlx::query_as::<_, Customer>(&query)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }
}
