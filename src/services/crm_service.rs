// src/services/crm_service.rs

use serde_json::Value;
use uuid::Uuid;

use crate::{common::error::AppError, db::CrmRepository, models::crm::Customer};

#[derive(Clone)]
pub struct CrmService {
    repo: CrmRepository,
}

impl CrmService {
    pub fn new(repo: CrmRepository) -> Self {
        Self { repo }
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
        self.repo
            .create_customer(
                tenant_id,
                full_name,
                email,
                phone,
                mobile,
                address,
                tags,
                notify_by_email,
                custom_data,
            )
            .await
    }

    pub async fn get_customer(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Customer, AppError> {
        self.repo
            .find_customer(tenant_id, customer_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))
    }

    pub async fn list_customers(&self, tenant_id: Uuid) -> Result<Vec<Customer>, AppError> {
        self.repo.list_customers(tenant_id).await
    }
}
