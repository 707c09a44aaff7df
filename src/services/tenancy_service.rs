// src/services/tenancy_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TenantRepository,
    models::tenancy::{Tenant, TenantSummary},
};

#[derive(Clone)]
pub struct TenancyService {
    repo: TenantRepository,
}

impl TenancyService {
    pub fn new(repo: TenantRepository) -> Self {
        Self { repo }
    }

    pub async fn create_tenant(&self, name: &str, owner_id: Uuid) -> Result<Tenant, AppError> {
        self.repo.create_tenant(name, owner_id).await
    }

    pub async fn list_my_tenants(&self, user_id: Uuid) -> Result<Vec<TenantSummary>, AppError> {
        self.repo.list_for_user(user_id).await
    }
}
