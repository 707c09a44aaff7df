// src/handlers/crm.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::StaffContext,
    models::crm::Customer,
};

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Maria da Silva")]
    pub full_name: String,

    #[validate(email(message = "invalid_email"))]
    #[schema(example = "maria@email.com")]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,

    pub address: Option<Value>,
    #[schema(example = json!(["vip", "2026"]))]
    pub tags: Option<Vec<String>>,

    // Cliente recebe notificações por e-mail? (padrão: sim)
    #[serde(default = "default_true")]
    pub notify_by_email: bool,

    #[serde(default)]
    pub custom_data: Value,
}

// POST /api/crm/customers
#[utoipa::path(
    post,
    path = "/api/crm/customers",
    tag = "CRM",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 400, description = "Dados inválidos")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    ctx: StaffContext,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let custom_data = if payload.custom_data.is_null() {
        json!({})
    } else {
        payload.custom_data
    };

    let customer = app_state
        .crm_service
        .create_customer(
            ctx.tenant_id,
            &payload.full_name,
            payload.email.as_deref(),
            payload.phone.as_deref(),
            payload.mobile.as_deref(),
            payload.address.as_ref(),
            payload.tags,
            payload.notify_by_email,
            &custom_data,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/crm/customers
#[utoipa::path(
    get,
    path = "/api/crm/customers",
    tag = "CRM",
    responses(
        (status = 200, description = "Lista de clientes", body = Vec<Customer>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    ctx: StaffContext,
) -> Result<impl IntoResponse, AppError> {
    let customers = app_state.crm_service.list_customers(ctx.tenant_id).await?;
    Ok(Json(customers))
}

// GET /api/crm/customers/{customer_id}
#[utoipa::path(
    get,
    path = "/api/crm/customers/{customer_id}",
    tag = "CRM",
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("customer_id" = Uuid, Path, description = "ID do cliente"),
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    ctx: StaffContext,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state
        .crm_service
        .get_customer(ctx.tenant_id, customer_id)
        .await?;
    Ok(Json(customer))
}
