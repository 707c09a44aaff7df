// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::bearer_token,
    models::auth::TenantRole,
};

// O nome do nosso cabeçalho HTTP customizado
const TENANT_ID_HEADER: &str = "x-tenant-id";

// O contexto do atendente dentro da empresa: quem é, onde está e o que pode.
// É isto que os handlers de agendamento consomem.
#[derive(Debug, Clone)]
pub struct StaffContext {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: TenantRole,
}

// Auth + Tenancy em um passo: valida o token, lê o X-Tenant-ID e
// confere se o usuário é mesmo membro daquela empresa.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::InvalidToken)?;
    let user = app_state.auth_service.validate_token(token).await?;

    let header_value = request
        .headers()
        .get(TENANT_ID_HEADER)
        .ok_or(AppError::BadRequest("O cabeçalho X-Tenant-ID é obrigatório."))?;

    let value_str = header_value.to_str().map_err(|_| {
        AppError::BadRequest("Cabeçalho X-Tenant-ID contém caracteres inválidos.")
    })?;

    let tenant_id = Uuid::parse_str(value_str)
        .map_err(|_| AppError::BadRequest("Cabeçalho X-Tenant-ID inválido (não é um UUID)."))?;

    // Membro da empresa? Qual o papel dele nela?
    let role = app_state
        .user_repo
        .membership_role(tenant_id, user.id)
        .await?
        .ok_or(AppError::TenantAccessDenied)?;

    let context = StaffContext {
        user_id: user.id,
        tenant_id,
        role,
    };

    request.extensions_mut().insert(user);
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for StaffContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<StaffContext>()
            .cloned()
            .ok_or(AppError::TenantAccessDenied)
    }
}
