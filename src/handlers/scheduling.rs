// src/handlers/scheduling.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::StaffContext,
    models::scheduling::{Appointment, AppointmentDetail, NewAppointment, UpdateAppointment},
};

// POST /api/scheduling/appointments
#[utoipa::path(
    post,
    path = "/api/scheduling/appointments",
    tag = "Agendamento",
    request_body = NewAppointment,
    responses(
        (status = 201, description = "Agendamento criado", body = AppointmentDetail),
        (status = 404, description = "Cliente não encontrado"),
        (status = 409, description = "Conflito de agenda com outro agendamento ativo"),
        (status = 422, description = "Profissional inválido ou intervalo mal formado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_appointment(
    State(app_state): State<AppState>,
    ctx: StaffContext,
    Json(payload): Json<NewAppointment>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let detail = app_state
        .scheduling_service
        .create(ctx.tenant_id, ctx.user_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentWindowQuery {
    // Janela opcional: devolve agendamentos que tocam [from, to)
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// GET /api/scheduling/appointments
#[utoipa::path(
    get,
    path = "/api/scheduling/appointments",
    tag = "Agendamento",
    responses(
        (status = 200, description = "Agendamentos da empresa", body = Vec<Appointment>)
    ),
    params(
        AppointmentWindowQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_appointments(
    State(app_state): State<AppState>,
    ctx: StaffContext,
    Query(window): Query<AppointmentWindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let appointments = app_state
        .scheduling_service
        .list(ctx.tenant_id, window.from, window.to)
        .await?;

    Ok(Json(appointments))
}

// GET /api/scheduling/appointments/{appointment_id}
#[utoipa::path(
    get,
    path = "/api/scheduling/appointments/{appointment_id}",
    tag = "Agendamento",
    responses(
        (status = 200, description = "Agendamento", body = AppointmentDetail),
        (status = 404, description = "Agendamento não encontrado")
    ),
    params(
        ("appointment_id" = Uuid, Path, description = "ID do agendamento"),
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_appointment(
    State(app_state): State<AppState>,
    ctx: StaffContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state
        .scheduling_service
        .get(ctx.tenant_id, appointment_id)
        .await?;

    Ok(Json(detail))
}

// PATCH /api/scheduling/appointments/{appointment_id}
#[utoipa::path(
    patch,
    path = "/api/scheduling/appointments/{appointment_id}",
    tag = "Agendamento",
    request_body = UpdateAppointment,
    responses(
        (status = 200, description = "Agendamento atualizado", body = AppointmentDetail),
        (status = 404, description = "Agendamento não encontrado"),
        (status = 409, description = "Conflito de agenda com outro agendamento ativo"),
        (status = 422, description = "Profissional inválido ou intervalo mal formado")
    ),
    params(
        ("appointment_id" = Uuid, Path, description = "ID do agendamento"),
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_appointment(
    State(app_state): State<AppState>,
    ctx: StaffContext,
    Path(appointment_id): Path<Uuid>,
    Json(payload): Json<UpdateAppointment>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let detail = app_state
        .scheduling_service
        .update(ctx.tenant_id, appointment_id, payload)
        .await?;

    Ok(Json(detail))
}

// DELETE /api/scheduling/appointments/{appointment_id}
// Soft delete: o registro vira CANCELLED, nunca some do banco.
#[utoipa::path(
    delete,
    path = "/api/scheduling/appointments/{appointment_id}",
    tag = "Agendamento",
    responses(
        (status = 200, description = "Agendamento cancelado", body = Appointment),
        (status = 403, description = "Exige papel MANAGER ou ADMIN"),
        (status = 404, description = "Agendamento não encontrado"),
        (status = 409, description = "Agendamento concluído e já faturado")
    ),
    params(
        ("appointment_id" = Uuid, Path, description = "ID do agendamento"),
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_appointment(
    State(app_state): State<AppState>,
    ctx: StaffContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let cancelled = app_state
        .scheduling_service
        .cancel(ctx.tenant_id, appointment_id, ctx.user_id, ctx.role)
        .await?;

    Ok(Json(cancelled))
}
