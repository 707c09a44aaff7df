// src/models/scheduling.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "appointment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    // Os status que "ocupam" a agenda do profissional.
    pub const ACTIVE: [AppointmentStatus; 3] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::InProgress,
    ];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "appointment_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentType {
    Maintenance,
    Repair,
    Installation,
    Inspection,
    Consultation,
    Emergency,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "appointment_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Default for AppointmentPriority {
    fn default() -> Self {
        AppointmentPriority::Normal
    }
}

// --- Entidade ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub created_by: Uuid,
    pub assigned_user_id: Option<Uuid>,
    #[schema(example = "Manutenção do ar-condicionado")]
    pub title: String,
    pub appointment_type: AppointmentType,
    pub priority: AppointmentPriority,
    pub status: AppointmentStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[schema(example = 60)]
    pub estimated_duration: i32,
    pub actual_duration: Option<i32>,
    #[schema(example = "150.00")]
    pub price: Option<Decimal>,
    pub location: Option<Value>,
    pub tags: Option<Vec<String>>,
    pub custom_data: Value,
    pub notes: Option<String>,
    pub completion_notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Projeção devolvida pelos handlers: o agendamento + nomes relacionados.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDetail {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub customer_name: Option<String>,
    pub assignee_name: Option<String>,
}

// Dados do agendamento que colide, devolvidos dentro do erro 409.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConflictInfo {
    pub appointment_id: Uuid,
    pub customer_name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

// --- Projeções usadas nas pré-condições ---

#[derive(Debug, Clone, FromRow)]
pub struct CustomerRef {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub address: Option<Value>,
    pub notify_by_email: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct StaffRef {
    pub id: Uuid,
    pub full_name: String,
}

// --- Payloads ---

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("negative_price"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub customer_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "required"))]
    #[schema(example = "Instalação de rastreador")]
    pub title: String,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    pub appointment_type: AppointmentType,

    #[serde(default)]
    pub priority: AppointmentPriority,

    pub assigned_user_id: Option<Uuid>,

    #[validate(range(min = 15, max = 480, message = "invalid_duration"))]
    #[schema(example = 60)]
    pub estimated_duration: i32,

    #[validate(custom(function = "validate_price"))]
    #[schema(example = "150.00")]
    pub price: Option<Decimal>,

    // Se não vier, usamos o endereço do cliente.
    pub location: Option<Value>,

    pub tags: Option<Vec<String>>,

    #[serde(default)]
    pub custom_data: Value,

    pub notes: Option<String>,

    // Quando true, tentamos enviar a confirmação de reserva ao cliente.
    #[serde(default)]
    pub send_confirmation: bool,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointment {
    #[validate(length(min = 1, max = 200, message = "required"))]
    pub title: Option<String>,

    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,

    pub appointment_type: Option<AppointmentType>,
    pub priority: Option<AppointmentPriority>,
    pub assigned_user_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,

    #[validate(range(min = 15, max = 480, message = "invalid_duration"))]
    pub estimated_duration: Option<i32>,

    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,

    pub location: Option<Value>,
    pub tags: Option<Vec<String>>,
    pub custom_data: Option<Value>,
    pub notes: Option<String>,

    pub completion_notes: Option<String>,

    #[validate(range(min = 1, message = "invalid_duration"))]
    pub actual_duration: Option<i32>,
}

impl UpdateAppointment {
    // Se qualquer extremidade mudou, o intervalo efetivo precisa ser revalidado.
    pub fn touches_schedule(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }
}

// --- Contratos de escrita contra o Record Store ---

#[derive(Debug, Clone)]
pub struct NewAppointmentRecord {
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub created_by: Uuid,
    pub assigned_user_id: Option<Uuid>,
    pub title: String,
    pub appointment_type: AppointmentType,
    pub priority: AppointmentPriority,
    pub status: AppointmentStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub estimated_duration: i32,
    pub price: Option<Decimal>,
    pub location: Option<Value>,
    pub tags: Option<Vec<String>>,
    pub custom_data: Value,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentChanges {
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub appointment_type: Option<AppointmentType>,
    pub priority: Option<AppointmentPriority>,
    pub assigned_user_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub estimated_duration: Option<i32>,
    pub actual_duration: Option<i32>,
    pub price: Option<Decimal>,
    pub location: Option<Value>,
    pub tags: Option<Vec<String>>,
    pub custom_data: Option<Value>,
    pub notes: Option<String>,
    pub completion_notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

// Teste clássico de interseção de intervalos, com fim exclusivo:
// um agendamento que termina às 10h não colide com um que começa às 10h.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}
