// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,

    pub full_name: String,

    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,

    // Endereço flexível.
    // O Frontend manda um JSON, o Rust guarda como JSONB.
    pub address: Option<Value>,

    // Tags simples (Array de Strings)
    // No Postgres é TEXT[], no Rust é Vec<String>
    pub tags: Option<Vec<String>>,

    // Preferência de comunicação: quando false, nenhuma notificação
    // de mudança de status é enviada para este cliente.
    pub notify_by_email: bool,

    pub custom_data: Value,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
