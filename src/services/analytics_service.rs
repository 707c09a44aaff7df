// src/services/analytics_service.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::services::scheduling_service::AnalyticsRecorder;

// Grava eventos de produto na tabela analytics_events.
// Quem chama trata isto como fire-and-forget.
#[derive(Clone)]
pub struct AnalyticsService {
    pool: PgPool,
}

impl AnalyticsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsRecorder for AnalyticsService {
    async fn track(&self, tenant_id: Uuid, event: &str, payload: Value) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO analytics_events (tenant_id, event_name, payload)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(tenant_id)
        .bind(event)
        .bind(payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
