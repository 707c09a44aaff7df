// src/services/notification_service.rs
//
// Persiste a notificação para o cliente; o transporte real (e-mail/SMS)
// é responsabilidade de um worker externo que consome a tabela.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::{
        notifications::{Notification, NotificationKind},
        scheduling::{Appointment, AppointmentStatus, CustomerRef},
    },
    services::scheduling_service::NotificationDispatcher,
};

fn status_label(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Scheduled => "agendado",
        AppointmentStatus::Confirmed => "confirmado",
        AppointmentStatus::InProgress => "em andamento",
        AppointmentStatus::Completed => "concluído",
        AppointmentStatus::Cancelled => "cancelado",
        AppointmentStatus::NoShow => "não compareceu",
    }
}

#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn persist(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        kind: NotificationKind,
        title: &str,
        message: &str,
        reference_id: Uuid,
    ) -> anyhow::Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (tenant_id, customer_id, kind, title, message, reference_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, tenant_id, customer_id, kind, title, message, reference_id, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .bind(kind)
        .bind(title)
        .bind(message)
        .bind(reference_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }
}

#[async_trait]
impl NotificationDispatcher for NotificationService {
    async fn send_booking_confirmation(
        &self,
        tenant_id: Uuid,
        customer: &CustomerRef,
        appointment: &Appointment,
    ) -> anyhow::Result<()> {
        let message = format!(
            "Olá, {}! Seu agendamento \"{}\" foi reservado para {} às {}.",
            customer.full_name,
            appointment.title,
            appointment.start_time.format("%d/%m/%Y"),
            appointment.start_time.format("%H:%M"),
        );

        let notification = self
            .persist(
                tenant_id,
                customer.id,
                NotificationKind::BookingConfirmation,
                "Agendamento reservado",
                &message,
                appointment.id,
            )
            .await?;

        tracing::info!(
            "Confirmação de reserva {} registrada para o cliente {} (agendamento {})",
            notification.id,
            customer.id,
            appointment.id
        );

        Ok(())
    }

    async fn send_status_change(
        &self,
        tenant_id: Uuid,
        customer: &CustomerRef,
        appointment: &Appointment,
        previous: AppointmentStatus,
    ) -> anyhow::Result<()> {
        let message = format!(
            "O agendamento \"{}\" passou de {} para {}.",
            appointment.title,
            status_label(previous),
            status_label(appointment.status),
        );

        self.persist(
            tenant_id,
            customer.id,
            NotificationKind::StatusChange,
            "Atualização do seu agendamento",
            &message,
            appointment.id,
        )
        .await
        .map(|_| ())
    }
}
