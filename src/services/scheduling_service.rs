// src/services/scheduling_service.rs
//
// O ciclo de vida do agendamento: criar, atualizar e cancelar,
// com a regra central de exclusividade de horário por profissional.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::TenantRole,
        scheduling::{
            Appointment, AppointmentChanges, AppointmentDetail, AppointmentStatus, ConflictInfo,
            CustomerRef, NewAppointment, NewAppointmentRecord, StaffRef, UpdateAppointment,
        },
    },
};

// =============================================================================
//  CONTRATOS
// =============================================================================

// O "Record Store" abstrato. Toda operação recebe o tenant_id como primeiro
// argumento -- nenhuma consulta roda sem escopo de empresa.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<Appointment>, AppError>;

    // Somente agendamentos ativos (SCHEDULED/CONFIRMED/IN_PROGRESS) do
    // profissional, ordenados por start_time para um resultado determinístico.
    async fn find_overlapping(
        &self,
        tenant_id: Uuid,
        assignee_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppError>;

    async fn insert(&self, record: NewAppointmentRecord) -> Result<Appointment, AppError>;

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> Result<Appointment, AppError>;

    async fn list_window(
        &self,
        tenant_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Appointment>, AppError>;

    async fn find_customer(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<CustomerRef>, AppError>;

    async fn find_staff(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<StaffRef>, AppError>;

    async fn has_invoice(
        &self,
        tenant_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<bool, AppError>;
}

// Canal lateral de notificações. Nunca decide o sucesso da operação.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send_booking_confirmation(
        &self,
        tenant_id: Uuid,
        customer: &CustomerRef,
        appointment: &Appointment,
    ) -> anyhow::Result<()>;

    async fn send_status_change(
        &self,
        tenant_id: Uuid,
        customer: &CustomerRef,
        appointment: &Appointment,
        previous: AppointmentStatus,
    ) -> anyhow::Result<()>;
}

// Canal lateral de analytics.
#[async_trait]
pub trait AnalyticsRecorder: Send + Sync {
    async fn track(&self, tenant_id: Uuid, event: &str, payload: Value) -> anyhow::Result<()>;
}

// =============================================================================
//  SERVICE
// =============================================================================

#[derive(Clone)]
pub struct SchedulingService {
    store: Arc<dyn AppointmentStore>,
    notifier: Arc<dyn NotificationDispatcher>,
    analytics: Arc<dyn AnalyticsRecorder>,
}

impl SchedulingService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        notifier: Arc<dyn NotificationDispatcher>,
        analytics: Arc<dyn AnalyticsRecorder>,
    ) -> Self {
        Self {
            store,
            notifier,
            analytics,
        }
    }

    // -------------------------------------------------------------------------
    //  CRIAÇÃO
    // -------------------------------------------------------------------------

    pub async fn create(
        &self,
        tenant_id: Uuid,
        created_by: Uuid,
        input: NewAppointment,
    ) -> Result<AppointmentDetail, AppError> {
        // 1. O cliente precisa existir NESTA empresa
        let customer = self
            .store
            .find_customer(tenant_id, input.customer_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;

        // 2. O profissional (se indicado) precisa ser membro da empresa
        let assignee = match input.assigned_user_id {
            Some(assignee_id) => Some(
                self.store
                    .find_staff(tenant_id, assignee_id)
                    .await?
                    .ok_or(AppError::InvalidAssignment)?,
            ),
            None => None,
        };

        // 3. Intervalo bem formado
        if input.start_time >= input.end_time {
            return Err(AppError::InvalidTimeRange);
        }

        // 4. Checagem de conflito -- apenas quando há profissional.
        //    Agendamentos sem responsável nunca ocupam agenda.
        if let Some(assignee_id) = input.assigned_user_id {
            self.ensure_no_conflict(tenant_id, assignee_id, input.start_time, input.end_time, None)
                .await?;
        }

        // Sem local informado, vale o endereço do cliente
        let location = input.location.or_else(|| customer.address.clone());
        let custom_data = if input.custom_data.is_null() {
            json!({})
        } else {
            input.custom_data
        };

        let record = NewAppointmentRecord {
            tenant_id,
            customer_id: customer.id,
            created_by,
            assigned_user_id: input.assigned_user_id,
            title: input.title,
            appointment_type: input.appointment_type,
            priority: input.priority,
            status: AppointmentStatus::Scheduled,
            start_time: input.start_time,
            end_time: input.end_time,
            estimated_duration: input.estimated_duration,
            price: input.price,
            location,
            tags: input.tags,
            custom_data,
            notes: input.notes,
        };

        let appointment = self.store.insert(record).await?;

        self.record_event(
            tenant_id,
            "appointment_created",
            json!({
                "appointmentId": appointment.id,
                "type": appointment.appointment_type,
                "priority": appointment.priority,
                "assigned": appointment.assigned_user_id.is_some(),
            }),
        )
        .await;

        if input.send_confirmation {
            if let Err(err) = self
                .notifier
                .send_booking_confirmation(tenant_id, &customer, &appointment)
                .await
            {
                tracing::warn!(
                    "Falha ao enviar confirmação de reserva do agendamento {}: {:#}",
                    appointment.id,
                    err
                );
            }
        }

        Ok(AppointmentDetail {
            appointment,
            customer_name: Some(customer.full_name),
            assignee_name: assignee.map(|s| s.full_name),
        })
    }

    // -------------------------------------------------------------------------
    //  ATUALIZAÇÃO
    // -------------------------------------------------------------------------

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        patch: UpdateAppointment,
    ) -> Result<AppointmentDetail, AppError> {
        let existing = self
            .store
            .find_by_id(tenant_id, id)
            .await?
            .ok_or(AppError::NotFound("Agendamento"))?;

        if let Some(assignee_id) = patch.assigned_user_id {
            self.store
                .find_staff(tenant_id, assignee_id)
                .await?
                .ok_or(AppError::InvalidAssignment)?;
        }

        // Mexeu em alguma extremidade? Recalcula o intervalo efetivo
        // (caindo para os valores atuais) e revalida, excluindo o próprio id.
        if patch.touches_schedule() {
            let start = patch.start_time.unwrap_or(existing.start_time);
            let end = patch.end_time.unwrap_or(existing.end_time);

            if start >= end {
                return Err(AppError::InvalidTimeRange);
            }

            let effective_assignee = patch.assigned_user_id.or(existing.assigned_user_id);
            if let Some(assignee_id) = effective_assignee {
                self.ensure_no_conflict(tenant_id, assignee_id, start, end, Some(id))
                    .await?;
            }
        }

        // completedAt é carimbado UMA vez: só na primeira entrada em COMPLETED
        let completed_at = match patch.status {
            Some(AppointmentStatus::Completed) if existing.completed_at.is_none() => {
                Some(Utc::now())
            }
            _ => None,
        };

        let previous_status = existing.status;
        let new_status = patch.status;

        let changes = AppointmentChanges {
            title: patch.title,
            start_time: patch.start_time,
            end_time: patch.end_time,
            appointment_type: patch.appointment_type,
            priority: patch.priority,
            assigned_user_id: patch.assigned_user_id,
            status: patch.status,
            estimated_duration: patch.estimated_duration,
            actual_duration: patch.actual_duration,
            price: patch.price,
            location: patch.location,
            tags: patch.tags,
            custom_data: patch.custom_data,
            notes: patch.notes,
            completion_notes: patch.completion_notes,
            completed_at,
        };

        let updated = self.store.update(tenant_id, id, changes).await?;

        if let Some(new_status) = new_status {
            if new_status != previous_status {
                self.record_event(
                    tenant_id,
                    "appointment_status_changed",
                    json!({
                        "appointmentId": updated.id,
                        "from": previous_status,
                        "to": new_status,
                    }),
                )
                .await;

                if new_status == AppointmentStatus::Completed {
                    self.record_event(
                        tenant_id,
                        "appointment_completed",
                        json!({
                            "appointmentId": updated.id,
                            "duration": updated
                                .actual_duration
                                .unwrap_or(updated.estimated_duration),
                            "revenue": updated.price,
                        }),
                    )
                    .await;
                }

                self.notify_status_change(tenant_id, &updated, previous_status)
                    .await;
            }
        }

        self.detail(tenant_id, updated).await
    }

    // -------------------------------------------------------------------------
    //  CANCELAMENTO (soft delete)
    // -------------------------------------------------------------------------

    pub async fn cancel(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        cancelled_by: Uuid,
        role: TenantRole,
    ) -> Result<Appointment, AppError> {
        if !role.can_cancel() {
            return Err(AppError::Forbidden);
        }

        let existing = self
            .store
            .find_by_id(tenant_id, id)
            .await?
            .ok_or(AppError::NotFound("Agendamento"))?;

        if existing.status == AppointmentStatus::Completed
            && self.store.has_invoice(tenant_id, id).await?
        {
            return Err(AppError::Conflict(
                "Não é possível cancelar um agendamento concluído e já faturado.",
            ));
        }

        // Nunca apagamos o registro: vira CANCELLED e as observações
        // anteriores são preservadas antes da linha de auditoria.
        let notes = append_cancellation_note(existing.notes.as_deref(), cancelled_by, Utc::now());

        let changes = AppointmentChanges {
            status: Some(AppointmentStatus::Cancelled),
            notes: Some(notes),
            ..Default::default()
        };

        let cancelled = self.store.update(tenant_id, id, changes).await?;

        self.record_event(
            tenant_id,
            "appointment_cancelled",
            json!({ "appointmentId": cancelled.id }),
        )
        .await;

        Ok(cancelled)
    }

    // -------------------------------------------------------------------------
    //  CONSULTA
    // -------------------------------------------------------------------------

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<AppointmentDetail, AppError> {
        let appointment = self
            .store
            .find_by_id(tenant_id, id)
            .await?
            .ok_or(AppError::NotFound("Agendamento"))?;

        self.detail(tenant_id, appointment).await
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Appointment>, AppError> {
        self.store.list_window(tenant_id, from, to).await
    }

    // -------------------------------------------------------------------------
    //  INTERNOS
    // -------------------------------------------------------------------------

    // A checagem de conflito compartilhada entre criação e atualização.
    async fn ensure_no_conflict(
        &self,
        tenant_id: Uuid,
        assignee_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let conflicting = self
            .store
            .find_overlapping(tenant_id, assignee_id, start, end, exclude_id)
            .await?;

        if let Some(first) = conflicting.into_iter().next() {
            let customer_name = self
                .store
                .find_customer(tenant_id, first.customer_id)
                .await?
                .map(|c| c.full_name);

            return Err(AppError::SchedulingConflict(ConflictInfo {
                appointment_id: first.id,
                customer_name,
                start_time: first.start_time,
                end_time: first.end_time,
            }));
        }

        Ok(())
    }

    // Os canais laterais nunca derrubam a mutação principal:
    // qualquer falha aqui é logada e engolida.
    async fn record_event(&self, tenant_id: Uuid, event: &str, payload: Value) {
        if let Err(err) = self.analytics.track(tenant_id, event, payload).await {
            tracing::warn!("Falha ao registrar evento '{}': {:#}", event, err);
        }
    }

    async fn notify_status_change(
        &self,
        tenant_id: Uuid,
        appointment: &Appointment,
        previous: AppointmentStatus,
    ) {
        let customer = match self
            .store
            .find_customer(tenant_id, appointment.customer_id)
            .await
        {
            Ok(Some(customer)) => customer,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!("Falha ao buscar cliente para notificação: {}", err);
                return;
            }
        };

        // Preferência de comunicação do cliente
        if !customer.notify_by_email || customer.email.is_none() {
            return;
        }

        if let Err(err) = self
            .notifier
            .send_status_change(tenant_id, &customer, appointment, previous)
            .await
        {
            tracing::warn!(
                "Falha ao notificar mudança de status do agendamento {}: {:#}",
                appointment.id,
                err
            );
        }
    }

    async fn detail(
        &self,
        tenant_id: Uuid,
        appointment: Appointment,
    ) -> Result<AppointmentDetail, AppError> {
        let customer_name = self
            .store
            .find_customer(tenant_id, appointment.customer_id)
            .await?
            .map(|c| c.full_name);

        let assignee_name = match appointment.assigned_user_id {
            Some(assignee_id) => self
                .store
                .find_staff(tenant_id, assignee_id)
                .await?
                .map(|s| s.full_name),
            None => None,
        };

        Ok(AppointmentDetail {
            appointment,
            customer_name,
            assignee_name,
        })
    }
}

fn append_cancellation_note(
    existing: Option<&str>,
    cancelled_by: Uuid,
    at: DateTime<Utc>,
) -> String {
    let line = format!(
        "[{}] Cancelado pelo usuário {}",
        at.format("%d/%m/%Y %H:%M UTC"),
        cancelled_by
    );

    match existing {
        Some(prev) if !prev.is_empty() => format!("{prev}\n{line}"),
        _ => line,
    }
}
