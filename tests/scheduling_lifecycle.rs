//! Testes de integração do ciclo de vida do agendamento.
//!
//! Os contratos (store, notificações, analytics) são implementados em memória,
//! então o gerenciador roda aqui exatamente como em produção, menos o Postgres.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use agenda_backend::common::error::AppError;
use agenda_backend::models::auth::TenantRole;
use agenda_backend::models::scheduling::{
    overlaps, Appointment, AppointmentChanges, AppointmentPriority, AppointmentStatus,
    AppointmentType, CustomerRef, NewAppointment, NewAppointmentRecord, StaffRef,
    UpdateAppointment,
};
use agenda_backend::services::scheduling_service::{
    AnalyticsRecorder, AppointmentStore, NotificationDispatcher, SchedulingService,
};

// =============================================================================
//  Implementações em memória dos contratos
// =============================================================================

#[derive(Default)]
struct MemoryStore {
    appointments: Mutex<Vec<Appointment>>,
    customers: Mutex<Vec<(Uuid, CustomerRef)>>,
    staff: Mutex<Vec<(Uuid, StaffRef)>>,
    invoiced: Mutex<HashSet<Uuid>>,
}

impl MemoryStore {
    fn add_customer(&self, tenant_id: Uuid, customer: CustomerRef) -> Uuid {
        let id = customer.id;
        self.customers.lock().unwrap().push((tenant_id, customer));
        id
    }

    fn add_staff(&self, tenant_id: Uuid, full_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.staff.lock().unwrap().push((
            tenant_id,
            StaffRef {
                id,
                full_name: full_name.to_string(),
            },
        ));
        id
    }

    fn mark_invoiced(&self, appointment_id: Uuid) {
        self.invoiced.lock().unwrap().insert(appointment_id);
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Appointment>, AppError> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.tenant_id == tenant_id && a.id == id)
            .cloned())
    }

    async fn find_overlapping(
        &self,
        tenant_id: Uuid,
        assignee_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppError> {
        let mut found: Vec<Appointment> = self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.tenant_id == tenant_id)
            .filter(|a| a.assigned_user_id == Some(assignee_id))
            .filter(|a| a.status.is_active())
            .filter(|a| Some(a.id) != exclude_id)
            .filter(|a| overlaps(start, end, a.start_time, a.end_time))
            .cloned()
            .collect();
        found.sort_by_key(|a| a.start_time);
        Ok(found)
    }

    async fn insert(&self, record: NewAppointmentRecord) -> Result<Appointment, AppError> {
        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            tenant_id: record.tenant_id,
            customer_id: record.customer_id,
            created_by: record.created_by,
            assigned_user_id: record.assigned_user_id,
            title: record.title,
            appointment_type: record.appointment_type,
            priority: record.priority,
            status: record.status,
            start_time: record.start_time,
            end_time: record.end_time,
            estimated_duration: record.estimated_duration,
            actual_duration: None,
            price: record.price,
            location: record.location,
            tags: record.tags,
            custom_data: record.custom_data,
            notes: record.notes,
            completion_notes: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.appointments.lock().unwrap().push(appointment.clone());
        Ok(appointment)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> Result<Appointment, AppError> {
        let mut appointments = self.appointments.lock().unwrap();
        let appointment = appointments
            .iter_mut()
            .find(|a| a.tenant_id == tenant_id && a.id == id)
            .ok_or(AppError::NotFound("Agendamento"))?;

        if let Some(title) = changes.title {
            appointment.title = title;
        }
        if let Some(start_time) = changes.start_time {
            appointment.start_time = start_time;
        }
        if let Some(end_time) = changes.end_time {
            appointment.end_time = end_time;
        }
        if let Some(appointment_type) = changes.appointment_type {
            appointment.appointment_type = appointment_type;
        }
        if let Some(priority) = changes.priority {
            appointment.priority = priority;
        }
        if let Some(assigned_user_id) = changes.assigned_user_id {
            appointment.assigned_user_id = Some(assigned_user_id);
        }
        if let Some(status) = changes.status {
            appointment.status = status;
        }
        if let Some(estimated_duration) = changes.estimated_duration {
            appointment.estimated_duration = estimated_duration;
        }
        if let Some(actual_duration) = changes.actual_duration {
            appointment.actual_duration = Some(actual_duration);
        }
        if let Some(price) = changes.price {
            appointment.price = Some(price);
        }
        if let Some(location) = changes.location {
            appointment.location = Some(location);
        }
        if let Some(tags) = changes.tags {
            appointment.tags = Some(tags);
        }
        if let Some(custom_data) = changes.custom_data {
            appointment.custom_data = custom_data;
        }
        if let Some(notes) = changes.notes {
            appointment.notes = Some(notes);
        }
        if let Some(completion_notes) = changes.completion_notes {
            appointment.completion_notes = Some(completion_notes);
        }
        if let Some(completed_at) = changes.completed_at {
            appointment.completed_at = Some(completed_at);
        }
        appointment.updated_at = Utc::now();

        Ok(appointment.clone())
    }

    async fn list_window(
        &self,
        tenant_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Appointment>, AppError> {
        let mut found: Vec<Appointment> = self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.tenant_id == tenant_id)
            .filter(|a| from.is_none_or(|from| a.end_time > from))
            .filter(|a| to.is_none_or(|to| a.start_time < to))
            .cloned()
            .collect();
        found.sort_by_key(|a| a.start_time);
        Ok(found)
    }

    async fn find_customer(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<CustomerRef>, AppError> {
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .find(|(t, c)| *t == tenant_id && c.id == customer_id)
            .map(|(_, c)| c.clone()))
    }

    async fn find_staff(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<StaffRef>, AppError> {
        Ok(self
            .staff
            .lock()
            .unwrap()
            .iter()
            .find(|(t, s)| *t == tenant_id && s.id == user_id)
            .map(|(_, s)| s.clone()))
    }

    async fn has_invoice(
        &self,
        _tenant_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<bool, AppError> {
        Ok(self.invoiced.lock().unwrap().contains(&appointment_id))
    }
}

#[derive(Default)]
struct RecordingAnalytics {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingAnalytics {
    fn event_names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl AnalyticsRecorder for RecordingAnalytics {
    async fn track(&self, _tenant_id: Uuid, event: &str, payload: Value) -> anyhow::Result<()> {
        self.events
            .lock()
            .unwrap()
            .push((event.to_string(), payload));
        Ok(())
    }
}

struct RecordingNotifier {
    fail: bool,
    sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn send_booking_confirmation(
        &self,
        _tenant_id: Uuid,
        _customer: &CustomerRef,
        _appointment: &Appointment,
    ) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("servidor de e-mail fora do ar");
        }
        self.sent
            .lock()
            .unwrap()
            .push("booking_confirmation".to_string());
        Ok(())
    }

    async fn send_status_change(
        &self,
        _tenant_id: Uuid,
        _customer: &CustomerRef,
        _appointment: &Appointment,
        _previous: AppointmentStatus,
    ) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("servidor de e-mail fora do ar");
        }
        self.sent.lock().unwrap().push("status_change".to_string());
        Ok(())
    }
}

// =============================================================================
//  Fixture
// =============================================================================

struct Harness {
    service: SchedulingService,
    store: Arc<MemoryStore>,
    analytics: Arc<RecordingAnalytics>,
    notifier: Arc<RecordingNotifier>,
    tenant: Uuid,
    customer: Uuid,
    staff: Uuid,
    actor: Uuid,
}

fn harness() -> Harness {
    harness_with_notifier(false)
}

fn harness_with_notifier(failing: bool) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let analytics = Arc::new(RecordingAnalytics::default());
    let notifier = Arc::new(RecordingNotifier::new(failing));

    let tenant = Uuid::new_v4();
    let customer = store.add_customer(
        tenant,
        CustomerRef {
            id: Uuid::new_v4(),
            full_name: "Maria da Silva".to_string(),
            email: Some("maria@email.com".to_string()),
            address: Some(json!({ "rua": "Av. Paulista, 1000", "cidade": "São Paulo" })),
            notify_by_email: true,
        },
    );
    let staff = store.add_staff(tenant, "João Técnico");

    let service = SchedulingService::new(store.clone(), notifier.clone(), analytics.clone());

    Harness {
        service,
        store,
        analytics,
        notifier,
        tenant,
        customer,
        staff,
        actor: Uuid::new_v4(),
    }
}

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, hour, min, 0).unwrap()
}

fn booking(
    customer: Uuid,
    assignee: Option<Uuid>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> NewAppointment {
    NewAppointment {
        customer_id: customer,
        title: "Visita técnica".to_string(),
        start_time: start,
        end_time: end,
        appointment_type: AppointmentType::Maintenance,
        priority: AppointmentPriority::Normal,
        assigned_user_id: assignee,
        estimated_duration: 60,
        price: None,
        location: None,
        tags: None,
        custom_data: Value::Null,
        notes: None,
        send_confirmation: false,
    }
}

// =============================================================================
//  Criação
// =============================================================================

#[tokio::test]
async fn create_schedules_appointment_and_defaults_location() {
    let h = harness();

    let detail = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    assert_eq!(detail.appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(detail.customer_name.as_deref(), Some("Maria da Silva"));
    assert_eq!(detail.assignee_name.as_deref(), Some("João Técnico"));

    // Sem local informado, herda o endereço do cliente
    assert_eq!(
        detail.appointment.location,
        Some(json!({ "rua": "Av. Paulista, 1000", "cidade": "São Paulo" }))
    );

    assert_eq!(h.analytics.event_names(), vec!["appointment_created"]);
}

#[tokio::test]
async fn create_rejects_unknown_customer() {
    let h = harness();

    let err = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(Uuid::new_v4(), None, at(9, 0), at(10, 0)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound("Cliente")));
}

#[tokio::test]
async fn create_rejects_assignee_outside_tenant() {
    let h = harness();

    let err = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(Uuid::new_v4()), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidAssignment));
}

#[tokio::test]
async fn create_rejects_inverted_or_empty_interval() {
    let h = harness();

    let err = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, None, at(10, 0), at(10, 0)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTimeRange));

    let err = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, None, at(11, 0), at(10, 0)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTimeRange));
}

// =============================================================================
//  Conflito de agenda
// =============================================================================

#[tokio::test]
async fn overlapping_booking_is_rejected_with_conflict_details() {
    let h = harness();

    let first = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    let err = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 30), at(10, 30)),
        )
        .await
        .unwrap_err();

    match err {
        AppError::SchedulingConflict(info) => {
            assert_eq!(info.appointment_id, first.appointment.id);
            assert_eq!(info.start_time, at(9, 0));
            assert_eq!(info.end_time, at(10, 0));
            assert_eq!(info.customer_name.as_deref(), Some("Maria da Silva"));
        }
        other => panic!("esperava SchedulingConflict, veio {other:?}"),
    }
}

#[tokio::test]
async fn conflict_reports_earliest_overlapping_appointment() {
    let h = harness();

    let early = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();
    h.service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(10, 30), at(11, 30)),
        )
        .await
        .unwrap();

    // Colide com os dois; o erro aponta o de menor start_time
    let err = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 30), at(11, 0)),
        )
        .await
        .unwrap_err();

    match err {
        AppError::SchedulingConflict(info) => {
            assert_eq!(info.appointment_id, early.appointment.id);
        }
        other => panic!("esperava SchedulingConflict, veio {other:?}"),
    }
}

#[tokio::test]
async fn boundary_adjacent_bookings_do_not_conflict() {
    let h = harness();

    h.service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    // Começa exatamente quando o outro termina: sem conflito
    h.service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(10, 0), at(11, 0)),
        )
        .await
        .unwrap();

    // E termina exatamente quando o primeiro começa
    h.service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(8, 0), at(9, 0)),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn unassigned_bookings_never_participate_in_conflicts() {
    let h = harness();

    h.service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    // Mesmo horário, sem profissional: entra sem checagem
    h.service
        .create(h.tenant, h.actor, booking(h.customer, None, at(9, 0), at(10, 0)))
        .await
        .unwrap();

    // E um novo agendamento do profissional não enxerga o sem responsável
    h.service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(10, 0), at(11, 0)),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn inactive_appointments_do_not_block_the_agenda() {
    let h = harness();

    let first = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    // CANCELLED sai da agenda
    h.service
        .cancel(h.tenant, first.appointment.id, h.actor, TenantRole::Manager)
        .await
        .unwrap();

    let second = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    // COMPLETED também
    h.service
        .update(
            h.tenant,
            second.appointment.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let third = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    // E NO_SHOW idem
    h.service
        .update(
            h.tenant,
            third.appointment.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::NoShow),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    h.service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();
}

// =============================================================================
//  Atualização
// =============================================================================

#[tokio::test]
async fn update_revalidates_the_effective_interval() {
    let h = harness();

    h.service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();
    let movable = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(11, 0), at(12, 0)),
        )
        .await
        .unwrap();

    // Só o início veio no patch; o fim efetivo continua 12:00 e invade 9-10
    let err = h
        .service
        .update(
            h.tenant,
            movable.appointment.id,
            UpdateAppointment {
                start_time: Some(at(9, 30)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SchedulingConflict(_)));

    // Encostar é permitido
    let moved = h
        .service
        .update(
            h.tenant,
            movable.appointment.id,
            UpdateAppointment {
                start_time: Some(at(10, 0)),
                end_time: Some(at(11, 0)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.appointment.start_time, at(10, 0));
}

#[tokio::test]
async fn update_excludes_itself_from_the_conflict_check() {
    let h = harness();

    let detail = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    // Encolher dentro da própria janela não pode colidir consigo mesmo
    h.service
        .update(
            h.tenant,
            detail.appointment.id,
            UpdateAppointment {
                start_time: Some(at(9, 15)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn update_rejects_inverted_effective_interval() {
    let h = harness();

    let detail = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    // Fim efetivo antes do início atual
    let err = h
        .service
        .update(
            h.tenant,
            detail.appointment.id,
            UpdateAppointment {
                end_time: Some(at(8, 0)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidTimeRange));
}

#[tokio::test]
async fn update_unknown_appointment_is_not_found() {
    let h = harness();

    let err = h
        .service
        .update(h.tenant, Uuid::new_v4(), UpdateAppointment::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound("Agendamento")));
}

#[tokio::test]
async fn update_validates_patched_assignee() {
    let h = harness();

    let detail = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    let err = h
        .service
        .update(
            h.tenant,
            detail.appointment.id,
            UpdateAppointment {
                assigned_user_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidAssignment));
}

#[tokio::test]
async fn completed_at_is_stamped_exactly_once() {
    let h = harness();

    let detail = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    let done = h
        .service
        .update(
            h.tenant,
            detail.appointment.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Completed),
                actual_duration: Some(55),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let first_stamp = done.appointment.completed_at.expect("deveria carimbar completedAt");

    // Repetir COMPLETED não move o carimbo
    let again = h
        .service
        .update(
            h.tenant,
            detail.appointment.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Completed),
                completion_notes: Some("Tudo certo".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(again.appointment.completed_at, Some(first_stamp));
}

#[tokio::test]
async fn status_change_records_analytics_events() {
    let h = harness();

    let detail = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    h.service
        .update(
            h.tenant,
            detail.appointment.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let events = h.analytics.event_names();
    assert_eq!(
        events,
        vec![
            "appointment_created",
            "appointment_status_changed",
            "appointment_completed",
        ]
    );

    // Um update sem mudança de status não gera evento novo
    h.service
        .update(
            h.tenant,
            detail.appointment.id,
            UpdateAppointment {
                completion_notes: Some("Sem novidades".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(h.analytics.event_names().len(), 3);
}

// =============================================================================
//  Cancelamento
// =============================================================================

#[tokio::test]
async fn cancel_requires_manager_or_admin() {
    let h = harness();

    let detail = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    let err = h
        .service
        .cancel(h.tenant, detail.appointment.id, h.actor, TenantRole::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let cancelled = h
        .service
        .cancel(h.tenant, detail.appointment.id, h.actor, TenantRole::Manager)
        .await
        .unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn cancel_is_a_soft_delete_and_preserves_notes() {
    let h = harness();

    let mut input = booking(h.customer, Some(h.staff), at(9, 0), at(10, 0));
    input.notes = Some("Cliente pediu urgência".to_string());

    let detail = h.service.create(h.tenant, h.actor, input).await.unwrap();

    let cancelled = h
        .service
        .cancel(h.tenant, detail.appointment.id, h.actor, TenantRole::Admin)
        .await
        .unwrap();

    let notes = cancelled.notes.expect("notas deveriam existir");
    assert!(notes.starts_with("Cliente pediu urgência\n"));
    assert!(notes.contains("Cancelado pelo usuário"));

    // O registro continua consultável: soft delete
    let fetched = h
        .service
        .get(h.tenant, detail.appointment.id)
        .await
        .unwrap();
    assert_eq!(fetched.appointment.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn cancel_rejects_completed_and_invoiced_appointment() {
    let h = harness();

    let detail = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    h.service
        .update(
            h.tenant,
            detail.appointment.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    h.store.mark_invoiced(detail.appointment.id);

    let err = h
        .service
        .cancel(h.tenant, detail.appointment.id, h.actor, TenantRole::Admin)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn cancel_allows_completed_appointment_without_invoice() {
    let h = harness();

    let detail = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    h.service
        .update(
            h.tenant,
            detail.appointment.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let cancelled = h
        .service
        .cancel(h.tenant, detail.appointment.id, h.actor, TenantRole::Manager)
        .await
        .unwrap();

    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
}

// =============================================================================
//  Canais laterais
// =============================================================================

#[tokio::test]
async fn booking_confirmation_is_sent_only_when_requested() {
    let h = harness();

    h.service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();
    assert!(h.notifier.sent().is_empty());

    let mut input = booking(h.customer, Some(h.staff), at(10, 0), at(11, 0));
    input.send_confirmation = true;
    h.service.create(h.tenant, h.actor, input).await.unwrap();

    assert_eq!(h.notifier.sent(), vec!["booking_confirmation"]);
}

#[tokio::test]
async fn notifier_failure_never_fails_the_mutation() {
    let h = harness_with_notifier(true);

    let mut input = booking(h.customer, Some(h.staff), at(9, 0), at(10, 0));
    input.send_confirmation = true;

    // Criação segue de pé mesmo com o canal de notificação fora
    let detail = h.service.create(h.tenant, h.actor, input).await.unwrap();

    // Idem para a notificação de mudança de status
    let updated = h
        .service
        .update(
            h.tenant,
            detail.appointment.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Confirmed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.appointment.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn status_change_notification_respects_customer_preference() {
    let h = harness();

    // Cliente que desligou notificações
    let silent_customer = h.store.add_customer(
        h.tenant,
        CustomerRef {
            id: Uuid::new_v4(),
            full_name: "Carlos Reservado".to_string(),
            email: Some("carlos@email.com".to_string()),
            address: None,
            notify_by_email: false,
        },
    );

    let silent = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(silent_customer, Some(h.staff), at(14, 0), at(15, 0)),
        )
        .await
        .unwrap();

    h.service
        .update(
            h.tenant,
            silent.appointment.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Confirmed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(h.notifier.sent().is_empty());

    // Cliente padrão (opt-in) recebe
    let chatty = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(15, 0), at(16, 0)),
        )
        .await
        .unwrap();

    h.service
        .update(
            h.tenant,
            chatty.appointment.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Confirmed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(h.notifier.sent(), vec!["status_change"]);
}

// =============================================================================
//  Escopo de empresa
// =============================================================================

#[tokio::test]
async fn appointments_are_invisible_outside_their_tenant() {
    let h = harness();

    let detail = h
        .service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();

    let other_tenant = Uuid::new_v4();
    let err = h
        .service
        .get(other_tenant, detail.appointment.id)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound("Agendamento")));
}

#[tokio::test]
async fn list_filters_by_time_window() {
    let h = harness();

    h.service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(9, 0), at(10, 0)),
        )
        .await
        .unwrap();
    h.service
        .create(
            h.tenant,
            h.actor,
            booking(h.customer, Some(h.staff), at(14, 0), at(15, 0)),
        )
        .await
        .unwrap();

    let all = h.service.list(h.tenant, None, None).await.unwrap();
    assert_eq!(all.len(), 2);

    let morning = h
        .service
        .list(h.tenant, Some(at(8, 0)), Some(at(12, 0)))
        .await
        .unwrap();
    assert_eq!(morning.len(), 1);
    assert_eq!(morning[0].start_time, at(9, 0));
}
