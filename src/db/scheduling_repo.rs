// src/db/scheduling_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::scheduling::{
        Appointment, AppointmentChanges, CustomerRef, NewAppointmentRecord, StaffRef,
    },
    services::scheduling_service::AppointmentStore,
};

const APPOINTMENT_COLUMNS: &str = r#"
    id, tenant_id, customer_id, created_by, assigned_user_id, title,
    appointment_type, priority, status, start_time, end_time,
    estimated_duration, actual_duration, price, location, tags, custom_data,
    notes, completion_notes, completed_at, created_at, updated_at
"#;

// A constraint de exclusão da migration. Se dois requests passarem juntos
// pela checagem do service, o segundo INSERT/UPDATE morre aqui.
const OVERLAP_CONSTRAINT: &str = "appointments_no_overlap";

fn map_overlap_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.constraint() == Some(OVERLAP_CONSTRAINT) {
            return AppError::Conflict(
                "O horário acabou de ser ocupado por outro agendamento deste profissional.",
            );
        }
    }
    e.into()
}

#[derive(Clone)]
pub struct SchedulingRepository {
    pool: PgPool,
}

impl SchedulingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentStore for SchedulingRepository {
    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Appointment>, AppError> {
        let query = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE tenant_id = $1 AND id = $2"
        );

        let appointment = sqlx::query_as::<_, Appointment>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(appointment)
    }

    // A consulta de conflito. As três cláusulas do OR cobrem:
    // início dentro do outro, fim dentro do outro, e contenção total --
    // o mesmo que `start < fim_dele AND inicio_dele < end`.
    async fn find_overlapping(
        &self,
        tenant_id: Uuid,
        assignee_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppError> {
        let query = format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM appointments
            WHERE tenant_id = $1
              AND assigned_user_id = $2
              AND status IN ('SCHEDULED', 'CONFIRMED', 'IN_PROGRESS')
              AND (
                    (start_time <= $3 AND end_time > $3)
                 OR (start_time < $4 AND end_time >= $4)
                 OR (start_time >= $3 AND end_time <= $4)
              )
              AND ($5::uuid IS NULL OR id <> $5)
            ORDER BY start_time ASC
            "#
        );

        let conflicting = sqlx::query_as::<_, Appointment>(&query)
            .bind(tenant_id)
            .bind(assignee_id)
            .bind(start)
            .bind(end)
            .bind(exclude_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(conflicting)
    }

    async fn insert(&self, record: NewAppointmentRecord) -> Result<Appointment, AppError> {
        let query = format!(
            r#"
            INSERT INTO appointments (
                tenant_id, customer_id, created_by, assigned_user_id, title,
                appointment_type, priority, status, start_time, end_time,
                estimated_duration, price, location, tags, custom_data, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        );

        let appointment = sqlx::query_as::<_, Appointment>(&query)
            .bind(record.tenant_id)
            .bind(record.customer_id)
            .bind(record.created_by)
            .bind(record.assigned_user_id)
            .bind(record.title)
            .bind(record.appointment_type)
            .bind(record.priority)
            .bind(record.status)
            .bind(record.start_time)
            .bind(record.end_time)
            .bind(record.estimated_duration)
            .bind(record.price)
            .bind(record.location)
            .bind(record.tags)
            .bind(record.custom_data)
            .bind(record.notes)
            .fetch_one(&self.pool)
            .await
            .map_err(map_overlap_violation)?;

        Ok(appointment)
    }

    // Patch parcial: COALESCE mantém o valor atual quando o campo não veio.
    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> Result<Appointment, AppError> {
        let query = format!(
            r#"
            UPDATE appointments SET
                title              = COALESCE($3, title),
                start_time         = COALESCE($4, start_time),
                end_time           = COALESCE($5, end_time),
                appointment_type   = COALESCE($6, appointment_type),
                priority           = COALESCE($7, priority),
                assigned_user_id   = COALESCE($8, assigned_user_id),
                status             = COALESCE($9, status),
                estimated_duration = COALESCE($10, estimated_duration),
                actual_duration    = COALESCE($11, actual_duration),
                price              = COALESCE($12, price),
                location           = COALESCE($13, location),
                tags               = COALESCE($14, tags),
                custom_data        = COALESCE($15, custom_data),
                notes              = COALESCE($16, notes),
                completion_notes   = COALESCE($17, completion_notes),
                completed_at       = COALESCE($18, completed_at),
                updated_at         = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        );

        let appointment = sqlx::query_as::<_, Appointment>(&query)
            .bind(tenant_id)
            .bind(id)
            .bind(changes.title)
            .bind(changes.start_time)
            .bind(changes.end_time)
            .bind(changes.appointment_type)
            .bind(changes.priority)
            .bind(changes.assigned_user_id)
            .bind(changes.status)
            .bind(changes.estimated_duration)
            .bind(changes.actual_duration)
            .bind(changes.price)
            .bind(changes.location)
            .bind(changes.tags)
            .bind(changes.custom_data)
            .bind(changes.notes)
            .bind(changes.completion_notes)
            .bind(changes.completed_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_overlap_violation)?;

        appointment.ok_or(AppError::NotFound("Agendamento"))
    }

    async fn list_window(
        &self,
        tenant_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Appointment>, AppError> {
        let query = format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM appointments
            WHERE tenant_id = $1
              AND ($2::timestamptz IS NULL OR end_time > $2)
              AND ($3::timestamptz IS NULL OR start_time < $3)
            ORDER BY start_time ASC
            "#
        );

        let appointments = sqlx::query_as::<_, Appointment>(&query)
            .bind(tenant_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(appointments)
    }

    async fn find_customer(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<CustomerRef>, AppError> {
        let customer = sqlx::query_as::<_, CustomerRef>(
            r#"
            SELECT id, full_name, email, address, notify_by_email
            FROM customers
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn find_staff(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<StaffRef>, AppError> {
        let staff = sqlx::query_as::<_, StaffRef>(
            r#"
            SELECT u.id, u.full_name
            FROM users u
            JOIN tenant_users tu ON tu.user_id = u.id
            WHERE tu.tenant_id = $1 AND u.id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(staff)
    }

    async fn has_invoice(
        &self,
        tenant_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM invoices
                WHERE tenant_id = $1 AND appointment_id = $2
            )
            "#,
        )
        .bind(tenant_id)
        .bind(appointment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
