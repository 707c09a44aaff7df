// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;
use crate::models;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_jwt",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::list_my_tenants,

        // --- CRM ---
        handlers::crm::create_customer,
        handlers::crm::list_customers,
        handlers::crm::get_customer,

        // --- Agendamento ---
        handlers::scheduling::create_appointment,
        handlers::scheduling::list_appointments,
        handlers::scheduling::get_appointment,
        handlers::scheduling::update_appointment,
        handlers::scheduling::cancel_appointment,
    ),
    components(
        schemas(
            models::auth::User,
            models::auth::TenantRole,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::tenancy::Tenant,
            models::tenancy::TenantSummary,
            handlers::tenancy::CreateTenantPayload,
            models::crm::Customer,
            handlers::crm::CreateCustomerPayload,
            models::scheduling::Appointment,
            models::scheduling::AppointmentDetail,
            models::scheduling::AppointmentStatus,
            models::scheduling::AppointmentType,
            models::scheduling::AppointmentPriority,
            models::scheduling::ConflictInfo,
            models::scheduling::NewAppointment,
            models::scheduling::UpdateAppointment,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registro e login"),
        (name = "Users", description = "Usuário autenticado"),
        (name = "Tenancy", description = "Empresas e vínculos"),
        (name = "CRM", description = "Clientes"),
        (name = "Agendamento", description = "Ciclo de vida dos agendamentos")
    )
)]
pub struct ApiDoc;
