pub mod auth;
pub mod crm;
pub mod notifications;
pub mod scheduling;
pub mod tenancy;
