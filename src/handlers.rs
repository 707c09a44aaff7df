pub mod auth;
pub mod crm;
pub mod scheduling;
pub mod tenancy;
