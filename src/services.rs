pub mod analytics_service;
pub mod auth;
pub mod crm_service;
pub mod notification_service;
pub mod scheduling_service;
pub mod tenancy_service;
