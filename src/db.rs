pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod scheduling_repo;
pub use scheduling_repo::SchedulingRepository;
