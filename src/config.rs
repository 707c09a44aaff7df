// src/config.rs

use std::sync::Arc;

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{CrmRepository, SchedulingRepository, TenantRepository, UserRepository},
    services::{
        analytics_service::AnalyticsService, auth::AuthService, crm_service::CrmService,
        notification_service::NotificationService, scheduling_service::SchedulingService,
        tenancy_service::TenancyService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub user_repo: UserRepository,
    pub tenancy_service: TenancyService,
    pub crm_service: CrmService,
    pub scheduling_service: SchedulingService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let auth_service = AuthService::new(user_repo.clone(), jwt_secret);

        let tenancy_service = TenancyService::new(TenantRepository::new(db_pool.clone()));
        let crm_service = CrmService::new(CrmRepository::new(db_pool.clone()));

        // O gerenciador de agendamento enxerga o banco e os canais laterais
        // apenas pelos contratos (Arc<dyn ...>), o que facilita os testes.
        let scheduling_service = SchedulingService::new(
            Arc::new(SchedulingRepository::new(db_pool.clone())),
            Arc::new(NotificationService::new(db_pool.clone())),
            Arc::new(AnalyticsService::new(db_pool.clone())),
        );

        Ok(Self {
            db_pool,
            auth_service,
            user_repo,
            tenancy_service,
            crm_service,
            scheduling_service,
        })
    }
}
