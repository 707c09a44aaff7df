use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::scheduling::ConflictInfo;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Os erros de domínio do agendamento ficam agrupados no meio.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não pertence a esta empresa")]
    TenantAccessDenied,

    #[error("{0}")]
    BadRequest(&'static str),

    // --- Domínio do agendamento ---

    // O `&'static str` diz QUAL recurso não foi achado ("Cliente", "Agendamento"...)
    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("O profissional indicado não pertence a esta empresa")]
    InvalidAssignment,

    #[error("O horário de início deve ser anterior ao de término")]
    InvalidTimeRange,

    #[error("Conflito de agenda")]
    SchedulingConflict(ConflictInfo),

    #[error("Permissão insuficiente para esta operação")]
    Forbidden,

    #[error("{0}")]
    Conflict(&'static str),

    // Variante para erros de banco de dados (exemplo com sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado.
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            // O conflito de agenda leva junto os dados do agendamento que colide,
            // para o cliente poder exibir "ocupado das X às Y com Fulano".
            AppError::SchedulingConflict(conflict) => {
                let body = Json(json!({
                    "error": "Já existe um agendamento ativo neste horário para o profissional.",
                    "conflict": conflict,
                }));
                return (StatusCode::CONFLICT, body).into_response();
            }

            AppError::NotFound(resource) => {
                let body = Json(json!({ "error": format!("{} não encontrado.", resource) }));
                return (StatusCode::NOT_FOUND, body).into_response();
            }

            AppError::Conflict(message) => {
                let body = Json(json!({ "error": message }));
                return (StatusCode::CONFLICT, body).into_response();
            }

            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "Este e-mail já está em uso."),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos."),
            AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Token de autenticação inválido ou ausente.")
            }
            AppError::TenantAccessDenied => {
                (StatusCode::FORBIDDEN, "Você não tem acesso a esta empresa.")
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::InvalidAssignment => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "O profissional indicado não pertence a esta empresa.",
            ),
            AppError::InvalidTimeRange => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "O horário de início deve ser anterior ao de término.",
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Você não tem permissão para realizar esta ação.",
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
