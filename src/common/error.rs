use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    // A validação de situação recusou a empresa
    #[error("{0}")]
    AutorizacaoRecusada(String),

    #[error("Já existe esse CNPJ para essa empresa.")]
    ClienteDuplicado,

    #[error("Cliente não encontrado")]
    ClienteNaoEncontrado,

    #[error("Não é possível excluir o cliente. Existem resultados vinculados.")]
    ClienteVinculadoResultado,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AutorizacaoRecusada(_) => StatusCode::FORBIDDEN,
            AppError::ClienteDuplicado => StatusCode::CONFLICT,
            AppError::ClienteNaoEncontrado => StatusCode::NOT_FOUND,
            AppError::ClienteVinculadoResultado => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let AppError::ValidationError(errors) = &self {
            let mut details = HashMap::new();
            coletar_erros_de_campo("", errors, &mut details);
            let body = Json(json!({
                "error": "Um ou mais campos são inválidos.",
                "details": details,
            }));
            return (status, body).into_response();
        }

        let error_message = match &self {
            // Erros de regra de negócio vão para o cliente com a mensagem original
            AppError::AutorizacaoRecusada(_)
            | AppError::ClienteDuplicado
            | AppError::ClienteNaoEncontrado
            | AppError::ClienteVinculadoResultado => self.to_string(),

            // O detalhe fica no log, nunca na resposta.
            e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                "Ocorreu um erro inesperado.".to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

// Achata erros aninhados (ex: `empresa.idEmpresa`) num único mapa campo -> mensagens.
fn coletar_erros_de_campo(
    prefixo: &str,
    errors: &ValidationErrors,
    details: &mut HashMap<String, Vec<String>>,
) {
    for (campo, kind) in errors.errors() {
        let chave = if prefixo.is_empty() {
            campo.to_string()
        } else {
            format!("{}.{}", prefixo, campo)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                details.insert(chave, messages);
            }
            ValidationErrorsKind::Struct(inner) => coletar_erros_de_campo(&chave, inner, details),
            ValidationErrorsKind::List(items) => {
                for (indice, inner) in items {
                    coletar_erros_de_campo(&format!("{}[{}]", chave, indice), inner, details);
                }
            }
        }
    }
}
