// src/handlers/clientes.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::cliente::{Cliente, Empresa},
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmpresaPayload {
    #[validate(length(min = 1, message = "O id da empresa é obrigatório"))]
    #[schema(example = "E1")]
    pub id_empresa: String,

    #[validate(length(min = 1, message = "O nome da empresa é obrigatório"))]
    #[schema(example = "Acme")]
    pub nome_empresa: String,

    #[validate(length(min = 1, message = "O CNPJ da empresa é obrigatório"))]
    #[schema(example = "99.999.999/0001-99")]
    pub cnpj: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientePayload {
    #[validate(length(min = 1, message = "O CNPJ do cliente é obrigatório"))]
    #[schema(example = "12.345.678/0001-99")]
    pub cnpj: String,

    #[validate(nested)]
    pub empresa: EmpresaPayload,
}

impl ClientePayload {
    // O status da empresa nunca vem do cliente: é recalculado a cada gravação
    fn into_cliente(self, id: Option<i32>) -> Cliente {
        Cliente {
            id,
            cnpj: self.cnpj,
            empresa: Empresa {
                id_empresa: self.empresa.id_empresa,
                nome_empresa: self.empresa.nome_empresa,
                cnpj: self.empresa.cnpj,
                status_empresa: None,
            },
        }
    }
}

// =============================================================================
//  HANDLERS
// =============================================================================

// POST /api/clientes
#[utoipa::path(
    post,
    path = "/api/clientes",
    tag = "Clientes",
    request_body = ClientePayload,
    responses(
        (status = 201, description = "Cliente cadastrado", body = Cliente),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Empresa não autorizada"),
        (status = 409, description = "CNPJ já cadastrado para a empresa")
    )
)]
pub async fn criar_cliente(
    State(app_state): State<AppState>,
    Json(payload): Json<ClientePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let cliente = app_state
        .registro_cliente_service
        .salvar_cliente_com_empresa(payload.into_cliente(None))
        .await?;

    Ok((StatusCode::CREATED, Json(cliente)))
}

// PUT /api/clientes/{id}
#[utoipa::path(
    put,
    path = "/api/clientes/{id}",
    tag = "Clientes",
    request_body = ClientePayload,
    params(
        ("id" = i32, Path, description = "ID do cliente")
    ),
    responses(
        (status = 200, description = "Cliente atualizado", body = Cliente),
        (status = 403, description = "Empresa não autorizada"),
        (status = 404, description = "Cliente não encontrado"),
        (status = 409, description = "CNPJ já cadastrado para a empresa")
    )
)]
pub async fn atualizar_cliente(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ClientePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let cliente = app_state
        .registro_cliente_service
        .salvar_cliente_com_empresa(payload.into_cliente(Some(id)))
        .await?;

    Ok((StatusCode::OK, Json(cliente)))
}

// GET /api/clientes/{id}
#[utoipa::path(
    get,
    path = "/api/clientes/{id}",
    tag = "Clientes",
    params(
        ("id" = i32, Path, description = "ID do cliente")
    ),
    responses(
        (status = 200, description = "Cliente encontrado", body = Cliente),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn buscar_cliente(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let cliente = app_state.registro_cliente_service.buscar_por_id(id).await?;
    Ok((StatusCode::OK, Json(cliente)))
}

// DELETE /api/clientes/{id}
#[utoipa::path(
    delete,
    path = "/api/clientes/{id}",
    tag = "Clientes",
    params(
        ("id" = i32, Path, description = "ID do cliente")
    ),
    responses(
        (status = 204, description = "Cliente excluído"),
        (status = 403, description = "Empresa não autorizada"),
        (status = 404, description = "Cliente não encontrado"),
        (status = 409, description = "Cliente com resultados de CND vinculados")
    )
)]
pub async fn excluir_cliente(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.registro_cliente_service.excluir(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
