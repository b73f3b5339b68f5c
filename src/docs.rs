// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Clientes ---
        handlers::clientes::criar_cliente,
        handlers::clientes::atualizar_cliente,
        handlers::clientes::buscar_cliente,
        handlers::clientes::excluir_cliente,
    ),
    components(
        schemas(
            models::cliente::Empresa,
            models::cliente::Cliente,

            // --- Payloads ---
            handlers::clientes::EmpresaPayload,
            handlers::clientes::ClientePayload,
        )
    ),
    tags(
        (name = "Clientes", description = "Cadastro de Clientes e Empresas")
    )
)]
pub struct ApiDoc;
