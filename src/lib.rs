//src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;

/// Monta o router da API. O `main` e os testes de integração usam o mesmo.
pub fn app(app_state: AppState, cors: CorsLayer) -> Router {
    let cliente_routes = Router::new()
        .route("/", post(handlers::clientes::criar_cliente))
        .route(
            "/{id}",
            get(handlers::clientes::buscar_cliente)
                .put(handlers::clientes::atualizar_cliente)
                .delete(handlers::clientes::excluir_cliente),
        );

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(docs::ApiDoc::openapi()) }))
        .nest("/api/clientes", cliente_routes)
        .layer(axum_middleware::from_fn(middleware::logging::log_requests))
        .layer(cors)
        .with_state(app_state)
}
