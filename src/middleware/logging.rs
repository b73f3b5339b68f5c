// src/middleware/logging.rs

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

// Loga entrada, saída e tempo de cada requisição da API
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let inicio = Instant::now();

    tracing::info!("Enter: {} {}", method, path);

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = inicio.elapsed().as_millis();

    if status.is_server_error() {
        tracing::error!("Exit: {} {} com erro {}", method, path, status);
    } else if status.is_client_error() {
        tracing::warn!("Exit: {} {} recusada com {}", method, path, status);
    } else {
        tracing::info!("Exit: {} {} -> {}", method, path, status);
    }
    tracing::debug!("Execution time: {} ms", elapsed_ms);

    response
}
