// src/middleware/cors.rs

use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, CorsLayer};

// Com credenciais o navegador não aceita curinga, então os headers são espelhados
pub fn cors_layer(origens: &[String]) -> anyhow::Result<CorsLayer> {
    let origens = origens
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Origem CORS inválida: '{}'", o))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origens)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600)))
}
