// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::transacao::PgProvedorTransacao,
    services::{
        registro_cliente_service::RegistroClienteService,
        situacao_validation_service::{PoliticaSituacao, SituacaoValidationService},
    },
};

const SERVER_ADDR_PADRAO: &str = "0.0.0.0:8080";
const ORIGEM_PADRAO: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub cors_allowed_origins: Vec<String>,
    pub situacoes_autorizadas: Vec<i32>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|chave| env::var(chave).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave -> valor.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;

        let server_addr = lookup("SERVER_ADDR").unwrap_or_else(|| SERVER_ADDR_PADRAO.to_string());

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(valor) => valor
                .trim()
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: '{}'", valor))?,
            None => 5,
        };

        let cors_allowed_origins = lista(lookup("CORS_ALLOWED_ORIGINS"))
            .unwrap_or_else(|| vec![ORIGEM_PADRAO.to_string()]);

        let situacoes_autorizadas = match lista(lookup("SITUACOES_AUTORIZADAS")) {
            Some(codigos) => codigos
                .iter()
                .map(|c| {
                    c.parse::<i32>()
                        .with_context(|| format!("SITUACOES_AUTORIZADAS contém código inválido: '{}'", c))
                })
                .collect::<anyhow::Result<Vec<_>>>()?,
            None => vec![1],
        };

        Ok(Self {
            database_url,
            server_addr,
            db_max_connections,
            cors_allowed_origins,
            situacoes_autorizadas,
        })
    }
}

// "a, b,,c" -> ["a", "b", "c"]; vazio conta como ausente
fn lista(valor: Option<String>) -> Option<Vec<String>> {
    let itens: Vec<String> = valor?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if itens.is_empty() { None } else { Some(itens) }
}

#[derive(Clone)]
pub struct AppState {
    pub registro_cliente_service: RegistroClienteService,
}

impl AppState {
    pub fn new(registro_cliente_service: RegistroClienteService) -> Self {
        Self { registro_cliente_service }
    }

    /// Conecta ao Postgres, roda as migrações e monta o gráfico de dependências.
    pub async fn conectar(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        sqlx::migrate!()
            .run(&db_pool)
            .await
            .context("Falha ao rodar as migrações do banco de dados.")?;

        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

        Ok(Self::montar(db_pool, config))
    }

    fn montar(db_pool: PgPool, config: &Config) -> Self {
        let politica = PoliticaSituacao::new(config.situacoes_autorizadas.iter().copied());
        let validador = SituacaoValidationService::new(db_pool.clone(), politica);
        let transacoes = PgProvedorTransacao::new(db_pool);

        Self::new(RegistroClienteService::new(Arc::new(transacoes), Arc::new(validador)))
    }
}
