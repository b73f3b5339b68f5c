// src/services/situacao_validation_service.rs

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::PgPool;

use crate::common::error::AppError;

/// Consulta se a empresa pode ser cadastrada/alterada e devolve o código de situação.
#[async_trait]
pub trait ValidadorSituacao: Send + Sync {
    async fn validar_autorizacao_empresa(&self, id_empresa: &str) -> Result<i32, AppError>;
}

// ---
// Regra comum: quais códigos de situação autorizam a empresa
// ---

#[derive(Debug, Clone)]
pub struct PoliticaSituacao {
    autorizadas: HashSet<i32>,
}

impl PoliticaSituacao {
    pub fn new(autorizadas: impl IntoIterator<Item = i32>) -> Self {
        Self {
            autorizadas: autorizadas.into_iter().collect(),
        }
    }

    pub fn avaliar(&self, id_empresa: &str, situacao: Option<i32>) -> Result<i32, AppError> {
        let situacao = situacao.ok_or_else(|| {
            AppError::AutorizacaoRecusada(format!("Empresa {} não encontrada no SAAM.", id_empresa))
        })?;

        if !self.autorizadas.contains(&situacao) {
            tracing::warn!(
                "Empresa {} recusada pela validação de situação (situação {})",
                id_empresa,
                situacao
            );
            return Err(AppError::AutorizacaoRecusada(format!(
                "Empresa {} não autorizada (situação {}).",
                id_empresa, situacao
            )));
        }

        Ok(situacao)
    }
}

// ---
// Implementação Postgres: lê a tabela 'situacoes_empresa'
// ---

#[derive(Clone)]
pub struct SituacaoValidationService {
    pool: PgPool,
    politica: PoliticaSituacao,
}

impl SituacaoValidationService {
    pub fn new(pool: PgPool, politica: PoliticaSituacao) -> Self {
        Self { pool, politica }
    }
}

#[async_trait]
impl ValidadorSituacao for SituacaoValidationService {
    async fn validar_autorizacao_empresa(&self, id_empresa: &str) -> Result<i32, AppError> {
        let situacao: Option<i32> =
            sqlx::query_scalar("SELECT situacao FROM situacoes_empresa WHERE id_empresa = $1")
                .bind(id_empresa)
                .fetch_optional(&self.pool)
                .await?;

        self.politica.avaliar(id_empresa, situacao)
    }
}

// ---
// Implementação em memória (testes e desenvolvimento)
// ---

pub struct SituacaoEmMemoria {
    situacoes: RwLock<HashMap<String, i32>>,
    politica: PoliticaSituacao,
}

impl SituacaoEmMemoria {
    pub fn new(politica: PoliticaSituacao) -> Self {
        Self {
            situacoes: RwLock::new(HashMap::new()),
            politica,
        }
    }

    pub fn definir(&self, id_empresa: &str, situacao: i32) {
        self.situacoes.write().insert(id_empresa.to_string(), situacao);
    }
}

#[async_trait]
impl ValidadorSituacao for SituacaoEmMemoria {
    async fn validar_autorizacao_empresa(&self, id_empresa: &str) -> Result<i32, AppError> {
        let situacao = self.situacoes.read().get(id_empresa).copied();
        self.politica.avaliar(id_empresa, situacao)
    }
}
