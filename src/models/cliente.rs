// src/models/cliente.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// --- EMPRESA ---

// `id_empresa` é a chave de negócio vinda do SAAM, não um id gerado
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Empresa {
    #[schema(example = "E1")]
    pub id_empresa: String,
    pub nome_empresa: String,
    pub cnpj: String,

    // Sobrescrito a cada gravação com o código devolvido pela validação de situação
    #[serde(default)]
    #[schema(example = "1")]
    pub status_empresa: Option<String>,
}

// --- CLIENTE ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cliente {
    // `None` = cliente novo
    #[serde(default)]
    pub id: Option<i32>,
    pub cnpj: String,
    pub empresa: Empresa,
}

/// Linha de `clientes` já com a empresa (JOIN), como o Postgres devolve.
#[derive(Debug, FromRow)]
pub struct ClienteRow {
    pub id: i32,
    pub cnpj: String,
    pub id_empresa: String,
    pub nome_empresa: String,
    pub empresa_cnpj: String,
    pub status_empresa: Option<String>,
}

impl From<ClienteRow> for Cliente {
    fn from(row: ClienteRow) -> Self {
        Cliente {
            id: Some(row.id),
            cnpj: row.cnpj,
            empresa: Empresa {
                id_empresa: row.id_empresa,
                nome_empresa: row.nome_empresa,
                cnpj: row.empresa_cnpj,
                status_empresa: row.status_empresa,
            },
        }
    }
}

// --- RESULTADO DE CND ---

// Só interessa ao cadastro como vínculo que bloqueia a exclusão do cliente
#[derive(Debug, Clone)]
pub struct CndResultado {
    pub id: i32,
    pub cliente_id: Option<i32>,
    pub situacao: Option<String>,
    pub data_processamento: DateTime<Utc>,
}
