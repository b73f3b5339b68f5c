// src/db/empresa_repo.rs

use sqlx::{Executor, Postgres};

use crate::{common::error::AppError, models::cliente::Empresa};

const INSERT_EMPRESA: &str = r#"
    INSERT INTO empresas (id_empresa, nome_empresa, cnpj, status_empresa)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (id_empresa) DO UPDATE
    SET nome_empresa = EXCLUDED.nome_empresa,
        cnpj = EXCLUDED.cnpj,
        status_empresa = EXCLUDED.status_empresa,
        updated_at = NOW()
    RETURNING id_empresa, nome_empresa, cnpj, status_empresa
"#;

// Repositório da tabela 'empresas'. Sem estado: quem chama decide o executor (pool ou transação).
#[derive(Clone, Copy, Default)]
pub struct EmpresaRepository;

impl EmpresaRepository {
    pub fn new() -> Self {
        Self
    }

    /// Busca a empresa pela chave de negócio
    pub async fn find_by_id_empresa<'e, E>(
        &self,
        executor: E,
        id_empresa: &str,
    ) -> Result<Option<Empresa>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let empresa = sqlx::query_as::<_, Empresa>(
            r#"
            SELECT id_empresa, nome_empresa, cnpj, status_empresa
            FROM empresas
            WHERE id_empresa = $1
            "#,
        )
        .bind(id_empresa)
        .fetch_optional(executor)
        .await?;

        Ok(empresa)
    }

    /// Insere a empresa. Se outra transação criou o mesmo `id_empresa` entre a busca
    /// e o INSERT, o registro existente é atualizado em vez de estourar a chave primária.
    pub async fn insert<'e, E>(&self, executor: E, empresa: &Empresa) -> Result<Empresa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let nova = sqlx::query_as::<_, Empresa>(INSERT_EMPRESA)
            .bind(&empresa.id_empresa)
            .bind(&empresa.nome_empresa)
            .bind(&empresa.cnpj)
            .bind(empresa.status_empresa.as_deref().unwrap_or_default())
            .fetch_one(executor)
            .await?;

        Ok(nova)
    }

    /// Atualiza nome, CNPJ e status mantendo a mesma identidade
    pub async fn update<'e, E>(&self, executor: E, empresa: &Empresa) -> Result<Empresa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let atualizada = sqlx::query_as::<_, Empresa>(
            r#"
            UPDATE empresas
            SET nome_empresa = $2, cnpj = $3, status_empresa = $4, updated_at = NOW()
            WHERE id_empresa = $1
            RETURNING id_empresa, nome_empresa, cnpj, status_empresa
            "#,
        )
        .bind(&empresa.id_empresa)
        .bind(&empresa.nome_empresa)
        .bind(&empresa.cnpj)
        .bind(empresa.status_empresa.as_deref().unwrap_or_default())
        .fetch_one(executor)
        .await?;

        Ok(atualizada)
    }
}
