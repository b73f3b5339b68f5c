// src/db/cliente_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::cliente::{Cliente, ClienteRow},
};

// Colunas do cliente já com a empresa dona, para montar `ClienteRow`
const SELECT_CLIENTE: &str = r#"
    SELECT
        c.id, c.cnpj,
        e.id_empresa, e.nome_empresa, e.cnpj AS empresa_cnpj, e.status_empresa
    FROM clientes c
    INNER JOIN empresas e ON e.id_empresa = c.id_empresa
"#;

#[derive(Clone, Copy, Default)]
pub struct ClienteRepository;

impl ClienteRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i32) -> Result<Option<Cliente>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{} WHERE c.id = $1", SELECT_CLIENTE);
        let row = sqlx::query_as::<_, ClienteRow>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(row.map(Cliente::from))
    }

    /// Procura outro cliente com o mesmo CNPJ na mesma empresa.
    /// `ignorar_id` exclui o próprio registro numa atualização.
    pub async fn find_by_cnpj_and_id_empresa<'e, E>(
        &self,
        executor: E,
        cnpj: &str,
        id_empresa: &str,
        ignorar_id: Option<i32>,
    ) -> Result<Option<Cliente>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "{} WHERE c.cnpj = $1 AND c.id_empresa = $2 AND ($3::INTEGER IS NULL OR c.id <> $3) LIMIT 1",
            SELECT_CLIENTE
        );
        let row = sqlx::query_as::<_, ClienteRow>(&sql)
            .bind(cnpj)
            .bind(id_empresa)
            .bind(ignorar_id)
            .fetch_optional(executor)
            .await?;

        Ok(row.map(Cliente::from))
    }

    pub async fn insert<'e, E>(&self, executor: E, cliente: &Cliente) -> Result<Cliente, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO clientes (cnpj, id_empresa) VALUES ($1, $2) RETURNING id",
        )
        .bind(&cliente.cnpj)
        .bind(&cliente.empresa.id_empresa)
        .fetch_one(executor)
        .await
        .map_err(mapear_violacao_unica)?;

        Ok(Cliente {
            id: Some(id),
            ..cliente.clone()
        })
    }

    pub async fn update<'e, E>(&self, executor: E, id: i32, cliente: &Cliente) -> Result<Cliente, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE clientes
            SET cnpj = $1, id_empresa = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(&cliente.cnpj)
        .bind(&cliente.empresa.id_empresa)
        .bind(id)
        .execute(executor)
        .await
        .map_err(mapear_violacao_unica)?;

        if result.rows_affected() == 0 {
            return Err(AppError::ClienteNaoEncontrado);
        }

        Ok(Cliente {
            id: Some(id),
            ..cliente.clone()
        })
    }

    pub async fn delete_by_id<'e, E>(&self, executor: E, id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM clientes WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }
}

// A constraint uq_clientes_cnpj_empresa cobre a corrida entre a checagem e o INSERT
fn mapear_violacao_unica(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::ClienteDuplicado;
        }
    }
    e.into()
}
