// src/db/cnd_resultado_repo.rs

use sqlx::{Executor, Postgres};

use crate::common::error::AppError;

#[derive(Clone, Copy, Default)]
pub struct CndResultadoRepository;

impl CndResultadoRepository {
    pub fn new() -> Self {
        Self
    }

    /// Existe algum resultado de CND apontando para este cliente?
    pub async fn exists_by_cliente_id<'e, E>(&self, executor: E, cliente_id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let existe: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM cnd_resultados WHERE cliente_id = $1)",
        )
        .bind(cliente_id)
        .fetch_one(executor)
        .await?;

        Ok(existe)
    }
}
