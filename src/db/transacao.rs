// src/db/transacao.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    common::error::AppError,
    db::{ClienteRepository, CndResultadoRepository, EmpresaRepository},
    models::cliente::{Cliente, Empresa},
};

// ---
// Os três "stores" que o cadastro consome. Todos operam dentro de uma transação aberta.
// ---

#[async_trait]
pub trait EmpresaStore: Send {
    async fn find_empresa_by_id_empresa(&mut self, id_empresa: &str) -> Result<Option<Empresa>, AppError>;
    async fn insert_empresa(&mut self, empresa: &Empresa) -> Result<Empresa, AppError>;
    async fn update_empresa(&mut self, empresa: &Empresa) -> Result<Empresa, AppError>;
}

#[async_trait]
pub trait ClienteStore: Send {
    async fn find_cliente_by_id(&mut self, id: i32) -> Result<Option<Cliente>, AppError>;

    /// Mesmo CNPJ na mesma empresa, opcionalmente ignorando um id.
    async fn find_cliente_duplicado(
        &mut self,
        cnpj: &str,
        id_empresa: &str,
        ignorar_id: Option<i32>,
    ) -> Result<Option<Cliente>, AppError>;

    /// Insere se `id` for `None`, senão atualiza. Devolve o cliente com id.
    async fn save_cliente(&mut self, cliente: &Cliente) -> Result<Cliente, AppError>;

    async fn delete_cliente_by_id(&mut self, id: i32) -> Result<(), AppError>;
}

#[async_trait]
pub trait CndResultadoStore: Send {
    async fn exists_cnd_resultado_by_cliente_id(&mut self, cliente_id: i32) -> Result<bool, AppError>;
}

/// Uma unidade de trabalho aberta. Nada é visível fora dela antes do `commit`.
#[async_trait]
pub trait Transacao: EmpresaStore + ClienteStore + CndResultadoStore + Send {
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}

/// Abre transações. É o que o serviço recebe no construtor.
#[async_trait]
pub trait ProvedorTransacao: Send + Sync {
    async fn iniciar(&self) -> Result<Box<dyn Transacao>, AppError>;
}

// ---
// Implementação Postgres
// ---

#[derive(Clone)]
pub struct PgProvedorTransacao {
    pool: PgPool,
}

impl PgProvedorTransacao {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProvedorTransacao for PgProvedorTransacao {
    async fn iniciar(&self) -> Result<Box<dyn Transacao>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransacao {
            tx,
            empresas: EmpresaRepository::new(),
            clientes: ClienteRepository::new(),
            resultados: CndResultadoRepository::new(),
        }))
    }
}

// Se for dropada sem commit, o sqlx faz o rollback sozinho
pub struct PgTransacao {
    tx: Transaction<'static, Postgres>,
    empresas: EmpresaRepository,
    clientes: ClienteRepository,
    resultados: CndResultadoRepository,
}

#[async_trait]
impl EmpresaStore for PgTransacao {
    async fn find_empresa_by_id_empresa(&mut self, id_empresa: &str) -> Result<Option<Empresa>, AppError> {
        self.empresas.find_by_id_empresa(&mut *self.tx, id_empresa).await
    }

    async fn insert_empresa(&mut self, empresa: &Empresa) -> Result<Empresa, AppError> {
        self.empresas.insert(&mut *self.tx, empresa).await
    }

    async fn update_empresa(&mut self, empresa: &Empresa) -> Result<Empresa, AppError> {
        self.empresas.update(&mut *self.tx, empresa).await
    }
}

#[async_trait]
impl ClienteStore for PgTransacao {
    async fn find_cliente_by_id(&mut self, id: i32) -> Result<Option<Cliente>, AppError> {
        self.clientes.find_by_id(&mut *self.tx, id).await
    }

    async fn find_cliente_duplicado(
        &mut self,
        cnpj: &str,
        id_empresa: &str,
        ignorar_id: Option<i32>,
    ) -> Result<Option<Cliente>, AppError> {
        self.clientes
            .find_by_cnpj_and_id_empresa(&mut *self.tx, cnpj, id_empresa, ignorar_id)
            .await
    }

    async fn save_cliente(&mut self, cliente: &Cliente) -> Result<Cliente, AppError> {
        match cliente.id {
            Some(id) => self.clientes.update(&mut *self.tx, id, cliente).await,
            None => self.clientes.insert(&mut *self.tx, cliente).await,
        }
    }

    async fn delete_cliente_by_id(&mut self, id: i32) -> Result<(), AppError> {
        self.clientes.delete_by_id(&mut *self.tx, id).await
    }
}

#[async_trait]
impl CndResultadoStore for PgTransacao {
    async fn exists_cnd_resultado_by_cliente_id(&mut self, cliente_id: i32) -> Result<bool, AppError> {
        self.resultados.exists_by_cliente_id(&mut *self.tx, cliente_id).await
    }
}

#[async_trait]
impl Transacao for PgTransacao {
    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let this = *self;
        this.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        let this = *self;
        this.tx.rollback().await?;
        Ok(())
    }
}
