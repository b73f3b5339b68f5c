// src/db/memoria.rs
//
// Banco em memória para testes e desenvolvimento local. Cada transação trabalha
// sobre uma cópia do estado e só a publica no commit, então qualquer erro no meio
// do caminho some junto com a cópia. Transações são serializadas: a próxima só
// começa quando a anterior faz commit ou rollback.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::{
    common::error::AppError,
    db::transacao::{ClienteStore, CndResultadoStore, EmpresaStore, ProvedorTransacao, Transacao},
    models::cliente::{Cliente, CndResultado, Empresa},
};

#[derive(Debug, Clone)]
struct ClienteRegistro {
    cnpj: String,
    id_empresa: String,
}

#[derive(Debug, Clone, Default)]
struct Estado {
    empresas: HashMap<String, Empresa>,
    clientes: BTreeMap<i32, ClienteRegistro>,
    resultados: Vec<CndResultado>,
    ultimo_cliente_id: i32,
    ultimo_resultado_id: i32,
}

impl Estado {
    fn montar_cliente(&self, id: i32, registro: &ClienteRegistro) -> Option<Cliente> {
        let empresa = self.empresas.get(&registro.id_empresa)?.clone();
        Some(Cliente {
            id: Some(id),
            cnpj: registro.cnpj.clone(),
            empresa,
        })
    }

    fn duplicado(&self, cnpj: &str, id_empresa: &str, ignorar_id: Option<i32>) -> Option<i32> {
        self.clientes
            .iter()
            .find(|(id, c)| c.cnpj == cnpj && c.id_empresa == id_empresa && Some(**id) != ignorar_id)
            .map(|(id, _)| *id)
    }
}

#[derive(Clone, Default)]
pub struct BancoEmMemoria {
    estado: Arc<Mutex<Estado>>,
    // Guarda de escrita: uma transação por vez, do `iniciar` ao `commit`/`rollback`
    escrita: Arc<AsyncMutex<()>>,
}

impl BancoEmMemoria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra um resultado de CND ligado ao cliente. Espera a transação aberta terminar.
    pub async fn registrar_resultado(&self, cliente_id: i32, situacao: &str) -> CndResultado {
        let _escrita = self.escrita.lock().await;
        let mut estado = self.estado.lock();
        estado.ultimo_resultado_id += 1;
        let resultado = CndResultado {
            id: estado.ultimo_resultado_id,
            cliente_id: Some(cliente_id),
            situacao: Some(situacao.to_string()),
            data_processamento: Utc::now(),
        };
        estado.resultados.push(resultado.clone());
        resultado
    }

    pub fn empresa(&self, id_empresa: &str) -> Option<Empresa> {
        self.estado.lock().empresas.get(id_empresa).cloned()
    }

    pub fn cliente(&self, id: i32) -> Option<Cliente> {
        let estado = self.estado.lock();
        let registro = estado.clientes.get(&id)?;
        estado.montar_cliente(id, registro)
    }

    pub fn total_empresas(&self) -> usize {
        self.estado.lock().empresas.len()
    }

    pub fn total_clientes(&self) -> usize {
        self.estado.lock().clientes.len()
    }
}

#[async_trait]
impl ProvedorTransacao for BancoEmMemoria {
    async fn iniciar(&self) -> Result<Box<dyn Transacao>, AppError> {
        let escrita = Arc::clone(&self.escrita).lock_owned().await;
        let copia = self.estado.lock().clone();
        Ok(Box::new(TransacaoEmMemoria {
            destino: Arc::clone(&self.estado),
            copia,
            _escrita: escrita,
        }))
    }
}

pub struct TransacaoEmMemoria {
    destino: Arc<Mutex<Estado>>,
    copia: Estado,
    // Liberada no drop, depois do commit ou do rollback
    _escrita: OwnedMutexGuard<()>,
}

#[async_trait]
impl EmpresaStore for TransacaoEmMemoria {
    async fn find_empresa_by_id_empresa(&mut self, id_empresa: &str) -> Result<Option<Empresa>, AppError> {
        Ok(self.copia.empresas.get(id_empresa).cloned())
    }

    // Mesma semântica do ON CONFLICT (id_empresa) DO UPDATE do Postgres
    async fn insert_empresa(&mut self, empresa: &Empresa) -> Result<Empresa, AppError> {
        self.copia
            .empresas
            .insert(empresa.id_empresa.clone(), empresa.clone());
        Ok(empresa.clone())
    }

    async fn update_empresa(&mut self, empresa: &Empresa) -> Result<Empresa, AppError> {
        let existente = self
            .copia
            .empresas
            .get_mut(&empresa.id_empresa)
            .ok_or_else(|| anyhow::anyhow!("empresa '{}' não existe", empresa.id_empresa))?;
        *existente = empresa.clone();
        Ok(empresa.clone())
    }
}

#[async_trait]
impl ClienteStore for TransacaoEmMemoria {
    async fn find_cliente_by_id(&mut self, id: i32) -> Result<Option<Cliente>, AppError> {
        Ok(self
            .copia
            .clientes
            .get(&id)
            .and_then(|registro| self.copia.montar_cliente(id, registro)))
    }

    async fn find_cliente_duplicado(
        &mut self,
        cnpj: &str,
        id_empresa: &str,
        ignorar_id: Option<i32>,
    ) -> Result<Option<Cliente>, AppError> {
        Ok(self
            .copia
            .duplicado(cnpj, id_empresa, ignorar_id)
            .and_then(|id| self.copia.montar_cliente(id, &self.copia.clientes[&id])))
    }

    async fn save_cliente(&mut self, cliente: &Cliente) -> Result<Cliente, AppError> {
        let id_empresa = &cliente.empresa.id_empresa;
        if !self.copia.empresas.contains_key(id_empresa) {
            return Err(anyhow::anyhow!("empresa '{}' não existe", id_empresa).into());
        }
        // Mesma regra da constraint uq_clientes_cnpj_empresa
        if self.copia.duplicado(&cliente.cnpj, id_empresa, cliente.id).is_some() {
            return Err(AppError::ClienteDuplicado);
        }

        let id = match cliente.id {
            Some(id) if self.copia.clientes.contains_key(&id) => id,
            Some(_) => return Err(AppError::ClienteNaoEncontrado),
            None => {
                self.copia.ultimo_cliente_id += 1;
                self.copia.ultimo_cliente_id
            }
        };

        self.copia.clientes.insert(
            id,
            ClienteRegistro {
                cnpj: cliente.cnpj.clone(),
                id_empresa: id_empresa.clone(),
            },
        );

        Ok(Cliente {
            id: Some(id),
            ..cliente.clone()
        })
    }

    async fn delete_cliente_by_id(&mut self, id: i32) -> Result<(), AppError> {
        self.copia.clientes.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl CndResultadoStore for TransacaoEmMemoria {
    async fn exists_cnd_resultado_by_cliente_id(&mut self, cliente_id: i32) -> Result<bool, AppError> {
        Ok(self
            .copia
            .resultados
            .iter()
            .any(|r| r.cliente_id == Some(cliente_id)))
    }
}

#[async_trait]
impl Transacao for TransacaoEmMemoria {
    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let TransacaoEmMemoria { destino, copia, _escrita } = *self;
        *destino.lock() = copia;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn empresa(id: &str) -> Empresa {
        Empresa {
            id_empresa: id.to_string(),
            nome_empresa: "Acme".to_string(),
            cnpj: "00.000.000/0001-00".to_string(),
            status_empresa: Some("1".to_string()),
        }
    }

    #[tokio::test]
    async fn nada_aparece_antes_do_commit() {
        let banco = BancoEmMemoria::new();

        let mut tx = banco.iniciar().await.unwrap();
        tx.insert_empresa(&empresa("E1")).await.unwrap();
        assert_eq!(banco.total_empresas(), 0);

        tx.commit().await.unwrap();
        assert_eq!(banco.total_empresas(), 1);
    }

    #[tokio::test]
    async fn rollback_descarta_as_alteracoes() {
        let banco = BancoEmMemoria::new();

        let mut tx = banco.iniciar().await.unwrap();
        tx.insert_empresa(&empresa("E1")).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(banco.empresa("E1").is_none());
    }

    #[tokio::test]
    async fn save_respeita_unicidade_de_cnpj_por_empresa() {
        let banco = BancoEmMemoria::new();
        let mut tx = banco.iniciar().await.unwrap();
        tx.insert_empresa(&empresa("E1")).await.unwrap();

        let cliente = Cliente {
            id: None,
            cnpj: "11.111.111/0001-11".to_string(),
            empresa: empresa("E1"),
        };
        let salvo = tx.save_cliente(&cliente).await.unwrap();
        assert_eq!(salvo.id, Some(1));

        let err = tx.save_cliente(&cliente).await.unwrap_err();
        assert!(matches!(err, AppError::ClienteDuplicado));

        // Regravar o próprio registro não conflita consigo mesmo
        assert!(tx.save_cliente(&salvo).await.is_ok());
    }

    #[tokio::test]
    async fn update_de_id_inexistente_falha() {
        let banco = BancoEmMemoria::new();
        let mut tx = banco.iniciar().await.unwrap();
        tx.insert_empresa(&empresa("E1")).await.unwrap();

        let fantasma = Cliente {
            id: Some(42),
            cnpj: "11.111.111/0001-11".to_string(),
            empresa: empresa("E1"),
        };
        let err = tx.save_cliente(&fantasma).await.unwrap_err();
        assert!(matches!(err, AppError::ClienteNaoEncontrado));
    }

    fn cliente_novo(cnpj: &str) -> Cliente {
        Cliente {
            id: None,
            cnpj: cnpj.to_string(),
            empresa: empresa("E1"),
        }
    }

    #[tokio::test]
    async fn transacoes_concorrentes_nao_perdem_escritas() {
        let banco = BancoEmMemoria::new();

        let mut a = banco.iniciar().await.unwrap();
        a.insert_empresa(&empresa("E1")).await.unwrap();

        // A segunda transação só começa depois que a primeira termina
        let outro = banco.clone();
        let b = tokio::spawn(async move {
            let mut b = outro.iniciar().await.unwrap();
            let salvo = b.save_cliente(&cliente_novo("222")).await.unwrap();
            b.commit().await.unwrap();
            salvo
        });
        tokio::task::yield_now().await;
        assert!(!b.is_finished());

        let salvo_a = a.save_cliente(&cliente_novo("111")).await.unwrap();
        a.commit().await.unwrap();
        let salvo_b = b.await.unwrap();

        assert_eq!(banco.total_clientes(), 2);
        assert_ne!(salvo_a.id, salvo_b.id);
        assert_eq!(banco.cliente(salvo_a.id.unwrap()).unwrap().cnpj, "111");
        assert_eq!(banco.cliente(salvo_b.id.unwrap()).unwrap().cnpj, "222");
    }

    #[tokio::test]
    async fn iniciar_espera_a_transacao_aberta() {
        let banco = BancoEmMemoria::new();
        let aberta = banco.iniciar().await.unwrap();

        let espera = tokio::time::timeout(Duration::from_millis(50), banco.iniciar()).await;
        assert!(espera.is_err());

        aberta.rollback().await.unwrap();
        assert!(banco.iniciar().await.is_ok());
    }

    #[tokio::test]
    async fn insert_de_empresa_existente_atualiza_em_vez_de_duplicar() {
        let banco = BancoEmMemoria::new();
        let mut tx = banco.iniciar().await.unwrap();
        tx.insert_empresa(&empresa("E1")).await.unwrap();

        let renomeada = Empresa {
            nome_empresa: "Acme Ltda".to_string(),
            ..empresa("E1")
        };
        tx.insert_empresa(&renomeada).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(banco.total_empresas(), 1);
        assert_eq!(banco.empresa("E1").unwrap().nome_empresa, "Acme Ltda");
    }
}
