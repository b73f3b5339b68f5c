// src/services/registro_cliente_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::transacao::{ClienteStore, CndResultadoStore, EmpresaStore, ProvedorTransacao, Transacao},
    models::cliente::{Cliente, Empresa},
    services::situacao_validation_service::ValidadorSituacao,
};

#[derive(Clone)]
pub struct RegistroClienteService {
    transacoes: Arc<dyn ProvedorTransacao>,
    validador: Arc<dyn ValidadorSituacao>,
}

impl RegistroClienteService {
    pub fn new(transacoes: Arc<dyn ProvedorTransacao>, validador: Arc<dyn ValidadorSituacao>) -> Self {
        Self { transacoes, validador }
    }

    // =========================================================================
    //  SALVAR (INSERT OU UPDATE)
    // =========================================================================

    /// Valida a empresa, faz o upsert dela e grava o cliente, tudo numa transação.
    /// Sem `id` o cliente é inserido; com `id` é atualizado.
    pub async fn salvar_cliente_com_empresa(&self, cliente: Cliente) -> Result<Cliente, AppError> {
        tracing::info!(
            "Iniciando processo de salvar cliente com empresa. Cliente: {}",
            cliente.cnpj
        );

        let mut tx = self.transacoes.iniciar().await?;

        match self.salvar_na_transacao(tx.as_mut(), cliente).await {
            Ok(salvo) => {
                tx.commit().await?;
                tracing::info!("Cliente salvo com sucesso. ID: {:?}", salvo.id);
                Ok(salvo)
            }
            Err(e) => {
                desfazer(tx, &e).await;
                Err(e)
            }
        }
    }

    async fn salvar_na_transacao(
        &self,
        tx: &mut dyn Transacao,
        mut cliente: Cliente,
    ) -> Result<Cliente, AppError> {
        // 1. Situação da empresa (falha aborta tudo)
        let situacao = self
            .validador
            .validar_autorizacao_empresa(&cliente.empresa.id_empresa)
            .await?;
        let status_empresa = situacao.to_string();
        tracing::debug!("Situação da empresa validada: {}", status_empresa);

        // 2. Upsert da empresa
        let empresa_salva = salvar_ou_atualizar_empresa(tx, &cliente.empresa, status_empresa).await?;
        tracing::debug!("Empresa salva ou atualizada: {}", empresa_salva.id_empresa);
        cliente.empresa = empresa_salva;

        // 3. Duplicidade de CNPJ dentro da empresa
        verificar_duplicidade_cliente(tx, &cliente).await?;

        // 4. Grava
        tx.save_cliente(&cliente).await
    }

    // =========================================================================
    //  EXCLUIR
    // =========================================================================

    pub async fn excluir(&self, cliente_id: i32) -> Result<(), AppError> {
        tracing::info!("Iniciando processo de exclusão do cliente. ID: {}", cliente_id);

        let mut tx = self.transacoes.iniciar().await?;

        match self.excluir_na_transacao(tx.as_mut(), cliente_id).await {
            Ok(()) => {
                tx.commit().await?;
                tracing::info!("Cliente excluído com sucesso. ID: {}", cliente_id);
                Ok(())
            }
            Err(e) => {
                desfazer(tx, &e).await;
                Err(e)
            }
        }
    }

    async fn excluir_na_transacao(&self, tx: &mut dyn Transacao, cliente_id: i32) -> Result<(), AppError> {
        let cliente = tx
            .find_cliente_by_id(cliente_id)
            .await?
            .ok_or(AppError::ClienteNaoEncontrado)?;
        tracing::debug!("Cliente encontrado para exclusão: {}", cliente.cnpj);

        // Excluir exige a mesma autorização que gravar
        self.validador
            .validar_autorizacao_empresa(&cliente.empresa.id_empresa)
            .await?;

        let existe_vinculo = tx.exists_cnd_resultado_by_cliente_id(cliente_id).await?;
        tracing::debug!("Verificação de vínculo com resultado: {}", existe_vinculo);

        if existe_vinculo {
            tracing::warn!(
                "Tentativa de exclusão de cliente com vínculo. Cliente ID: {}",
                cliente_id
            );
            return Err(AppError::ClienteVinculadoResultado);
        }

        tx.delete_cliente_by_id(cliente_id).await
    }

    // =========================================================================
    //  CONSULTA
    // =========================================================================

    pub async fn buscar_por_id(&self, cliente_id: i32) -> Result<Cliente, AppError> {
        let mut tx = self.transacoes.iniciar().await?;
        let encontrado = tx.find_cliente_by_id(cliente_id).await;
        tx.rollback().await?;

        encontrado?.ok_or(AppError::ClienteNaoEncontrado)
    }
}

async fn salvar_ou_atualizar_empresa(
    tx: &mut dyn Transacao,
    dados: &Empresa,
    status_empresa: String,
) -> Result<Empresa, AppError> {
    match tx.find_empresa_by_id_empresa(&dados.id_empresa).await? {
        Some(mut existente) => {
            existente.nome_empresa = dados.nome_empresa.clone();
            existente.cnpj = dados.cnpj.clone();
            existente.status_empresa = Some(status_empresa);
            tx.update_empresa(&existente).await
        }
        None => {
            let nova = Empresa {
                id_empresa: dados.id_empresa.clone(),
                nome_empresa: dados.nome_empresa.clone(),
                cnpj: dados.cnpj.clone(),
                status_empresa: Some(status_empresa),
            };
            tx.insert_empresa(&nova).await
        }
    }
}

async fn verificar_duplicidade_cliente(tx: &mut dyn Transacao, cliente: &Cliente) -> Result<(), AppError> {
    let duplicado = tx
        .find_cliente_duplicado(&cliente.cnpj, &cliente.empresa.id_empresa, cliente.id)
        .await?;

    if duplicado.is_some() {
        return Err(AppError::ClienteDuplicado);
    }
    Ok(())
}

// O erro original é o que vai para o chamador; falha no rollback só vira log
async fn desfazer(tx: Box<dyn Transacao>, erro: &AppError) {
    tracing::debug!("Desfazendo transação: {}", erro);
    if let Err(e) = tx.rollback().await {
        tracing::error!("Falha ao desfazer transação: {:?}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memoria::BancoEmMemoria,
        services::situacao_validation_service::{PoliticaSituacao, SituacaoEmMemoria},
    };

    struct Cenario {
        banco: BancoEmMemoria,
        situacoes: Arc<SituacaoEmMemoria>,
        service: RegistroClienteService,
    }

    fn cenario() -> Cenario {
        let banco = BancoEmMemoria::new();
        let situacoes = Arc::new(SituacaoEmMemoria::new(PoliticaSituacao::new([1, 2])));
        situacoes.definir("E1", 1);
        let service = RegistroClienteService::new(Arc::new(banco.clone()), situacoes.clone());
        Cenario { banco, situacoes, service }
    }

    fn cliente(id: Option<i32>, cnpj: &str, id_empresa: &str, nome: &str) -> Cliente {
        Cliente {
            id,
            cnpj: cnpj.to_string(),
            empresa: Empresa {
                id_empresa: id_empresa.to_string(),
                nome_empresa: nome.to_string(),
                cnpj: "99.999.999/0001-99".to_string(),
                status_empresa: None,
            },
        }
    }

    #[tokio::test]
    async fn novo_cliente_cria_empresa_e_cliente() {
        let c = cenario();

        let salvo = c
            .service
            .salvar_cliente_com_empresa(cliente(None, "12.345.678/0001-99", "E1", "Acme"))
            .await
            .unwrap();

        assert!(salvo.id.is_some());
        assert_eq!(salvo.cnpj, "12.345.678/0001-99");
        assert_eq!(salvo.empresa.status_empresa.as_deref(), Some("1"));

        let empresa = c.banco.empresa("E1").unwrap();
        assert_eq!(empresa.nome_empresa, "Acme");
        assert_eq!(empresa.status_empresa.as_deref(), Some("1"));
        assert_eq!(c.banco.total_empresas(), 1);
        assert_eq!(c.banco.total_clientes(), 1);
    }

    #[tokio::test]
    async fn empresa_existente_e_atualizada_no_lugar() {
        let c = cenario();
        c.service
            .salvar_cliente_com_empresa(cliente(None, "11.111.111/0001-11", "E1", "Acme"))
            .await
            .unwrap();

        // A situação mudou no SAAM, mas continua autorizada
        c.situacoes.definir("E1", 2);
        let mut outro = cliente(None, "22.222.222/0001-22", "E1", "Acme Ltda");
        outro.empresa.cnpj = "55.555.555/0001-55".to_string();
        c.service.salvar_cliente_com_empresa(outro).await.unwrap();

        assert_eq!(c.banco.total_empresas(), 1);
        let empresa = c.banco.empresa("E1").unwrap();
        assert_eq!(empresa.nome_empresa, "Acme Ltda");
        assert_eq!(empresa.cnpj, "55.555.555/0001-55");
        assert_eq!(empresa.status_empresa.as_deref(), Some("2"));
        assert_eq!(c.banco.total_clientes(), 2);
    }

    #[tokio::test]
    async fn cnpj_duplicado_na_empresa_falha_sem_alterar_nada() {
        let c = cenario();
        c.service
            .salvar_cliente_com_empresa(cliente(None, "11.111.111/0001-11", "E1", "Acme"))
            .await
            .unwrap();

        let err = c
            .service
            .salvar_cliente_com_empresa(cliente(None, "11.111.111/0001-11", "E1", "Outro Nome"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ClienteDuplicado));
        // O upsert da empresa foi desfeito junto
        assert_eq!(c.banco.empresa("E1").unwrap().nome_empresa, "Acme");
        assert_eq!(c.banco.total_clientes(), 1);
    }

    #[tokio::test]
    async fn mesmo_cnpj_em_outra_empresa_e_permitido() {
        let c = cenario();
        c.situacoes.definir("E2", 1);

        c.service
            .salvar_cliente_com_empresa(cliente(None, "11.111.111/0001-11", "E1", "Acme"))
            .await
            .unwrap();
        c.service
            .salvar_cliente_com_empresa(cliente(None, "11.111.111/0001-11", "E2", "Beta"))
            .await
            .unwrap();

        assert_eq!(c.banco.total_clientes(), 2);
    }

    #[tokio::test]
    async fn regravar_cliente_existente_nao_e_duplicidade() {
        let c = cenario();
        let salvo = c
            .service
            .salvar_cliente_com_empresa(cliente(None, "11.111.111/0001-11", "E1", "Acme"))
            .await
            .unwrap();

        let regravado = c.service.salvar_cliente_com_empresa(salvo.clone()).await.unwrap();

        assert_eq!(regravado.id, salvo.id);
        assert_eq!(c.banco.total_clientes(), 1);
    }

    #[tokio::test]
    async fn atualizar_para_cnpj_de_outro_cliente_falha() {
        let c = cenario();
        c.service
            .salvar_cliente_com_empresa(cliente(None, "11.111.111/0001-11", "E1", "Acme"))
            .await
            .unwrap();
        let segundo = c
            .service
            .salvar_cliente_com_empresa(cliente(None, "22.222.222/0001-22", "E1", "Acme"))
            .await
            .unwrap();

        let alterado = Cliente {
            cnpj: "11.111.111/0001-11".to_string(),
            ..segundo.clone()
        };
        let err = c.service.salvar_cliente_com_empresa(alterado).await.unwrap_err();

        assert!(matches!(err, AppError::ClienteDuplicado));
        assert_eq!(c.banco.cliente(segundo.id.unwrap()).unwrap().cnpj, "22.222.222/0001-22");
    }

    #[tokio::test]
    async fn empresa_nao_autorizada_nao_grava_nada() {
        let c = cenario();
        c.situacoes.definir("E3", 7);

        let err = c
            .service
            .salvar_cliente_com_empresa(cliente(None, "11.111.111/0001-11", "E3", "Gama"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AutorizacaoRecusada(_)));
        assert_eq!(c.banco.total_empresas(), 0);
        assert_eq!(c.banco.total_clientes(), 0);
    }

    #[tokio::test]
    async fn excluir_inexistente_retorna_nao_encontrado() {
        let c = cenario();
        let err = c.service.excluir(999).await.unwrap_err();
        assert!(matches!(err, AppError::ClienteNaoEncontrado));
    }

    #[tokio::test]
    async fn excluir_com_resultado_vinculado_e_recusado() {
        let c = cenario();
        let salvo = c
            .service
            .salvar_cliente_com_empresa(cliente(None, "11.111.111/0001-11", "E1", "Acme"))
            .await
            .unwrap();
        let id = salvo.id.unwrap();
        c.banco.registrar_resultado(id, "REGULAR").await;

        let err = c.service.excluir(id).await.unwrap_err();

        assert!(matches!(err, AppError::ClienteVinculadoResultado));
        assert!(c.banco.cliente(id).is_some());
    }

    #[tokio::test]
    async fn excluir_exige_empresa_autorizada() {
        let c = cenario();
        let salvo = c
            .service
            .salvar_cliente_com_empresa(cliente(None, "11.111.111/0001-11", "E1", "Acme"))
            .await
            .unwrap();
        let id = salvo.id.unwrap();

        c.situacoes.definir("E1", 9);
        let err = c.service.excluir(id).await.unwrap_err();

        assert!(matches!(err, AppError::AutorizacaoRecusada(_)));
        assert!(c.banco.cliente(id).is_some());
    }

    #[tokio::test]
    async fn excluir_sem_vinculo_remove_o_cliente() {
        let c = cenario();
        let salvo = c
            .service
            .salvar_cliente_com_empresa(cliente(None, "11.111.111/0001-11", "E1", "Acme"))
            .await
            .unwrap();
        let id = salvo.id.unwrap();

        c.service.excluir(id).await.unwrap();

        assert!(matches!(
            c.service.buscar_por_id(id).await,
            Err(AppError::ClienteNaoEncontrado)
        ));
        // A empresa é compartilhada e continua lá
        assert!(c.banco.empresa("E1").is_some());
    }
}
