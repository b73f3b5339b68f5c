pub mod registro_cliente_service;
pub use registro_cliente_service::RegistroClienteService;
pub mod situacao_validation_service;
