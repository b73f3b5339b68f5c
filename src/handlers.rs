pub mod clientes;
