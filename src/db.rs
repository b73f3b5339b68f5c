pub mod cliente_repo;
pub use cliente_repo::ClienteRepository;
pub mod empresa_repo;
pub use empresa_repo::EmpresaRepository;
pub mod cnd_resultado_repo;
pub use cnd_resultado_repo::CndResultadoRepository;

pub mod transacao;
pub mod memoria;
