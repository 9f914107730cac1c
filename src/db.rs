pub mod pool;

pub mod user_repo;
pub use user_repo::UserRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod machine_repo;
pub use machine_repo::MachineRepository;
pub mod silo_repo;
pub use silo_repo::SiloRepository;
pub mod silo_blend_repo;
pub use silo_blend_repo::SiloBlendRepository;
pub mod entry_repo;
pub use entry_repo::EntryRepository;
pub mod exit_repo;
pub use exit_repo::ExitRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
