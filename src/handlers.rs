pub mod dashboard;
pub mod entries;
pub mod exits;
pub mod machines;
pub mod products;
pub mod silos;
pub mod users;
