pub mod error;
pub mod purchase_repo;
