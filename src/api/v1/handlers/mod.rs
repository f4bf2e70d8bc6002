pub mod account;
pub mod catalog;
pub mod health;
pub mod videos;
