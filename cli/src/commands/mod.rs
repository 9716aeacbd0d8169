pub mod auth;
pub mod chat;
pub mod generate;
pub mod health;
