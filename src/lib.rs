pub mod core;
pub mod handlers;
pub mod models;
pub mod security;
pub mod services;
pub mod stores;
pub mod utils;
pub mod views;
