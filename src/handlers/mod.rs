pub mod auth;
pub mod dashboard;
pub mod fallback;
pub mod health;
pub mod pages;
pub mod subscription;
