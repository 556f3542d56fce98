pub mod actions;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod debounce;
pub mod error;
pub mod models;
pub mod store;
pub mod token;
pub mod view;
