/// Shared modules for the signal dashboard
pub mod app;
pub mod config;
pub mod decoder;
pub mod error;
pub mod metrics;
pub mod order_form;
pub mod presentation;
pub mod types;
pub mod websocket;
pub mod widget;
