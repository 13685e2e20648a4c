pub mod api;
pub mod web;
pub mod server;
