pub mod app;
pub mod config;
pub mod model;
pub mod services;
pub mod state;
pub mod vcloud;
pub mod web;
