mod aws_service;
mod forwarder;
mod images;
mod label;
mod lifecycle;
mod model;
mod rekognition;
mod routes;
mod server;
mod telemetry;

pub mod app;
pub mod config;

pub use app::start_app;
