//! Dishes and orders REST API for a restaurant delivery service.
//!
//! The server binary wires [`endpoints::create_http_router`] to an [`http::HttpServer`], with a
//! [`database::Database`] behind a mutex. The client binary talks to it over plain HTTP/1.1.

pub mod api;
pub mod cli;
pub mod database;
pub mod endpoints;
pub mod errors;
pub mod http;
pub mod ids;
pub mod logging;
pub mod routes;
pub mod threadpool;
pub mod validation;
