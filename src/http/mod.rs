pub mod handlers;
pub mod models;
pub mod resources;
pub mod routes;
