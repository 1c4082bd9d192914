pub mod auth;
pub mod middleware;
pub mod routes;
pub mod types;

pub use routes::vcloud as routes_vcloud;
