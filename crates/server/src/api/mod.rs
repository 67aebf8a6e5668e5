pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod videos;

pub use routes::create_router;
