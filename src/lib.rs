pub mod config;
pub mod error;

pub mod matrix {
    pub mod convert;
    pub mod preprocess;
    pub mod types;
    pub mod util;
}

pub mod server {
    pub mod app;
    pub mod auth;
    pub mod response;
    pub mod routes;
    pub mod validation;

    pub use app::{create_app, serve, serve_listener};
}

pub mod utils {
    pub mod array;
    pub mod bytes;
}
