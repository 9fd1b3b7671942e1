pub mod components;
pub mod cookies;
pub mod errors;
pub mod flash;
pub mod oauth;
pub mod platform;
pub mod publish;
pub mod resize;
pub mod routes;
pub mod session;
pub mod setup;
pub mod state;

pub use state::AppState;
