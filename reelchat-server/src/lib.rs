pub mod gateway;
pub mod handlers;
pub mod samples;
pub mod server;
pub mod state;

pub use gateway::{ChatExchange, InferenceGateway};
pub use server::{build_router, run_server};
pub use state::AppState;
