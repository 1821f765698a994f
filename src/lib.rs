// RAGAData Chat - upload tabular data or PDFs, explore them, and ask a hosted LLM about them

pub mod analysis;
pub mod config;
pub mod context;
pub mod credentials;
pub mod ingest;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod session;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
