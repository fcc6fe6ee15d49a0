pub mod authority;
pub mod guard;
pub mod orchestrator;
pub mod session;
pub mod state;

pub use orchestrator::TokenLifecycleOrchestrator;
