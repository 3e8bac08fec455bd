//! Shared utilities

pub mod preprocessing;
pub mod providers;

pub use preprocessing::ImagePreprocessor;
pub use providers::ExecutionProviderManager;
