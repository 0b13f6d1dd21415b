pub mod settings;

pub use settings::{PoolSettings, ProviderSettings, ServerSettings, Settings};
