pub mod analytics;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod pipeline;
pub mod quality;
pub mod row;
pub mod schema;
pub mod ui;
pub mod warehouse;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::Settings;
pub use error::{LoadError, TransformError};
pub use ui::{Phase, SilentUi, TracingUi, Ui, UiApp};
