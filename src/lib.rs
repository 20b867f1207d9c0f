pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
pub use config::toml_config::GeneratorConfig;
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use crate::core::{
    decomposer::{Decomposer, Strategy},
    engine::{GeneratorEngine, RunOutput},
    runner::BatchRunner,
    MarksPipeline,
};
pub use domain::model::{ComponentRange, ComponentSpec, Decomposition, ResultRow};
pub use utils::error::{MarksError, Result};
