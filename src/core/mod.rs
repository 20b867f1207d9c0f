pub mod decomposer;
pub mod engine;
pub mod runner;
pub mod validator;

pub use crate::domain::model::{InputRow, InputSheet, ResultRow};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;

pub use crate::app::pipelines::marks_pipeline::MarksPipeline;
