use crate::core::Pipeline;
use crate::domain::model::ResultRow;
use crate::utils::error::Result;

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub rows: Vec<ResultRow>,
    pub output_paths: Vec<String>,
}

pub struct GeneratorEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> GeneratorEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunOutput> {
        tracing::info!("Starting marks generation...");

        // Extract
        let sheet = self.pipeline.extract().await?;
        tracing::info!("Read {} rows", sheet.rows.len());

        // Transform
        let rows = self.pipeline.transform(sheet).await?;
        tracing::info!("Generated marks for {} rows", rows.len());

        // Load
        let output_paths = self.pipeline.load(rows.clone()).await?;
        for path in &output_paths {
            tracing::info!("Output saved to: {}", path);
        }

        Ok(RunOutput { rows, output_paths })
    }
}
