use crate::adapters::spreadsheet::{read_input, write_output};
use crate::config::toml_config::parse_formats;
use crate::core::decomposer::{Decomposer, Strategy};
use crate::core::runner::BatchRunner;
use crate::core::validator::{check_schema, required_columns};
use crate::core::{ConfigProvider, InputRow, InputSheet, Pipeline, ResultRow, Storage};
use crate::utils::error::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Mutex;

/// Reads a filled template, splits each row's total and writes the result sheets.
pub struct MarksPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    input_path: String,
    decomposer: Decomposer,
    rng: Mutex<StdRng>,
}

impl<S: Storage, C: ConfigProvider> MarksPipeline<S, C> {
    pub fn new(storage: S, config: C, input_path: impl Into<String>) -> Self {
        let decomposer = Decomposer::new(config.component_spec().clone())
            .with_strategy(config.strategy())
            .with_max_attempts(config.max_attempts());

        let rng = match config.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            storage,
            config,
            input_path: input_path.into(),
            decomposer,
            rng: Mutex::new(rng),
        }
    }

    fn generate(&self, rows: &[InputRow]) -> Result<Vec<ResultRow>> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        BatchRunner::new(&self.decomposer).process(rows, &mut *rng)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for MarksPipeline<S, C> {
    async fn extract(&self) -> Result<InputSheet> {
        tracing::info!("📥 Reading input from: {}", self.input_path);

        let data = self.storage.read_file(&self.input_path).await?;
        let sheet = read_input(&self.input_path, &data, self.config.total_column())?;
        tracing::debug!("Input headers: {:?}", sheet.headers);

        let required = required_columns(self.config.component_spec(), self.config.total_column());
        check_schema(&sheet.headers, &required)?;

        tracing::info!("📊 Extracted {} rows", sheet.rows.len());
        Ok(sheet)
    }

    async fn transform(&self, sheet: InputSheet) -> Result<Vec<ResultRow>> {
        tracing::info!(
            "🔧 Generating marks for {} rows (strategy: {}, max attempts: {})",
            sheet.rows.len(),
            self.decomposer.strategy(),
            self.decomposer.max_attempts()
        );
        let search_space = self.decomposer.spec().combinations();
        if self.decomposer.strategy() != Strategy::Greedy
            && search_space > self.decomposer.max_attempts()
        {
            tracing::warn!(
                "Search space of {} combinations exceeds the attempt budget; some totals may not be found",
                search_space
            );
        } else {
            tracing::debug!("Search space: {} combinations", search_space);
        }

        let rows = self.generate(&sheet.rows)?;

        tracing::info!("✅ Transform complete: {} rows generated", rows.len());
        Ok(rows)
    }

    async fn load(&self, rows: Vec<ResultRow>) -> Result<Vec<String>> {
        let formats = parse_formats(self.config.output_formats())?;
        let mut output_paths = Vec::with_capacity(formats.len());

        for format in formats {
            let data = write_output(
                format,
                self.config.component_spec(),
                self.config.total_column(),
                &rows,
            )?;
            let output_path = format!(
                "{}/{}.{}",
                self.config.output_path(),
                self.config.output_filename(),
                format.extension()
            );

            tracing::debug!("Writing {} ({} bytes)", output_path, data.len());
            self.storage.write_file(&output_path, &data).await?;
            output_paths.push(output_path);
        }

        tracing::info!("💾 Saved {} output files", output_paths.len());
        Ok(output_paths)
    }
}
