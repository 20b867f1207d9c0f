use crate::adapters::spreadsheet::output_columns;
use crate::domain::model::ComponentSpec;
use crate::domain::ports::Storage;
use crate::utils::error::{MarksError, Result};
use rust_xlsxwriter::{Format, Workbook};

/// Hands out the blank workbook users fill in.
pub struct TemplateProvider<S: Storage> {
    storage: S,
    path: String,
}

impl<S: Storage> TemplateProvider<S> {
    pub fn new(storage: S, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        self.storage.exists(&self.path).await
    }

    /// Template bytes; fails with `TemplateNotFound` if the file is absent.
    pub async fn load(&self) -> Result<Vec<u8>> {
        if !self.exists().await {
            return Err(MarksError::TemplateNotFound {
                path: self.path.clone(),
            });
        }
        self.storage.read_file(&self.path).await
    }

    /// Write a freshly built template to the configured path.
    pub async fn init(&self, spec: &ComponentSpec, total_column: &str) -> Result<()> {
        let data = build_template(spec, total_column)?;
        self.storage.write_file(&self.path, &data).await?;
        tracing::info!("Template written to {}", self.path);
        Ok(())
    }
}

/// Workbook with a bold header row and nothing else.
pub fn build_template(spec: &ComponentSpec, total_column: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col, name) in output_columns(spec, total_column).iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
    }

    Ok(workbook.save_to_buffer()?)
}
