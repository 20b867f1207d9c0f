use crate::adapters::spreadsheet::SheetFormat;
use crate::core::decomposer::{Strategy, DEFAULT_MAX_ATTEMPTS};
use crate::core::ConfigProvider;
use crate::domain::model::ComponentSpec;
use crate::utils::error::{MarksError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Upper bound on `generator.max_attempts`.
pub const MAX_ATTEMPTS_LIMIT: u64 = 10_000_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub generator: GeneratorSection,
    pub components: ComponentSpec,
    pub total: TotalSection,
    pub template: TemplateSection,
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    pub strategy: Strategy,
    pub max_attempts: u64,
    pub seed: Option<u64>,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TotalSection {
    pub column: String,
}

impl Default for TotalSection {
    fn default() -> Self {
        Self {
            column: "Total".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSection {
    pub path: String,
}

impl Default for TemplateSection {
    fn default() -> Self {
        Self {
            path: "Template.xlsx".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub filename: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            output_formats: vec!["xlsx".to_string()],
            filename: "generated_marks".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MarksError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MarksError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MARKS_SEED})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MarksError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if self.components.is_empty() {
            return Err(MarksError::ConfigValidationError {
                field: "components".to_string(),
                message: "At least one component is required".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for (idx, component) in self.components.components().iter().enumerate() {
            let field = format!("components[{}]", idx);
            validate_non_empty_string(&format!("{}.name", field), &component.name)?;
            if component.min > component.max {
                return Err(MarksError::InvalidConfigValueError {
                    field,
                    value: format!("[{}, {}]", component.min, component.max),
                    reason: "min must not exceed max".to_string(),
                });
            }
            if !seen.insert(component.name.as_str()) {
                return Err(MarksError::InvalidConfigValueError {
                    field: format!("{}.name", field),
                    value: component.name.clone(),
                    reason: "Component names must be unique".to_string(),
                });
            }
        }

        if self.components.checked_reachable_range().is_none() {
            let highest: u64 = self
                .components
                .components()
                .iter()
                .map(|c| u64::from(c.max))
                .sum();
            return Err(MarksError::InvalidConfigValueError {
                field: "components".to_string(),
                value: highest.to_string(),
                reason: format!("Sum of component maximums must not exceed {}", u32::MAX),
            });
        }

        validate_non_empty_string("total.column", &self.total.column)?;
        if seen.contains(self.total.column.as_str()) {
            return Err(MarksError::InvalidConfigValueError {
                field: "total.column".to_string(),
                value: self.total.column.clone(),
                reason: "Total column must differ from every component name".to_string(),
            });
        }

        validate_range(
            "generator.max_attempts",
            self.generator.max_attempts,
            0,
            MAX_ATTEMPTS_LIMIT,
        )?;

        validate_path("template.path", &self.template.path)?;
        validate_path("load.output_path", &self.load.output_path)?;
        validate_non_empty_string("load.filename", &self.load.filename)?;
        validate_positive_number("load.output_formats", self.load.output_formats.len(), 1)?;
        self.sheet_formats()?;

        Ok(())
    }

    /// 解析輸出格式
    pub fn sheet_formats(&self) -> Result<Vec<SheetFormat>> {
        parse_formats(&self.load.output_formats)
    }
}

pub fn parse_formats(formats: &[String]) -> Result<Vec<SheetFormat>> {
    let mut parsed = Vec::with_capacity(formats.len());
    for format in formats {
        let sheet_format = format
            .parse::<SheetFormat>()
            .map_err(|reason| MarksError::InvalidConfigValueError {
                field: "load.output_formats".to_string(),
                value: format.clone(),
                reason,
            })?;
        if !parsed.contains(&sheet_format) {
            parsed.push(sheet_format);
        }
    }
    Ok(parsed)
}

impl ConfigProvider for GeneratorConfig {
    fn component_spec(&self) -> &ComponentSpec {
        &self.components
    }

    fn total_column(&self) -> &str {
        &self.total.column
    }

    fn strategy(&self) -> Strategy {
        self.generator.strategy
    }

    fn max_attempts(&self) -> u64 {
        self.generator.max_attempts
    }

    fn seed(&self) -> Option<u64> {
        self.generator.seed
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.load.output_formats
    }

    fn output_filename(&self) -> &str {
        &self.load.filename
    }
}

impl Validate for GeneratorConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
