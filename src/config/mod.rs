pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::decomposer::Strategy;
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "cli")]
use toml_config::GeneratorConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "marks-generator")]
#[command(about = "Split row totals into per-component marks")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Copy the template workbook to a destination, or create it with --init
    Template(TemplateArgs),
    /// Generate marks for a filled template
    Generate(GenerateArgs),
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct TemplateArgs {
    /// Write a fresh template to the configured template path
    #[arg(long)]
    pub init: bool,

    /// Where to copy the template to
    #[arg(short, long, default_value = "template.xlsx")]
    pub output: String,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Filled template (.xlsx or .csv)
    #[arg(short, long)]
    pub input: String,

    #[arg(long)]
    pub output_path: Option<String>,

    /// Output formats, comma separated (xlsx, csv, json)
    #[arg(long, value_delimiter = ',')]
    pub format: Vec<String>,

    /// sampling, uniform or greedy
    #[arg(long)]
    pub strategy: Option<Strategy>,

    #[arg(long)]
    pub max_attempts: Option<u64>,

    /// Seed for reproducible marks
    #[arg(long)]
    pub seed: Option<u64>,

    /// Do not print the result table
    #[arg(long)]
    pub quiet: bool,
}

#[cfg(feature = "cli")]
impl GenerateArgs {
    /// Command-line flags take precedence over the configuration file.
    pub fn apply_overrides(&self, config: &mut GeneratorConfig) {
        if let Some(output_path) = &self.output_path {
            config.load.output_path = output_path.clone();
        }
        if !self.format.is_empty() {
            config.load.output_formats = self.format.clone();
        }
        if let Some(strategy) = self.strategy {
            config.generator.strategy = strategy;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.generator.max_attempts = max_attempts;
        }
        if let Some(seed) = self.seed {
            config.generator.seed = Some(seed);
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_generate_flags_override_config() {
        let cli = CliConfig::parse_from([
            "marks-generator",
            "generate",
            "--input",
            "filled.xlsx",
            "--strategy",
            "greedy",
            "--max-attempts",
            "50",
            "--seed",
            "9",
            "--format",
            "csv,json",
            "--output-path",
            "results",
        ]);

        let Command::Generate(args) = cli.command else {
            panic!("expected generate command");
        };
        let mut config = GeneratorConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(args.input, "filled.xlsx");
        assert_eq!(config.generator.strategy, Strategy::Greedy);
        assert_eq!(config.generator.max_attempts, 50);
        assert_eq!(config.generator.seed, Some(9));
        assert_eq!(config.load.output_formats, vec!["csv", "json"]);
        assert_eq!(config.load.output_path, "results");
    }

    #[test]
    fn test_template_defaults() {
        let cli = CliConfig::parse_from(["marks-generator", "-v", "template"]);
        assert!(cli.verbose);
        let Command::Template(args) = cli.command else {
            panic!("expected template command");
        };
        assert!(!args.init);
        assert_eq!(args.output, "template.xlsx");
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let result = CliConfig::try_parse_from([
            "marks-generator",
            "generate",
            "--input",
            "a.csv",
            "--strategy",
            "random",
        ]);
        assert!(result.is_err());
    }
}
