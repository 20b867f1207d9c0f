use anyhow::Context;
use clap::Parser;
use marks_generator::adapters::spreadsheet::render_table;
use marks_generator::adapters::template::TemplateProvider;
use marks_generator::config::{Command, GenerateArgs, TemplateArgs};
use marks_generator::core::ConfigProvider;
use marks_generator::utils::{logger, validation::Validate};
use marks_generator::{
    CliConfig, GeneratorConfig, GeneratorEngine, LocalStorage, MarksError, MarksPipeline,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting marks-generator");
    tracing::debug!("CLI config: {:?}", cli);

    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_file(path)
            .with_context(|| format!("Failed to load config file '{}'", path))?,
        None => GeneratorConfig::default(),
    };

    if let Command::Generate(args) = &cli.command {
        args.apply_overrides(&mut config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let result = match &cli.command {
        Command::Template(args) => run_template(&config, args).await,
        Command::Generate(args) => run_generate(config, args).await,
    };

    if let Err(e) = result {
        exit_with(&e);
    }

    Ok(())
}

async fn run_template(config: &GeneratorConfig, args: &TemplateArgs) -> marks_generator::Result<()> {
    let provider = TemplateProvider::new(LocalStorage::new(".".to_string()), config.template.path.clone());

    if args.init {
        provider
            .init(config.component_spec(), config.total_column())
            .await?;
        println!("✅ Template created: {}", provider.path());
        return Ok(());
    }

    let data = provider.load().await?;
    tokio::fs::write(&args.output, &data).await?;
    println!("✅ Template saved to: {}", args.output);
    Ok(())
}

async fn run_generate(config: GeneratorConfig, args: &GenerateArgs) -> marks_generator::Result<()> {
    let spec = config.component_spec().clone();
    let total_column = config.total_column().to_string();

    let storage = LocalStorage::new(".".to_string());
    let pipeline = MarksPipeline::new(storage, config, args.input.clone());
    let engine = GeneratorEngine::new(pipeline);

    let output = engine.run().await?;

    if !args.quiet {
        println!("{}", render_table(&spec, &total_column, &output.rows));
        println!();
    }
    println!("✅ Generated marks for {} rows", output.rows.len());
    for path in &output.output_paths {
        println!("📁 Output saved to: {}", path);
    }
    Ok(())
}

fn exit_with(e: &MarksError) -> ! {
    tracing::error!(
        "❌ marks-generator failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    std::process::exit(e.exit_code());
}
