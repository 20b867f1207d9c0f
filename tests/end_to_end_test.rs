use anyhow::Result;
use calamine::{Data, Reader, Xlsx};
use marks_generator::{
    ComponentSpec, GeneratorConfig, GeneratorEngine, LocalStorage, MarksError, MarksPipeline,
    Strategy,
};
use rust_xlsxwriter::Workbook;
use std::io::Cursor;
use tempfile::TempDir;

const COLUMNS: [&str; 6] = ["Mark1", "Mark2", "Mark3", "Mark4", "Mark5", "Total"];

/// Build an input workbook with the given header and one total per row.
fn write_input(dir: &TempDir, name: &str, header: &[&str], totals: &[Option<f64>]) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let total_col = header.iter().position(|h| *h == "Total");

    for (col, title) in header.iter().enumerate() {
        worksheet.write_string(0, col as u16, *title)?;
    }
    for (idx, total) in totals.iter().enumerate() {
        let row = idx as u32 + 1;
        // Student name keeps a trailing row with an empty total from being trimmed.
        worksheet.write_string(row, header.len() as u16, format!("student {}", row))?;
        if let (Some(col), Some(total)) = (total_col, total) {
            worksheet.write_number(row, col as u16, *total)?;
        }
    }

    std::fs::write(dir.path().join(name), workbook.save_to_buffer()?)?;
    Ok(())
}

fn read_output(path: &std::path::Path) -> Result<Vec<Vec<Data>>> {
    let data = std::fs::read(path)?;
    let mut workbook = Xlsx::new(Cursor::new(data))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow::anyhow!("no worksheet"))??;
    Ok(range.rows().map(|r| r.to_vec()).collect())
}

fn as_u32(cell: &Data) -> u32 {
    match cell {
        Data::Float(v) => *v as u32,
        Data::Int(v) => *v as u32,
        other => panic!("expected a number, got {:?}", other),
    }
}

fn engine_for(
    dir: &TempDir,
    input: &str,
    strategy: Strategy,
) -> GeneratorEngine<MarksPipeline<LocalStorage, GeneratorConfig>> {
    let mut config = GeneratorConfig::default();
    config.generator.strategy = strategy;
    config.generator.seed = Some(17);
    config.load.output_path = "out".to_string();

    let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());
    GeneratorEngine::new(MarksPipeline::new(storage, config, input))
}

#[tokio::test]
async fn test_two_valid_rows_produce_two_output_rows() -> Result<()> {
    let dir = TempDir::new()?;
    write_input(&dir, "filled.xlsx", &COLUMNS, &[Some(5.0), Some(12.0)])?;

    let output = engine_for(&dir, "filled.xlsx", Strategy::Uniform).run().await?;
    assert_eq!(output.output_paths, vec!["out/generated_marks.xlsx".to_string()]);

    let rows = read_output(&dir.path().join("out/generated_marks.xlsx"))?;
    assert_eq!(rows.len(), 3);

    let header: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
    assert_eq!(header, COLUMNS.to_vec());

    let spec = ComponentSpec::default();
    for (row, expected_total) in rows[1..].iter().zip([5u32, 12]) {
        let values: Vec<u32> = row.iter().map(as_u32).collect();
        assert_eq!(values[5], expected_total);
        assert_eq!(values[..5].iter().sum::<u32>(), expected_total);
        for (value, component) in values[..5].iter().zip(spec.components()) {
            assert!(component.contains(*value));
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_two_valid_rows_with_default_sampling() -> Result<()> {
    let dir = TempDir::new()?;
    write_input(&dir, "filled.xlsx", &COLUMNS, &[Some(5.0), Some(12.0)])?;

    let mut config = GeneratorConfig::default();
    config.generator.seed = Some(17);
    // Total 12 matches 1 of 288 draws; this budget leaves ~3e-8 odds of giving up.
    config.generator.max_attempts = 5000;
    config.load.output_path = "out".to_string();
    assert_eq!(config.generator.strategy, Strategy::Sampling);

    let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());
    let output = GeneratorEngine::new(MarksPipeline::new(storage, config, "filled.xlsx"))
        .run()
        .await?;

    assert_eq!(output.rows.len(), 2);
    assert_eq!(output.rows[1].decomposition.values, vec![1, 5, 3, 2, 1]);

    let rows = read_output(&dir.path().join("out/generated_marks.xlsx"))?;
    assert_eq!(rows.len(), 3);
    let spec = ComponentSpec::default();
    for (row, expected_total) in rows[1..].iter().zip([5u32, 12]) {
        let values: Vec<u32> = row.iter().map(as_u32).collect();
        assert_eq!(values[5], expected_total);
        for (value, component) in values[..5].iter().zip(spec.components()) {
            assert!(component.contains(*value));
        }
    }
    assert_eq!(
        rows[2].iter().map(as_u32).collect::<Vec<_>>(),
        vec![1, 5, 3, 2, 1, 12]
    );
    Ok(())
}

#[tokio::test]
async fn test_sampling_strategy_end_to_end() -> Result<()> {
    let dir = TempDir::new()?;
    let totals: Vec<Option<f64>> = (1..=11).map(|t| Some(t as f64)).collect();
    write_input(&dir, "filled.xlsx", &COLUMNS, &totals)?;

    let output = engine_for(&dir, "filled.xlsx", Strategy::Sampling).run().await?;

    assert_eq!(output.rows.len(), 11);
    let spec = ComponentSpec::default();
    for (idx, row) in output.rows.iter().enumerate() {
        assert_eq!(row.row, idx + 1);
        assert!(row.decomposition.satisfies(&spec, row.total));
    }
    Ok(())
}

#[tokio::test]
async fn test_total_above_range_is_rejected_without_output() -> Result<()> {
    let dir = TempDir::new()?;
    write_input(&dir, "filled.xlsx", &COLUMNS, &[Some(13.0)])?;

    let err = engine_for(&dir, "filled.xlsx", Strategy::Sampling)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, MarksError::InvalidTotals { .. }));
    assert!(err.to_string().contains("Row 1: Total = 13"));
    assert!(!dir.path().join("out").exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_total_is_rejected_without_output() -> Result<()> {
    let dir = TempDir::new()?;
    write_input(&dir, "filled.xlsx", &COLUMNS, &[None])?;

    let err = engine_for(&dir, "filled.xlsx", Strategy::Sampling)
        .run()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Row 1: Total is missing"));
    assert!(!dir.path().join("out").exists());
    Ok(())
}

#[tokio::test]
async fn test_all_invalid_rows_reported_together() -> Result<()> {
    let dir = TempDir::new()?;
    write_input(
        &dir,
        "filled.xlsx",
        &COLUMNS,
        &[Some(4.0), None, Some(-2.0), Some(6.0), Some(20.0)],
    )?;

    let err = engine_for(&dir, "filled.xlsx", Strategy::Greedy)
        .run()
        .await
        .unwrap_err();
    let message = err.to_string();

    assert!(message.starts_with(
        "The following rows have invalid totals (must be between 0 and 12):"
    ));
    assert!(message.contains("Row 2: Total is missing"));
    assert!(message.contains("Row 3: Total = -2"));
    assert!(message.contains("Row 5: Total = 20"));
    assert!(!message.contains("Row 1"));
    assert!(!message.contains("Row 4"));
    Ok(())
}

#[tokio::test]
async fn test_blank_row_between_filled_rows_is_reported_missing() -> Result<()> {
    let dir = TempDir::new()?;
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (col, title) in COLUMNS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *title)?;
    }
    worksheet.write_number(1, 5, 5.0)?;
    worksheet.write_number(3, 5, 13.0)?;
    std::fs::write(dir.path().join("filled.xlsx"), workbook.save_to_buffer()?)?;

    let err = engine_for(&dir, "filled.xlsx", Strategy::Greedy)
        .run()
        .await
        .unwrap_err();
    let message = err.to_string();

    assert!(message.contains("Row 2: Total is missing"));
    assert!(message.contains("Row 3: Total = 13"));
    assert!(!message.contains("Row 1"));
    assert!(!dir.path().join("out").exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_mark3_column_is_schema_mismatch() -> Result<()> {
    let dir = TempDir::new()?;
    let header = ["Mark1", "Mark2", "Mark4", "Mark5", "Total"];
    // Row 1 is out of range as well; the schema check must win.
    write_input(&dir, "filled.xlsx", &header, &[Some(99.0)])?;

    let err = engine_for(&dir, "filled.xlsx", Strategy::Sampling)
        .run()
        .await
        .unwrap_err();

    match err {
        MarksError::SchemaMismatch { missing, .. } => assert_eq!(missing, vec!["Mark3"]),
        other => panic!("expected SchemaMismatch, got {:?}", other),
    }
    assert!(!dir.path().join("out").exists());
    Ok(())
}

#[tokio::test]
async fn test_exhausted_budget_discards_all_rows() -> Result<()> {
    let dir = TempDir::new()?;
    write_input(&dir, "filled.xlsx", &COLUMNS, &[Some(2.0), Some(3.0)])?;

    let mut config = GeneratorConfig::default();
    config.generator.max_attempts = 0;
    config.load.output_path = "out".to_string();
    let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());
    let engine = GeneratorEngine::new(MarksPipeline::new(storage, config, "filled.xlsx"));

    let err = engine.run().await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot generate marks for total: 2");
    assert!(!dir.path().join("out").exists());
    Ok(())
}

#[tokio::test]
async fn test_csv_input_and_multiple_outputs() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(
        dir.path().join("filled.csv"),
        "Name,Total,Mark5,Mark4,Mark3,Mark2,Mark1\nAda,0,,,,,\nBo,7,,,,,\n",
    )?;

    let mut config = GeneratorConfig::default();
    config.generator.strategy = Strategy::Greedy;
    config.load.output_path = "out".to_string();
    config.load.output_formats = vec!["csv".to_string(), "json".to_string()];
    let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());
    let engine = GeneratorEngine::new(MarksPipeline::new(storage, config, "filled.csv"));

    let output = engine.run().await?;
    assert_eq!(output.output_paths.len(), 2);

    let csv = std::fs::read_to_string(dir.path().join("out/generated_marks.csv"))?;
    assert_eq!(
        csv,
        "Mark1,Mark2,Mark3,Mark4,Mark5,Total\n0,0,0,0,0,0\n1,5,1,0,0,7\n"
    );

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("out/generated_marks.json"))?)?;
    assert_eq!(json["rows"].as_array().map(Vec::len), Some(2));
    Ok(())
}
