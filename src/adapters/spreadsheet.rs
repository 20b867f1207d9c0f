use crate::domain::model::{ComponentSpec, InputRow, InputSheet, ResultRow, TotalCell};
use crate::utils::error::{MarksError, Result};
use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Xlsx,
    Csv,
    Json,
}

impl SheetFormat {
    pub const ALL: [SheetFormat; 3] = [SheetFormat::Xlsx, SheetFormat::Csv, SheetFormat::Json];

    pub fn extension(&self) -> &'static str {
        match self {
            SheetFormat::Xlsx => "xlsx",
            SheetFormat::Csv => "csv",
            SheetFormat::Json => "json",
        }
    }

    /// Input format from a file name. Only xlsx and csv can be read.
    pub fn for_input(path: &str) -> Result<Self> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("xlsx") => Ok(SheetFormat::Xlsx),
            Some("csv") => Ok(SheetFormat::Csv),
            _ => Err(MarksError::UnsupportedFormat {
                path: path.to_string(),
            }),
        }
    }
}

impl FromStr for SheetFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SheetFormat::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown output format '{}', expected xlsx, csv or json", s))
    }
}

/// Parse an input spreadsheet. `path` is only used to pick the format and in errors.
pub fn read_input(path: &str, data: &[u8], total_column: &str) -> Result<InputSheet> {
    match SheetFormat::for_input(path)? {
        SheetFormat::Xlsx => read_xlsx(path, data, total_column),
        SheetFormat::Csv => read_csv(path, data, total_column),
        SheetFormat::Json => Err(MarksError::UnsupportedFormat {
            path: path.to_string(),
        }),
    }
}

fn read_xlsx(path: &str, data: &[u8], total_column: &str) -> Result<InputSheet> {
    let mut workbook = Xlsx::new(Cursor::new(data))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| MarksError::EmptyWorkbook {
            path: path.to_string(),
        })??;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .ok_or_else(|| MarksError::EmptyWorkbook {
            path: path.to_string(),
        })?
        .iter()
        .map(header_text)
        .collect();

    let total_idx = headers.iter().position(|h| h == total_column);
    let mut rows = Vec::new();
    let mut last_filled = 0;
    for (idx, cells) in sheet_rows.enumerate() {
        let total = total_idx
            .and_then(|col| cells.get(col))
            .map(total_cell)
            .unwrap_or(TotalCell::Missing);
        rows.push(InputRow::new(idx + 1, total));
        if !cells.iter().all(is_blank) {
            last_filled = rows.len();
        }
    }
    // Interior blank rows stay and report a missing total; trailing ones are dropped.
    rows.truncate(last_filled);

    Ok(InputSheet { headers, rows })
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn total_cell(cell: &Data) -> TotalCell {
    match cell {
        Data::Empty => TotalCell::Missing,
        Data::Int(v) => TotalCell::Number(*v as f64),
        Data::Float(v) => TotalCell::Number(*v),
        Data::String(s) => TotalCell::from_text(s),
        Data::Bool(v) => TotalCell::Text(v.to_string().to_uppercase()),
        Data::DateTime(v) => TotalCell::Number(v.as_f64()),
        Data::DateTimeIso(v) | Data::DurationIso(v) => TotalCell::Text(v.clone()),
        Data::Error(e) => TotalCell::Text(e.to_string()),
    }
}

fn read_csv(path: &str, data: &[u8], total_column: &str) -> Result<InputSheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(MarksError::EmptyWorkbook {
            path: path.to_string(),
        });
    }

    let total_idx = headers.iter().position(|h| h == total_column);
    let mut rows = Vec::new();
    let mut last_filled = 0;
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let total = total_idx
            .and_then(|col| record.get(col))
            .map(TotalCell::from_text)
            .unwrap_or(TotalCell::Missing);
        rows.push(InputRow::new(idx + 1, total));
        if !record.iter().all(|field| field.trim().is_empty()) {
            last_filled = rows.len();
        }
    }
    rows.truncate(last_filled);

    Ok(InputSheet { headers, rows })
}

/// Output header: component names followed by the total column.
pub fn output_columns(spec: &ComponentSpec, total_column: &str) -> Vec<String> {
    crate::core::validator::required_columns(spec, total_column)
}

fn row_values(row: &ResultRow) -> Vec<u32> {
    row.decomposition
        .values
        .iter()
        .copied()
        .chain(std::iter::once(row.total))
        .collect()
}

pub fn write_output(
    format: SheetFormat,
    spec: &ComponentSpec,
    total_column: &str,
    rows: &[ResultRow],
) -> Result<Vec<u8>> {
    let columns = output_columns(spec, total_column);
    match format {
        SheetFormat::Xlsx => write_xlsx(&columns, rows),
        SheetFormat::Csv => write_csv(&columns, rows),
        SheetFormat::Json => write_json(&columns, rows),
    }
}

fn write_xlsx(columns: &[String], rows: &[ResultRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col, name) in columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
    }
    for (idx, row) in rows.iter().enumerate() {
        for (col, value) in row_values(row).into_iter().enumerate() {
            worksheet.write_number(idx as u32 + 1, col as u16, f64::from(value))?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_csv(columns: &[String], rows: &[ResultRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(row_values(row).iter().map(u32::to_string))?;
    }
    writer
        .into_inner()
        .map_err(|e| MarksError::IoError(e.into_error()))
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    columns: &'a [String],
    rows: Vec<Vec<u32>>,
}

fn write_json(columns: &[String], rows: &[ResultRow]) -> Result<Vec<u8>> {
    let output = JsonOutput {
        columns,
        rows: rows.iter().map(row_values).collect(),
    };
    Ok(serde_json::to_vec_pretty(&output)?)
}

/// Plain-text table of the results for the terminal.
pub fn render_table(spec: &ComponentSpec, total_column: &str, rows: &[ResultRow]) -> String {
    let columns = output_columns(spec, total_column);
    let widths: Vec<usize> = columns.iter().map(|c| c.len().max(3)).collect();

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(name, width)| format!("{:>width$}", name, width = width))
        .collect();
    lines.push(format!("{:>4}  {}", "Row", header.join("  ")));
    lines.push("-".repeat(lines[0].len()));

    for row in rows {
        let cells: Vec<String> = row_values(row)
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:>width$}", value, width = width))
            .collect();
        lines.push(format!("{:>4}  {}", row.row, cells.join("  ")));
    }

    lines.join("\n")
}
