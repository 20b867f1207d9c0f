// Adapters layer: concrete implementations for external systems (spreadsheets, templates).

pub mod spreadsheet;
pub mod template;
