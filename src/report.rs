//! Report structures produced by the analyzers.
//!
//! A `Report` is an ordered list of sections, one per analyzer; each section
//! wraps a description and zero or more tables of plain string cells. This is
//! the whole contract between analysis and rendering: the text and JSON
//! renderers below only ever see these three types.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ReportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub description: String,
    pub tables: Vec<ReportTable>,
}

impl ReportSection {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            tables: Vec::new(),
        }
    }

    pub fn add_table(&mut self, table: ReportTable) {
        self.tables.push(table);
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub sections: Vec<ReportSection>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    /// Plain-text rendering with column-aligned tables. Cells may contain
    /// newlines; such rows render as one physical line per cell line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (idx, section) in self.sections.iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            out.push_str(&section.title);
            out.push('\n');
            out.push_str(&"-".repeat(section.title.len()));
            out.push('\n');
            if !section.description.is_empty() {
                out.push_str(&section.description);
                out.push('\n');
            }
            for table in &section.tables {
                out.push('\n');
                render_table(&mut out, table);
            }
        }
        out
    }
}

fn render_table(out: &mut String, table: &ReportTable) {
    let widths = column_widths(table);

    render_line(out, &widths, &table.columns);
    let header_width: usize = widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1);
    out.push_str(&"=".repeat(header_width));
    out.push('\n');

    for row in &table.rows {
        let height = row.iter().map(|c| c.lines().count().max(1)).max().unwrap_or(1);
        for line_idx in 0..height {
            let cells: Vec<String> = row
                .iter()
                .map(|c| c.lines().nth(line_idx).unwrap_or("").to_string())
                .collect();
            render_line(out, &widths, &cells);
        }
    }
}

fn render_line<S: AsRef<str>>(out: &mut String, widths: &[usize], cells: &[S]) {
    let mut line = String::new();
    for (idx, cell) in cells.iter().enumerate() {
        if idx > 0 {
            line.push_str(" | ");
        }
        if idx + 1 < cells.len() {
            line.push_str(&format!("{:width$}", cell.as_ref(), width = widths[idx]));
        } else {
            line.push_str(cell.as_ref());
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

fn column_widths(table: &ReportTable) -> Vec<usize> {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.len()).collect();
    for row in &table.rows {
        for (idx, cell) in row.iter().enumerate() {
            let cell_width = cell.lines().map(|l| l.len()).max().unwrap_or(0);
            if cell_width > widths[idx] {
                widths[idx] = cell_width;
            }
        }
    }
    widths
}
