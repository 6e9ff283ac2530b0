//! Excel and HTML export of a filtered view

use std::fmt::Write as _;
use std::path::Path;

use rust_xlsxwriter::{Format, FormatBorder, Workbook};
use tracing::info;

use crate::columns::{SsaColumn, COLUMN_COUNT};
use crate::error::Result;
use crate::record::SsaRecord;
use crate::time::{self, datetime_to_excel_serial};

const SHEET_NAME: &str = "SSAs";
const DATE_FORMAT: &str = "dd/mm/yyyy hh:mm";

/// Workbook with a bold header row and one row per record
pub fn build_workbook(records: &[&SsaRecord]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold().set_border(FormatBorder::Thin);
    let date = Format::new().set_num_format(DATE_FORMAT);

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for column in SsaColumn::ALL {
        let col = column.index() as u16;
        sheet.write_with_format(0, col, column.display_name(), &header)?;
        let width = column.display_name().chars().count().max(12) as f64;
        sheet.set_column_width(col, width)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        for column in SsaColumn::ALL {
            let col = column.index() as u16;
            if column == SsaColumn::EmitidaEm {
                if let Some(dt) = record.emitida_em {
                    sheet.write_number_with_format(row, col, datetime_to_excel_serial(&dt), &date)?;
                }
                continue;
            }
            if let Some(value) = record.field(column) {
                sheet.write_string(row, col, &value)?;
            }
        }
    }

    sheet.set_freeze_panes(1, 0)?;
    if !records.is_empty() {
        sheet.autofilter(0, 0, records.len() as u32, (COLUMN_COUNT - 1) as u16)?;
    }

    Ok(workbook)
}

/// Write the view to an `.xlsx` file
pub fn export_xlsx(records: &[&SsaRecord], path: &Path) -> Result<()> {
    let mut workbook = build_workbook(records)?;
    workbook.save(path)?;
    info!("Exported {} SSAs to {}", records.len(), path.display());
    Ok(())
}

/// The view as `.xlsx` bytes
pub fn export_xlsx_buffer(records: &[&SsaRecord]) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(records)?;
    Ok(workbook.save_to_buffer()?)
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Self-contained HTML report of the view
pub fn export_html(records: &[&SsaRecord], title: &str) -> String {
    let title = escape_html(title);
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>\n\
         body {{ font-family: sans-serif; margin: 1.5rem; }}\n\
         table {{ border-collapse: collapse; font-size: 0.85rem; }}\n\
         th, td {{ border: 1px solid #ccc; padding: 4px 6px; text-align: left; }}\n\
         th {{ background: #1e3799; color: #fff; position: sticky; top: 0; }}\n\
         tr:nth-child(even) {{ background: #f4f6fb; }}\n\
         </style>\n</head>\n<body>\n<h1>{title}</h1>\n\
         <p>{count} SSAs &middot; gerado em {generated}</p>\n<table>\n<thead><tr>",
        title = title,
        count = records.len(),
        generated = time::now().format("%d/%m/%Y %H:%M"),
    );

    for column in SsaColumn::ALL {
        let _ = write!(html, "<th>{}</th>", escape_html(column.display_name()));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for record in records {
        html.push_str("<tr>");
        for column in SsaColumn::ALL {
            let value = record.field(column).unwrap_or_default();
            let _ = write!(html, "<td>{}</td>", escape_html(&value));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}
