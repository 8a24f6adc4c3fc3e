// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: bulleted summaries and tables using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use physicalizer_core::PaperSize;
use physicalizer_core::error::{PhysicalizerError, Result};
use physicalizer_core::types::Table;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use tracing::{debug, info, instrument};

use super::renderer::{DocumentRenderer, ExportContent};

const FONT_SIZE_PT: f32 = 11.0;
const LINE_HEIGHT_PT: f32 = 14.0;
const MARGIN_MM: f32 = 20.0;
/// Average Helvetica glyph width is roughly half the font size.
const AVG_GLYPH_WIDTH_EM: f32 = 0.50;
const MM_PER_PT: f32 = 0.3528;

const BULLET: &str = "- ";
const BULLET_INDENT: &str = "  ";
const ELLIPSIS: &str = "...";

/// Renders captures as PDFs with the built-in Helvetica fonts.
pub struct PdfWriter {
    paper_size: PaperSize,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfWriter {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: None,
        }
    }

    pub fn a4() -> Self {
        Self::new(PaperSize::A4)
    }

    pub fn set_paper_size(&mut self, paper_size: PaperSize) {
        self.paper_size = paper_size;
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("Physicalizer Capture")
    }

    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    fn layout(&self) -> PageLayout {
        let (page_w, page_h) = self.page_dimensions();
        let margin_pt = Mm(MARGIN_MM).into_pt().0;
        let page_h_pt = page_h.into_pt().0;
        let usable_width_mm = page_w.0 - 2.0 * MARGIN_MM;
        let glyph_width_mm = AVG_GLYPH_WIDTH_EM * FONT_SIZE_PT * MM_PER_PT;

        PageLayout {
            page_w,
            page_h,
            margin_pt,
            top_pt: page_h_pt - margin_pt,
            usable_width_pt: Mm(usable_width_mm).into_pt().0,
            chars_per_line: ((usable_width_mm / glyph_width_mm) as usize).max(1),
            lines_per_page: (((page_h_pt - 2.0 * margin_pt) / LINE_HEIGHT_PT) as usize).max(2),
        }
    }

    // -- Summary --------------------------------------------------------------

    /// Render OCR text as a bulleted list, one bullet per non-blank line.
    ///
    /// Long lines wrap under their bullet and pages break automatically. Text
    /// with no content yields a single blank page.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn create_summary(&self, text: &str) -> Result<Vec<u8>> {
        let layout = self.layout();
        info!(paper = ?self.paper_size, title = self.title(), "Creating summary PDF");

        let wrap_width = layout.chars_per_line.saturating_sub(BULLET.len()).max(1);
        let mut lines = Vec::new();
        for entry in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            for (i, wrapped) in wrap_text(entry, wrap_width).into_iter().enumerate() {
                let prefix = if i == 0 { BULLET } else { BULLET_INDENT };
                lines.push(format!("{prefix}{wrapped}"));
            }
        }

        let pages: Vec<PdfPage> = lines
            .chunks(layout.lines_per_page)
            .map(|chunk| {
                let mut ops = Vec::new();
                for (idx, line) in chunk.iter().enumerate() {
                    let y_pt = layout.top_pt - idx as f32 * LINE_HEIGHT_PT;
                    push_text(&mut ops, layout.margin_pt, y_pt, BuiltinFont::Helvetica, line);
                }
                PdfPage::new(layout.page_w, layout.page_h, ops)
            })
            .collect();

        debug!(bullet_lines = lines.len(), pages = pages.len(), "Summary layout complete");
        Ok(self.save(pages, &layout))
    }

    // -- Table ----------------------------------------------------------------

    /// Render a table with a bold header repeated on every page.
    ///
    /// Columns share the usable width evenly; cells that do not fit are
    /// truncated with an ellipsis.
    #[instrument(skip(self, table), fields(rows = table.rows().len(), columns = table.width()))]
    pub fn create_table(&self, table: &Table) -> Result<Vec<u8>> {
        let columns = table.width();
        if columns == 0 {
            return Err(PhysicalizerError::Pdf("table has no columns".to_string()));
        }

        let layout = self.layout();
        info!(paper = ?self.paper_size, title = self.title(), columns, "Creating table PDF");

        let column_width_pt = layout.usable_width_pt / columns as f32;
        let column_chars = (layout.chars_per_line / columns).saturating_sub(1).max(1);
        let rows_per_page = layout.lines_per_page - 1;

        let draw_row = |ops: &mut Vec<Op>, row: &[String], y_pt: f32, font: BuiltinFont| {
            for (col, cell) in row.iter().enumerate() {
                let x_pt = layout.margin_pt + col as f32 * column_width_pt;
                push_text(ops, x_pt, y_pt, font, &truncate_cell(cell, column_chars));
            }
        };

        let mut pages = Vec::new();
        let data = table.data_rows();
        let chunks: Vec<&[Vec<String>]> = if data.is_empty() {
            vec![data]
        } else {
            data.chunks(rows_per_page).collect()
        };

        for chunk in chunks {
            let mut ops = Vec::new();
            draw_row(&mut ops, table.header(), layout.top_pt, BuiltinFont::HelveticaBold);
            for (idx, row) in chunk.iter().enumerate() {
                let y_pt = layout.top_pt - (idx + 1) as f32 * LINE_HEIGHT_PT;
                draw_row(&mut ops, row.as_slice(), y_pt, BuiltinFont::Helvetica);
            }
            pages.push(PdfPage::new(layout.page_w, layout.page_h, ops));
        }

        debug!(column_chars, pages = pages.len(), "Table layout complete");
        Ok(self.save(pages, &layout))
    }

    fn save(&self, mut pages: Vec<PdfPage>, layout: &PageLayout) -> Vec<u8> {
        if pages.is_empty() {
            pages.push(PdfPage::new(layout.page_w, layout.page_h, Vec::new()));
        }
        let mut doc = PdfDocument::new(self.title());
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(bytes = output.len(), warnings = warnings.len(), "PDF serialised");
        output
    }

    // -- File output convenience ----------------------------------------------

    /// Render `content` and write it to `path`.
    pub fn write_to_file(&self, content: &ExportContent<'_>, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.render(content)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote {:?} PDF to {}", content.mode(), path.as_ref().display());
        Ok(())
    }
}

impl DocumentRenderer for PdfWriter {
    fn render(&self, content: &ExportContent<'_>) -> Result<Vec<u8>> {
        match content {
            ExportContent::Summary(text) => self.create_summary(text),
            ExportContent::Table(table) => self.create_table(table),
        }
    }
}

/// Page geometry shared by both layouts, in points unless noted.
struct PageLayout {
    page_w: Mm,
    page_h: Mm,
    margin_pt: f32,
    top_pt: f32,
    usable_width_pt: f32,
    chars_per_line: usize,
    lines_per_page: usize,
}

fn push_text(ops: &mut Vec<Op>, x_pt: f32, y_pt: f32, font: BuiltinFont, text: &str) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Pt(x_pt),
            y: Pt(y_pt),
        },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(FONT_SIZE_PT),
        font,
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(text.to_string())],
        font,
    });
    ops.push(Op::EndTextSection);
}

/// Shorten `cell` to at most `max_chars` characters, marking the cut.
fn truncate_cell(cell: &str, max_chars: usize) -> String {
    if cell.chars().count() <= max_chars {
        return cell.to_string();
    }
    let ellipsis_len = ELLIPSIS.len();
    if max_chars <= ellipsis_len {
        return cell.chars().take(max_chars).collect();
    }
    let mut out: String = cell.chars().take(max_chars - ellipsis_len).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Word-wrap one line so no piece exceeds `max_width` characters. Words
/// longer than the width are force-broken.
fn wrap_text(line: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in line.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();

        if current_len > 0 && current_len + 1 + chars.len() <= max_width {
            current.push(' ');
            current.extend(chars.iter());
            current_len += 1 + chars.len();
            continue;
        }
        if current_len > 0 {
            result.push(std::mem::take(&mut current));
            current_len = 0;
        }
        while chars.len() > max_width {
            let rest = chars.split_off(max_width);
            result.push(chars.iter().collect());
            chars = rest;
        }
        current.extend(chars.iter());
        current_len = chars.len();
    }

    if current_len > 0 {
        result.push(current);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use physicalizer_core::types::HeaderSource;

    fn table(rows: &[&[&str]]) -> Table {
        let mut rows: Vec<Vec<String>> = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        let data = rows.split_off(1);
        Table::new(rows.remove(0), data, HeaderSource::Detected)
    }

    #[test]
    fn summary_produces_pdf_bytes() {
        let bytes = PdfWriter::a4()
            .create_summary("Milk 2L\nEggs x12\n\n  \nBread")
            .expect("renders");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_summary_still_renders() {
        let bytes = PdfWriter::a4().create_summary("  \n").expect("renders");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn table_produces_pdf_bytes() {
        let mut writer = PdfWriter::new(PaperSize::Letter);
        writer.set_title("Inventory");
        let bytes = writer
            .render(&ExportContent::Table(&table(&[&["Item", "Qty"], &["Bolt", "40"]])))
            .expect("renders");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn header_only_table_renders() {
        let bytes = PdfWriter::a4()
            .create_table(&table(&[&["Key", "Value"]]))
            .expect("renders");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn zero_column_table_is_rejected() {
        let empty = Table::new(Vec::new(), Vec::new(), HeaderSource::Synthesized);
        let err = PdfWriter::a4().create_table(&empty).expect_err("no columns");
        assert!(matches!(err, PhysicalizerError::Pdf(_)));
    }

    #[test]
    fn write_to_file_saves_rendered_pdf() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("summary.pdf");
        let writer = PdfWriter::a4();
        writer
            .write_to_file(&ExportContent::Summary("Milk 2L\nEggs x12"), &path)
            .expect("writes");

        let written = std::fs::read(&path).expect("file exists");
        assert!(written.starts_with(b"%PDF"));
    }

    #[test]
    fn write_to_file_reports_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("no-such-dir").join("out.pdf");
        let err = PdfWriter::a4()
            .write_to_file(&ExportContent::Summary("x"), &path)
            .expect_err("parent directory is missing");
        assert!(matches!(err, PhysicalizerError::Io(_)));
    }

    #[test]
    fn paper_size_drives_layout() {
        let mut writer = PdfWriter::a4();
        let a4 = writer.layout();
        writer.set_paper_size(PaperSize::A5);
        let a5 = writer.layout();
        assert!(a5.chars_per_line < a4.chars_per_line);
        assert!(a5.lines_per_page < a4.lines_per_page);
    }

    #[test]
    fn wrap_respects_width_and_keeps_words() {
        let wrapped = wrap_text("the quick brown fox jumps", 10);
        assert_eq!(wrapped, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn wrap_breaks_long_words_on_char_boundaries() {
        let wrapped = wrap_text("ab ñññññññ", 3);
        assert_eq!(wrapped, vec!["ab", "ñññ", "ñññ", "ñ"]);
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate_cell("Description", 8), "Descr...");
        assert_eq!(truncate_cell("short", 8), "short");
        assert_eq!(truncate_cell("abcdef", 2), "ab");
    }

    #[test]
    fn export_content_reports_mode() {
        use physicalizer_core::types::ExportMode;
        assert_eq!(ExportContent::Summary("x").mode(), ExportMode::Summary);
        let t = table(&[&["a", "b"]]);
        assert_eq!(ExportContent::Table(&t).mode(), ExportMode::Table);
    }
}
