//! Plain-text to PDF rendering, used by demo flows to fabricate documents
//! (e.g. an agreement sent for signature).

use std::path::Path;

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, TextItem,
};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const TITLE_SIZE_PT: f32 = 16.0;
const BODY_SIZE_PT: f32 = 11.0;
const LINE_HEIGHT_MM: f32 = 6.0;

#[derive(Debug)]
pub enum PdfError {
    Io(std::io::Error),
    EmptyInput,
}

impl std::fmt::Display for PdfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdfError::Io(e) => write!(f, "io error: {e}"),
            PdfError::EmptyInput => write!(f, "refusing to render an empty document"),
        }
    }
}

impl std::error::Error for PdfError {}

impl From<std::io::Error> for PdfError {
    fn from(e: std::io::Error) -> Self {
        PdfError::Io(e)
    }
}

/// Render `title` plus body `lines` into PDF bytes, paginating on page
/// height. Long lines are not wrapped; callers supply pre-wrapped text.
pub fn text_to_pdf(title: &str, lines: &[String]) -> Result<Vec<u8>, PdfError> {
    if title.is_empty() && lines.iter().all(|line| line.trim().is_empty()) {
        return Err(PdfError::EmptyInput);
    }

    let lines_per_page =
        ((PAGE_HEIGHT_MM - 2.0 * MARGIN_MM - 2.0 * LINE_HEIGHT_MM) / LINE_HEIGHT_MM) as usize;

    let mut doc = PdfDocument::new(title);
    let mut pages = Vec::new();

    for (page_index, chunk) in lines.chunks(lines_per_page.max(1)).enumerate() {
        let mut ops = Vec::new();
        let mut cursor_y = PAGE_HEIGHT_MM - MARGIN_MM;

        if page_index == 0 {
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(TITLE_SIZE_PT),
                font: BuiltinFont::HelveticaBold,
            });
            ops.push(Op::SetTextCursor {
                pos: Point::new(Mm(MARGIN_MM), Mm(cursor_y)),
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(title.to_string())],
                font: BuiltinFont::HelveticaBold,
            });
            cursor_y -= 2.0 * LINE_HEIGHT_MM;
        }

        for line in chunk {
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(BODY_SIZE_PT),
                font: BuiltinFont::Helvetica,
            });
            ops.push(Op::SetTextCursor {
                pos: Point::new(Mm(MARGIN_MM), Mm(cursor_y)),
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(line.clone())],
                font: BuiltinFont::Helvetica,
            });
            cursor_y -= LINE_HEIGHT_MM;
        }

        pages.push(PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops));
    }

    if pages.is_empty() {
        // Title-only document still renders one page.
        let ops = vec![
            Op::SetFontSizeBuiltinFont {
                size: Pt(TITLE_SIZE_PT),
                font: BuiltinFont::HelveticaBold,
            },
            Op::SetTextCursor {
                pos: Point::new(Mm(MARGIN_MM), Mm(PAGE_HEIGHT_MM - MARGIN_MM)),
            },
            Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(title.to_string())],
                font: BuiltinFont::HelveticaBold,
            },
        ];
        pages.push(PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops));
    }

    let mut warnings = Vec::new();
    Ok(doc
        .with_pages(pages)
        .save(&PdfSaveOptions::default(), &mut warnings))
}

/// Render and write straight to `path`.
pub fn write_text_pdf(path: &Path, title: &str, lines: &[String]) -> Result<(), PdfError> {
    let bytes = text_to_pdf(title, lines)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
