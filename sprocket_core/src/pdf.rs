//! # PDF Report Generation
//!
//! Renders the manufacturing report for a stored result using Typst.
//!
//! The layout lives in `templates/report.typ`, embedded into the binary. This
//! module fills its placeholders from a [`ResultView`] and compiles the
//! result in a minimal in-memory Typst world using the fonts bundled with
//! `typst-assets`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sprocket_core::form::SprocketForm;
//! use sprocket_core::pdf::render_report_pdf;
//! use sprocket_core::session::StoredResult;
//!
//! let submission = SprocketForm::new().submit();
//! let result = sprocket_core::costing::calculate(&submission.request).unwrap();
//! let pdf = render_report_pdf(&StoredResult { submission, result }).unwrap();
//! assert!(pdf.starts_with(b"%PDF"));
//! ```

use chrono::{DateTime, Local, TimeZone, Utc};
use once_cell::sync::Lazy;
use rust_embed::RustEmbed;
use tracing::{debug, info};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::errors::{CalcError, CalcResult};
use crate::presenter::{ResultView, COMPONENT_HEADERS, PRICE_HEADERS};
use crate::session::StoredResult;

const REPORT_TEMPLATE: &str = "report.typ";

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

/// Bundled fonts, parsed once per process
static FONTS: Lazy<Vec<Font>> = Lazy::new(|| {
    let fonts: Vec<Font> = typst_assets::fonts()
        .flat_map(|data| Font::iter(Bytes::new(data.to_vec())))
        .collect();
    debug!(count = fonts.len(), "loaded report fonts");
    fonts
});

// ============================================================================
// Typst World Implementation
// ============================================================================

/// A minimal Typst world for compiling documents without external files.
struct PdfWorld {
    main: Source,
    book: LazyHash<FontBook>,
    fonts: &'static [Font],
    library: LazyHash<Library>,
}

impl PdfWorld {
    fn new(source: String) -> Self {
        let fonts = FONTS.as_slice();
        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(FontBook::from_fonts(fonts)),
            fonts,
            library: LazyHash::new(Library::default()),
        }
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(
            now.format("%Y").to_string().parse().ok()?,
            now.format("%m").to_string().parse().ok()?,
            now.format("%d").to_string().parse().ok()?,
        )
    }
}

// ============================================================================
// Source generation
// ============================================================================

/// Quote text as a Typst string literal so it is never read as markup
fn typst_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// One table/grid row: `  "a", "b", "c",`
fn row(cells: &[&str]) -> String {
    let cells: Vec<String> = cells.iter().map(|cell| typst_string(cell)).collect();
    format!("  {},", cells.join(", "))
}

/// Header cells in bold white on the table fill
fn header_row(cells: &[&str]) -> String {
    let cells: Vec<String> = cells
        .iter()
        .map(|cell| format!("text(fill: white, weight: \"bold\", {})", typst_string(cell)))
        .collect();
    format!("    {},", cells.join(", "))
}

fn load_template() -> CalcResult<String> {
    let file = Templates::get(REPORT_TEMPLATE)
        .ok_or_else(|| CalcError::render_failed("pdf", format!("missing template {}", REPORT_TEMPLATE)))?;
    String::from_utf8(file.data.into_owned())
        .map_err(|e| CalcError::render_failed("pdf", format!("template is not UTF-8: {}", e)))
}

/// Typst source for the report, stamped with `generated_at`.
pub fn render_report_source<Tz>(stored: &StoredResult, generated_at: &DateTime<Tz>) -> CalcResult<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let view = ResultView::build(stored);

    let product_info_rows = view
        .product_info
        .iter()
        .map(|line| {
            format!(
                "  strong({}), {},",
                typst_string(&format!("{}:", line.label)),
                typst_string(&line.value)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let component_rows = view
        .components
        .iter()
        .map(|component| row(&component.cells()))
        .collect::<Vec<_>>()
        .join("\n");

    let price_rows = view
        .price_chart
        .iter()
        .map(|tier| row(&[tier.selling_price.as_str(), tier.margin.as_str(), tier.net_price.as_str()]))
        .collect::<Vec<_>>()
        .join("\n");

    let generated = generated_at.format("%B %-d, %Y at %I:%M %p").to_string();

    let source = load_template()?
        .replace("{{COMPONENT_HEADER}}", &header_row(&COMPONENT_HEADERS))
        .replace("{{PRICE_HEADER}}", &header_row(&PRICE_HEADERS))
        .replace("{{GENERATED_AT}}", &typst_string(&generated))
        .replace("{{TOTAL_PRODUCTION_COST}}", &typst_string(&view.total_production_cost))
        .replace("{{PRICE_ROWS}}", &price_rows)
        .replace("{{COMPONENT_ROWS}}", &component_rows)
        .replace("{{PRODUCT_INFO_ROWS}}", &product_info_rows);

    Ok(source)
}

/// Render the manufacturing report to PDF bytes.
///
/// # Errors
///
/// `RenderFailed` when the template is missing or Typst rejects the document.
pub fn render_report_pdf(stored: &StoredResult) -> CalcResult<Vec<u8>> {
    let source = render_report_source(stored, &Local::now())?;
    let world = PdfWorld::new(source);

    let warned = typst::compile(&world);

    let document = warned.output.map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::render_failed("pdf", format!("Typst compilation failed: {}", error_msgs.join("; ")))
    })?;

    let pdf_bytes = typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::render_failed("pdf", format!("PDF rendering failed: {}", error_msgs.join("; ")))
    })?;

    info!(
        product = %stored.result.product_name,
        bytes = pdf_bytes.len(),
        "rendered PDF report"
    );
    Ok(pdf_bytes)
}
