//! # Spreadsheet Export
//!
//! Writes the stored result to an `.xlsx` workbook with four sheets:
//!
//! | Sheet             | Contents                                          |
//! |-------------------|---------------------------------------------------|
//! | `Component Costs` | One row per component, same columns as the report |
//! | `Price Chart`     | Selling price, margin and net price per tier      |
//! | `Summary`         | Product name, PCD, total and per-component cost   |
//! | `Inputs`          | Every raw input with its unit and the mm value    |
//!
//! Amounts are written as numbers with a `0.00` format so they stay usable in
//! formulas.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::info;

use crate::errors::{CalcError, CalcResult};
use crate::fields::MeasurementField;
use crate::pcd::PcdSelection;
use crate::presenter::{COMPONENT_HEADERS, PRICE_HEADERS};
use crate::request::RateField;
use crate::session::StoredResult;
use crate::units::sanitize;

pub const COMPONENT_SHEET: &str = "Component Costs";
pub const PRICE_SHEET: &str = "Price Chart";
pub const SUMMARY_SHEET: &str = "Summary";
pub const INPUTS_SHEET: &str = "Inputs";

fn xlsx_error(e: XlsxError) -> CalcError {
    CalcError::render_failed("xlsx", e.to_string())
}

fn write_headers(sheet: &mut Worksheet, headers: &[&str], bold: &Format) -> Result<(), XlsxError> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, bold)?;
        sheet.set_column_width(col as u16, 18)?;
    }
    Ok(())
}

fn component_sheet(sheet: &mut Worksheet, stored: &StoredResult, bold: &Format, amount: &Format) -> Result<(), XlsxError> {
    sheet.set_name(COMPONENT_SHEET)?;
    write_headers(sheet, &COMPONENT_HEADERS, bold)?;

    for (row, (kind, cost)) in (1u32..).zip(stored.result.components.iter()) {
        sheet.write_string(row, 0, kind.display_name())?;
        let values = [
            cost.raw_size,
            cost.length,
            cost.cost_per_kg,
            cost.raw_material_cost,
            cost.processing_cost,
            cost.heat_treatment_cost,
            cost.production_cost,
        ];
        for (col, value) in (1u16..).zip(values) {
            sheet.write_number_with_format(row, col, value, amount)?;
        }
    }
    Ok(())
}

fn price_sheet(sheet: &mut Worksheet, stored: &StoredResult, bold: &Format, amount: &Format) -> Result<(), XlsxError> {
    sheet.set_name(PRICE_SHEET)?;
    write_headers(sheet, &PRICE_HEADERS, bold)?;

    for (row, tier) in (1u32..).zip(&stored.result.price_chart) {
        sheet.write_number_with_format(row, 0, tier.selling_price, amount)?;
        sheet.write_string(row, 1, &tier.margin_label)?;
        sheet.write_number_with_format(row, 2, tier.net_price_incl_tax, amount)?;
    }
    Ok(())
}

fn summary_sheet(sheet: &mut Worksheet, stored: &StoredResult, bold: &Format, amount: &Format) -> Result<(), XlsxError> {
    let result = &stored.result;
    sheet.set_name(SUMMARY_SHEET)?;
    sheet.set_column_width(0, 28)?;
    sheet.set_column_width(1, 22)?;

    sheet.write_string_with_format(0, 0, "Product Information", bold)?;
    sheet.write_string(1, 0, "Product Name")?;
    sheet.write_string(1, 1, &result.product_name)?;
    sheet.write_string(2, 0, "PCD (mm)")?;
    sheet.write_number_with_format(2, 1, result.pcd_mm, amount)?;
    sheet.write_string(3, 0, "Total Production Cost (Rs.)")?;
    sheet.write_number_with_format(3, 1, result.total_production_cost, amount)?;

    sheet.write_string_with_format(5, 0, "Component Costs", bold)?;
    for (row, (kind, cost)) in (6u32..).zip(result.components.iter()) {
        sheet.write_string(row, 0, kind.display_name())?;
        sheet.write_number_with_format(row, 1, cost.production_cost, amount)?;
    }
    Ok(())
}

fn inputs_sheet(sheet: &mut Worksheet, stored: &StoredResult, bold: &Format) -> Result<(), XlsxError> {
    let submission = &stored.submission;
    sheet.set_name(INPUTS_SHEET)?;
    write_headers(sheet, &["Input", "Value", "Unit", "Value (mm)"], bold)?;
    sheet.set_column_width(0, 24)?;

    let mut row = 1u32;
    for field in MeasurementField::MEASUREMENTS {
        let input = submission.input(field);
        sheet.write_string(row, 0, field.label())?;
        sheet.write_number(row, 1, input.value())?;
        sheet.write_string(row, 2, input.unit.label())?;
        sheet.write_number(row, 3, submission.request.measurement(field))?;
        row += 1;
    }

    sheet.write_string(row, 0, "Number of Teeth")?;
    sheet.write_number(row, 1, sanitize(submission.raw_teeth))?;
    row += 1;

    sheet.write_string(row, 0, "PCD")?;
    match submission.pcd_selection {
        PcdSelection::Automatic => {
            sheet.write_string(row, 1, "automatic")?;
        }
        PcdSelection::Manual { value, unit } => {
            sheet.write_number(row, 1, sanitize(value))?;
            sheet.write_string(row, 2, unit.label())?;
        }
    }
    sheet.write_number(row, 3, submission.request.pcd)?;
    row += 1;

    sheet.write_string(row, 0, "Chain Type")?;
    sheet.write_string(row, 1, &submission.request.chain_type)?;
    row += 1;

    for rate in RateField::ALL {
        sheet.write_string(row, 0, rate.label())?;
        sheet.write_number(row, 1, submission.request.rates.get(rate))?;
        row += 1;
    }
    Ok(())
}

/// Build the workbook in memory.
pub fn render_workbook(stored: &StoredResult) -> CalcResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let amount = Format::new().set_num_format("0.00");

    component_sheet(workbook.add_worksheet(), stored, &bold, &amount).map_err(xlsx_error)?;
    price_sheet(workbook.add_worksheet(), stored, &bold, &amount).map_err(xlsx_error)?;
    summary_sheet(workbook.add_worksheet(), stored, &bold, &amount).map_err(xlsx_error)?;
    inputs_sheet(workbook.add_worksheet(), stored, &bold).map_err(xlsx_error)?;

    let bytes = workbook.save_to_buffer().map_err(xlsx_error)?;
    info!(
        product = %stored.result.product_name,
        bytes = bytes.len(),
        "rendered spreadsheet"
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FormEdit, PcdMode, SprocketForm};
    use crate::units::LengthUnit;
    use calamine::{Reader, Xlsx};
    use std::io::Cursor;

    fn sample() -> StoredResult {
        let mut form = SprocketForm::new();
        form.apply(FormEdit::unit(MeasurementField::ChainPitch, LengthUnit::Inches));
        form.apply(FormEdit::measurement(MeasurementField::ChainPitch, "0.5"));
        form.apply(FormEdit::Teeth("40".to_string()));
        form.apply(FormEdit::measurement(MeasurementField::OuterDiameter, "170"));
        form.apply(FormEdit::SelectPcd(PcdMode::Manual));
        form.apply(FormEdit::measurement(MeasurementField::ManualPcd, "160"));
        form.apply(FormEdit::rate(RateField::HubPc, "80"));
        let submission = form.submit();
        let result = crate::costing::calculate(&submission.request).unwrap();
        StoredResult { submission, result }
    }

    type Book = Xlsx<Cursor<Vec<u8>>>;

    fn read_back(bytes: Vec<u8>) -> Book {
        Xlsx::new(Cursor::new(bytes)).unwrap()
    }

    fn cell(workbook: &mut Book, sheet: &str, pos: (u32, u32)) -> String {
        let range = workbook.worksheet_range(sheet).unwrap();
        range.get_value(pos).map(|v| v.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_sheet_names() {
        let stored = sample();
        let mut workbook = read_back(render_workbook(&stored).unwrap());
        assert_eq!(
            workbook.sheet_names(),
            vec![COMPONENT_SHEET, PRICE_SHEET, SUMMARY_SHEET, INPUTS_SHEET]
        );
        assert_eq!(cell(&mut workbook, COMPONENT_SHEET, (0, 1)), "RAW SIZE (mm)");
    }

    #[test]
    fn test_component_and_price_values() {
        let stored = sample();
        let mut workbook = read_back(render_workbook(&stored).unwrap());

        assert_eq!(cell(&mut workbook, COMPONENT_SHEET, (1, 0)), "Sprocket");
        assert_eq!(cell(&mut workbook, COMPONENT_SHEET, (1, 1)), "180");
        assert_eq!(cell(&mut workbook, COMPONENT_SHEET, (2, 0)), "Hub");
        assert_eq!(cell(&mut workbook, COMPONENT_SHEET, (2, 5)), "80");
        assert_eq!(cell(&mut workbook, PRICE_SHEET, (1, 1)), "40%");
        assert_eq!(cell(&mut workbook, PRICE_SHEET, (5, 1)), "80%");
    }

    #[test]
    fn test_summary_and_inputs() {
        let stored = sample();
        let mut workbook = read_back(render_workbook(&stored).unwrap());

        assert_eq!(cell(&mut workbook, SUMMARY_SHEET, (1, 1)), "12.7X40");
        assert_eq!(cell(&mut workbook, SUMMARY_SHEET, (2, 1)), "160");

        assert_eq!(cell(&mut workbook, INPUTS_SHEET, (1, 0)), "Chain Pitch");
        assert_eq!(cell(&mut workbook, INPUTS_SHEET, (1, 1)), "0.5");
        assert_eq!(cell(&mut workbook, INPUTS_SHEET, (1, 2)), "inches");
        assert_eq!(cell(&mut workbook, INPUTS_SHEET, (1, 3)), "12.7");
    }

    #[test]
    fn test_inputs_sheet_defaults_garbage() {
        let mut form = SprocketForm::new();
        form.apply(FormEdit::measurement(MeasurementField::ChainPitch, "12.7"));
        form.apply(FormEdit::Teeth("NaN".to_string()));
        form.apply(FormEdit::SelectPcd(PcdMode::Manual));
        form.apply(FormEdit::unit(MeasurementField::ManualPcd, LengthUnit::Inches));
        form.apply(FormEdit::measurement(MeasurementField::ManualPcd, "-5"));
        let submission = form.submit();
        let result = crate::costing::calculate(&submission.request).unwrap();
        let stored = StoredResult { submission, result };

        let mut workbook = read_back(render_workbook(&stored).unwrap());
        // rows: header, six measurements, teeth, PCD
        assert_eq!(cell(&mut workbook, INPUTS_SHEET, (7, 0)), "Number of Teeth");
        assert_eq!(cell(&mut workbook, INPUTS_SHEET, (7, 1)), "0");
        assert_eq!(cell(&mut workbook, INPUTS_SHEET, (8, 0)), "PCD");
        assert_eq!(cell(&mut workbook, INPUTS_SHEET, (8, 1)), "0");
        assert_eq!(cell(&mut workbook, INPUTS_SHEET, (8, 2)), "inches");
    }
}
