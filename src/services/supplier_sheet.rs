use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};

use crate::error::{ApiError, ApiResult};
use crate::models::catalog::Catalog;
use crate::models::quote::TourPackageQuote;
use crate::services::pricing_service::PricingService;

const SHEET_NAME: &str = "Supplier";
const MONEY_FORMAT: &str = "#,##0.00";
const LINE_HEADERS: [&str; 8] = [
    "Date", "City", "Hotel", "Type", "Item", "Qty", "Unit price", "Line total",
];
const HOTEL_HEADERS: [&str; 8] = [
    "Dates", "Hotel", "Room type", "Rooms", "Nights", "Price", "Extra bed", "Line total",
];

/// A priced service or guide line of the sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierLine {
    pub date: String,
    pub city: String,
    pub hotel: String,
    pub kind: String,
    pub item: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// One row per service and guide service, in itinerary order. Names of
/// entries deleted from the catalog show up blank.
pub fn supplier_lines(quote: &TourPackageQuote, catalog: &Catalog) -> Vec<SupplierLine> {
    let mut lines = Vec::new();

    for day in &quote.days {
        let date = day.date.format("%d-%b-%y").to_string();
        let city = catalog.city(&day.city_id).map(|c| c.name.clone()).unwrap_or_default();
        let hotel = catalog.hotel(&day.hotel_id).map(|h| h.name.clone()).unwrap_or_default();

        for line in &day.services {
            let service = catalog.service(&line.service_id);
            let quantity = line.quantity.max(1);
            lines.push(SupplierLine {
                date: date.clone(),
                city: city.clone(),
                hotel: hotel.clone(),
                kind: service.map(|s| catalog.service_type_name(s)).unwrap_or_default(),
                item: service.map(|s| s.name.clone()).unwrap_or_default(),
                quantity,
                unit_price: line.price_at_booking,
                line_total: PricingService::round_money(line.price_at_booking * Decimal::from(quantity)),
            });
        }

        for line in &day.guide_services {
            lines.push(SupplierLine {
                date: date.clone(),
                city: city.clone(),
                hotel: hotel.clone(),
                kind: "Guide".into(),
                item: catalog
                    .guide_service(&line.guide_service_id)
                    .map(|g| g.name.clone())
                    .unwrap_or_default(),
                quantity: 1,
                unit_price: line.price_at_booking,
                line_total: line.price_at_booking,
            });
        }
    }

    lines
}

fn money(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

fn write_headers(sheet: &mut Worksheet, row: u32, headers: &[&str], bold: &Format) -> ApiResult<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(row, col as u16, *header, bold)?;
    }
    Ok(())
}

/// Supplier and accounting workbook for a quote, as xlsx bytes.
pub fn build_supplier_sheet(quote: &TourPackageQuote, catalog: &Catalog) -> ApiResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let title = Format::new().set_bold().set_font_size(14);
    let amount = Format::new().set_num_format(MONEY_FORMAT);
    let total = Format::new()
        .set_bold()
        .set_num_format(MONEY_FORMAT)
        .set_align(FormatAlign::Right);

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    for (col, width) in [12.0, 16.0, 22.0, 14.0, 34.0, 8.0, 12.0, 12.0].iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }

    let pack = catalog
        .tour_pack_type(&quote.tour_pack_type_id)
        .map(|t| t.name.clone())
        .unwrap_or_default();

    sheet.write_string_with_format(0, 0, &quote.name, &title)?;
    let header_rows = [
        ("Package reference", quote.package_reference.to_string()),
        ("Customer", quote.customer_name.clone()),
        ("Tour package type", pack),
        ("Remark", quote.remark.clone().unwrap_or_default()),
    ];
    for (offset, (label, value)) in header_rows.iter().enumerate() {
        let row = 1 + offset as u32;
        sheet.write_string_with_format(row, 0, *label, &bold)?;
        sheet.write_string(row, 1, value)?;
    }

    let mut row: u32 = 6;
    write_headers(sheet, row, &LINE_HEADERS, &bold)?;
    row += 1;
    for line in supplier_lines(quote, catalog) {
        sheet.write_string(row, 0, &line.date)?;
        sheet.write_string(row, 1, &line.city)?;
        sheet.write_string(row, 2, &line.hotel)?;
        sheet.write_string(row, 3, &line.kind)?;
        sheet.write_string(row, 4, &line.item)?;
        sheet.write_number(row, 5, line.quantity)?;
        sheet.write_number_with_format(row, 6, money(line.unit_price), &amount)?;
        sheet.write_number_with_format(row, 7, money(line.line_total), &amount)?;
        row += 1;
    }

    row += 1;
    sheet.write_string_with_format(row, 0, "Hotels", &title)?;
    row += 1;
    write_headers(sheet, row, &HOTEL_HEADERS, &bold)?;
    row += 1;
    for cost in &quote.hotel_costs {
        let line_total = PricingService::hotel_line_cost(cost)
            .ok_or_else(|| ApiError::internal(format!("hotel line {} overflows", cost.name)))?;
        sheet.write_string(row, 0, &cost.date)?;
        sheet.write_string(row, 1, &cost.name)?;
        sheet.write_string(row, 2, &cost.room_type)?;
        sheet.write_number(row, 3, cost.rooms)?;
        sheet.write_number(row, 4, cost.nights)?;
        sheet.write_number_with_format(row, 5, money(cost.price), &amount)?;
        sheet.write_number_with_format(row, 6, money(cost.extra_bed_price), &amount)?;
        sheet.write_number_with_format(row, 7, money(line_total), &amount)?;
        row += 1;
    }
    if let Some(remark) = quote.remark_of_hotels.as_deref().filter(|r| !r.is_empty()) {
        sheet.write_string(row, 1, remark)?;
        row += 1;
    }

    for (heading, adjustments) in [("Extra costs", &quote.extra_costs), ("Discounts", &quote.discounts)] {
        if adjustments.is_empty() {
            continue;
        }
        row += 1;
        sheet.write_string_with_format(row, 0, heading, &title)?;
        row += 1;
        for adjustment in adjustments {
            sheet.write_string(row, 4, &adjustment.item)?;
            sheet.write_number_with_format(row, 7, money(adjustment.amount), &amount)?;
            row += 1;
        }
    }

    let totals = &quote.totals;
    row += 1;
    let summary = [
        ("Service total", totals.service_total),
        ("Guide service total", totals.guide_service_total),
        ("Hotel total", totals.hotel_grand_total),
        ("Extra costs", totals.extra_costs_total),
        ("Discounts", totals.discounts_total),
        ("Grand total", totals.grand_total_cost),
        ("Hotel commission", totals.commission_amount_hotel),
        ("Service commission", totals.commission_amount_services),
    ];
    for (label, value) in summary {
        sheet.write_string_with_format(row, 6, label, &bold)?;
        sheet.write_number_with_format(row, 7, money(value), &total)?;
        row += 1;
    }

    let bytes = workbook.save_to_buffer()?;
    log::debug!(
        "Built supplier sheet for {} ({} bytes)",
        quote.package_reference,
        bytes.len()
    );
    Ok(bytes)
}
