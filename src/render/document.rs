// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io::{BufWriter, Cursor};

use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb};
use rust_decimal::Decimal;

use crate::aggregate::{Report, ReportRequest, Scope, Totals};
use crate::error::{Error, Result};
use crate::models::LedgerEntry;
use crate::utils::{checked_sum, fmt_money};

/// Columns of the full listing. Cells that do not apply to a row's kind are
/// left blank.
pub const LISTING_COLUMNS: [&str; 11] = [
    "kind",
    "id",
    "amount",
    "date",
    "category",
    "source",
    "type",
    "roi",
    "interval",
    "start_date",
    "reason",
];

pub fn title(req: &ReportRequest) -> String {
    let scope = match req.scope {
        Scope::Totals => "Totals",
        Scope::Full => "Full breakdown",
    };
    format!("Financial Report - {} ({})", scope, req.window)
}

pub fn listing_row(e: &LedgerEntry) -> Vec<String> {
    let mut row = vec![String::new(); LISTING_COLUMNS.len()];
    row[0] = e.kind().tag().to_string();
    row[1] = e.id().to_string();
    row[2] = e.amount().to_string();
    match e {
        LedgerEntry::Expense(x) => {
            row[3] = e.stamp();
            row[4] = x.category.clone();
        }
        LedgerEntry::Income(x) => {
            row[3] = e.stamp();
            row[5] = x.source.clone();
        }
        LedgerEntry::Investment(x) => {
            row[6] = x.r#type.clone();
            row[7] = x.roi.to_string();
            row[8] = x.interval.clone();
            row[9] = e.stamp();
        }
        LedgerEntry::Loss(x) => {
            row[3] = e.stamp();
            row[10] = x.reason.clone();
        }
    }
    row
}

/// Header and rows for either report shape.
pub fn table(report: &Report) -> (Vec<&'static str>, Vec<Vec<String>>) {
    match report {
        Report::Totals(t) => (
            Totals::FIELDS.to_vec(),
            vec![t.values().iter().map(Decimal::to_string).collect()],
        ),
        Report::Full(rows) => (
            LISTING_COLUMNS.to_vec(),
            rows.iter().map(listing_row).collect(),
        ),
    }
}

/// Sums of the numeric columns, drawn on the PDF summary page.
pub fn numeric_sums(report: &Report) -> Result<Vec<(String, Decimal)>> {
    Ok(match report {
        Report::Totals(t) => Totals::FIELDS
            .iter()
            .zip(t.values())
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        Report::Full(rows) => vec![
            (
                "amount".into(),
                checked_sum("amount", rows.iter().map(LedgerEntry::amount))?,
            ),
            (
                "roi".into(),
                checked_sum(
                    "roi",
                    rows.iter()
                        .filter_map(LedgerEntry::as_investment)
                        .map(|v| v.roi),
                )?,
            ),
        ],
    })
}

pub fn to_csv(report: &Report) -> Result<Vec<u8>> {
    let (headers, rows) = table(report);
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(&headers)?;
    for r in rows {
        wtr.write_record(&r)?;
    }
    wtr.into_inner().map_err(|e| Error::Io(e.into_error()))
}

const A4_SHORT: f32 = 210.0;
const A4_LONG: f32 = 297.0;
const MARGIN: f32 = 12.0;
const LINE: f32 = 6.0;
/// Helvetica digit advance, in em. Digits are the widest glyphs in dates and
/// amounts.
const DIGIT_EM: f32 = 0.556;
const MM_PER_PT: f32 = 25.4 / 72.0;

/// Page geometry for one table. Wide tables go landscape, and the clip
/// length is derived from the column width so cells never overrun.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Layout {
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub col_w: f32,
    pub max_chars: usize,
    pub rows_per_page: usize,
}

impl Layout {
    pub(crate) fn for_columns(columns: usize) -> Self {
        let columns = columns.max(1);
        let (width, height, font_size) = if columns > 6 {
            (A4_LONG, A4_SHORT, 7.0)
        } else {
            (A4_SHORT, A4_LONG, 9.0)
        };
        let col_w = (width - 2.0 * MARGIN) / columns as f32;
        let char_w = DIGIT_EM * font_size * MM_PER_PT;
        // title, header and footer take three lines plus the margins
        let body = height - 2.0 * MARGIN - 4.0 - 3.0 * LINE;
        Layout {
            width,
            height,
            font_size,
            col_w,
            max_chars: ((col_w - 1.0) / char_w).floor() as usize,
            rows_per_page: (body / LINE).floor() as usize,
        }
    }
}

fn pdf_err<E: std::fmt::Debug>(e: E) -> Error {
    Error::Render(format!("pdf: {:?}", e))
}

fn ink(layer: &PdfLayerReference, r: f32, g: f32, b: f32) {
    layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
}

fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max.saturating_sub(1)).collect();
        t.push('~');
        t
    }
}

/// Paginated table followed by a summary page with one horizontal bar per
/// numeric column sum.
pub fn to_pdf(report: &Report, title: &str) -> Result<Vec<u8>> {
    let (headers, rows) = table(report);
    let sums = numeric_sums(report)?;
    let lay = Layout::for_columns(headers.len());
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(lay.width), Mm(lay.height), "Layer 1");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_err)?;

    let chunks: Vec<&[Vec<String>]> = if rows.is_empty() {
        vec![rows.as_slice()]
    } else {
        rows.chunks(lay.rows_per_page).collect()
    };
    let pages = chunks.len() + 1;

    for (n, chunk) in chunks.iter().enumerate() {
        let layer = if n == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = doc.add_page(Mm(lay.width), Mm(lay.height), "Layer 1");
            doc.get_page(p).get_layer(l)
        };
        let mut y = lay.height - MARGIN - 4.0;
        layer.use_text(title, 14.0, Mm(MARGIN), Mm(y), &bold);
        y -= LINE * 2.0;
        for (i, h) in headers.iter().enumerate() {
            layer.use_text(
                clip(h, lay.max_chars),
                lay.font_size,
                Mm(MARGIN + i as f32 * lay.col_w),
                Mm(y),
                &bold,
            );
        }
        y -= LINE;
        for row in chunk.iter() {
            for (i, cell) in row.iter().enumerate() {
                layer.use_text(
                    clip(cell, lay.max_chars),
                    lay.font_size,
                    Mm(MARGIN + i as f32 * lay.col_w),
                    Mm(y),
                    &font,
                );
            }
            y -= LINE;
        }
        if chunk.is_empty() {
            layer.use_text("No entries in this window.", 10.0, Mm(MARGIN), Mm(y), &font);
        }
        footer(&layer, &font, &lay, n + 1, pages);
    }

    let (p, l) = doc.add_page(Mm(lay.width), Mm(lay.height), "Layer 1");
    let layer = doc.get_page(p).get_layer(l);
    summary_page(&layer, &font, &bold, &lay, &sums);
    footer(&layer, &font, &lay, pages, pages);

    let mut out = Cursor::new(Vec::new());
    doc.save(&mut BufWriter::new(&mut out)).map_err(pdf_err)?;
    Ok(out.into_inner())
}

fn footer(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    lay: &Layout,
    page: usize,
    pages: usize,
) {
    layer.use_text(
        format!("Page {} of {}", page, pages),
        8.0,
        Mm(lay.width - MARGIN - 22.0),
        Mm(MARGIN - 4.0),
        font,
    );
}

fn summary_page(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
    lay: &Layout,
    sums: &[(String, Decimal)],
) {
    use rust_decimal::prelude::ToPrimitive;

    let top = lay.height - MARGIN - 4.0;
    layer.use_text("Financial Overview", 16.0, Mm(MARGIN), Mm(top), bold);

    let label_w = 45.0;
    let bar_max = lay.width - 2.0 * MARGIN - label_w - 30.0;
    let largest = sums
        .iter()
        .filter_map(|(_, v)| v.abs().to_f32())
        .fold(0.0_f32, f32::max);
    let mut y = top - 20.0;
    for (label, value) in sums {
        let len = if largest > 0.0 {
            value.abs().to_f32().unwrap_or(0.0) / largest * bar_max
        } else {
            0.0
        };
        let x0 = MARGIN + label_w;
        ink(layer, 0.0, 0.0, 0.0);
        layer.use_text(label.as_str(), 10.0, Mm(MARGIN), Mm(y + 2.0), font);
        if len > 0.0 {
            ink(layer, 0.22, 0.42, 0.69);
            layer.add_rect(Rect::new(Mm(x0), Mm(y), Mm(x0 + len), Mm(y + 7.0)));
        }
        ink(layer, 0.0, 0.0, 0.0);
        layer.use_text(fmt_money(value), 9.0, Mm(x0 + len + 2.0), Mm(y + 2.0), font);
        y -= 14.0;
    }
}
