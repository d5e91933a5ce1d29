// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::ChartKind;
use crate::aggregate::Filtered;
use crate::error::{Error, Result};
use crate::models::{LedgerEntry, RecordKind};
use crate::utils::checked_sum;

const SIZE: (u32, u32) = (960, 640);

fn draw_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Render(e.to_string())
}

fn to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or_default()
}

fn accumulate(slot: &mut Decimal, v: Decimal, what: &'static str) -> Result<()> {
    *slot = slot.checked_add(v).ok_or(Error::Overflow { what })?;
    Ok(())
}

/// Amount summed per descriptive field, ordered by label.
pub fn breakdown(rows: &[LedgerEntry]) -> Result<BTreeMap<String, Decimal>> {
    let mut out = BTreeMap::new();
    for e in rows {
        let slot = out.entry(e.label().to_string()).or_insert(Decimal::ZERO);
        accumulate(slot, e.amount(), "breakdown")?;
    }
    Ok(out)
}

/// Amount summed per calendar day.
pub fn daily_series(rows: &[LedgerEntry]) -> Result<BTreeMap<NaiveDate, Decimal>> {
    let mut out = BTreeMap::new();
    for e in rows {
        accumulate(out.entry(e.day()).or_insert(Decimal::ZERO), e.amount(), "daily series")?;
    }
    Ok(out)
}

/// Puts two day series on the union of their days. A day missing from one
/// side counts as zero on that side.
pub fn align(
    a: &BTreeMap<NaiveDate, Decimal>,
    b: &BTreeMap<NaiveDate, Decimal>,
) -> BTreeMap<NaiveDate, (Decimal, Decimal)> {
    let mut out: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    for (d, v) in a {
        out.entry(*d).or_default().0 = *v;
    }
    for (d, v) in b {
        out.entry(*d).or_default().1 = *v;
    }
    out
}

/// Renders one chart kind as an SVG document.
pub fn draw(kind: ChartKind, data: &Filtered) -> Result<String> {
    match kind {
        ChartKind::Breakdown(k) => {
            let groups = breakdown(data.of(k))?;
            let bars: Vec<(String, f64)> =
                groups.into_iter().map(|(l, v)| (l, to_f64(v))).collect();
            let field = k.label_column();
            let field = format!("{}{}", field[..1].to_uppercase(), &field[1..]);
            bar_svg(&format!("{} by {}", k.plural(), field), &field, &bars)
        }
        ChartKind::Comparison => {
            let bars: Vec<(String, f64)> = [
                RecordKind::Expense,
                RecordKind::Income,
                RecordKind::Investment,
            ]
            .iter()
            .map(|k| {
                let total = checked_sum(k.plural(), data.of(*k).iter().map(LedgerEntry::amount))?;
                Ok((k.plural().to_string(), to_f64(total)))
            })
            .collect::<Result<_>>()?;
            bar_svg("Expenses vs Income vs Investments", "Category", &bars)
        }
        ChartKind::Overlay(a, b) => {
            let aligned = align(&daily_series(data.of(a))?, &daily_series(data.of(b))?);
            overlay_svg(
                &format!("{} vs {}", a.plural(), b.plural()),
                (a.plural(), b.plural()),
                &aligned,
            )
        }
    }
}

fn bar_svg(title: &str, x_desc: &str, bars: &[(String, f64)]) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let n = bars.len().max(1) as u32;
        let top = bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
        let top = if top > 0.0 { top * 1.1 } else { 1.0 };

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d((0u32..n).into_segmented(), 0f64..top)
            .map_err(draw_err)?;

        let label_of = |v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(i) => bars
                .get(*i as usize)
                .map(|(l, _)| l.clone())
                .unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(x_desc)
            .y_desc("Amount")
            .x_labels(n as usize + 1)
            .x_label_formatter(&label_of)
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(bars.iter().enumerate().map(|(i, (_, v))| {
                let i = i as u32;
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
                    BLUE.mix(0.7).filled(),
                );
                bar.set_margin(0, 0, 10, 10);
                bar
            }))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
    }
    Ok(svg)
}

fn overlay_svg(
    title: &str,
    names: (&str, &str),
    series: &BTreeMap<NaiveDate, (Decimal, Decimal)>,
) -> Result<String> {
    let days: Vec<NaiveDate> = series.keys().copied().collect();
    let points: Vec<(f64, f64)> = series
        .values()
        .map(|(a, b)| (to_f64(*a), to_f64(*b)))
        .collect();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let n = days.len().max(1) as u32;
        let top = points
            .iter()
            .map(|(a, b)| a.max(*b))
            .fold(0.0_f64, f64::max);
        let top = if top > 0.0 { top * 1.1 } else { 1.0 };

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d((0u32..n).into_segmented(), 0f64..top)
            .map_err(draw_err)?;

        let day_of = |v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(i) => days
                .get(*i as usize)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Amount")
            .x_labels((n as usize).min(12))
            .x_label_formatter(&day_of)
            .draw()
            .map_err(draw_err)?;

        for (idx, (name, color)) in [(names.0, RED), (names.1, BLUE)].into_iter().enumerate() {
            let line = points.iter().enumerate().map(|(i, p)| {
                let y = if idx == 0 { p.0 } else { p.1 };
                (SegmentValue::CenterOf(i as u32), y)
            });
            chart
                .draw_series(LineSeries::new(line, color.stroke_width(2)))
                .map_err(draw_err)?
                .label(name)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
    }
    Ok(svg)
}
