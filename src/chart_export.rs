//! Bar chart export to PNG (plotters bitmap) and EPS (minimal PostScript, no deps).

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::chart_data::{format_value, nice_ticks, BarSeries};

/// Export format for chart: PNG or EPS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartExportFormat {
    Png,
    Eps,
}

impl ChartExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Eps => "eps",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Eps => "EPS",
        }
    }
}

/// Write `series` into `dir` as `<title>.<ext>` and return the file path.
pub fn export_bars(dir: &Path, series: &BarSeries, format: ChartExportFormat) -> Result<PathBuf> {
    let path = dir.join(format!("{}.{}", series.file_stem(), format.extension()));
    match format {
        ChartExportFormat::Png => write_bars_png(&path, series)?,
        ChartExportFormat::Eps => write_bars_eps(&path, series)?,
    }
    tracing::info!(path = %path.display(), format = format.as_str(), "exported chart");
    Ok(path)
}

/// Escape a string for PostScript ( and ) and \.
fn ps_escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Write bar chart to EPS (Encapsulated PostScript).
pub fn write_bars_eps(path: &Path, series: &BarSeries) -> Result<()> {
    let (y_min, y_max) = series
        .value_range()
        .ok_or_else(|| eyre!("No data to export"))?;

    const W: f64 = 480.0;
    const H: f64 = 300.0;
    const MARGIN_LEFT: f64 = 60.0;
    const MARGIN_BOTTOM: f64 = 50.0;
    const PLOT_W: f64 = W - MARGIN_LEFT - 20.0;
    const PLOT_H: f64 = H - MARGIN_BOTTOM - 40.0;

    let y_range = if y_max > y_min { y_max - y_min } else { 1.0 };
    let to_y = |y: f64| MARGIN_BOTTOM + (y - y_min) / y_range * PLOT_H;
    let slot = PLOT_W / series.bars.len() as f64;

    let mut f = File::create(path)?;

    writeln!(f, "%!PS-Adobe-3.0 EPSF-3.0")?;
    writeln!(f, "%%BoundingBox: 0 0 {} {}", W as i32, H as i32)?;
    writeln!(f, "%%Title: ({})", ps_escape(&series.title))?;
    writeln!(f, "%%Creator: salesdash")?;
    writeln!(f, "%%EndComments")?;
    writeln!(f, "gsave")?;

    // Grid (light gray, behind bars)
    let y_ticks = nice_ticks(y_min, y_max, 6);
    writeln!(f, "0.9 setgray")?;
    writeln!(f, "0.5 setlinewidth")?;
    for &v in &y_ticks {
        let py = to_y(v);
        if (MARGIN_BOTTOM..=MARGIN_BOTTOM + PLOT_H).contains(&py) {
            writeln!(f, "{} {} moveto {} 0 rlineto stroke", MARGIN_LEFT, py, PLOT_W)?;
        }
    }
    writeln!(f, "1 setlinewidth")?;
    writeln!(f, "0 setgray")?;

    // Axis box
    writeln!(f, "{} {} moveto", MARGIN_LEFT, MARGIN_BOTTOM)?;
    writeln!(f, "{} 0 rlineto", PLOT_W)?;
    writeln!(f, "0 {} rlineto", PLOT_H)?;
    writeln!(f, "{} 0 rlineto", -PLOT_W)?;
    writeln!(f, "closepath stroke")?;

    // Value labels on the y axis
    writeln!(f, "/Helvetica findfont 9 scalefont setfont")?;
    let char_w: f64 = 5.0;
    for &v in &y_ticks {
        let py = to_y(v);
        if (MARGIN_BOTTOM..=MARGIN_BOTTOM + PLOT_H).contains(&py) {
            let s = format_value(v);
            let tx = (MARGIN_LEFT - s.len() as f64 * char_w - 4.0).max(2.0);
            writeln!(f, "{} {} moveto ({}) show", tx, py - 3.0, ps_escape(&s))?;
        }
    }

    // Bars, one slot per label; NaN values leave the slot empty
    let baseline = to_y(0.0);
    let bar_w = slot * 0.7;
    writeln!(f, "0.2 0.6 0.8 setrgbcolor")?;
    for (i, _, v) in series.finite() {
        let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_w) / 2.0;
        writeln!(f, "{} {} {} {} rectfill", x, baseline, bar_w, to_y(v) - baseline)?;
    }
    writeln!(f, "0 setgray")?;

    // Category labels under each slot, rotated to fit
    for (i, (label, _)) in series.bars.iter().enumerate() {
        let cx = MARGIN_LEFT + slot * (i as f64 + 0.5);
        writeln!(f, "gsave")?;
        writeln!(f, "{} {} translate 45 rotate", cx + 3.0, MARGIN_BOTTOM - 8.0)?;
        let w = label.len() as f64 * char_w;
        writeln!(f, "{} 0 moveto ({}) show", -w, ps_escape(label))?;
        writeln!(f, "grestore")?;
    }

    // Title and value axis name
    writeln!(f, "/Helvetica findfont 11 scalefont setfont")?;
    writeln!(
        f,
        "{} {} moveto ({}) show",
        MARGIN_LEFT,
        H - 25.0,
        ps_escape(&series.title)
    )?;
    writeln!(f, "gsave")?;
    writeln!(f, "12 {} translate 90 rotate", MARGIN_BOTTOM + PLOT_H / 2.0)?;
    writeln!(
        f,
        "{} 0 moveto ({}) show",
        -(series.value_label.len() as f64 * char_w) / 2.0,
        ps_escape(&series.value_label)
    )?;
    writeln!(f, "grestore")?;

    writeln!(f, "grestore")?;
    writeln!(f, "%%EOF")?;
    f.sync_all()?;
    Ok(())
}

/// Write bar chart to PNG using plotters bitmap backend.
pub fn write_bars_png(path: &Path, series: &BarSeries) -> Result<()> {
    use plotters::prelude::*;

    let (y_min, y_max) = series
        .value_range()
        .ok_or_else(|| eyre!("No data to export"))?;
    let y_max = if y_max > y_min { y_max } else { y_min + 1.0 };
    let labels: Vec<&str> = series.bars.iter().map(|(l, _)| l.as_str()).collect();

    let root = BitMapBackend::new(path, (800, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(series.title.as_str(), ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..labels.len() as f64, y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|x| {
            labels
                .get(x.floor() as usize)
                .map(|l| l.to_string())
                .unwrap_or_default()
        })
        .y_label_formatter(&|y| format_value(*y))
        .y_desc(series.value_label.as_str())
        .draw()?;

    let color = RGBColor(51, 153, 204);
    chart.draw_series(series.finite().map(|(i, _, v)| {
        let x = i as f64;
        Rectangle::new([(x + 0.15, 0.0), (x + 0.85, v)], color.filled())
    }))?;

    root.present()?;
    Ok(())
}
