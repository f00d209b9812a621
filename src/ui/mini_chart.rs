// ============================================================================
// Mini chart - Sparkline de la watchlist
// ============================================================================
// Aire + ligne sans axes, colorée selon la tendance de la série.
// La courbe occupe 90% de la hauteur (5% de marge en haut et en bas).
// Moins de 2 points : ligne plate au milieu.
// ============================================================================

use ratatui::{
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::canvas::{Canvas, Line as CanvasLine},
    Frame,
};

use crate::models::PriceSeries;
use crate::ui::chart::{render_flat_line, trend_color, DOTS_PER_CELL};

const HEIGHT_FRACTION: f64 = 0.9;

/// Assombrit une couleur RGB pour l'aire sous la courbe
fn dimmed(color: Color) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let scale = |c: u8| (c as f64 * 0.35) as u8;
            Color::Rgb(scale(r), scale(g), scale(b))
        }
        other => other,
    }
}

/// Bornes verticales pour que [min, max] occupe HEIGHT_FRACTION de la hauteur
pub fn sparkline_bounds(min: f64, max: f64) -> (f64, f64) {
    let span = max - min;
    if span <= 0.0 {
        return (min - 1.0, max + 1.0);
    }
    let pad = span * (1.0 - HEIGHT_FRACTION) / 2.0 / HEIGHT_FRACTION;
    (min - pad, max + pad)
}

pub fn render_mini_chart(frame: &mut Frame, area: Rect, series: &PriceSeries, background: Color) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let (Some((min, max)), Some((t0, t1))) = (series.price_bounds(), series.time_bounds()) else {
        render_flat_line(frame, area, series.is_positive(), background);
        return;
    };
    if !series.is_renderable() || t1 <= t0 {
        render_flat_line(frame, area, series.is_positive(), background);
        return;
    }

    let color = trend_color(series.is_positive());
    let fill = dimmed(color);
    let (lo, hi) = sparkline_bounds(min, max);
    let (x0, x1) = (t0 as f64, t1 as f64);
    let columns = (area.width as u32 * DOTS_PER_CELL.0).max(2);

    let canvas = Canvas::default()
        .background_color(background)
        .marker(Marker::Braille)
        .x_bounds([x0, x1])
        .y_bounds([lo, hi])
        .paint(|ctx| {
            for i in 0..columns {
                let x = x0 + (x1 - x0) * i as f64 / (columns - 1) as f64;
                if let Some(price) = series.price_at(x as i64) {
                    ctx.draw(&CanvasLine {
                        x1: x,
                        y1: lo,
                        x2: x,
                        y2: price,
                        color: fill,
                    });
                }
            }
            ctx.layer();

            for pair in series.points().windows(2) {
                ctx.draw(&CanvasLine {
                    x1: pair[0].timestamp as f64,
                    y1: pair[0].price,
                    x2: pair[1].timestamp as f64,
                    y2: pair[1].price,
                    color,
                });
            }
        });

    frame.render_widget(canvas, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricePoint;
    use crate::ui::chart::{TREND_DOWN, TREND_UP};
    use ratatui::{backend::TestBackend, Terminal};

    fn series(prices: &[f64]) -> PriceSeries {
        PriceSeries::from_points(
            prices
                .iter()
                .enumerate()
                .map(|(i, p)| PricePoint::new(i as i64 * 60_000, *p))
                .collect(),
        )
    }

    fn colors(series: &PriceSeries) -> Vec<Color> {
        let mut terminal = Terminal::new(TestBackend::new(20, 3)).unwrap();
        terminal
            .draw(|frame| render_mini_chart(frame, frame.size(), series, Color::Black))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .filter(|cell| cell.symbol() != " ")
            .map(|cell| cell.fg)
            .collect()
    }

    #[test]
    fn test_sparkline_bounds_use_ninety_percent() {
        let (lo, hi) = sparkline_bounds(10.0, 19.0);
        assert!(((19.0 - 10.0) / (hi - lo) - 0.9).abs() < 1e-9);
        assert!((10.0 - lo - (hi - 19.0)).abs() < 1e-9);
    }

    #[test]
    fn test_trend_colors() {
        assert!(colors(&series(&[1.0, 2.0, 3.0])).contains(&TREND_UP));
        assert!(colors(&series(&[3.0, 2.0, 1.0])).contains(&TREND_DOWN));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(!colors(&PriceSeries::new()).is_empty());
        assert!(!colors(&series(&[5.0])).is_empty());
    }
}
