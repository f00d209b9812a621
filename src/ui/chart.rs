// ============================================================================
// Chart - Rendu du graphique de prix
// ============================================================================
// Dessine une série résolue (live, cache ou synthétique) en aire + ligne
//
// ZONES (à l'intérieur de la bordure) :
//
//   ┌──────────────────────────────────────────────┐
//   │ chargement…          Données simulées        │ ← bannière (1 ligne)
//   │  65,432.10 │⣀⣀⡠⠤⠒⠉⠉⠒⠢⢄⣀                      │
//   │  65,100.00 │             ⠉⠒⠤⣀⣀⡠⠔⠊⠉          │ ← aire de tracé
//   │  64,800.00 │                                 │
//   │            │ 09:00   13:00   17:00   21:00   │ ← axe X (1 ligne)
//   └──────────────────────────────────────────────┘
//
// CONCEPTS RATATUI :
// 1. Canvas + Marker::Braille : 2×4 points par cellule, c'est la "densité
//    de pixels" du terminal
// 2. ctx.layer() : ce qui est dessiné après passe au-dessus
// 3. Paragraph positionnés à la main pour les labels des axes
//
// Le rendu est recalculé à chaque frame depuis la zone reçue : un resize du
// terminal donne une nouvelle zone, donc de nouvelles dimensions en points.
// ============================================================================

use chrono::{Local, TimeZone};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::canvas::{Canvas, Line as CanvasLine},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::models::coin::format_price;
use crate::models::{PriceSeries, Provenance, TimeRange};

/// Points Braille par cellule (colonnes, lignes)
pub const DOTS_PER_CELL: (u32, u32) = (2, 4);

/// Nombre de graduations de l'axe Y
pub const Y_TICKS: usize = 5;

/// Largeur de la colonne des labels de prix
const Y_AXIS_WIDTH: u16 = 12;

/// Marge verticale autour de [min, max], en fraction de l'amplitude
const VERTICAL_MARGIN: f64 = 0.08;

/// Couleurs de tendance (hausse / baisse)
pub const TREND_UP: Color = Color::Rgb(0x22, 0xc5, 0x5e);
pub const TREND_DOWN: Color = Color::Rgb(0xef, 0x44, 0x44);

const BANNER_COLOR: Color = Color::Rgb(0xf5, 0x9e, 0x0b);

pub fn trend_color(is_positive: bool) -> Color {
    if is_positive {
        TREND_UP
    } else {
        TREND_DOWN
    }
}

// ============================================================================
// Palette
// ============================================================================

/// Couleurs du graphique selon le thème
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub grid: Color,
    pub line: Color,
    pub fill: Color,
}

impl Palette {
    pub fn dark() -> Self {
        Self {
            background: Color::Rgb(0x12, 0x13, 0x19),
            text: Color::Rgb(0xd1, 0xd4, 0xdc),
            grid: Color::Rgb(0x27, 0x2b, 0x3b),
            line: Color::Rgb(0x29, 0x62, 0xff),
            fill: Color::Rgb(0x1a, 0x2b, 0x5c),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::Rgb(0xff, 0xff, 0xff),
            text: Color::Rgb(0x19, 0x19, 0x19),
            grid: Color::Rgb(0xf0, 0xf3, 0xfa),
            line: Color::Rgb(0x29, 0x62, 0xff),
            fill: Color::Rgb(0xc9, 0xd8, 0xff),
        }
    }

    pub fn for_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Self::dark()
        } else {
            Self::light()
        }
    }
}

/// Texte de la bannière de données dégradées
pub fn banner_text(provenance: Provenance) -> Option<&'static str> {
    match provenance {
        Provenance::Live => None,
        Provenance::Cached => Some("Données en cache (API indisponible)"),
        Provenance::Synthetic => Some("Données simulées"),
    }
}

// ============================================================================
// Géométrie
// ============================================================================

/// Découpage de la zone intérieure du graphique
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartGeometry {
    pub banner: Rect,
    pub y_axis: Rect,
    pub plot: Rect,
    pub x_axis: Rect,
}

impl ChartGeometry {
    /// Découpe une zone intérieure (sans bordure)
    pub fn compute(inner: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Bannière
                Constraint::Min(0),    // Tracé
                Constraint::Length(1), // Axe X
            ])
            .split(inner);

        let columns = [Constraint::Length(Y_AXIS_WIDTH), Constraint::Min(0)];
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(columns)
            .split(rows[1]);
        let axis = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(columns)
            .split(rows[2]);

        Self {
            banner: rows[0],
            y_axis: body[0],
            plot: body[1],
            x_axis: axis[1],
        }
    }

    /// Géométrie d'un graphique encadré occupant `area`
    pub fn for_area(area: Rect) -> Self {
        Self::compute(Block::default().borders(Borders::ALL).inner(area))
    }

    /// Dimensions de l'aire de tracé en points Braille
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.plot.width as u32 * DOTS_PER_CELL.0,
            self.plot.height as u32 * DOTS_PER_CELL.1,
        )
    }
}

// ============================================================================
// Échelles et labels
// ============================================================================

/// Bornes verticales avec marge haute et basse
///
/// Une série plate reçoit une marge non nulle pour rester centrée.
pub fn padded_bounds(min: f64, max: f64) -> (f64, f64) {
    let span = max - min;
    let pad = if span > 0.0 {
        span * VERTICAL_MARGIN
    } else if max != 0.0 {
        max.abs() * 0.01
    } else {
        1.0
    };
    (min - pad, max + pad)
}

/// Graduations régulièrement espacées de min à max
pub fn y_axis_ticks(min: f64, max: f64) -> [f64; Y_TICKS] {
    let step = (max - min) / (Y_TICKS - 1) as f64;
    let mut ticks = [0.0; Y_TICKS];
    for (i, tick) in ticks.iter_mut().enumerate() {
        *tick = min + step * i as f64;
    }
    ticks
}

/// Timestamps des labels de l'axe X, répartis de t0 à t1
pub fn x_axis_timestamps(t0: i64, t1: i64, count: usize) -> Vec<i64> {
    match count {
        0 => Vec::new(),
        1 => vec![t0],
        n => (0..n)
            .map(|i| t0 + ((t1 - t0) as f64 * i as f64 / (n - 1) as f64).round() as i64)
            .collect(),
    }
}

/// Formate un timestamp selon la granularité de la fenêtre, en heure locale
pub fn format_time_label(timestamp_ms: i64, range: TimeRange) -> String {
    format_time_label_in(timestamp_ms, range, &Local)
}

pub fn format_time_label_in<Tz>(timestamp_ms: i64, range: TimeRange, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match tz.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format(range.x_label_format()).to_string(),
        None => String::new(),
    }
}

/// Place les labels sur une ligne de `width` colonnes
///
/// Le label i est centré sur la colonne i * (width - 1) / (n - 1), puis
/// ramené dans la ligne. Un label qui chevaucherait le précédent est omis.
pub fn layout_x_labels(labels: &[String], width: usize) -> String {
    let mut line = vec![' '; width];
    if width == 0 || labels.is_empty() {
        return String::new();
    }

    let last = labels.len().saturating_sub(1).max(1);
    let mut next_free = 0usize;

    for (i, label) in labels.iter().enumerate() {
        let len = label.chars().count();
        if len == 0 || len > width {
            continue;
        }

        let center = i * (width - 1) / last;
        let start = center.saturating_sub(len / 2).min(width - len);
        if start < next_free {
            continue;
        }

        for (offset, c) in label.chars().enumerate() {
            line[start + offset] = c;
        }
        next_free = start + len + 1;
    }

    line.into_iter().collect()
}

/// Ligne de terminal correspondant à une valeur dans l'aire de tracé
fn value_to_row(value: f64, (lo, hi): (f64, f64), plot: Rect) -> u16 {
    if plot.height == 0 || hi <= lo {
        return plot.y;
    }
    let ratio = ((hi - value) / (hi - lo)).clamp(0.0, 1.0);
    plot.y + (ratio * (plot.height - 1) as f64).round() as u16
}

// ============================================================================
// Rendu
// ============================================================================

/// Ce que le graphique doit afficher
pub struct PriceChart<'a> {
    pub title: String,
    pub series: &'a PriceSeries,
    pub provenance: Provenance,
    pub range: TimeRange,
    pub is_loading: bool,
    pub palette: Palette,
}

/// Dessine le graphique complet dans `area`
pub fn render_chart(frame: &mut Frame, area: Rect, chart: &PriceChart) {
    let palette = chart.palette;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.grid))
        .style(Style::default().bg(palette.background).fg(palette.text))
        .title(Span::styled(
            chart.title.clone(),
            Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
        ));
    let geometry = ChartGeometry::compute(block.inner(area));
    frame.render_widget(block, area);

    render_banner(frame, geometry.banner, chart);

    if geometry.plot.width == 0 || geometry.plot.height == 0 {
        return;
    }

    if !chart.series.is_renderable() {
        render_flat_line(frame, geometry.plot, chart.series.is_positive(), palette.background);
        return;
    }

    // is_renderable() garantit au moins 2 points
    let (Some((min, max)), Some((t0, t1))) = (chart.series.price_bounds(), chart.series.time_bounds())
    else {
        return;
    };
    // Points tous au même instant : pas d'axe X exploitable
    if t1 <= t0 {
        render_flat_line(frame, geometry.plot, chart.series.is_positive(), palette.background);
        return;
    }
    let bounds = padded_bounds(min, max);
    let ticks = y_axis_ticks(min, max);

    render_plot(frame, &geometry, chart.series, bounds, &ticks, palette);
    render_y_labels(frame, &geometry, bounds, &ticks, palette);
    render_x_labels(frame, &geometry, t0, t1, chart.range, palette);
}

/// Message affiché quand aucune série n'a pu être obtenue
pub fn render_failed(frame: &mut Frame, area: Rect, title: &str, palette: Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(TREND_DOWN))
        .style(Style::default().bg(palette.background).fg(palette.text))
        .title(format!(" {} ", title));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled("failed to load", Style::default().fg(TREND_DOWN))),
        Line::from(""),
        Line::from(vec![
            Span::styled("[r]", Style::default().fg(BANNER_COLOR).add_modifier(Modifier::BOLD)),
            Span::raw(" Réessayer"),
        ]),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn render_banner(frame: &mut Frame, area: Rect, chart: &PriceChart) {
    if chart.is_loading {
        let loading = Paragraph::new(Span::styled(
            " chargement…",
            Style::default().fg(chart.palette.grid).add_modifier(Modifier::ITALIC),
        ));
        frame.render_widget(loading, area);
    }

    if let Some(text) = banner_text(chart.provenance) {
        let banner = Paragraph::new(Span::styled(
            format!("{} ", text),
            Style::default().fg(BANNER_COLOR),
        ))
        .alignment(Alignment::Right);
        frame.render_widget(banner, area);
    }
}

/// Grille, aire remplie puis ligne de prix
fn render_plot(
    frame: &mut Frame,
    geometry: &ChartGeometry,
    series: &PriceSeries,
    (lo, hi): (f64, f64),
    ticks: &[f64],
    palette: Palette,
) {
    let (t0, t1) = match series.time_bounds() {
        Some(bounds) => bounds,
        None => return,
    };
    let (x0, x1) = (t0 as f64, t1 as f64);
    let (pixel_width, _) = geometry.pixel_size();
    let columns = pixel_width.max(2);

    let canvas = Canvas::default()
        .background_color(palette.background)
        .marker(Marker::Braille)
        .x_bounds([x0, x1])
        .y_bounds([lo, hi])
        .paint(|ctx| {
            for tick in ticks {
                ctx.draw(&CanvasLine {
                    x1: x0,
                    y1: *tick,
                    x2: x1,
                    y2: *tick,
                    color: palette.grid,
                });
            }
            ctx.layer();

            // Une colonne verticale par colonne de points
            for i in 0..columns {
                let x = x0 + (x1 - x0) * i as f64 / (columns - 1) as f64;
                if let Some(price) = series.price_at(x as i64) {
                    ctx.draw(&CanvasLine {
                        x1: x,
                        y1: lo,
                        x2: x,
                        y2: price,
                        color: palette.fill,
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
                    color: palette.line,
                });
            }
        });

    frame.render_widget(canvas, geometry.plot);
}

fn render_y_labels(
    frame: &mut Frame,
    geometry: &ChartGeometry,
    bounds: (f64, f64),
    ticks: &[f64],
    palette: Palette,
) {
    let area = geometry.y_axis;
    if area.width < 2 {
        return;
    }

    for tick in ticks {
        let row = value_to_row(*tick, bounds, geometry.plot);
        let label_area = Rect::new(area.x, row, area.width - 1, 1);
        let label = Paragraph::new(format_price(*tick))
            .style(Style::default().fg(palette.text))
            .alignment(Alignment::Right);
        frame.render_widget(label, label_area);
    }
}

fn render_x_labels(
    frame: &mut Frame,
    geometry: &ChartGeometry,
    t0: i64,
    t1: i64,
    range: TimeRange,
    palette: Palette,
) {
    let labels: Vec<String> = x_axis_timestamps(t0, t1, range.x_label_count())
        .into_iter()
        .map(|ts| format_time_label(ts, range))
        .collect();
    let line = layout_x_labels(&labels, geometry.x_axis.width as usize);

    let paragraph = Paragraph::new(line).style(Style::default().fg(palette.text));
    frame.render_widget(paragraph, geometry.x_axis);
}

/// Cas dégénéré : ligne horizontale au milieu, couleur de tendance
pub fn render_flat_line(frame: &mut Frame, area: Rect, is_positive: bool, background: Color) {
    let color = trend_color(is_positive);
    let canvas = Canvas::default()
        .background_color(background)
        .marker(Marker::Braille)
        .x_bounds([0.0, 1.0])
        .y_bounds([0.0, 1.0])
        .paint(move |ctx| {
            ctx.draw(&CanvasLine {
                x1: 0.0,
                y1: 0.5,
                x2: 1.0,
                y2: 0.5,
                color,
            });
        });

    frame.render_widget(canvas, area);
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricePoint;
    use chrono::Utc;
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    fn buffer_text(buffer: &Buffer) -> String {
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    fn has_braille(buffer: &Buffer) -> bool {
        buffer
            .content
            .iter()
            .flat_map(|cell| cell.symbol().chars())
            .any(|c| ('\u{2801}'..='\u{28FF}').contains(&c))
    }

    fn hourly_series(prices: &[f64]) -> PriceSeries {
        PriceSeries::from_points(
            prices
                .iter()
                .enumerate()
                .map(|(i, p)| PricePoint::new(1_700_000_000_000 + i as i64 * 3_600_000, *p))
                .collect(),
        )
    }

    fn draw(series: &PriceSeries, provenance: Provenance, width: u16, height: u16) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| {
                let chart = PriceChart {
                    title: " BTC ".to_string(),
                    series,
                    provenance,
                    range: TimeRange::D1,
                    is_loading: false,
                    palette: Palette::dark(),
                };
                render_chart(frame, frame.size(), &chart);
            })
            .unwrap();
        terminal.backend().buffer().clone()
    }

    #[test]
    fn test_y_axis_ticks_span_min_to_max() {
        let ticks = y_axis_ticks(100.0, 200.0);
        assert_eq!(ticks, [100.0, 125.0, 150.0, 175.0, 200.0]);
    }

    #[test]
    fn test_padded_bounds() {
        let (lo, hi) = padded_bounds(100.0, 200.0);
        assert!((lo - 92.0).abs() < 1e-9 && (hi - 208.0).abs() < 1e-9);
        let (lo, hi) = padded_bounds(50.0, 50.0);
        assert!(lo < 50.0 && hi > 50.0);
        assert_eq!(padded_bounds(0.0, 0.0), (-1.0, 1.0));
    }

    #[test]
    fn test_x_axis_timestamps() {
        assert_eq!(x_axis_timestamps(0, 100, 5), vec![0, 25, 50, 75, 100]);
        assert_eq!(x_axis_timestamps(0, 100, 1), vec![0]);
        assert!(x_axis_timestamps(0, 100, 0).is_empty());
    }

    #[test]
    fn test_format_time_label_by_granularity() {
        // 2024-03-15 14:30:00 UTC
        let ts = 1_710_513_000_000;
        assert_eq!(format_time_label_in(ts, TimeRange::H4, &Utc), "14:30");
        assert_eq!(format_time_label_in(ts, TimeRange::W1, &Utc), "Mar 15");
        assert_eq!(format_time_label_in(ts, TimeRange::Y1, &Utc), "Mar 2024");
    }

    #[test]
    fn test_layout_x_labels() {
        let labels: Vec<String> = ["00:00", "06:00", "12:00"].iter().map(|s| s.to_string()).collect();
        let line = layout_x_labels(&labels, 30);
        assert_eq!(line.chars().count(), 30);
        assert!(line.starts_with("00:00"));
        assert!(line.trim_end().ends_with("12:00"));
        assert!(line.contains("06:00"));

        // Trop étroit : les labels qui se chevauchent sont omis
        let narrow = layout_x_labels(&labels, 12);
        assert!(narrow.contains("00:00"));
        assert_eq!(narrow.matches(':').count(), 2);
    }

    #[test]
    fn test_banner_text() {
        assert_eq!(banner_text(Provenance::Live), None);
        assert_eq!(banner_text(Provenance::Synthetic), Some("Données simulées"));
        assert_ne!(banner_text(Provenance::Cached), banner_text(Provenance::Synthetic));
    }

    #[test]
    fn test_geometry_pixel_size() {
        let geometry = ChartGeometry::for_area(Rect::new(0, 0, 80, 24));
        assert_eq!(geometry.plot.width, 80 - 2 - Y_AXIS_WIDTH);
        assert_eq!(geometry.plot.height, 24 - 2 - 2);
        assert_eq!(
            geometry.pixel_size(),
            ((80 - 2 - Y_AXIS_WIDTH) as u32 * 2, (24 - 4) as u32 * 4)
        );
    }

    #[test]
    fn test_renders_line_labels_and_no_banner_when_live() {
        let series = hourly_series(&[100.0, 120.0, 90.0, 150.0, 130.0]);
        let buffer = draw(&series, Provenance::Live, 80, 20);
        let text = buffer_text(&buffer);

        assert!(has_braille(&buffer));
        assert!(text.contains("150.00"));
        assert!(text.contains("90.00"));
        assert!(!text.contains("Données"));
    }

    #[test]
    fn test_renders_degraded_banner() {
        let series = hourly_series(&[1.0, 2.0, 3.0]);
        let synthetic = buffer_text(&draw(&series, Provenance::Synthetic, 80, 20));
        assert!(synthetic.contains("Données simulées"));

        let cached = buffer_text(&draw(&series, Provenance::Cached, 80, 20));
        assert!(cached.contains("Données en cache"));
    }

    #[test]
    fn test_degenerate_series_renders_flat_line() {
        for series in [PriceSeries::new(), hourly_series(&[42.0])] {
            let buffer = draw(&series, Provenance::Live, 40, 12);
            assert!(has_braille(&buffer));
        }
    }

    #[test]
    fn test_zero_time_span_renders_flat_line() {
        let series = PriceSeries::from_points(vec![
            PricePoint::new(1_000, 10.0),
            PricePoint::new(1_000, 12.0),
        ]);
        assert!(series.is_renderable());

        let buffer = draw(&series, Provenance::Live, 60, 16);
        assert!(has_braille(&buffer));
    }

    #[test]
    fn test_tiny_area_does_not_panic() {
        let series = hourly_series(&[1.0, 2.0]);
        draw(&series, Provenance::Synthetic, 3, 3);
        draw(&series, Provenance::Synthetic, 14, 4);
    }

    #[test]
    fn test_redraw_after_resize() {
        let series = hourly_series(&[10.0, 12.0, 11.0, 14.0]);
        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        let mut sizes = Vec::new();

        for (w, h) in [(60, 16), (120, 40), (30, 10)] {
            terminal.backend_mut().resize(w, h);
            terminal
                .draw(|frame| {
                    let area = frame.size();
                    sizes.push(ChartGeometry::for_area(area).pixel_size());
                    let chart = PriceChart {
                        title: " ETH ".to_string(),
                        series: &series,
                        provenance: Provenance::Live,
                        range: TimeRange::H1,
                        is_loading: true,
                        palette: Palette::light(),
                    };
                    render_chart(frame, area, &chart);
                })
                .unwrap();
            assert_eq!(terminal.backend().buffer().area.width, w);
        }

        assert!(sizes[1].0 > sizes[0].0 && sizes[1].1 > sizes[0].1);
        assert!(sizes[2].0 < sizes[0].0);
    }
}
