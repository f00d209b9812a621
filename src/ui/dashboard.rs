// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine l'écran unique de l'application :
//
//   ┌ CoinWatch ────────────────────────────────────────────────┐
//   │ 1h 3h 4h 12h [1d] 1w 1m 3m 6m 1y all   API : OK            │ header
//   ├ Watchlist ───────────┬ BTC · Bitcoin ──────────────────────┤
//   │ ● BTC  Bitcoin  ⣀⡠⠔⠊ │                                     │
//   │ 65,432.10 ▲ +2.11%   │      graphique du coin sélectionné  │ content
//   │ ● ETH  Ethereum ⠉⠒⠤⣀ │                                     │
//   ├──────────────────────┴─────────────────────────────────────┤
//   │ [q] Quit  [↑↓ / j k] Navigate  [h l] Range  [t] Theme ...  │ footer
//   └────────────────────────────────────────────────────────────┘
//
// CONCEPTS RATATUI :
// 1. Layout : découpage de l'espace en zones
// 2. Widgets : Block, Paragraph, Canvas (via chart et mini_chart)
// 3. Style : couleurs du thème et de la tendance
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::coin::{coin_color, format_price};
use crate::models::{PriceSeries, TimeRange, WatchlistItem};
use crate::service::{RateLimitSnapshot, SubscriptionStatus};
use crate::ui::chart::{self, Palette, PriceChart};
use crate::ui::mini_chart;

/// Hauteur d'une ligne de la watchlist
const ROW_HEIGHT: u16 = 3;

/// Largeur de la partie texte d'une ligne de la watchlist
const ROW_TEXT_WIDTH: u16 = 24;

const KEY_COLOR: Color = Color::Rgb(0xf5, 0x9e, 0x0b);

/// Dessine l'interface complète
///
/// # Arguments
/// * `frame` - Surface de dessin ratatui
/// * `app` - État de l'application
/// * `api` - État du rate limit, affiché dans le header
pub fn render(frame: &mut Frame, app: &App, api: &RateLimitSnapshot) {
    let palette = Palette::for_mode(app.dark_mode);
    let size = frame.size();

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.background).fg(palette.text)),
        size,
    );

    let chunks = create_layout(size);
    let content = split_content(chunks[1]);

    render_header(frame, app, api, palette, chunks[0]);
    render_watchlist(frame, app, palette, content[0]);
    render_selected_chart(frame, app, palette, content[1]);
    render_footer(frame, app, palette, chunks[2]);
}

/// Zone occupée par le grand graphique pour une taille de terminal donnée
pub fn chart_area(size: Rect) -> Rect {
    split_content(create_layout(size)[1])[1]
}

// ============================================================================
// Layout
// ============================================================================

/// Crée le layout principal (header, content, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header : 3 lignes
            Constraint::Min(0),    // Content : tout le reste
            Constraint::Length(3), // Footer : 3 lignes
        ])
        .split(area)
        .to_vec()
}

/// Découpe le contenu : watchlist à gauche, graphique à droite
fn split_content(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header : fenêtres de temps et état de l'API
// ============================================================================

fn render_header(
    frame: &mut Frame,
    app: &App,
    api: &RateLimitSnapshot,
    palette: Palette,
    area: Rect,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.grid))
        .title(Span::styled(
            " CoinWatch ",
            Style::default().fg(palette.line).add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let mut spans: Vec<Span> = Vec::new();
    for range in TimeRange::all() {
        let style = if *range == app.current_range {
            Style::default()
                .fg(palette.line)
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(palette.text)
        };
        spans.push(Span::styled(format!(" {} ", range.label()), style));
    }
    spans.push(Span::raw("   "));
    spans.push(Span::styled("API : ", Style::default().fg(palette.text)));
    spans.push(api_status_span(api));

    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Texte d'état de l'API
fn api_status_span(api: &RateLimitSnapshot) -> Span<'static> {
    if api.is_limited {
        let secs = api.remaining.map(|d| d.as_secs()).unwrap_or(0);
        Span::styled(
            format!("rate limit, reprise dans {:02}:{:02}", secs / 60, secs % 60),
            Style::default().fg(KEY_COLOR).add_modifier(Modifier::BOLD),
        )
    } else if api.consecutive_errors > 0 {
        Span::styled(
            format!("{} erreur(s) consécutive(s)", api.consecutive_errors),
            Style::default().fg(KEY_COLOR),
        )
    } else {
        Span::styled("OK", Style::default().fg(chart::TREND_UP))
    }
}

// ============================================================================
// Watchlist
// ============================================================================

fn render_watchlist(frame: &mut Frame, app: &App, palette: Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.grid))
        .title(" Watchlist ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.watchlist.is_empty() {
        let paragraph = Paragraph::new("Watchlist vide")
            .style(Style::default().fg(palette.grid))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, inner);
        return;
    }

    // Une ligne de ROW_HEIGHT par coin, tant qu'il reste de la place
    for (index, item) in app.watchlist.iter().enumerate() {
        let y = inner.y + index as u16 * ROW_HEIGHT;
        if y + ROW_HEIGHT > inner.y + inner.height {
            break;
        }
        let row = Rect::new(inner.x, y, inner.width, ROW_HEIGHT);
        render_watchlist_row(frame, item, app, index == app.selected_index, palette, row);
    }
}

fn render_watchlist_row(
    frame: &mut Frame,
    item: &WatchlistItem,
    app: &App,
    selected: bool,
    palette: Palette,
    area: Rect,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(ROW_TEXT_WIDTH), Constraint::Min(0)])
        .split(area);

    let range = app.current_range;
    let (r, g, b) = coin_color(&item.coin_id);
    let symbol_style = if selected {
        Style::default().fg(palette.text).add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        Style::default().fg(palette.text).add_modifier(Modifier::BOLD)
    };

    let title = Line::from(vec![
        Span::styled("● ", Style::default().fg(Color::Rgb(r, g, b))),
        Span::styled(format!("{:<5}", item.symbol), symbol_style),
        Span::raw(" "),
        Span::styled(item.name.clone(), Style::default().fg(palette.text)),
    ]);

    let details = match (item.status(range), item.current_price(range)) {
        (Some(SubscriptionStatus::Failed), _) => Line::from(Span::styled(
            "failed to load  [r]",
            Style::default().fg(chart::TREND_DOWN),
        )),
        (_, Some(price)) => {
            let change = item.change_percent(range).unwrap_or(0.0);
            let arrow = if change >= 0.0 { "▲" } else { "▼" };
            Line::from(vec![
                Span::styled(format_price(price), Style::default().fg(palette.text)),
                Span::raw(" "),
                Span::styled(
                    format!("{} {:+.2}%", arrow, change),
                    Style::default().fg(chart::trend_color(item.is_positive(range))),
                ),
            ])
        }
        (_, None) => Line::from(Span::styled("…", Style::default().fg(palette.grid))),
    };

    frame.render_widget(Paragraph::new(vec![title, details]), columns[0]);

    if let Some(state) = item.state(range) {
        let spark = Rect::new(columns[1].x, columns[1].y, columns[1].width, ROW_HEIGHT - 1);
        mini_chart::render_mini_chart(frame, spark, &state.series, palette.background);
    }
}

// ============================================================================
// Grand graphique
// ============================================================================

fn render_selected_chart(frame: &mut Frame, app: &App, palette: Palette, area: Rect) {
    let range = app.current_range;
    let item = match app.selected_item() {
        Some(item) => item,
        None => {
            let empty = PriceSeries::new();
            let chart = PriceChart {
                title: " Aucun coin ".to_string(),
                series: &empty,
                provenance: crate::models::Provenance::Live,
                range,
                is_loading: false,
                palette,
            };
            chart::render_chart(frame, area, &chart);
            return;
        }
    };

    let mut title = format!(" {} · {}", item.symbol, item.name);
    if let Some(price) = item.current_price(range) {
        let change = item.change_percent(range).unwrap_or(0.0);
        title.push_str(&format!(" · {} $ {:+.2}%", format_price(price), change));
    }
    title.push_str(&format!(" · {} ", range.label()));

    if item.status(range) == Some(SubscriptionStatus::Failed) {
        chart::render_failed(frame, area, title.trim(), palette);
        return;
    }

    match item.state(range) {
        Some(state) => {
            let chart = PriceChart {
                title,
                series: &state.series,
                provenance: state.provenance,
                range,
                is_loading: state.is_loading,
                palette,
            };
            chart::render_chart(frame, area, &chart);
        }
        None => {
            let empty = PriceSeries::new();
            let chart = PriceChart {
                title,
                series: &empty,
                provenance: crate::models::Provenance::Live,
                range,
                is_loading: true,
                palette,
            };
            chart::render_chart(frame, area, &chart);
        }
    }
}

// ============================================================================
// Footer : Instructions
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, palette: Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.grid));

    let key = Style::default().fg(KEY_COLOR).add_modifier(Modifier::BOLD);
    let text = Style::default().fg(palette.text);

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled("Appuyez sur ", key),
            Span::styled("[q]", Style::default().fg(chart::TREND_DOWN).add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK)),
            Span::styled(" à nouveau pour quitter, ou n'importe quelle autre touche pour annuler", key),
        ])
    } else {
        Line::from(vec![
            Span::styled("[q]", key),
            Span::styled(" Quit  ", text),
            Span::styled("[↑↓ / j k]", key),
            Span::styled(" Navigate  ", text),
            Span::styled("[h l]", key),
            Span::styled(" Range  ", text),
            Span::styled("[t]", key),
            Span::styled(" Theme  ", text),
            Span::styled("[r]", key),
            Span::styled(" Retry", text),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================
