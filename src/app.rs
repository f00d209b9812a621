// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
//
// PATTERN : "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Les données de prix arrivent par les abonnements des WatchlistItem,
//   App ne fait que décider qui s'abonne à quoi
// ============================================================================

use ratatui::layout::Rect;
use tracing::{debug, info};

use crate::models::{TimeRange, WatchlistItem};
use crate::service::PriceDataService;
use crate::ui::chart::ChartGeometry;
use crate::ui::dashboard;

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Coins surveillés
    pub watchlist: Vec<WatchlistItem>,

    /// Index du coin sélectionné (affiché dans le grand graphique)
    pub selected_index: usize,

    /// Fenêtre de temps commune à tous les graphiques
    pub current_range: TimeRange,

    pub dark_mode: bool,

    /// Two-step quit
    /// - Première pression de 'q' : confirm_quit = true
    /// - Deuxième pression de 'q' : running = false
    /// - N'importe quelle autre touche : annulation
    pub confirm_quit: bool,

    /// Taille du terminal (colonnes, lignes)
    pub viewport: (u16, u16),

    /// Dimensions en points Braille de l'aire de tracé du grand graphique
    ///
    /// Diagnostic uniquement (logs de resize) : le rendu recalcule la
    /// géométrie depuis la taille de la frame.
    chart_pixels: (u32, u32),
}

impl App {
    pub fn new(coin_ids: &[String], range: TimeRange, dark_mode: bool) -> Self {
        Self {
            running: true,
            watchlist: coin_ids.iter().map(WatchlistItem::new).collect(),
            selected_index: 0,
            current_range: range,
            dark_mode,
            confirm_quit: false,
            viewport: (0, 0),
            chart_pixels: (0, 0),
        }
    }

    /// Abonne chaque coin à la fenêtre courante si ce n'est pas déjà fait
    ///
    /// Le coin sélectionné passe en premier, avec priorité : son graphique est
    /// celui que l'utilisateur regarde.
    /// Retourne le nombre de nouveaux abonnements.
    pub fn sync_subscriptions(&mut self, service: &PriceDataService) -> usize {
        let range = self.current_range;
        let selected = self.selected_index;
        let mut created = 0;

        if let Some(item) = self.watchlist.get_mut(selected) {
            if item.ensure_subscribed(service, range, true) {
                created += 1;
            }
        }

        for (index, item) in self.watchlist.iter_mut().enumerate() {
            if index != selected && item.ensure_subscribed(service, range, false) {
                created += 1;
            }
        }

        if created > 0 {
            debug!(created, range = %range, "New series subscriptions");
        }
        created
    }

    /// Met à jour la taille du terminal et recalcule la taille du graphique
    pub fn on_resize(&mut self, cols: u16, rows: u16) {
        self.viewport = (cols, rows);
        let chart_area = dashboard::chart_area(Rect::new(0, 0, cols, rows));
        self.chart_pixels = ChartGeometry::for_area(chart_area).pixel_size();
        debug!(cols, rows, pixels = ?self.chart_pixels, "Viewport resized");
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// CONCEPT RUST : Saturating arithmetic
    /// - saturating_sub() ne descend pas en dessous de 0
    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn navigate_down(&mut self) {
        let max_index = self.watchlist.len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    pub fn selected_item(&self) -> Option<&WatchlistItem> {
        self.watchlist.get(self.selected_index)
    }

    /// Fenêtre suivante : 1h → 3h → ... → all → 1h
    pub fn next_range(&mut self) {
        self.current_range = self.current_range.next();
        info!(range = %self.current_range, "Range changed");
    }

    pub fn previous_range(&mut self) {
        self.current_range = self.current_range.previous();
        info!(range = %self.current_range, "Range changed");
    }

    pub fn toggle_theme(&mut self) {
        self.dark_mode = !self.dark_mode;
    }

    /// Relance le chargement du coin sélectionné s'il est en échec
    ///
    /// Le nouvel abonnement est créé au prochain sync_subscriptions().
    pub fn retry_selected(&mut self) -> bool {
        let range = self.current_range;
        match self.watchlist.get_mut(self.selected_index) {
            Some(item) => {
                let armed = item.retry(range);
                if armed {
                    info!(coin = %item.coin_id, "Retry requested");
                }
                armed
            }
            None => false,
        }
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
