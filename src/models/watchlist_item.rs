// ============================================================================
// Structure : WatchlistItem
// ============================================================================
// Représente un coin dans la watchlist et son abonnement à la série de prix
//
// CONCEPTS RUST :
// 1. Composition : WatchlistItem contient une SeriesSubscription
// 2. Option : pas encore abonné, ou abonnement abandonné pour un retry
// 3. Garde "déjà demandé" : un seul abonnement par (coin, range)
// ============================================================================

use crate::models::coin;
use crate::models::TimeRange;
use crate::service::{PriceDataService, SeriesState, SeriesSubscription, SubscriptionStatus};

/// Un coin dans la watchlist
#[derive(Debug)]
pub struct WatchlistItem {
    /// Identifiant CoinGecko (ex: "bitcoin")
    pub coin_id: String,

    /// Nom affiché (ex: "Bitcoin")
    pub name: String,

    /// Ticker affiché (ex: "BTC")
    pub symbol: String,

    /// Abonnement courant
    /// - Some(sub) : une demande existe pour la clé de sub
    /// - None : rien demandé (ou retry demandé)
    subscription: Option<SeriesSubscription>,
}

impl WatchlistItem {
    pub fn new(coin_id: impl Into<String>) -> Self {
        let coin_id = coin_id.into();
        Self {
            name: coin::display_name(&coin_id),
            symbol: coin::display_symbol(&coin_id),
            coin_id,
            subscription: None,
        }
    }

    /// S'abonne à (coin, range) si ce n'est pas déjà fait
    ///
    /// Un changement de range remplace l'abonnement : l'ancien receiver est
    /// droppé, son fetch en file sera sauté.
    /// Retourne true si un nouvel abonnement a été créé.
    pub fn ensure_subscribed(
        &mut self,
        service: &PriceDataService,
        range: TimeRange,
        priority: bool,
    ) -> bool {
        let already_requested = self
            .subscription
            .as_ref()
            .map(|sub| sub.matches(&self.coin_id, range))
            .unwrap_or(false);

        if already_requested {
            return false;
        }

        self.subscription = Some(service.subscribe(&self.coin_id, range, priority));
        true
    }

    /// Snapshot courant, seulement s'il correspond encore à `range`
    ///
    /// CONCEPT : Stale-result guard
    /// - Un résultat arrivé pour une ancienne fenêtre n'est jamais affiché
    pub fn state(&self, range: TimeRange) -> Option<SeriesState> {
        self.current(range).map(|sub| sub.state())
    }

    pub fn status(&self, range: TimeRange) -> Option<SubscriptionStatus> {
        self.current(range).map(|sub| sub.status())
    }

    /// Dernier prix de la série
    pub fn current_price(&self, range: TimeRange) -> Option<f64> {
        let state = self.state(range)?;
        state.series.last().map(|p| p.price)
    }

    /// Variation sur la fenêtre en pourcentage
    pub fn change_percent(&self, range: TimeRange) -> Option<f64> {
        self.state(range)?.series.change_percent()
    }

    /// Retourne true si le coin est en hausse sur la fenêtre
    pub fn is_positive(&self, range: TimeRange) -> bool {
        self.change_percent(range).map(|c| c >= 0.0).unwrap_or(true)
    }

    /// Abandonne un abonnement en échec pour qu'il soit refait
    ///
    /// Retourne true si un retry a été armé.
    pub fn retry(&mut self, range: TimeRange) -> bool {
        if self.status(range) == Some(SubscriptionStatus::Failed) {
            self.subscription = None;
            true
        } else {
            false
        }
    }

    fn current(&self, range: TimeRange) -> Option<&SeriesSubscription> {
        self.subscription
            .as_ref()
            .filter(|sub| sub.matches(&self.coin_id, range))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::models::Provenance;
    use crate::service::testing::{sample_series, PanickingSource, ScriptedSource};
    use std::sync::Arc;

    #[test]
    fn test_watchlist_item_new() {
        let item = WatchlistItem::new("bitcoin");
        assert_eq!(item.symbol, "BTC");
        assert_eq!(item.name, "Bitcoin");
        assert!(item.state(TimeRange::D1).is_none());
        assert!(item.current_price(TimeRange::D1).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribes_once_per_key() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(sample_series(3, 1.0)),
            Ok(sample_series(3, 2.0)),
        ]));
        let service = PriceDataService::new(source, ServiceConfig::default());
        let mut item = WatchlistItem::new("ethereum");

        assert!(item.ensure_subscribed(&service, TimeRange::D1, false));
        assert!(!item.ensure_subscribed(&service, TimeRange::D1, false));
        assert!(service.queue_len() <= 1);

        // Changement de range : nouvel abonnement, l'ancien n'est plus visible
        assert!(item.ensure_subscribed(&service, TimeRange::W1, false));
        assert!(item.state(TimeRange::D1).is_none());
        assert!(item.state(TimeRange::W1).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_price_and_change_after_fetch() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(sample_series(3, 100.0))]));
        let service = PriceDataService::new(source, ServiceConfig::default());
        let mut item = WatchlistItem::new("solana");

        item.ensure_subscribed(&service, TimeRange::D1, true);
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;

        let state = item.state(TimeRange::D1).unwrap();
        assert_eq!(state.provenance, Provenance::Live);
        assert_eq!(item.current_price(TimeRange::D1), Some(102.0));
        assert!(item.change_percent(TimeRange::D1).unwrap() > 1.9);
        assert!(item.is_positive(TimeRange::D1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_failure() {
        let service = PriceDataService::new(Arc::new(PanickingSource), ServiceConfig::default());
        let mut item = WatchlistItem::new("bitcoin");

        item.ensure_subscribed(&service, TimeRange::D1, true);
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        assert_eq!(item.status(TimeRange::D1), Some(SubscriptionStatus::Failed));

        assert!(item.retry(TimeRange::D1));
        assert!(item.status(TimeRange::D1).is_none());
        assert!(item.ensure_subscribed(&service, TimeRange::D1, false));
    }
}
