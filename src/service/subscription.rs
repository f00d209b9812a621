// ============================================================================
// SeriesSubscription
// ============================================================================
// Vue consommateur d'une demande (coin, range) : { series, provenance, is_loading }
//
// CONCEPT RUST : tokio::sync::watch
// - Un seul émetteur (la tâche de fetch), un ou plusieurs lecteurs
// - Le lecteur voit toujours la dernière valeur publiée
// - Dropper le Receiver ferme le canal : l'émetteur le détecte avec
//   is_closed() et abandonne son fetch
// ============================================================================

use tokio::sync::watch;

use crate::models::{PriceSeries, Provenance, ResolvedSeries, TimeRange};

use super::cache::SeriesKey;

/// Snapshot publié au consommateur
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesState {
    pub series: PriceSeries,
    pub provenance: Provenance,
    /// Vrai tant que la série est un placeholder en attente du fetch
    pub is_loading: bool,
}

impl SeriesState {
    pub fn loading(placeholder: ResolvedSeries) -> Self {
        Self {
            series: placeholder.series,
            provenance: placeholder.provenance,
            is_loading: true,
        }
    }

    pub fn ready(resolved: ResolvedSeries) -> Self {
        Self {
            series: resolved.series,
            provenance: resolved.provenance,
            is_loading: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Loading,
    Ready,
    /// Le fetch a disparu sans publier de résultat
    Failed,
}

/// Abonnement à une série (équivalent d'un hook usePriceSeries)
#[derive(Debug)]
pub struct SeriesSubscription {
    key: SeriesKey,
    receiver: watch::Receiver<SeriesState>,
}

impl SeriesSubscription {
    pub(crate) fn new(key: SeriesKey, receiver: watch::Receiver<SeriesState>) -> Self {
        Self { key, receiver }
    }

    /// Vrai si l'abonnement correspond encore à ce (coin, range)
    pub fn matches(&self, coin_id: &str, range: TimeRange) -> bool {
        self.key.coin_id == coin_id && self.key.range == range
    }

    /// Dernier snapshot publié
    pub fn state(&self) -> SeriesState {
        self.receiver.borrow().clone()
    }

    pub fn status(&self) -> SubscriptionStatus {
        if !self.receiver.borrow().is_loading {
            SubscriptionStatus::Ready
        } else if self.receiver.has_changed().is_err() {
            // Émetteur droppé alors qu'on attend encore
            SubscriptionStatus::Failed
        } else {
            SubscriptionStatus::Loading
        }
    }

    /// Attend le résultat final
    ///
    /// Retourne None si le fetch a disparu sans publier.
    pub async fn ready(&mut self) -> Option<SeriesState> {
        self.receiver
            .wait_for(|state| !state.is_loading)
            .await
            .ok()
            .map(|state| state.clone())
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
