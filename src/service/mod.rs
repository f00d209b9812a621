// ============================================================================
// Module : service
// ============================================================================
// PriceDataService : cache, rate limit, file de requêtes et fallback
//
// Instancié une fois au démarrage et partagé (clone bon marché, Arc interne)
// par tous les graphiques. Chaque test crée sa propre instance.
//
// RÉSOLUTION D'UNE SÉRIE (fetch) :
// 1. Cache frais              → Live, aucun appel réseau
// 2. Cooldown actif           → fallback, aucun appel réseau
// 3. Appel réseau (timeout)   → succès : cache + Live
//                             → échec  : compteur d'erreurs + fallback
// Fallback = entrée du cache même périmée (Cached), sinon synthétique (Synthetic)
//
// fetch() ne retourne jamais d'erreur : l'appelant reçoit toujours une série
// affichable d'au moins 2 points.
// ============================================================================

pub mod cache;
pub mod queue;
pub mod rate_limit;
pub mod subscription;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::api::{FetchFailure, PriceSource};
use crate::config::ServiceConfig;
use crate::models::{synthetic, PriceSeries, Provenance, ResolvedSeries, TimeRange};

pub use cache::{CacheEntry, CacheStore, SeriesKey};
pub use queue::{QueueState, QueuedRequest, RequestQueue};
pub use rate_limit::{RateLimitSnapshot, RateLimitState};
pub use subscription::{SeriesState, SeriesSubscription, SubscriptionStatus};

struct ServiceInner {
    source: Arc<dyn PriceSource>,
    cache: Mutex<CacheStore>,
    rate_limit: Arc<Mutex<RateLimitState>>,
    queue: RequestQueue,
    config: ServiceConfig,
    network_calls: AtomicU64,
}

/// Service partagé de données de prix
#[derive(Clone)]
pub struct PriceDataService {
    inner: Arc<ServiceInner>,
}

impl PriceDataService {
    pub fn new(source: Arc<dyn PriceSource>, config: ServiceConfig) -> Self {
        let rate_limit = Arc::new(Mutex::new(RateLimitState::new(
            config.error_threshold,
            config.rate_limit_cooldown,
        )));
        let queue = RequestQueue::new(
            rate_limit.clone(),
            config.request_delay,
            config.rate_limit_poll_interval,
        );

        Self {
            inner: Arc::new(ServiceInner {
                source,
                cache: Mutex::new(CacheStore::new(config.cache_duration)),
                rate_limit,
                queue,
                config,
                network_calls: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// Entrée du cache (fraîche ou non)
    pub fn cached(&self, coin_id: &str, range: TimeRange) -> Option<PriceSeries> {
        self.cache()
            .get(&SeriesKey::new(coin_id, range))
            .map(|entry| entry.series.clone())
    }

    pub fn rate_limit(&self) -> RateLimitSnapshot {
        self.rate_limit_state().snapshot(Instant::now())
    }

    /// Nombre d'appels réseau effectués depuis la création
    pub fn network_calls(&self) -> u64 {
        self.inner.network_calls.load(Ordering::Relaxed)
    }

    pub fn queue_len(&self) -> usize {
        self.inner.queue.len()
    }

    // ========================================================================
    // Price History Fetcher
    // ========================================================================

    /// Résout la série d'un (coin, range), sans jamais échouer
    pub async fn fetch(&self, coin_id: &str, range: TimeRange) -> ResolvedSeries {
        let key = SeriesKey::new(coin_id, range);

        if let Some(series) = self.fresh(&key) {
            debug!(key = %key, "Cache hit");
            return ResolvedSeries::new(series, Provenance::Live);
        }

        if self.is_rate_limited() {
            debug!(key = %key, "Rate limit cooldown active, skipping network");
            return self.fallback(&key);
        }

        self.inner.network_calls.fetch_add(1, Ordering::Relaxed);
        let request = self.inner.source.fetch_market_chart(coin_id, range);
        let outcome = match timeout(self.inner.config.request_timeout, request).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(key = %key, "market_chart request timed out");
                Err(FetchFailure::Network("timeout".to_string()))
            }
        };

        // Une source peut répondre 2xx avec trop peu de points
        let outcome = outcome.and_then(|series| {
            if series.is_renderable() {
                Ok(series)
            } else {
                Err(FetchFailure::Malformed(format!(
                    "{} point(s), au moins 2 attendus",
                    series.len()
                )))
            }
        });

        match outcome {
            Ok(series) => {
                self.rate_limit_state().record_success();
                self.cache().put(&key, series.clone());
                info!(key = %key, points = series.len(), "Fetched live series");
                ResolvedSeries::new(series, Provenance::Live)
            }
            Err(failure) => {
                let tripped = self
                    .rate_limit_state()
                    .record_failure(Instant::now(), failure.retry_after());
                warn!(
                    key = %key,
                    kind = failure.kind(),
                    error = %failure,
                    tripped,
                    "Fetch failed, using fallback"
                );
                self.fallback(&key)
            }
        }
    }

    // ========================================================================
    // Hook consommateur
    // ========================================================================

    /// Abonne un consommateur à un (coin, range)
    ///
    /// - Cache frais : prêt immédiatement, rien n'est mis en file
    /// - Sinon : placeholder immédiat (cache périmé ou synthétique), puis fetch
    ///   en file, ou lancé tout de suite si `priority` et pas de cooldown
    ///
    /// Doit être appelé depuis un contexte tokio.
    pub fn subscribe(&self, coin_id: &str, range: TimeRange, priority: bool) -> SeriesSubscription {
        let key = SeriesKey::new(coin_id, range);

        if let Some(series) = self.fresh(&key) {
            debug!(key = %key, "Subscription served from cache");
            let (_tx, rx) = watch::channel(SeriesState::ready(ResolvedSeries::new(
                series,
                Provenance::Live,
            )));
            return SeriesSubscription::new(key, rx);
        }

        let (tx, rx) = watch::channel(SeriesState::loading(self.fallback(&key)));
        let job = self.fetch_job(key.clone(), tx);

        if priority && !self.is_rate_limited() {
            debug!(key = %key, "Priority fetch, bypassing queue");
            let _ = job();
        } else {
            self.inner.queue.enqueue(job);
        }

        SeriesSubscription::new(key, rx)
    }

    /// Requête de file : lance le fetch et publie le résultat
    ///
    /// Vérifié au moment de l'exécution, avant tout appel réseau :
    /// - abonné disparu : rien n'est lancé
    /// - cache devenu frais entre-temps : publié directement
    /// Dans ces deux cas la requête retourne false et la file n'attend pas.
    fn fetch_job(&self, key: SeriesKey, tx: watch::Sender<SeriesState>) -> QueuedRequest {
        let service = self.clone();
        Box::new(move || {
            if tx.is_closed() {
                debug!(key = %key, "Subscriber gone, skipping fetch");
                return false;
            }

            if let Some(series) = service.fresh(&key) {
                debug!(key = %key, "Cache filled while queued");
                let _ = tx.send(SeriesState::ready(ResolvedSeries::new(series, Provenance::Live)));
                return false;
            }

            tokio::spawn(async move {
                let resolved = service.fetch(&key.coin_id, key.range).await;
                if tx.send(SeriesState::ready(resolved)).is_err() {
                    debug!(key = %key, "Subscriber dropped before result");
                }
            });
            true
        })
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn fresh(&self, key: &SeriesKey) -> Option<PriceSeries> {
        self.cache()
            .get_fresh(key, Instant::now())
            .map(|entry| entry.series.clone())
    }

    /// Cache même périmé, sinon série synthétique
    fn fallback(&self, key: &SeriesKey) -> ResolvedSeries {
        if let Some(entry) = self.cache().get(key) {
            return ResolvedSeries::new(entry.series.clone(), Provenance::Cached);
        }
        ResolvedSeries::new(
            synthetic::generate(key.range, &key.coin_id),
            Provenance::Synthetic,
        )
    }

    fn is_rate_limited(&self) -> bool {
        self.rate_limit_state().is_limited(Instant::now())
    }

    fn cache(&self) -> MutexGuard<'_, CacheStore> {
        self.inner.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn rate_limit_state(&self) -> MutexGuard<'_, RateLimitState> {
        self.inner
            .rate_limit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::testing::{rate_limited, sample_series, PanickingSource, ScriptedSource};
    use super::*;
    use std::time::Duration;

    fn service(source: Arc<dyn PriceSource>) -> PriceDataService {
        PriceDataService::new(source, ServiceConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_then_cache_hit() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(sample_series(10, 100.0))]));
        let service = service(source.clone());

        let first = service.fetch("bitcoin", TimeRange::D1).await;
        assert_eq!(first.provenance, Provenance::Live);
        assert_eq!(first.series.len(), 10);
        assert_eq!(service.cached("bitcoin", TimeRange::D1), Some(first.series.clone()));

        tokio::time::advance(Duration::from_secs(2 * 60)).await;
        let second = service.fetch("bitcoin", TimeRange::D1).await;
        assert_eq!(second, first);
        assert_eq!(source.calls(), 1);
        assert_eq!(service.network_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_without_cache_is_synthetic() {
        let source = Arc::new(ScriptedSource::new(vec![rate_limited()]));
        let service = service(source.clone());

        let resolved = service.fetch("bitcoin", TimeRange::D1).await;
        assert_eq!(resolved.provenance, Provenance::Synthetic);
        assert_eq!(resolved.series.len(), 24);
        assert_eq!(service.rate_limit().consecutive_errors, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_cache_is_fallback() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(sample_series(5, 10.0)),
            Err(FetchFailure::Network("HTTP 500".to_string())),
        ]));
        let service = service(source.clone());

        let live = service.fetch("ethereum", TimeRange::W1).await;
        tokio::time::advance(Duration::from_secs(21 * 60)).await;

        let fallback = service.fetch("ethereum", TimeRange::W1).await;
        assert_eq!(fallback.provenance, Provenance::Cached);
        assert_eq!(fallback.series, live.series);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_failure_kind_falls_back() {
        let source = Arc::new(ScriptedSource::new(vec![
            rate_limited(),
            Err(FetchFailure::Auth { status: 403 }),
            Err(FetchFailure::Malformed("champ 'prices' absent".to_string())),
            Err(FetchFailure::Network("connection refused".to_string())),
            Ok(sample_series(1, 5.0)),
        ]));
        let service = PriceDataService::new(
            source,
            ServiceConfig {
                error_threshold: 10,
                ..ServiceConfig::default()
            },
        );

        for _ in 0..5 {
            let resolved = service.fetch("solana", TimeRange::H1).await;
            assert_eq!(resolved.provenance, Provenance::Synthetic);
            assert!(resolved.series.len() >= 2);
            assert!(resolved
                .series
                .points()
                .windows(2)
                .all(|w| w[1].timestamp > w[0].timestamp));
        }
        // Le succès à 1 point compte comme réponse malformée
        assert_eq!(service.rate_limit().consecutive_errors, 5);
        assert!(service.cached("solana", TimeRange::H1).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_escalation_and_recovery() {
        let mut outcomes: Vec<_> = (0..5).map(|_| rate_limited()).collect();
        outcomes.push(Ok(sample_series(3, 1.0)));
        let source = Arc::new(ScriptedSource::new(outcomes));
        let service = service(source.clone());

        for _ in 0..5 {
            service.fetch("bitcoin", TimeRange::D1).await;
        }
        let snapshot = service.rate_limit();
        assert!(snapshot.is_limited);
        assert_eq!(snapshot.consecutive_errors, 5);
        assert_eq!(snapshot.remaining, Some(Duration::from_secs(15 * 60)));

        // Pendant le cooldown : aucun appel réseau
        let during = service.fetch("bitcoin", TimeRange::D1).await;
        assert_eq!(during.provenance, Provenance::Synthetic);
        assert_eq!(source.calls(), 5);

        tokio::time::advance(Duration::from_secs(15 * 60 + 1)).await;
        let after = service.fetch("bitcoin", TimeRange::D1).await;
        assert_eq!(after.provenance, Provenance::Live);
        assert_eq!(source.calls(), 6);

        let snapshot = service.rate_limit();
        assert!(!snapshot.is_limited);
        assert_eq!(snapshot.consecutive_errors, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_network_error() {
        let source = Arc::new(
            ScriptedSource::new(vec![Ok(sample_series(3, 1.0))]).with_delay(Duration::from_secs(30)),
        );
        let service = service(source.clone());
        let start = Instant::now();

        let resolved = service.fetch("dogecoin", TimeRange::D1).await;
        assert_eq!(resolved.provenance, Provenance::Synthetic);
        assert!(Instant::now() - start < Duration::from_secs(30));
        assert_eq!(service.rate_limit().consecutive_errors, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_fresh_hit_is_ready() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(sample_series(4, 1.0))]));
        let service = service(source.clone());
        service.fetch("bitcoin", TimeRange::D1).await;

        let sub = service.subscribe("bitcoin", TimeRange::D1, false);
        assert_eq!(sub.status(), SubscriptionStatus::Ready);
        assert_eq!(sub.state().provenance, Provenance::Live);
        assert_eq!(service.queue_len(), 0);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_miss_publishes_placeholder_then_result() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(sample_series(8, 1.0))]));
        let service = service(source.clone());

        let mut sub = service.subscribe("ethereum", TimeRange::W1, false);
        let placeholder = sub.state();
        assert!(placeholder.is_loading);
        assert_eq!(placeholder.provenance, Provenance::Synthetic);
        assert_eq!(sub.status(), SubscriptionStatus::Loading);

        let state = sub.ready().await.unwrap();
        assert_eq!(state.provenance, Provenance::Live);
        assert_eq!(state.series.len(), 8);
        assert_eq!(sub.status(), SubscriptionStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_priority_bypasses_queue_delay() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(sample_series(3, 1.0)),
            Ok(sample_series(3, 2.0)),
        ]));
        let service = service(source.clone());

        // Occupe la file : le prochain élément devrait attendre le délai
        let _first = service.subscribe("bitcoin", TimeRange::D1, false);
        tokio::task::yield_now().await;

        let start = Instant::now();
        let mut priority = service.subscribe("solana", TimeRange::D1, true);
        priority.ready().await.unwrap();
        assert!(Instant::now() - start < service.config().request_delay);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_subscription_skips_network() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(sample_series(3, 1.0))]));
        let service = service(source.clone());

        let sub = service.subscribe("bitcoin", TimeRange::D1, false);
        drop(sub);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls(), 0);
        assert_eq!(service.network_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_jobs_do_not_delay_live_request() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(sample_series(6, 1.0))]));
        let service = service(source.clone());
        let start = Instant::now();

        // Changements de fenêtre : les anciens abonnements sont abandonnés
        let abandoned: Vec<_> = ["bitcoin", "solana", "ripple", "dogecoin"]
            .iter()
            .flat_map(|coin| {
                TimeRange::all()
                    .iter()
                    .filter(|range| **range != TimeRange::All)
                    .map(|range| service.subscribe(coin, *range, false))
                    .collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(abandoned.len(), 40);
        drop(abandoned);

        let mut sub = service.subscribe("ethereum", TimeRange::All, false);
        let state = sub.ready().await.unwrap();

        assert_eq!(state.provenance, Provenance::Live);
        assert!(Instant::now() - start < service.config().request_delay);
        assert_eq!(service.network_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_job_uses_cache_filled_meanwhile() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(sample_series(3, 1.0)),
            Ok(sample_series(4, 2.0)),
        ]));
        let service = service(source.clone());

        // Occupe la file, puis deux demandes pour la même clé
        let _busy = service.subscribe("bitcoin", TimeRange::D1, false);
        let mut first = service.subscribe("solana", TimeRange::D1, false);
        let mut second = service.subscribe("solana", TimeRange::D1, false);

        first.ready().await.unwrap();
        let state = second.ready().await.unwrap();
        assert_eq!(state.provenance, Provenance::Live);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_fetch_reports_failed() {
        let service = service(Arc::new(PanickingSource));

        let mut sub = service.subscribe("bitcoin", TimeRange::D1, true);
        assert!(sub.ready().await.is_none());
        assert_eq!(sub.status(), SubscriptionStatus::Failed);
        // Le placeholder reste affichable
        assert!(sub.state().series.is_renderable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_rate_limited_bitcoin_day() {
        let source = Arc::new(ScriptedSource::new(vec![rate_limited()]));
        let service = service(source.clone());

        assert_eq!(service.queue_len(), 0);
        let mut sub = service.subscribe("bitcoin", TimeRange::D1, false);
        let state = sub.ready().await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(state.provenance, Provenance::Synthetic);
        assert_eq!(state.series.len(), 24);
        assert!(state.series.points().iter().all(|p| p.price > 0.0));
        assert_eq!(
            crate::ui::chart::banner_text(state.provenance),
            Some("Données simulées")
        );
    }
}
