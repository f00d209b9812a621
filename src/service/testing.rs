// Sources factices pour les tests du service

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{FetchFailure, FetchOutcome, PriceSource};
use crate::models::{PricePoint, PriceSeries, TimeRange};

/// Rejoue une liste de réponses dans l'ordre
///
/// Une fois la liste épuisée, chaque appel échoue en Network.
#[derive(Default)]
pub struct ScriptedSource {
    outcomes: Mutex<VecDeque<FetchOutcome>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn new(outcomes: Vec<FetchOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            ..Default::default()
        }
    }

    /// Chaque réponse arrive après `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    async fn fetch_market_chart(&self, _coin_id: &str, _range: TimeRange) -> FetchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchFailure::Network("script exhausted".to_string())))
    }
}

/// Source dont le fetch panique
pub struct PanickingSource;

#[async_trait]
impl PriceSource for PanickingSource {
    async fn fetch_market_chart(&self, coin_id: &str, _range: TimeRange) -> FetchOutcome {
        panic!("transport exploded for {}", coin_id)
    }
}

/// Série croissante de `len` points espacés d'une minute
pub fn sample_series(len: usize, start_price: f64) -> PriceSeries {
    PriceSeries::from_points(
        (0..len)
            .map(|i| PricePoint::new(1_700_000_000_000 + i as i64 * 60_000, start_price + i as f64))
            .collect(),
    )
}

pub fn rate_limited() -> FetchOutcome {
    Err(FetchFailure::RateLimited { retry_after: None })
}
