// ============================================================================
// Request Queue
// ============================================================================
// File FIFO des requêtes sortantes, avec espacement minimum entre deux
// exécutions et suspension pendant un cooldown de rate limit.
//
// MACHINE À ÉTATS :
//
//   Idle ──enqueue()──> Draining ──file vide──> Idle
//                         │  ▲
//                         ▼  │
//            cooldown actif : attente poll_interval, puis re-vérification
//
// Boucle de vidage (une tâche tokio par période Draining) :
// 1. Cooldown actif → sleep(poll_interval), recommencer
// 2. pop_front() ; file vide → Idle, fin de la tâche
// 3. Exécuter la requête (elle lance elle-même son fetch async)
// 4. Si elle a réellement appelé le réseau : sleep(delay)
// 5. Recommencer
//
// CONCEPT RUST : Arc<Mutex<...>> partagé
// - RequestQueue est Clone : chaque clone pointe vers la même file
// - Le verrou n'est jamais tenu pendant un .await
// ============================================================================

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, error};

use super::rate_limit::RateLimitState;

/// Unité de travail sans argument (closure sur coin/range)
///
/// Retourne true si un appel réseau a été lancé. Une requête abandonnée
/// (abonné disparu, cache déjà frais) retourne false et ne consomme pas
/// d'espacement.
pub type QueuedRequest = Box<dyn FnOnce() -> bool + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Idle,
    Draining,
}

struct QueueInner {
    pending: VecDeque<QueuedRequest>,
    state: QueueState,
}

#[derive(Clone)]
pub struct RequestQueue {
    inner: Arc<Mutex<QueueInner>>,
    rate_limit: Arc<Mutex<RateLimitState>>,
    delay: Duration,
    poll_interval: Duration,
}

impl RequestQueue {
    pub fn new(
        rate_limit: Arc<Mutex<RateLimitState>>,
        delay: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueInner {
                pending: VecDeque::new(),
                state: QueueState::Idle,
            })),
            rate_limit,
            delay,
            poll_interval,
        }
    }

    /// Ajoute une requête en fin de file
    ///
    /// Si la file était Idle, lance la tâche de vidage (doit être appelé
    /// depuis un contexte tokio).
    pub fn enqueue(&self, request: QueuedRequest) {
        let start_draining = {
            let mut inner = self.lock();
            inner.pending.push_back(request);
            debug!(pending = inner.pending.len(), "Request enqueued");

            if inner.state == QueueState::Idle {
                inner.state = QueueState::Draining;
                true
            } else {
                false
            }
        };

        if start_draining {
            tokio::spawn(self.clone().drain());
        }
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state(&self) -> QueueState {
        self.lock().state
    }

    async fn drain(self) {
        debug!("Queue draining started");

        loop {
            if self.is_cooling_down() {
                debug!(
                    poll_secs = self.poll_interval.as_secs(),
                    "Rate limit cooldown active, deferring queue"
                );
                sleep(self.poll_interval).await;
                continue;
            }

            let next = {
                let mut inner = self.lock();
                match inner.pending.pop_front() {
                    Some(request) => request,
                    None => {
                        inner.state = QueueState::Idle;
                        debug!("Queue empty, draining stopped");
                        return;
                    }
                }
            };

            // Une requête qui panique ne doit pas bloquer la file en Draining
            let issued = match panic::catch_unwind(AssertUnwindSafe(next)) {
                Ok(issued) => issued,
                Err(_) => {
                    error!("Queued request panicked");
                    true
                }
            };

            if issued {
                sleep(self.delay).await;
            } else {
                debug!("Request skipped, no spacing");
            }
        }
    }

    fn is_cooling_down(&self) -> bool {
        self.rate_limit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_limited(Instant::now())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
