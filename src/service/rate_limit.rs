// ============================================================================
// RateLimitState
// ============================================================================
// Mémoire des échecs consécutifs et cooldown global de l'API
//
// CYCLE DE VIE :
//   échecs consécutifs < seuil  → libre
//   échecs consécutifs >= seuil → limité jusqu'à reset_at
//   succès, ou reset_at dépassé → libre, compteur à 0
//
// Le cooldown vaut le Retry-After de l'API s'il est fourni, sinon la durée
// configurée (15 minutes par défaut).
// ============================================================================

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

/// Photo de l'état, pour l'affichage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitSnapshot {
    pub is_limited: bool,
    pub remaining: Option<Duration>,
    pub consecutive_errors: u32,
}

#[derive(Debug)]
pub struct RateLimitState {
    is_limited: bool,
    reset_at: Option<Instant>,
    consecutive_errors: u32,
    threshold: u32,
    cooldown: Duration,
}

impl RateLimitState {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            is_limited: false,
            reset_at: None,
            consecutive_errors: 0,
            threshold,
            cooldown,
        }
    }

    /// Vrai si un cooldown est actif à `now`
    ///
    /// Un cooldown expiré est levé ici (reset automatique).
    pub fn is_limited(&mut self, now: Instant) -> bool {
        if !self.is_limited {
            return false;
        }

        match self.reset_at {
            Some(reset_at) if now < reset_at => true,
            _ => {
                info!("Rate limit cooldown elapsed, resuming requests");
                self.clear();
                false
            }
        }
    }

    /// Un succès efface toute la mémoire d'erreurs
    pub fn record_success(&mut self) {
        if self.is_limited || self.consecutive_errors > 0 {
            info!(
                previous_errors = self.consecutive_errors,
                "Successful fetch, rate limit state reset"
            );
        }
        self.clear();
    }

    /// Enregistre un échec classifié
    ///
    /// Retourne true si cet échec déclenche le cooldown.
    pub fn record_failure(&mut self, now: Instant, retry_after: Option<Duration>) -> bool {
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);

        if self.is_limited || self.consecutive_errors < self.threshold {
            return false;
        }

        let cooldown = retry_after.unwrap_or(self.cooldown);
        self.is_limited = true;
        self.reset_at = Some(now + cooldown);
        warn!(
            consecutive_errors = self.consecutive_errors,
            cooldown_secs = cooldown.as_secs(),
            "Error threshold reached, entering rate limit cooldown"
        );
        true
    }

    /// Temps restant avant la fin du cooldown
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        if !self.is_limited {
            return None;
        }
        self.reset_at
            .map(|reset_at| reset_at.saturating_duration_since(now))
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn reset_at(&self) -> Option<Instant> {
        self.reset_at
    }

    pub fn snapshot(&mut self, now: Instant) -> RateLimitSnapshot {
        let is_limited = self.is_limited(now);
        RateLimitSnapshot {
            is_limited,
            remaining: self.remaining(now),
            consecutive_errors: self.consecutive_errors,
        }
    }

    fn clear(&mut self) {
        self.is_limited = false;
        self.reset_at = None;
        self.consecutive_errors = 0;
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
