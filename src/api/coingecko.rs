// ============================================================================
// API Client : CoinGecko (market_chart)
// ============================================================================
// Récupère l'historique de prix d'un coin et classifie la réponse
//
// Endpoint : GET {base}/coins/{id}/market_chart?vs_currency=usd&days={N|max}
// Réponse  : { "prices": [[ts_ms, price], ...], "market_caps": [...], "total_volumes": [...] }
//
// CLASSIFICATION :
// - 2xx + "prices" valide (>= 2 points) → Ok(série)
// - 429                                 → RateLimited (+ Retry-After)
// - 401 / 403                           → Auth
// - 2xx sans série exploitable          → Malformed
// - autre statut, connexion, timeout    → Network
// ============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::api::{FetchFailure, FetchOutcome, PriceSource};
use crate::config::ServiceConfig;
use crate::models::{PricePoint, PriceSeries, TimeRange};

/// Header d'authentification de l'API CoinGecko
const API_KEY_HEADER: &str = "x-cg-pro-api-key";

// ============================================================================
// Schéma de la réponse
// ============================================================================
// Seul "prices" est exigé. Les tuples (f64, f64) imposent des paires de
// nombres : un tableau de 3 éléments ou une valeur null rend la réponse
// malformée au lieu d'être acceptée aveuglément.
// ============================================================================

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Option<Vec<(f64, f64)>>,
}

/// Client HTTP pour l'API CoinGecko (ou un proxy qui la relaie)
pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    /// Crée le client à partir de la configuration
    ///
    /// Le timeout de la configuration s'applique à chaque requête.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("coinwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Construit l'URL market_chart pour un coin et une fenêtre
    pub fn market_chart_url(&self, coin_id: &str, range: TimeRange) -> String {
        format!(
            "{}/coins/{}/market_chart?vs_currency=usd&days={}",
            self.base_url,
            coin_id,
            range.api_days()
        )
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    /// CONCEPT RUST : #[instrument]
    /// - Tous les logs de la requête portent coin_id et range
    #[instrument(skip(self), fields(range = %range))]
    async fn fetch_market_chart(&self, coin_id: &str, range: TimeRange) -> FetchOutcome {
        let url = self.market_chart_url(coin_id, range);
        debug!(url = %url, "Sending market_chart request");

        let mut request = self.http.get(&url).header(ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let reason = if e.is_timeout() {
                    "timeout".to_string()
                } else {
                    e.to_string()
                };
                warn!(error = %reason, "market_chart request failed");
                return Err(FetchFailure::Network(reason));
            }
        };

        let status = response.status().as_u16();
        let retry_after = parse_retry_after(
            response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
        );

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(status, error = %e, "Failed to read market_chart body");
                return Err(FetchFailure::Network(e.to_string()));
            }
        };

        classify_response(status, retry_after, &body)
    }
}

/// Classifie une réponse HTTP
///
/// Les échecs sont loggés ici, au point de classification.
pub fn classify_response(status: u16, retry_after: Option<Duration>, body: &str) -> FetchOutcome {
    let outcome = match status {
        200..=299 => parse_market_chart(body),
        429 => Err(FetchFailure::RateLimited { retry_after }),
        401 | 403 => Err(FetchFailure::Auth { status }),
        _ => Err(FetchFailure::Network(format!("HTTP {}", status))),
    };

    match &outcome {
        Ok(series) => info!(status, points = series.len(), "market_chart classified as success"),
        Err(failure) => warn!(status, kind = failure.kind(), error = %failure, "market_chart classified as failure"),
    }

    outcome
}

/// Valide le JSON market_chart et le convertit en PriceSeries
///
/// Les points au prix non fini (NaN, inf) sont ignorés. Il faut au moins
/// 2 points valides pour tracer une ligne.
pub fn parse_market_chart(body: &str) -> FetchOutcome {
    let response: MarketChartResponse = serde_json::from_str(body)
        .map_err(|e| FetchFailure::Malformed(format!("JSON invalide : {}", e)))?;

    let prices = response
        .prices
        .ok_or_else(|| FetchFailure::Malformed("champ 'prices' absent".to_string()))?;

    let total = prices.len();
    let points: Vec<PricePoint> = prices
        .into_iter()
        .filter(|(ts, price)| ts.is_finite() && price.is_finite())
        .map(|(ts, price)| PricePoint::new(ts as i64, price))
        .collect();

    if points.len() < total {
        debug!(skipped = total - points.len(), total, "Skipped non-finite price points");
    }

    if points.len() < 2 {
        return Err(FetchFailure::Malformed(format!(
            "au moins 2 points attendus, {} reçu(s)",
            points.len()
        )));
    }

    Ok(PriceSeries::from_points(points))
}

/// Lit un header Retry-After exprimé en secondes
///
/// La forme date HTTP n'est pas supportée (retourne None).
pub fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

// ============================================================================
// Tests unitaires
// ============================================================================
