// ============================================================================
// Générateur de données synthétiques
// ============================================================================
// Produit une série de prix plausible quand aucune donnée réelle n'est
// disponible (API en rate limit, erreur réseau, pas de cache).
//
// ALGORITHME :
// 1. Profil (prix de base, volatilité) tiré de la table des coins connus
// 2. Nombre de points et espacement tirés de la fenêtre de temps
// 3. Marche aléatoire : chaque point = précédent + perturbation bornée
// 4. Un prix <= 0 est ramené à une fraction du prix de base
//
// La série est aléatoire à chaque appel, mais toujours :
// - au moins 2 points
// - timestamps strictement croissants
// - prix strictement positifs
// ============================================================================

use rand::Rng;

use crate::models::coin::{self, GENERIC_BASE_PRICE, GENERIC_VOLATILITY};
use crate::models::{PricePoint, PriceSeries, TimeRange};

/// Fraction du prix de base utilisée comme plancher
const PRICE_FLOOR_FRACTION: f64 = 0.1;

/// Paramètres de la marche aléatoire pour un coin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticProfile {
    pub base_price: f64,
    pub volatility: f64,
}

impl SyntheticProfile {
    /// Profil d'un coin : table des coins connus, sinon profil générique
    pub fn for_coin(coin_hint: &str) -> Self {
        match coin::lookup(coin_hint) {
            Some(known) => Self {
                base_price: known.base_price,
                volatility: known.volatility,
            },
            None => Self {
                base_price: GENERIC_BASE_PRICE,
                volatility: GENERIC_VOLATILITY,
            },
        }
    }

    fn floor(&self) -> f64 {
        self.base_price * PRICE_FLOOR_FRACTION
    }
}

/// Génère une série synthétique se terminant maintenant
pub fn generate(range: TimeRange, coin_hint: &str) -> PriceSeries {
    let now_ms = chrono::Utc::now().timestamp_millis();
    generate_with(range, coin_hint, now_ms, &mut rand::thread_rng())
}

/// Génère une série synthétique se terminant à `end_ms`, avec un RNG fourni
///
/// CONCEPT RUST : Generics avec trait bound
/// - R: Rng + ?Sized accepte thread_rng() comme un StdRng seedé (tests)
pub fn generate_with<R: Rng + ?Sized>(
    range: TimeRange,
    coin_hint: &str,
    end_ms: i64,
    rng: &mut R,
) -> PriceSeries {
    let profile = SyntheticProfile::for_coin(coin_hint);
    let (count, step_ms) = range.synthetic_layout();
    let start_ms = end_ms - (count as i64 - 1) * step_ms;

    let mut series = PriceSeries::new();
    let mut price = profile.base_price;

    for i in 0..count {
        if i > 0 {
            price += rng.gen_range(-profile.volatility..=profile.volatility);
            if price <= 0.0 {
                price = profile.floor();
            }
        }
        series.push(PricePoint::new(start_ms + i as i64 * step_ms, price));
    }

    series
}

// ============================================================================
// Tests unitaires
// ============================================================================
