// ============================================================================
// Structure : PriceSeries
// ============================================================================
// Série temporelle de prix : paires (timestamp en millisecondes, prix)
//
// INVARIANT : les timestamps sont croissants (non décroissants)
// - from_points() trie les points reçus
// - push() refuse un point plus ancien que le dernier
//
// Une série de moins de 2 points ne peut pas être tracée en ligne :
// le renderer affiche alors une ligne plate (placeholder).
// ============================================================================

use serde::{Deserialize, Serialize};

/// Un point de la série : timestamp (ms depuis epoch) + prix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Millisecondes depuis l'epoch Unix
    pub timestamp: i64,

    /// Prix en USD
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: i64, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Série de prix ordonnée par timestamp
///
/// CONCEPT RUST : Encapsulation
/// - Le Vec est privé : l'invariant d'ordre ne peut pas être cassé de l'extérieur
/// - Lecture via points() qui retourne une slice immuable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Crée une série vide
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Crée une série à partir de points quelconques
    ///
    /// Le tri est stable : deux points au même timestamp gardent leur ordre d'arrivée.
    pub fn from_points(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self { points }
    }

    /// Ajoute un point en fin de série
    ///
    /// Retourne false (et ignore le point) s'il est plus ancien que le dernier.
    pub fn push(&mut self, point: PricePoint) -> bool {
        if let Some(last) = self.points.last() {
            if point.timestamp < last.timestamp {
                return false;
            }
        }
        self.points.push(point);
        true
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Vrai si la série peut être tracée comme une ligne (au moins 2 points)
    pub fn is_renderable(&self) -> bool {
        self.points.len() >= 2
    }

    /// Prix minimum et maximum de la série
    ///
    /// CONCEPT RUST : fold pour calculer min/max en un seul passage
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(min, max), p| (min.min(p.price), max.max(p.price)),
        ))
    }

    /// Premier et dernier timestamp
    pub fn time_bounds(&self) -> Option<(i64, i64)> {
        Some((self.first()?.timestamp, self.last()?.timestamp))
    }

    /// Variation en pourcentage entre le premier et le dernier point
    pub fn change_percent(&self) -> Option<f64> {
        let first = self.first()?;
        let last = self.last()?;
        if first.price == 0.0 {
            return None;
        }
        Some((last.price - first.price) / first.price * 100.0)
    }

    /// Tendance de la série (hausse ou stable = true)
    ///
    /// Sans variation calculable, on considère la tendance positive.
    pub fn is_positive(&self) -> bool {
        self.change_percent().map(|c| c >= 0.0).unwrap_or(true)
    }

    /// Prix interpolé linéairement au timestamp donné
    ///
    /// Hors de la série, retourne le prix du bord le plus proche.
    pub fn price_at(&self, timestamp: i64) -> Option<f64> {
        let first = self.first()?;
        let last = self.last()?;
        if timestamp <= first.timestamp {
            return Some(first.price);
        }
        if timestamp >= last.timestamp {
            return Some(last.price);
        }

        // Premier point dont le timestamp dépasse la cible
        let idx = self.points.partition_point(|p| p.timestamp <= timestamp);
        let right = self.points[idx];
        let left = self.points[idx - 1];
        let span = (right.timestamp - left.timestamp) as f64;
        if span <= 0.0 {
            return Some(right.price);
        }
        let t = (timestamp - left.timestamp) as f64 / span;
        Some(left.price + (right.price - left.price) * t)
    }
}

// ============================================================================
// Provenance
// ============================================================================

/// Origine d'une série affichée
///
/// - Live : récupérée à l'instant (ou en cache encore frais)
/// - Cached : cache périmé réutilisé faute de mieux
/// - Synthetic : fabriquée localement, l'API étant indisponible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Live,
    Cached,
    Synthetic,
}

impl Provenance {
    pub fn label(&self) -> &'static str {
        match self {
            Provenance::Live => "live",
            Provenance::Cached => "cached",
            Provenance::Synthetic => "synthetic",
        }
    }

    /// Vrai si les données ne sont pas fraîches
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Provenance::Live)
    }
}

/// Série résolue : toujours affichable, accompagnée de sa provenance
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSeries {
    pub series: PriceSeries,
    pub provenance: Provenance,
}

impl ResolvedSeries {
    pub fn new(series: PriceSeries, provenance: Provenance) -> Self {
        Self { series, provenance }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
