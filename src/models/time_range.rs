// ============================================================================
// Enum : TimeRange
// ============================================================================
// Fenêtre de temps sélectionnée pour un graphique (1h, 1d, 1w, ...)
//
// Chaque fenêtre détermine :
// - le paramètre `days` envoyé à l'API (market_chart)
// - la granularité des données synthétiques (nombre de points + espacement)
// - le nombre et le format des labels de l'axe X
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Fenêtre de temps d'un graphique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    /// 1 heure
    H1,
    /// 3 heures
    H3,
    /// 4 heures
    H4,
    /// 12 heures
    H12,
    /// 1 jour
    D1,
    /// 1 semaine
    W1,
    /// 1 mois
    M1,
    /// 3 mois
    M3,
    /// 6 mois
    M6,
    /// 1 an
    Y1,
    /// Tout l'historique disponible
    All,
}

/// Ordre de cycle pour la navigation clavier (h / l)
const ALL_RANGES: [TimeRange; 11] = [
    TimeRange::H1,
    TimeRange::H3,
    TimeRange::H4,
    TimeRange::H12,
    TimeRange::D1,
    TimeRange::W1,
    TimeRange::M1,
    TimeRange::M3,
    TimeRange::M6,
    TimeRange::Y1,
    TimeRange::All,
];

impl TimeRange {
    /// Label court pour l'affichage et la ligne de commande
    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::H1 => "1h",
            TimeRange::H3 => "3h",
            TimeRange::H4 => "4h",
            TimeRange::H12 => "12h",
            TimeRange::D1 => "1d",
            TimeRange::W1 => "1w",
            TimeRange::M1 => "1m",
            TimeRange::M3 => "3m",
            TimeRange::M6 => "6m",
            TimeRange::Y1 => "1y",
            TimeRange::All => "all",
        }
    }

    /// Valeur du paramètre `days` de l'endpoint market_chart
    ///
    /// L'API ne descend pas sous le jour : toutes les fenêtres intraday demandent "1".
    pub fn api_days(&self) -> &'static str {
        match self {
            TimeRange::H1 | TimeRange::H3 | TimeRange::H4 | TimeRange::H12 | TimeRange::D1 => "1",
            TimeRange::W1 => "7",
            TimeRange::M1 => "30",
            TimeRange::M3 => "90",
            TimeRange::M6 => "180",
            TimeRange::Y1 => "365",
            TimeRange::All => "max",
        }
    }

    /// Layout des données synthétiques : (nombre de points, espacement en ms)
    ///
    /// CONCEPT : granularité adaptée à la fenêtre
    /// - 1h → une minute par point
    /// - 1d → une heure par point (24 points)
    /// - 1w et plus → un jour par point
    pub fn synthetic_layout(&self) -> (usize, i64) {
        match self {
            TimeRange::H1 => (60, MINUTE_MS),
            TimeRange::H3 => (36, 5 * MINUTE_MS),
            TimeRange::H4 => (48, 5 * MINUTE_MS),
            TimeRange::H12 => (48, 15 * MINUTE_MS),
            TimeRange::D1 => (24, HOUR_MS),
            TimeRange::W1 => (7, DAY_MS),
            TimeRange::M1 => (30, DAY_MS),
            TimeRange::M3 => (90, DAY_MS),
            TimeRange::M6 => (180, DAY_MS),
            TimeRange::Y1 => (365, DAY_MS),
            TimeRange::All => (260, 7 * DAY_MS),
        }
    }

    /// Vrai pour les fenêtres d'une journée ou moins (labels en heures)
    pub fn is_intraday(&self) -> bool {
        matches!(
            self,
            TimeRange::H1 | TimeRange::H3 | TimeRange::H4 | TimeRange::H12 | TimeRange::D1
        )
    }

    /// Nombre de labels sur l'axe X : plus dense pour les fenêtres très courtes
    pub fn x_label_count(&self) -> usize {
        match self {
            TimeRange::H1 | TimeRange::H3 => 6,
            _ => 5,
        }
    }

    /// Format chrono des labels de l'axe X
    pub fn x_label_format(&self) -> &'static str {
        if self.is_intraday() {
            "%H:%M"
        } else if matches!(self, TimeRange::Y1 | TimeRange::All) {
            "%b %Y"
        } else {
            "%b %d"
        }
    }

    /// Toutes les fenêtres, dans l'ordre de cycle
    pub fn all() -> &'static [TimeRange] {
        &ALL_RANGES
    }

    /// Fenêtre suivante (cycle)
    pub fn next(&self) -> TimeRange {
        let idx = self.position();
        ALL_RANGES[(idx + 1) % ALL_RANGES.len()]
    }

    /// Fenêtre précédente (cycle)
    pub fn previous(&self) -> TimeRange {
        let idx = self.position();
        ALL_RANGES[(idx + ALL_RANGES.len() - 1) % ALL_RANGES.len()]
    }

    fn position(&self) -> usize {
        ALL_RANGES.iter().position(|r| r == self).unwrap_or(0)
    }
}

impl Default for TimeRange {
    /// Fenêtre par défaut : 1 jour
    fn default() -> Self {
        TimeRange::D1
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// CONCEPT RUST : FromStr
/// - Permet "1d".parse::<TimeRange>()
/// - Utilisé par clap pour l'argument --range
impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ALL_RANGES
            .iter()
            .copied()
            .find(|r| r.label() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = ALL_RANGES.iter().map(|r| r.label()).collect();
                format!("fenêtre inconnue '{}' (valeurs : {})", s, valid.join(", "))
            })
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
