// ============================================================================
// Module : coin
// ============================================================================
// Table des cryptomonnaies connues et helpers d'affichage
//
// La table sert à trois choses :
// - nom et symbole affichés dans la watchlist
// - couleur d'accent de chaque coin
// - profil (prix de base, volatilité) des données synthétiques
// ============================================================================

/// Couleur RGB (indépendante de ratatui pour garder les models sans dépendance UI)
pub type Rgb = (u8, u8, u8);

/// Une cryptomonnaie connue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnownCoin {
    /// Identifiant CoinGecko (ex: "bitcoin")
    pub id: &'static str,
    /// Ticker (ex: "BTC")
    pub symbol: &'static str,
    pub name: &'static str,
    /// Prix de départ des séries synthétiques
    pub base_price: f64,
    /// Amplitude maximale d'une perturbation entre deux points synthétiques
    pub volatility: f64,
    pub color: Rgb,
}

/// Profil générique pour les coins inconnus
pub const GENERIC_BASE_PRICE: f64 = 100.0;
pub const GENERIC_VOLATILITY: f64 = 2.0;

const KNOWN_COINS: &[KnownCoin] = &[
    KnownCoin { id: "bitcoin", symbol: "BTC", name: "Bitcoin", base_price: 65_000.0, volatility: 900.0, color: (0xf7, 0x93, 0x1a) },
    KnownCoin { id: "ethereum", symbol: "ETH", name: "Ethereum", base_price: 3_500.0, volatility: 60.0, color: (0x62, 0x7e, 0xea) },
    KnownCoin { id: "binancecoin", symbol: "BNB", name: "BNB", base_price: 580.0, volatility: 10.0, color: (0xf3, 0xba, 0x2f) },
    KnownCoin { id: "solana", symbol: "SOL", name: "Solana", base_price: 150.0, volatility: 4.0, color: (0x14, 0xf1, 0x95) },
    KnownCoin { id: "ripple", symbol: "XRP", name: "XRP", base_price: 0.55, volatility: 0.01, color: (0x00, 0x85, 0xc0) },
    KnownCoin { id: "cardano", symbol: "ADA", name: "Cardano", base_price: 0.45, volatility: 0.008, color: (0x00, 0x33, 0xad) },
    KnownCoin { id: "dogecoin", symbol: "DOGE", name: "Dogecoin", base_price: 0.12, volatility: 0.003, color: (0xc3, 0xa6, 0x34) },
    KnownCoin { id: "polkadot", symbol: "DOT", name: "Polkadot", base_price: 7.0, volatility: 0.15, color: (0xe6, 0x00, 0x7a) },
    KnownCoin { id: "litecoin", symbol: "LTC", name: "Litecoin", base_price: 85.0, volatility: 1.8, color: (0xbf, 0xbb, 0xbb) },
    KnownCoin { id: "tether", symbol: "USDT", name: "Tether", base_price: 1.0, volatility: 0.001, color: (0x26, 0xa1, 0x7b) },
    KnownCoin { id: "chainlink", symbol: "LINK", name: "Chainlink", base_price: 15.0, volatility: 0.35, color: (0x2a, 0x5a, 0xda) },
    KnownCoin { id: "uniswap", symbol: "UNI", name: "Uniswap", base_price: 8.0, volatility: 0.2, color: (0xff, 0x00, 0x7a) },
];

/// Cherche un coin connu par identifiant CoinGecko ou par ticker (insensible à la casse)
pub fn lookup(coin: &str) -> Option<&'static KnownCoin> {
    let wanted = coin.trim().to_lowercase();
    KNOWN_COINS
        .iter()
        .find(|c| c.id == wanted || c.symbol.to_lowercase() == wanted)
}

/// Nom affichable : nom connu, sinon l'identifiant avec une majuscule
pub fn display_name(coin: &str) -> String {
    match lookup(coin) {
        Some(known) => known.name.to_string(),
        None => {
            let mut chars = coin.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

/// Ticker affichable : ticker connu, sinon les 4 premières lettres en majuscules
pub fn display_symbol(coin: &str) -> String {
    match lookup(coin) {
        Some(known) => known.symbol.to_string(),
        None => coin.chars().take(4).collect::<String>().to_uppercase(),
    }
}

/// Couleur d'accent d'un coin
///
/// Coins inconnus : couleur dérivée d'un hash du nom, donc stable d'un lancement à l'autre.
pub fn coin_color(coin: &str) -> Rgb {
    if let Some(known) = lookup(coin) {
        return known.color;
    }

    // CONCEPT RUST : arithmétique wrapping explicite (pas de panic en overflow)
    let hash = coin.chars().fold(0i32, |hash, c| {
        (c as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    });
    let byte = |shift: u32| ((hash >> shift) & 0xFF) as u8;
    (byte(0), byte(8), byte(16))
}

/// Formate un prix avec un nombre de décimales adapté à sa magnitude
///
/// - >= 1000 : 2 décimales (65,432.10)
/// - >= 1    : 2 à 4 décimales
/// - >= 0.01 : 4 à 6 décimales
/// - sinon   : 6 à 8 décimales
pub fn format_price(price: f64) -> String {
    let magnitude = price.abs();
    let (min_decimals, max_decimals) = if magnitude >= 1000.0 {
        (2, 2)
    } else if magnitude >= 1.0 {
        (2, 4)
    } else if magnitude >= 0.01 {
        (4, 6)
    } else {
        (6, 8)
    };

    let raw = format!("{:.*}", max_decimals, magnitude);
    let (int_part, frac_part) = raw.split_once('.').unwrap_or((raw.as_str(), ""));

    // Supprime les zéros inutiles au-delà du minimum de décimales
    let mut frac = frac_part.to_string();
    while frac.len() > min_decimals && frac.ends_with('0') {
        frac.pop();
    }

    let sign = if price < 0.0 { "-" } else { "" };
    if frac.is_empty() {
        format!("{}{}", sign, group_thousands(int_part))
    } else {
        format!("{}{}.{}", sign, group_thousands(int_part), frac)
    }
}

/// Insère un séparateur de milliers : "65432" -> "65,432"
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id_and_symbol() {
        assert_eq!(lookup("bitcoin").map(|c| c.symbol), Some("BTC"));
        assert_eq!(lookup("ETH").map(|c| c.id), Some("ethereum"));
        assert!(lookup("unknown-coin").is_none());
    }

    #[test]
    fn test_display_name_and_symbol() {
        assert_eq!(display_name("solana"), "Solana");
        assert_eq!(display_name("pepe"), "Pepe");
        assert_eq!(display_symbol("dogecoin"), "DOGE");
        assert_eq!(display_symbol("arbitrum"), "ARBI");
    }

    #[test]
    fn test_format_price_magnitudes() {
        assert_eq!(format_price(65_432.1), "65,432.10");
        assert_eq!(format_price(1_234_567.891), "1,234,567.89");
        assert_eq!(format_price(150.5), "150.50");
        assert_eq!(format_price(1.23456), "1.2346");
        assert_eq!(format_price(0.55), "0.5500");
        assert_eq!(format_price(0.123456), "0.123456");
        assert_eq!(format_price(0.00001234), "0.00001234");
    }

    #[test]
    fn test_coin_color_known_and_hashed() {
        assert_eq!(coin_color("btc"), (0xf7, 0x93, 0x1a));
        // Couleur déterministe pour un coin inconnu
        assert_eq!(coin_color("mystery"), coin_color("mystery"));
        assert_ne!(coin_color("mystery"), coin_color("another"));
    }
}
