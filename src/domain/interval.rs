use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Candle interval, mirroring the Binance-style shorthand used throughout
/// the wider market-data ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Interval {
    #[strum(to_string = "1s")]
    S1,
    #[strum(to_string = "1m")]
    M1,
    #[strum(to_string = "3m")]
    M3,
    #[strum(to_string = "5m")]
    M5,
    #[strum(to_string = "15m")]
    M15,
    #[strum(to_string = "30m")]
    M30,
    #[strum(to_string = "1h")]
    H1,
    #[strum(to_string = "2h")]
    H2,
    #[strum(to_string = "4h")]
    H4,
    #[strum(to_string = "6h")]
    H6,
    #[strum(to_string = "8h")]
    H8,
    #[strum(to_string = "12h")]
    H12,
    #[strum(to_string = "1d")]
    D1,
    #[strum(to_string = "3d")]
    D3,
    #[strum(to_string = "1w")]
    W1,
}

impl Interval {
    /// Interval length in milliseconds.
    pub const fn to_ms(self) -> i64 {
        const MS_IN_S: i64 = 1_000;
        const MS_IN_MIN: i64 = MS_IN_S * 60;
        match self {
            Interval::S1 => MS_IN_S,
            Interval::M1 => MS_IN_MIN,
            Interval::M3 => MS_IN_MIN * 3,
            Interval::M5 => MS_IN_MIN * 5,
            Interval::M15 => MS_IN_MIN * 15,
            Interval::M30 => MS_IN_MIN * 30,
            Interval::H1 => MS_IN_MIN * 60,
            Interval::H2 => MS_IN_MIN * 60 * 2,
            Interval::H4 => MS_IN_MIN * 60 * 4,
            Interval::H6 => MS_IN_MIN * 60 * 6,
            Interval::H8 => MS_IN_MIN * 60 * 8,
            Interval::H12 => MS_IN_MIN * 60 * 12,
            Interval::D1 => MS_IN_MIN * 60 * 24,
            Interval::D3 => MS_IN_MIN * 60 * 24 * 3,
            Interval::W1 => MS_IN_MIN * 60 * 24 * 7,
        }
    }
}
