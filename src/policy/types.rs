use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::config::types::{Bps, Pct, Price};

/// Exit-risk policy. A tagged union over six kinds; `Combo` nests the
/// others and is the only recursive variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Policy {
    FixedStop {
        stop_pct: Pct,
        take_profit_pct: Option<Pct>,
    },
    TimeStop {
        max_hold_ms: i64,
        take_profit_pct: Option<Pct>,
    },
    TrailingStop {
        activation_pct: Pct,
        trail_pct: Pct,
        hard_stop_pct: Option<Pct>,
    },
    Ladder {
        stop_pct: Option<Pct>,
        levels: Vec<LadderLevel>,
    },
    Combo {
        policies: Vec<Policy>,
    },
    WashRebound {
        trail_pct: Pct,
        wash_pct: Pct,
        rebound_pct: Pct,
        #[serde(default = "default_cooldown_candles")]
        cooldown_candles: u32,
        #[serde(default = "default_max_reentries")]
        max_reentries: u32,
    },
}

fn default_cooldown_candles() -> u32 {
    1
}

fn default_max_reentries() -> u32 {
    3
}

/// One partial-exit rung of a [`Policy::Ladder`]. `fraction` is of the
/// *original* position, not of what remains.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LadderLevel {
    pub multiple: f64,
    pub fraction: f64,
}

/// Why a policy stopped driving a position forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExitReason {
    NoEntry,
    StopLoss,
    TakeProfit,
    TimeStop,
    HardStop,
    TrailingStop,
    LadderComplete,
    EndOfData,
    Cancelled,
}

/// The raw outcome of driving one policy's state machine across a candle
/// window, before fee accounting. `gross_return_bps` is already net of fees
/// when `fees_already_applied` is set (only `wash_rebound` does this, since
/// its per-trade fee is folded into the compounding multiplier as it runs).
#[derive(Debug, Clone)]
pub struct PolicyRunResult {
    pub entry_idx: usize,
    pub exit_idx: usize,
    pub entry_price: Price,
    pub exit_price: Price,
    pub exit_reason: ExitReason,
    pub peak_high: Price,
    pub max_adverse_excursion_bps: Bps,
    pub gross_return_bps: Bps,
    pub fees_already_applied: bool,
    /// `Ladder` only: executed-levels fraction plus whatever fraction was
    /// still open at exit. Should always be `1.0` (I6); checked by the
    /// executor. `None` for every other policy kind.
    pub ladder_fraction_total: Option<f64>,
}

/// The outcome of executing a policy end to end (§3 "Execution result").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub realized_return_bps: Bps,
    pub gross_return_bps: Bps,
    pub stop_out: bool,
    pub max_adverse_excursion_bps: Bps,
    pub time_exposed_ms: i64,
    pub tail_capture: Option<f64>,
    pub entry_ts_ms: i64,
    pub exit_ts_ms: i64,
    pub entry_px: Price,
    pub exit_px: Price,
    pub exit_reason: ExitReason,
}

impl ExecutionResult {
    pub fn no_entry() -> Self {
        Self {
            realized_return_bps: Bps::new(0.0),
            gross_return_bps: Bps::new(0.0),
            stop_out: false,
            max_adverse_excursion_bps: Bps::new(0.0),
            time_exposed_ms: 0,
            tail_capture: None,
            entry_ts_ms: 0,
            exit_ts_ms: 0,
            entry_px: Price::new(0.0),
            exit_px: Price::new(0.0),
            exit_reason: ExitReason::NoEntry,
        }
    }

    pub fn is_no_entry(&self) -> bool {
        matches!(self.exit_reason, ExitReason::NoEntry)
    }
}
