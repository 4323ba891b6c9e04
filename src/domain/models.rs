// src/domain/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pct_change: Option<f64>,
}

impl Bar {
    /// Bar carrying only a close price, as served by the history store
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
            amount: 0.0,
            pct_change: None,
        }
    }
}

// Ordered daily bars for one instrument
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    pub instrument: String,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(instrument: &str, bars: Vec<Bar>) -> Self {
        Self {
            instrument: instrument.to_string(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn close_prices(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// True when dates are strictly increasing (no duplicates)
    pub fn is_strictly_ascending(&self) -> bool {
        self.bars.windows(2).all(|w| w[0].date < w[1].date)
    }
}

/// Short/long simple moving averages at the current and previous step.
///
/// `None` marks an average whose window is not yet full; such a value is
/// incomparable and never takes part in a crossover decision.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovingAverageState {
    pub short_avg: Option<f64>,
    pub long_avg: Option<f64>,
    pub prev_short_avg: Option<f64>,
    pub prev_long_avg: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Signal {
    Buy,
    Sell,
    BiasBuy,
    BiasSell,
    Hold,
    // Action vocabulary of the AI-augmented intraday variant
    ImmediateBuy,
    ImmediateSell,
    NoAction,
    AddPosition,
    ReducePosition,
}

impl Signal {
    pub fn as_label(&self) -> &'static str {
        match self {
            Signal::Buy => "buy",
            Signal::Sell => "sell",
            Signal::BiasBuy => "bias-buy",
            Signal::BiasSell => "bias-sell",
            Signal::Hold => "hold",
            Signal::ImmediateBuy => "immediate-buy",
            Signal::ImmediateSell => "immediate-sell",
            Signal::NoAction => "no-action",
            Signal::AddPosition => "add-position",
            Signal::ReducePosition => "reduce-position",
        }
    }

    /// Golden or death cross
    pub fn is_crossover(&self) -> bool {
        matches!(self, Signal::Buy | Signal::Sell)
    }

    pub fn is_bias(&self) -> bool {
        matches!(self, Signal::BiasBuy | Signal::BiasSell)
    }

    /// Intraday actions that ask the operator to trade
    pub fn is_intraday_action(&self) -> bool {
        matches!(
            self,
            Signal::ImmediateBuy
                | Signal::ImmediateSell
                | Signal::AddPosition
                | Signal::ReducePosition
        )
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "buy" => Ok(Signal::Buy),
            "sell" => Ok(Signal::Sell),
            "bias-buy" => Ok(Signal::BiasBuy),
            "bias-sell" => Ok(Signal::BiasSell),
            "hold" | "neutral" => Ok(Signal::Hold),
            "immediate-buy" => Ok(Signal::ImmediateBuy),
            "immediate-sell" => Ok(Signal::ImmediateSell),
            "no-action" => Ok(Signal::NoAction),
            "add-position" => Ok(Signal::AddPosition),
            "reduce-position" => Ok(Signal::ReducePosition),
            _ => Err(format!("Unknown signal label: {}", s)),
        }
    }
}

/// Held position used to enrich intraday prompts
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub cost: Option<f64>,
    pub ratio: f64,
}

impl Position {
    /// Floating profit/loss in percent at `price`
    pub fn floating_pct(&self, price: f64) -> Option<f64> {
        match self.cost {
            Some(cost) if cost != 0.0 => Some((price - cost) / cost * 100.0),
            _ => None,
        }
    }
}
