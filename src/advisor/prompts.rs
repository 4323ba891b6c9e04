// src/advisor/prompts.rs
use crate::analysis::indicators;
use crate::domain::models::Position;
use crate::report::formatter::{format_avg, format_pct};
use crate::trading::strategies::SignalAssessment;
use std::fmt::Write;

pub const TRADE_TEMPERATURE: f64 = 0.3;
pub const INTRADAY_TEMPERATURE: f64 = 0.2;

const TRADE_HISTORY_ROWS: usize = 20;
const INTRADAY_HISTORY_ROWS: usize = 10;

/// Markdown table of the newest `rows` closes with their averages
fn history_table(assessment: &SignalAssessment, rows: usize, precision: usize) -> String {
    let closes = assessment.series.close_prices();
    let short = indicators::rolling_sma(&closes, assessment.short_period);
    let long = indicators::rolling_sma(&closes, assessment.long_period);
    let fmt_avg = |avg: Option<f64>| match avg {
        Some(v) => format!("{:.*}", precision, v),
        None => "N/A".to_string(),
    };

    let mut table = format!(
        "Date | Close | MA{} | MA{}\n--- | --- | --- | ---\n",
        assessment.short_period, assessment.long_period
    );
    let start = assessment.series.len().saturating_sub(rows);
    for (idx, bar) in assessment.series.bars.iter().enumerate().skip(start) {
        let _ = writeln!(
            table,
            "{} | {:.*} | {} | {}",
            bar.date.format("%Y-%m-%d"),
            precision,
            bar.close,
            fmt_avg(short[idx]),
            fmt_avg(long[idx])
        );
    }
    table
}

fn prev_close_text(assessment: &SignalAssessment) -> String {
    assessment
        .prev_close
        .map(|p| p.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Prompt asking for a buy/sell/hold call on the current session
pub fn trade_signal_prompt(assessment: &SignalAssessment) -> String {
    let live = &assessment.live;
    let averages = &assessment.averages;
    format!(
        "You are a quantitative trading analyst. Give a trading signal for **{code}**.

## Daily history (last {rows} sessions)
{table}
## Live session
- **Date**: {date}
- **Current**: {close}
- **Open**: {open}
- **High**: {high}
- **Low**: {low}
- **Volume**: {volume}
- **Amount**: {amount}
- **Change**: {change}
- **MA{sp}**: {short}
- **MA{lp}**: {long}
- **Prev Close**: {prev}

## Requirements
1. Weigh trend (moving averages), volume, price pattern and support/resistance
2. Give one clear signal: buy / sell / hold
3. State at most three core reasons, briefly
4. For buy or sell, suggest a stop loss and a target based on the technicals

## Answer format (follow exactly)
Signal: [buy/sell/hold]
Reason: [reason 1; reason 2; reason 3]
Stop Loss: [price or N/A]
Target: [price or N/A]
",
        code = assessment.instrument,
        rows = TRADE_HISTORY_ROWS,
        table = history_table(assessment, TRADE_HISTORY_ROWS, 4),
        date = live.date.format("%Y-%m-%d"),
        close = live.close,
        open = live.open,
        high = live.high,
        low = live.low,
        volume = live.volume,
        amount = live.amount,
        change = format_pct(assessment.pct_change),
        sp = assessment.short_period,
        short = format_avg(averages.short_avg),
        lp = assessment.long_period,
        long = format_avg(averages.long_avg),
        prev = prev_close_text(assessment),
    )
}

/// Intraday range of the live bar in percent of the previous close
pub fn intraday_range_pct(assessment: &SignalAssessment) -> Option<f64> {
    let live = &assessment.live;
    assessment
        .prev_close
        .filter(|prev| *prev != 0.0)
        .map(|prev| (live.high - live.low) / prev * 100.0)
}

/// Where the current price sits in the day's range, 0.0 at the low and 1.0 at the high
pub fn position_in_range(assessment: &SignalAssessment) -> f64 {
    let live = &assessment.live;
    if live.high > live.low {
        (live.close - live.low) / (live.high - live.low)
    } else {
        0.5
    }
}

fn position_section(position: Option<&Position>, price: f64) -> String {
    let position = match position {
        Some(position) => position,
        None => return String::new(),
    };
    match (position.cost, position.floating_pct(price)) {
        (Some(cost), Some(pnl)) => format!(
            "\n## Current position\n- **Cost**: {:.3}\n- **Ratio**: {:.1}%\n- **Floating P/L**: {:+.2}%\n",
            cost,
            position.ratio * 100.0,
            pnl
        ),
        _ if position.ratio > 0.0 => format!(
            "\n## Current position\n- **Ratio**: {:.1}%\n",
            position.ratio * 100.0
        ),
        _ => String::new(),
    }
}

/// Prompt asking for an intraday swing ("T") action
pub fn intraday_t_prompt(assessment: &SignalAssessment, position: Option<&Position>) -> String {
    let live = &assessment.live;
    let averages = &assessment.averages;
    format!(
        "You are an intraday trading specialist focused on swing trades within the session. \
Analyse the intraday opportunity for **{code}**.

## Daily history (last {rows} sessions)
{table}
## Live session
- **Date**: {date}
- **Open**: {open}
- **Current**: {close}
- **High**: {high}
- **Low**: {low}
- **Intraday Range**: {range}
- **Position In Range**: {in_range:.1}% (0% = day low, 100% = day high)
- **Change**: {change}
- **MA{sp}**: {short}
- **MA{lp}**: {long}
- **Prev Close**: {prev}
{position}
## Requirements
1. Decide whether price sits at an intraday low, an intraday high, or mid-range
2. Derive support and resistance from prev close, open, averages and the day's extremes
3. Pick exactly one action:
   - immediate-buy: pulled back to support, buy the dip for a quick rebound
   - immediate-sell: pushed up to resistance, sell into strength
   - add-position: trend up and price not extended, add to the core holding
   - reduce-position: extended gain or weakening trend, cut exposure
   - no-action: range-bound, no clear direction
4. Suggest a size: light 10-20% / standard 20-30% / heavy 30-50%, given the current ratio
5. Give the target price and a strict stop loss

## Answer format (follow exactly)
Action: [immediate-buy/immediate-sell/add-position/reduce-position/no-action]
Key Reason: [brief, at most three points]
Suggested Size: [light 10-20% / standard 20-30% / heavy 30-50%]
Target Price: [price]
Stop Loss: [price]
",
        code = assessment.instrument,
        rows = INTRADAY_HISTORY_ROWS,
        table = history_table(assessment, INTRADAY_HISTORY_ROWS, 3),
        date = live.date.format("%Y-%m-%d"),
        open = live.open,
        close = live.close,
        high = live.high,
        low = live.low,
        range = format_pct(intraday_range_pct(assessment)),
        in_range = position_in_range(assessment) * 100.0,
        change = format_pct(assessment.pct_change),
        sp = assessment.short_period,
        short = format_avg(averages.short_avg),
        lp = assessment.long_period,
        long = format_avg(averages.long_avg),
        prev = prev_close_text(assessment),
        position = position_section(position, live.close),
    )
}
