// src/monitor/mod.rs
pub mod labels;
pub mod schedule;

use crate::advisor::{self, TextGenerator};
use crate::config::{MonitorConfig, MonitorMode, SurfaceFilter};
use crate::domain::errors::{AdvisorError, AnalysisError, AdvisorResult, AppResult};
use crate::domain::models::Signal;
use crate::exchange::client::{HistorySource, QuoteSource};
use crate::market_data::merge_live_bar;
use crate::notify::{MessageClass, NotificationSink};
use crate::report::{render_signal_report, ReportFields};
use crate::trading::{MovingAverageCrossStrategy, SignalAssessment, SignalTracker};
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub use labels::LabelMapping;
pub use schedule::{beijing_now, is_trading_time, next_sleep};

const UNKNOWN: &str = "unknown";
const NOT_AVAILABLE: &str = "N/A";

/// One instrument's parsed report for the current tick
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub signal: String,
    pub fields: ReportFields,
    pub assessment: SignalAssessment,
}

/// What a single tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSummary {
    /// Outside trading hours, nothing was fetched
    pub gated: bool,
    pub evaluated: usize,
    pub surfaced: Vec<String>,
    pub failed: Vec<String>,
}

/// Poll scheduler: fetch, evaluate, and surface signal changes per instrument
pub struct Monitor {
    config: MonitorConfig,
    mode: MonitorMode,
    mapping: LabelMapping,
    strategy: MovingAverageCrossStrategy,
    quotes: Arc<dyn QuoteSource>,
    history: Arc<dyn HistorySource>,
    advisor: Option<Arc<dyn TextGenerator>>,
    notifier: Arc<dyn NotificationSink>,
    tracker: SignalTracker,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        quotes: Arc<dyn QuoteSource>,
        history: Arc<dyn HistorySource>,
        advisor: Option<Arc<dyn TextGenerator>>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let mode = config.mode;
        if advisor.is_none() {
            if mode == MonitorMode::AiIntraday {
                log::warn!("AI intraday mode without an advisor credential, every evaluation will fail");
            }
            if config.ai_corroboration {
                log::warn!("AI corroboration without an advisor credential, it will report failures");
            }
        }

        Self {
            mapping: LabelMapping::for_mode(mode),
            mode,
            config,
            strategy: MovingAverageCrossStrategy::default(),
            quotes,
            history,
            advisor,
            notifier,
            tracker: SignalTracker::new(),
        }
    }

    /// Replace the preset label mapping
    pub fn with_mapping(mut self, mapping: LabelMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn mode(&self) -> MonitorMode {
        self.mode
    }

    pub fn tracker(&self) -> &SignalTracker {
        &self.tracker
    }

    fn corroborates(&self) -> bool {
        self.mode == MonitorMode::Rule && self.config.ai_corroboration
    }

    fn advisor(&self) -> AdvisorResult<&dyn TextGenerator> {
        self.advisor
            .as_deref()
            .ok_or_else(|| AdvisorError::MissingCredential("DEEPSEEK_API_KEY is not set".to_string()))
    }

    /// Run ticks until the process is stopped, or once with `run_once`
    pub async fn run(&mut self) {
        let interval = Duration::from_secs(self.config.interval_secs);
        log::info!(
            "Monitoring {} every {}s in {} mode ({})",
            self.config.codes.join(", "),
            interval.as_secs(),
            self.mode,
            if self.config.all_day {
                "all day"
            } else {
                "trading hours only"
            }
        );

        loop {
            let started = Instant::now();
            let summary = self.run_tick(beijing_now()).await;
            if !summary.gated {
                log::info!(
                    "Tick done in {:?}: {} evaluated, {} surfaced, {} failed",
                    started.elapsed(),
                    summary.evaluated,
                    summary.surfaced.len(),
                    summary.failed.len()
                );
            }
            if self.config.run_once {
                break;
            }
            tokio::time::sleep(next_sleep(interval, started.elapsed())).await;
        }
    }

    /// Process every instrument once, in configured order.
    ///
    /// A failing instrument produces an error notification and never stops
    /// the remaining ones.
    pub async fn run_tick(&mut self, now: NaiveDateTime) -> TickSummary {
        let mut summary = TickSummary::default();
        if !self.config.all_day && !is_trading_time(&now) {
            log::debug!("Outside trading hours at {}, skipping tick", now.format("%H:%M:%S"));
            summary.gated = true;
            return summary;
        }

        let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
        let codes = self.config.codes.clone();
        for code in &codes {
            match self.evaluate(code).await {
                Ok(evaluation) => {
                    summary.evaluated += 1;
                    if self.surface(code, evaluation, &timestamp).await {
                        summary.surfaced.push(code.clone());
                    }
                }
                Err(e) => {
                    let message = format!("[{}] {} signal fetch failed: {}", timestamp, code, e);
                    log::error!("{}", message);
                    self.notifier.deliver(&message, MessageClass::Error).await;
                    summary.failed.push(code.clone());
                }
            }
        }
        summary
    }

    /// Fetch, merge, evaluate and parse the report for one instrument
    pub async fn evaluate(&self, code: &str) -> AppResult<Evaluation> {
        let history = self
            .history
            .fetch_history(code, self.config.history_limit)
            .await?;
        let live = self.quotes.fetch_live_bar(code).await?;
        let merged = merge_live_bar(&history, &live)?;
        let assessment = self.strategy.evaluate(&merged, &live)?;

        let report = match self.mode {
            MonitorMode::AiIntraday => {
                advisor::intraday_t_report(
                    self.advisor()?,
                    &assessment,
                    self.config.position(code),
                )
                .await?
            }
            MonitorMode::Rule => render_signal_report(&assessment),
        };

        let fields = ReportFields::parse(&report, &self.mapping.labels());
        let signal = fields
            .get(&self.mapping.signal)
            .ok_or_else(|| AnalysisError::ExtractionMiss(self.mapping.signal.clone()))?
            .to_string();

        log::info!("{}: {} ({})", code, signal, self.mapping.strategy_label);
        Ok(Evaluation {
            signal,
            fields,
            assessment,
        })
    }

    /// Whether `signal` passes the surface filter
    pub fn is_candidate(&self, signal: &str) -> bool {
        if self.config.surface_filter == SurfaceFilter::All {
            return true;
        }
        let parsed = match signal.parse::<Signal>() {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };
        match self.mode {
            MonitorMode::Rule => {
                parsed.is_crossover() || (self.config.include_bias && parsed.is_bias())
            }
            MonitorMode::AiIntraday => parsed.is_intraday_action(),
        }
    }

    async fn surface(&mut self, code: &str, evaluation: Evaluation, timestamp: &str) -> bool {
        if !self.is_candidate(&evaluation.signal) {
            log::debug!("{}: {} filtered out", code, evaluation.signal);
            return false;
        }
        if !self.tracker.observe(code, &evaluation.signal) {
            log::debug!("{}: {} unchanged", code, evaluation.signal);
            return false;
        }

        let mut message = self.format_message(code, &evaluation, timestamp);
        if self.corroborates() {
            message.push_str(&self.corroboration(&evaluation).await);
        }
        log::info!("Signal change\n{}", message);
        self.notifier.deliver(&message, MessageClass::Info).await;
        true
    }

    /// `[ts] code date`, then strategy, signal, reason and extras lines
    pub fn format_message(&self, code: &str, evaluation: &Evaluation, timestamp: &str) -> String {
        let fields = &evaluation.fields;
        let mut message = format!(
            "[{}] {} {}\n[{}] signal={}\nreason={}",
            timestamp,
            code,
            fields.first_of(&self.mapping.dates).unwrap_or(UNKNOWN),
            self.mapping.strategy_label,
            evaluation.signal,
            fields.get_or(&self.mapping.reason, UNKNOWN),
        );
        for (label, key) in &self.mapping.extras {
            message.push_str(&format!("\n{}={}", key, fields.get_or(label, NOT_AVAILABLE)));
        }
        message
    }

    // Never fails: an advisor error becomes part of the message
    async fn corroboration(&self, evaluation: &Evaluation) -> String {
        let result = match self.advisor() {
            Ok(generator) => advisor::trade_signal_report(generator, &evaluation.assessment).await,
            Err(e) => Err(e),
        };
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                log::warn!("{}: AI corroboration failed: {}", evaluation.assessment.instrument, e);
                return format!("\n[AI call failed: {}]", e);
            }
        };

        use crate::advisor::labels as ai;
        let fields = ReportFields::parse(
            &report,
            &[ai::AI_SIGNAL, ai::KEY_REASON, ai::STOP_LOSS, ai::TARGET],
        );
        let ai_signal = fields.get_or(ai::AI_SIGNAL, UNKNOWN);
        let mut text = format!(
            "\n[AI Advisor] signal={}\nreason={}\nstop-loss={} | target={}",
            ai_signal,
            fields.get_or(ai::KEY_REASON, UNKNOWN),
            fields.get_or(ai::STOP_LOSS, NOT_AVAILABLE),
            fields.get_or(ai::TARGET, NOT_AVAILABLE),
        );

        let rule_is_crossover = matches!(evaluation.signal.parse::<Signal>(), Ok(s) if s.is_crossover());
        if rule_is_crossover {
            if ai_signal == evaluation.signal {
                text.push_str("\nrule and AI agree");
            } else {
                text.push_str("\nrule and AI disagree, decide with caution");
            }
        }
        text
    }
}
