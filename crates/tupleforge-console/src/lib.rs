//! Colorful console output for constraint sessions.
//!
//! Provides a custom `tracing` layer that formats session events with colors.
//!
//! ## Log Levels
//!
//! - **INFO**: Session lifecycle (session built)
//! - **DEBUG**: Plan compilation and one line per fact mutation
//! - **TRACE**: Individual node deltas and match changes
//! - **WARN**: Poisoned sessions

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Package version for banner display.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "tupleforge_scoring=info";

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect.
/// Prints the TupleForge banner and sets up tracing.
pub fn init() {
    INIT.get_or_init(|| {
        EPOCH.get_or_init(Instant::now);
        print_banner();

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(SessionConsoleLayer)
            .try_init();
    });
}

// Returns elapsed time since init.
fn elapsed_secs() -> f64 {
    EPOCH
        .get()
        .map_or(0.0, |epoch| epoch.elapsed().as_secs_f64())
}

fn print_banner() {
    let banner = r#"
 _____             _      _____
|_   _|   _ _ __  | | ___|  ___|__  _ __ __ _  ___
  | || | | | '_ \ | |/ _ \ |_ / _ \| '__/ _` |/ _ \
  | || |_| | |_) || |  __/  _| (_) | | | (_| |  __/
  |_| \__,_| .__/ |_|\___|_|  \___/|_|  \__, |\___|
           |_|                          |___/
"#;

    let version_line = format!(
        "                   v{} - Incremental Constraint Scoring\n",
        VERSION
    );

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_cyan());
    let _ = writeln!(stdout, "{}", version_line.bright_white().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats session events with colors.
pub struct SessionConsoleLayer;

impl<S: Subscriber> Layer<S> for SessionConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        // Accept events from TupleForge crates only
        if !metadata.target().starts_with("tupleforge") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor, *metadata.level());
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    score: Option<String>,
    fact: Option<String>,
    fact_type: Option<String>,
    error: Option<String>,
    environment_mode: Option<String>,
    side: Option<String>,
    delta: Option<String>,
    nodes: Option<u64>,
    shared: Option<u64>,
    layers: Option<u64>,
    constraints: Option<u64>,
    node: Option<u64>,
    constraint: Option<u64>,
    tuple: Option<u64>,
    insert: Option<bool>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value).trim_matches('"').to_string();
        match field.name() {
            "event" => self.event = Some(s),
            "score" => self.score = Some(s),
            "fact" => self.fact = Some(s),
            "fact_type" => self.fact_type = Some(s),
            "error" => self.error = Some(s),
            "environment_mode" => self.environment_mode = Some(s),
            "side" => self.side = Some(s),
            "delta" => self.delta = Some(s),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "nodes" => self.nodes = Some(value),
            "shared" => self.shared = Some(value),
            "layers" => self.layers = Some(value),
            "constraints" => self.constraints = Some(value),
            "node" => self.node = Some(value),
            "constraint" => self.constraint = Some(value),
            "tuple" => self.tuple = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "insert" {
            self.insert = Some(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "event" => self.event = Some(value.to_string()),
            "score" => self.score = Some(value.to_string()),
            "fact" => self.fact = Some(value.to_string()),
            "fact_type" => self.fact_type = Some(value.to_string()),
            "error" => self.error = Some(value.to_string()),
            _ => {}
        }
    }
}

fn format_event(v: &EventVisitor, level: Level) -> String {
    let event = v.event.as_deref().unwrap_or("");

    match event {
        "session_built" => format_session_built(v),
        "plan_compiled" => format_plan_compiled(v),
        "fact_inserted" => format_fact_change(v, "+", "inserted"),
        "fact_updated" => format_fact_change(v, "~", "updated"),
        "fact_retracted" => format_fact_change(v, "-", "retracted"),
        "session_poisoned" => format_poisoned(v),
        "delta" => format_delta(v, level),
        "match_inserted" | "match_retracted" => format_match(v, event, level),
        _ => String::new(),
    }
}

fn format_elapsed() -> String {
    format!("{:>7.3}s", elapsed_secs())
        .bright_black()
        .to_string()
}

fn count(n: Option<u64>) -> String {
    n.unwrap_or(0).to_formatted_string(&Locale::en)
}

fn format_session_built(v: &EventVisitor) -> String {
    let mut output = format!(
        "{} {} Session ready │ {} nodes │ {} layers │ {} constraints",
        format_elapsed(),
        "▶".bright_green().bold(),
        count(v.nodes).bright_yellow(),
        count(v.layers).bright_yellow(),
        count(v.constraints).bright_yellow(),
    );

    if let Some(ref mode) = v.environment_mode {
        output.push_str(&format!(" │ {}", mode.bright_magenta()));
    }

    output
}

fn format_plan_compiled(v: &EventVisitor) -> String {
    format!(
        "{} {} Plan compiled │ {} nodes ({} shared) │ {} layers",
        format_elapsed(),
        "◆".bright_blue(),
        count(v.nodes).white(),
        count(v.shared).bright_black(),
        count(v.layers).white(),
    )
}

fn format_fact_change(v: &EventVisitor, icon: &str, verb: &str) -> String {
    let fact = v.fact.as_deref().unwrap_or("?");
    let score = v.score.as_deref().unwrap_or("N/A");

    let mut output = format!(
        "{} {} Fact {} {}",
        format_elapsed(),
        icon.bright_cyan().bold(),
        fact.white(),
        verb,
    );
    if let Some(ref fact_type) = v.fact_type {
        output.push_str(&format!(" ({})", fact_type.bright_black()));
    }
    output.push_str(&format!(" │ {}", format_score(score)));
    output
}

fn format_poisoned(v: &EventVisitor) -> String {
    format!(
        "{} {} Session poisoned │ {}",
        format_elapsed(),
        "✗".bright_red().bold(),
        v.error.as_deref().unwrap_or("unknown error").red()
    )
}

fn format_delta(v: &EventVisitor, level: Level) -> String {
    if level != Level::TRACE {
        return String::new();
    }

    let icon = if v.insert.unwrap_or(false) {
        "+".bright_green().to_string()
    } else {
        "-".bright_red().to_string()
    };

    format!(
        "{} {} Node {:>5} │ {:<5} │ Tuple {:>8}",
        format_elapsed(),
        icon,
        count(v.node).bright_black(),
        v.side.as_deref().unwrap_or(""),
        count(v.tuple).bright_black(),
    )
}

fn format_match(v: &EventVisitor, event: &str, level: Level) -> String {
    if level != Level::TRACE {
        return String::new();
    }

    let icon = if event == "match_inserted" {
        "✓".bright_green().to_string()
    } else {
        "↺".yellow().to_string()
    };

    format!(
        "{} {} Constraint {:>3} │ {}",
        format_elapsed(),
        icon,
        count(v.constraint).bright_black(),
        format_score(v.delta.as_deref().unwrap_or("0")),
    )
}

// Colors each level of a score like "-1hard/3soft" by its sign.
fn format_score(score: &str) -> String {
    score
        .split('/')
        .map(|level| {
            let number: String = level
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '-' || *c == '.')
                .collect();
            match number.parse::<f64>() {
                Ok(n) if n < 0.0 => level.bright_red().to_string(),
                Ok(n) if n > 0.0 => level.bright_green().to_string(),
                _ => level.white().to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
