//! Colorful console output for runs.
//!
//! Provides a `tracing` layer that formats driver and policy events with
//! colors. Enabled with the `console` feature.


use std::fmt;
use std::io::{self, Write};
use std::sync::OnceLock;

use owo_colors::OwoColorize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();

/// Installs the console layer as the global subscriber.
///
/// Only the first call has effect. `RUST_LOG` directives are honoured on
/// top of `hyperforge=info`.
pub fn init() {
    INIT.get_or_init(|| {
        print_banner();

        let mut filter = EnvFilter::from_default_env();
        for directive in ["hyperforge=info", "hyperforge_solver=info"] {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }

        // Another subscriber may already be installed; keep it.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(ConsoleLayer)
            .try_init();
    });
}

fn print_banner() {
    let banner = format!("HyperForge v{}", env!("CARGO_PKG_VERSION"));
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_cyan().bold());
    let _ = stdout.flush();
}

/// A tracing layer that prints HyperForge events.
pub struct ConsoleLayer;

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("hyperforge") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(*metadata.level(), &visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Debug, Default)]
struct EventVisitor {
    event: Option<String>,
    problem: Option<String>,
    instance: Option<String>,
    policy: Option<String>,
    heuristic: Option<String>,
    error: Option<String>,
    path: Option<String>,
    key_item: Option<String>,
    key_value: Option<f64>,
    value: Option<f64>,
    step: Option<u64>,
    steps: Option<u64>,
    running_steps: Option<u64>,
    success: Option<bool>,
    stop: Option<bool>,
}

impl EventVisitor {
    fn set_text(&mut self, name: &str, value: String) {
        match name {
            "event" => self.event = Some(value),
            "problem" => self.problem = Some(value),
            "instance" => self.instance = Some(value),
            "policy" => self.policy = Some(value),
            "heuristic" => self.heuristic = Some(value),
            "error" => self.error = Some(value),
            "path" => self.path = Some(value),
            "key_item" => self.key_item = Some(value),
            _ => {}
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let s = format!("{:?}", value);
        self.set_text(field.name(), s.trim_matches('"').to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.set_text(field.name(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "step" => self.step = Some(value),
            "steps" => self.steps = Some(value),
            "running_steps" => self.running_steps = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        match field.name() {
            "key_value" => self.key_value = Some(value),
            "value" => self.value = Some(value),
            _ => {}
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        match field.name() {
            "success" => self.success = Some(value),
            "stop" => self.stop = Some(value),
            _ => {}
        }
    }
}

fn format_event(level: Level, v: &EventVisitor) -> String {
    match v.event.as_deref() {
        Some("launch") => format_launch(v),
        Some("decision") if level <= Level::INFO => format_decision(v),
        Some("new_best") => format_new_best(v),
        Some("heuristic_failed") => format_warning("heuristic failed", v),
        Some("decision_failed") => format_warning("decision failed", v),
        Some("comparison_failed") => format_warning("comparison failed", v),
        Some("result_dumped") => format_result_dumped(v),
        Some("finished") => format_finished(v),
        _ => String::new(),
    }
}

fn format_launch(v: &EventVisitor) -> String {
    format!(
        "{} {} {} {}/{} with policy ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Driver]".bright_cyan(),
        v.problem.as_deref().unwrap_or("?").white().bold(),
        v.instance.as_deref().unwrap_or("?").white().bold(),
        v.policy.as_deref().unwrap_or("?").bright_yellow()
    )
}

fn format_decision(v: &EventVisitor) -> String {
    let step = v.step.unwrap_or(0);
    if v.stop == Some(true) {
        return format!("    {} Step {:>7} | {}", "->".bright_blue(), step, "stop".bright_magenta());
    }
    format!(
        "    {} Step {:>7} | {} x {}",
        "->".bright_blue(),
        step,
        v.heuristic.as_deref().unwrap_or("?").white(),
        v.running_steps.unwrap_or(1).to_string().yellow()
    )
}

fn format_new_best(v: &EventVisitor) -> String {
    format!(
        "    {} New best {} by {}",
        "*".bright_green(),
        format_value(v.value.unwrap_or(f64::NAN)).bright_green().bold(),
        v.heuristic.as_deref().unwrap_or("?")
    )
}

fn format_warning(what: &str, v: &EventVisitor) -> String {
    format!(
        "{} {} {} {}: {}",
        timestamp().bright_black(),
        "WARN".bright_yellow(),
        format!("[{}]", v.heuristic.as_deref().or(v.policy.as_deref()).unwrap_or("?")).bright_cyan(),
        what,
        v.error.as_deref().unwrap_or("")
    )
}

fn format_result_dumped(v: &EventVisitor) -> String {
    format!(
        "{} {} {} result written to {}",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Driver]".bright_cyan(),
        v.path.as_deref().unwrap_or("?").underline()
    )
}

fn format_finished(v: &EventVisitor) -> String {
    let success = v.success.unwrap_or(false);
    let key_item = v.key_item.as_deref().unwrap_or("key_value");
    let key_value = format_value(v.key_value.unwrap_or(f64::NAN));

    let mut output = format!(
        "{} {} {} Run ended: {} ({}), step total ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Driver]".bright_cyan(),
        key_item,
        key_value.bright_yellow(),
        v.steps.unwrap_or(0)
    );

    let status = if success {
        "COMPLETE AND VALID SOLUTION".bright_green().bold().to_string()
    } else {
        "INCOMPLETE OR INVALID SOLUTION".bright_red().bold().to_string()
    };
    output.push_str("\n\n");
    output.push_str(&format!("  {status}\n"));
    output.push_str(&format!("  {:<18}{:>24}\n", format!("{key_item}:"), key_value));
    output
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{:.4}", value)
    }
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| {
            let secs = d.as_secs() % 100000;
            let millis = d.subsec_millis();
            format!("{:5}.{:03}", secs, millis)
        })
        .unwrap_or_else(|_| "    0.000".to_string())
}
