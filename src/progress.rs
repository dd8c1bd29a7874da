use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::{Duration, Instant};

const MAX_STORED_WARNINGS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lower")]
pub enum ProgressMode {
    Auto,
    Rich,
    Plain,
    Quiet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedProgressMode {
    Rich,
    Plain,
    Quiet,
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressConfig {
    pub mode: ProgressMode,
    pub plain_interval: Duration,
    tty_override: Option<bool>,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            mode: ProgressMode::Auto,
            plain_interval: Duration::from_secs(2),
            tty_override: None,
        }
    }
}

impl ProgressConfig {
    pub fn new(mode: ProgressMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn with_tty_override(mut self, is_tty: bool) -> Self {
        self.tty_override = Some(is_tty);
        self
    }

    pub fn resolve_mode(self) -> ResolvedProgressMode {
        self.mode.resolve(
            self.tty_override
                .unwrap_or_else(|| std::io::stderr().is_terminal()),
        )
    }
}

impl ProgressMode {
    fn resolve(self, stderr_is_tty: bool) -> ResolvedProgressMode {
        match self {
            ProgressMode::Auto => {
                if stderr_is_tty {
                    ResolvedProgressMode::Rich
                } else {
                    ResolvedProgressMode::Plain
                }
            }
            ProgressMode::Rich => ResolvedProgressMode::Rich,
            ProgressMode::Plain => ResolvedProgressMode::Plain,
            ProgressMode::Quiet => ResolvedProgressMode::Quiet,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressOutcome {
    pub elapsed: Duration,
    pub scanned_entries: u64,
    pub matched_files: u64,
    pub warning_count: usize,
    pub warnings: Vec<String>,
}

/// Stderr reporter for one run. Everything happens on the calling thread;
/// plain-mode lines are rate limited by `plain_interval` instead of a ticker.
pub struct ProgressReporter {
    label: String,
    mode: ResolvedProgressMode,
    plain_interval: Duration,
    started: Instant,
    last_plain_emit: Instant,
    stage: String,
    scanned_entries: u64,
    matched_files: u64,
    warning_count: usize,
    warnings: Vec<String>,
    spinner: Option<ProgressBar>,
    finalized: bool,
}

impl ProgressReporter {
    pub fn new(label: impl Into<String>, config: ProgressConfig) -> Self {
        let label = label.into();
        let mode = config.resolve_mode();
        let now = Instant::now();

        let spinner = if mode == ResolvedProgressMode::Rich {
            Some(new_spinner(&label))
        } else {
            None
        };

        Self {
            label,
            mode,
            plain_interval: config.plain_interval,
            started: now,
            last_plain_emit: now.checked_sub(config.plain_interval).unwrap_or(now),
            stage: "starting".to_string(),
            scanned_entries: 0,
            matched_files: 0,
            warning_count: 0,
            warnings: Vec::new(),
            spinner,
            finalized: false,
        }
    }

    pub fn set_stage(&mut self, stage: impl Into<String>) {
        self.stage = stage.into();
        self.render(true);
    }

    /// Counts one walked entry; `matched` marks it as a manifest candidate.
    pub fn inc_scanned(&mut self, matched: bool) {
        self.scanned_entries = self.scanned_entries.saturating_add(1);
        if matched {
            self.matched_files = self.matched_files.saturating_add(1);
        }
        self.render(false);
    }

    pub fn log(&self, message: impl Into<String>) {
        self.emit_message("INFO", &message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.emit_message("WARN", &message);
        self.warning_count += 1;
        if self.warnings.len() >= MAX_STORED_WARNINGS {
            self.warnings.remove(0);
        }
        self.warnings.push(message);
    }

    pub fn finish(mut self, final_message: impl Into<String>) -> ProgressOutcome {
        self.finalize(Some(final_message.into()))
    }

    fn render(&mut self, force_plain: bool) {
        match self.mode {
            ResolvedProgressMode::Rich => {
                if let Some(spinner) = &self.spinner {
                    spinner.set_position(self.scanned_entries);
                    spinner.set_message(format!(
                        "stage={} matched={}",
                        self.stage, self.matched_files
                    ));
                }
            }
            ResolvedProgressMode::Plain => {
                let now = Instant::now();
                if force_plain || now.duration_since(self.last_plain_emit) >= self.plain_interval {
                    self.last_plain_emit = now;
                    self.render_plain();
                }
            }
            ResolvedProgressMode::Quiet => {}
        }
    }

    fn render_plain(&self) {
        eprintln!(
            "[PROGRESS] {} elapsed={} stage={} scanned={} matched={}",
            self.label,
            format_duration(self.started.elapsed()),
            self.stage,
            self.scanned_entries,
            self.matched_files,
        );
    }

    fn emit_message(&self, level: &str, message: &str) {
        match self.mode {
            ResolvedProgressMode::Quiet => {}
            ResolvedProgressMode::Plain => {
                eprintln!("[{}] {}: {}", level, self.label, message);
            }
            ResolvedProgressMode::Rich => {
                if let Some(spinner) = &self.spinner {
                    spinner.println(format!("[{}] {}: {}", level, self.label, message));
                } else {
                    eprintln!("[{}] {}: {}", level, self.label, message);
                }
            }
        }
    }

    fn finalize(&mut self, final_message: Option<String>) -> ProgressOutcome {
        if !self.finalized {
            self.finalized = true;
            match self.mode {
                ResolvedProgressMode::Quiet => {}
                ResolvedProgressMode::Plain => {
                    self.render_plain();
                    if let Some(msg) = final_message.as_deref() {
                        eprintln!("[DONE] {}: {}", self.label, msg);
                    }
                }
                ResolvedProgressMode::Rich => {
                    if let Some(spinner) = &self.spinner {
                        match final_message {
                            Some(msg) => spinner.finish_with_message(format!(
                                "{} ({} scanned, {} elapsed)",
                                msg,
                                self.scanned_entries,
                                format_duration(self.started.elapsed())
                            )),
                            None => spinner.finish_and_clear(),
                        }
                    }
                }
            }
        }

        ProgressOutcome {
            elapsed: self.started.elapsed(),
            scanned_entries: self.scanned_entries,
            matched_files: self.matched_files,
            warning_count: self.warning_count,
            warnings: self.warnings.clone(),
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        let _ = self.finalize(None);
    }
}

fn new_spinner(label: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {prefix:.bold} {pos} entries | {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("|/-\\ "),
    );
    spinner.set_prefix(label.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("starting");
    spinner
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{:02}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}
