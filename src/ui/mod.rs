//! CLI UI utilities for terminal output.
//!
//! Colored status lines, provider icons, a spinner while providers are
//! queried, and the record table / plain renderings used by the binary.

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use std::io::IsTerminal;
use std::time::Duration;

use crate::models::{Facets, Provider, Record, SearchOutcome};

pub use owo_colors::OwoColorize;

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(100)
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Icon shown next to a provider name.
pub fn provider_icon(provider: Provider) -> &'static str {
    match provider {
        Provider::Crossref => "🔗",
        Provider::PubMed => "🏥",
        Provider::Doaj => "📓",
    }
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Search => "🔍",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Search,
}

/// Print a styled status message.
#[macro_export]
macro_rules! print_status {
    ($status:expr, $msg:expr) => {{
        use $crate::ui::{status_icon, OwoColorize as _, Status};
        let icon = status_icon($status);
        match $status {
            Status::Success => println!("{} {}", icon.green().bold(), $msg),
            Status::Error => println!("{} {}", icon.red().bold(), $msg),
            Status::Warning => println!("{} {}", icon.yellow().bold(), $msg),
            Status::Info => println!("{} {}", icon.cyan().bold(), $msg),
            Status::Search => println!("{} {}", icon.yellow(), $msg),
        }
    }};
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    let widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    if widths.iter().map(|(_, w)| *w).sum::<usize>() <= max_width {
        return text.to_string();
    }

    let budget = max_width - 3;
    let mut used = 0;
    let mut kept = String::new();
    for (c, w) in widths {
        if used + w > budget {
            break;
        }
        used += w;
        kept.push(c);
    }

    format!("{}...", kept)
}

/// Short labels describing a record: classification, language and OA.
pub fn badges(record: &Record) -> Vec<String> {
    let mut out = Vec::new();
    for label in [&record.study_type, &record.method, &record.population]
        .into_iter()
        .flatten()
    {
        out.push(label.clone());
    }
    if let Some(language) = record.language.as_ref().filter(|l| !l.is_empty()) {
        out.push(language.to_uppercase());
    }
    if record.oa {
        out.push("OA".to_string());
    }
    out
}

/// `dimension(distinct values)` for every dimension, e.g. `year(3) language(2)`
pub fn facet_summary(facets: &Facets) -> String {
    facets
        .dimension_sizes()
        .iter()
        .map(|(name, n)| format!("{}({})", name, n))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Header line: result count, or the neutral empty state
pub fn search_header(outcome: &SearchOutcome) -> String {
    if outcome.is_empty() {
        return "No results.".to_string();
    }
    let noun = if outcome.records.len() == 1 {
        "record"
    } else {
        "records"
    };
    format!(
        "{} {} for \"{}\" ({}-{})",
        outcome.records.len(),
        noun,
        outcome.query.q,
        outcome.query.year_from,
        outcome.query.year_to
    )
}

/// Print the header, the error banner when providers failed, and the facet summary.
pub fn print_search_header(outcome: &SearchOutcome) {
    println!();
    if outcome.is_empty() {
        println!("{}", search_header(outcome).dimmed());
    } else {
        println!(
            "{} {}",
            status_icon(Status::Search).yellow(),
            search_header(outcome).bold()
        );
    }

    for (provider, reason) in &outcome.errors {
        println!(
            "{} {} {}: {}",
            status_icon(Status::Error).red().bold(),
            provider_icon(*provider),
            provider.name().red(),
            reason
        );
    }

    if !outcome.is_empty() {
        println!("{}", facet_summary(&outcome.facets).dimmed());
    }
    println!();
}

fn year_label(record: &Record) -> String {
    record.year.map(|y| y.to_string()).unwrap_or_default()
}

/// Render records as a table sized to the terminal.
pub fn records_table(records: &[Record]) -> Table {
    let title_width = terminal_width().saturating_sub(70).max(30);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Title", "First author", "Journal", "Year", "Badges", "Sources"]);

    for (i, record) in records.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(truncate_with_ellipsis(&record.title, title_width))
                .add_attribute(Attribute::Bold),
            Cell::new(truncate_with_ellipsis(record.first_author().unwrap_or(""), 24)),
            Cell::new(truncate_with_ellipsis(&record.journal, 24)),
            Cell::new(year_label(record)),
            Cell::new(badges(record).join(" ")),
            Cell::new(record.source_names()),
        ]);
    }
    table
}

/// Render one record as plain text lines.
pub fn plain_record(index: usize, record: &Record) -> String {
    let mut lines = vec![format!("{}. {}", index, record.title)];

    let mut meta = Vec::new();
    if let Some(author) = record.first_author() {
        meta.push(author.to_string());
    }
    if !record.journal.is_empty() {
        meta.push(record.journal.clone());
    }
    if let Some(year) = record.year {
        meta.push(year.to_string());
    }
    if !meta.is_empty() {
        lines.push(format!("   {}", meta.join(" · ")));
    }

    let badges = badges(record);
    if !badges.is_empty() {
        lines.push(format!("   [{}]", badges.join("] [")));
    }
    lines.push(format!("   Sources: {}", record.source_names()));
    if let Some(doi) = &record.doi {
        lines.push(format!("   DOI: {}", doi));
    }
    if let Some(link) = record.link() {
        lines.push(format!("   {}", link));
    }
    lines.join("\n")
}

/// Loading spinner with message.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(Self::style("{spinner:.cyan} {msg}", "⠁⠂⠄⡀⢀⠠⠐⠈ "));
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// A spinner that draws nothing, for non-interactive output.
    pub fn hidden() -> Self {
        Self {
            pb: indicatif::ProgressBar::hidden(),
        }
    }

    fn style(template: &str, ticks: &str) -> indicatif::ProgressStyle {
        indicatif::ProgressStyle::with_template(template)
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
            .tick_chars(ticks)
    }

    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.pb.set_style(Self::style("{spinner:.green} {msg}", "✓✓"));
        self.pb.finish_with_message(msg.to_string());
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.pb.set_style(Self::style("{spinner:.red} {msg}", "✗✗"));
        self.pb.finish_with_message(msg.to_string());
    }

    /// Remove the spinner from the terminal.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}
