//! CLI output formatting and display helpers.

use idgames_core::api::{MAX_RATING, Record};

/// Column budget for table rows: `COLUMNS` when set to something usable,
/// otherwise 80.
pub fn terminal_width() -> usize {
    match std::env::var("COLUMNS").map(|value| value.trim().parse::<usize>()) {
        Ok(Ok(width)) if width >= 40 => width,
        _ => 80,
    }
}

/// Cuts `text` to `width` characters, marking the cut with `…`.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    match width {
        0 => String::new(),
        _ => text.chars().take(width - 1).chain(std::iter::once('…')).collect(),
    }
}

/// Five-character rating bar: one `*` per whole star, `-` for the rest.
pub fn star_bar(record: &Record) -> String {
    let filled = usize::from(record.stars());
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = MAX_RATING as usize;
    format!("{}{}", "*".repeat(filled), "-".repeat(total.saturating_sub(filled)))
}

/// Human-readable byte count.
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// One table row: id, stars, title, author, date.
pub fn render_record_row(record: &Record, width: usize) -> String {
    let fixed = format!("{:>6}  {}  ", record.id, star_bar(record));
    let date = format!("  {:<10}", record.date);
    let remaining = width.saturating_sub(fixed.chars().count() + date.chars().count());
    let title_width = remaining * 3 / 5;
    let author_width = remaining.saturating_sub(title_width + 2);
    format!(
        "{fixed}{:<title_width$}  {:<author_width$}{date}",
        truncate_to_width(&record.title, title_width),
        truncate_to_width(&record.author, author_width),
    )
}

/// Full detail block for one record: metadata, text file, then reviews.
pub fn render_record_detail(record: &Record) -> Vec<String> {
    let mut lines = vec![
        format!("{} ({})", record.title, record.archive_path()),
        format!("Author:  {}", record.author),
        format!(
            "Rating:  {} {:.2} ({} votes)",
            star_bar(record),
            record.rating,
            record.votes
        ),
        format!("Date:    {}", record.date),
        format!("Size:    {}", format_size(record.size)),
    ];
    if !record.url.is_empty() {
        lines.push(format!("URL:     {}", record.url));
    }
    if !record.description.is_empty() {
        lines.push(String::new());
        lines.push(record.description.clone());
    }
    if !record.textfile.is_empty() {
        lines.push(String::new());
        lines.extend(record.textfile.lines().map(str::to_string));
    }
    if !record.reviews.is_empty() {
        lines.push(String::new());
        lines.push(format!("Reviews ({}):", record.reviews.len()));
        for review in &record.reviews {
            lines.push(format!("  [{}] {}: {}", review.vote, review.author(), review.text));
        }
    }
    lines
}
