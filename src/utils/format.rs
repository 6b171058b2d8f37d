use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

/// Format a percentage, trimming a trailing ".00"
pub fn format_percent(value: f64) -> String {
    if value == value.floor() {
        format!("{}%", value as i64)
    } else {
        format!("{:.2}%", value)
    }
}

/// "today", "yesterday", "N days ago" or the ISO date for anything older than a week
pub fn format_relative_day(date: NaiveDate, today: NaiveDate) -> String {
    match (today - date).num_days() {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        n @ 2..=6 => format!("{} days ago", n),
        _ => date.format("%Y-%m-%d").to_string(),
    }
}

/// Pad to a display width, truncating with an ellipsis when too long
pub fn pad(s: &str, width: usize) -> String {
    let current = UnicodeWidthStr::width(s);
    if current <= width {
        return format!("{}{}", s, " ".repeat(width - current));
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    used += 1;
    format!("{}{}", out, " ".repeat(width.saturating_sub(used)))
}

/// Create a simple ASCII progress bar
pub fn progress_bar(filled: u32, total: u32, width: usize) -> String {
    if total == 0 {
        return "░".repeat(width);
    }
    let ratio = (filled as f64 / total as f64).min(1.0);
    let filled_count = (ratio * width as f64).round() as usize;
    let empty_count = width.saturating_sub(filled_count);
    format!("{}{}", "█".repeat(filled_count), "░".repeat(empty_count))
}
