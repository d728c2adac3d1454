//! Calendar helpers used by case bookkeeping and dashboards

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Formats the MIS "receipt month" label, e.g. `Jan-25`
pub fn receipt_month(date: NaiveDate) -> String {
    date.format("%b-%y").to_string()
}

/// Adds whole days to a date, saturating at the calendar limits
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days)).unwrap_or(date)
}

/// Renders the time elapsed since `then` the way the activity feed shows it
///
/// Days win over hours, hours over minutes; anything under a minute is "just now".
pub fn humanize_elapsed(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - then;
    let days = diff.num_days();
    let hours = diff.num_hours();
    let minutes = diff.num_minutes();

    if days > 0 {
        format!("{} day{} ago", days, if days > 1 { "s" } else { "" })
    } else if hours > 0 {
        format!("{} hour{} ago", hours, if hours > 1 { "s" } else { "" })
    } else if minutes > 0 {
        format!("{} min ago", minutes)
    } else {
        "just now".to_string()
    }
}
