use chrono::NaiveDate;

pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

pub(crate) fn now_secs() -> i64 {
    now_ms() / 1000
}

pub(crate) fn now_rfc3339() -> String {
    js_sys::Date::new_0().to_iso_string().into()
}

/// Today in the browser's local timezone.
pub(crate) fn today_local() -> NaiveDate {
    let d = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(d.get_full_year() as i32, d.get_month() + 1, d.get_date())
        .unwrap_or_default()
}

pub(crate) fn random_bytes() -> Option<[u8; 32]> {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).ok()?;
    Some(buf)
}

/// `YYYY-MM-DD` from a date input, `None` when blank or malformed.
pub(crate) fn parse_due_input(raw: &str) -> Option<String> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Short label for a due date, e.g. "Mar 4".
pub(crate) fn due_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ => date.format("%b %-d").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_input_accepts_iso_dates_only() {
        assert_eq!(parse_due_input(" 2024-03-04 ").as_deref(), Some("2024-03-04"));
        assert_eq!(parse_due_input(""), None);
        assert_eq!(parse_due_input("03/04/2024"), None);
    }

    #[test]
    fn due_labels_are_relative_near_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(due_label(today, today), "Today");
        assert_eq!(due_label(today.succ_opt().unwrap(), today), "Tomorrow");
        assert_eq!(due_label(NaiveDate::from_ymd_opt(2024, 5, 9).unwrap(), today), "May 9");
    }
}
