use chrono::NaiveDateTime;

/// Two decimals with thousands separators: 1234.5 -> "1,234.50".
pub fn amount(val: f64) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-{with_commas}.{dec_part}")
    } else {
        format!("{with_commas}.{dec_part}")
    }
}

pub fn total_line(total: f64) -> String {
    format!("Total: {}", amount(total))
}

/// "24 Sep"
pub fn short_date(at: NaiveDateTime) -> String {
    at.format("%d %b").to_string()
}

/// "23:59"
pub fn short_time(at: NaiveDateTime) -> String {
    at.format("%H:%M").to_string()
}

/// "2025-09-24 23:59", used when asking to confirm a future date.
pub fn timestamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}
