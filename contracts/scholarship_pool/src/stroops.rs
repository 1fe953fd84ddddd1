//! Amount helpers. All engine amounts are integers in stroops, the smallest
//! unit of XLM.

/// 1 XLM = 10,000,000 stroops.
pub const STROOPS_PER_XLM: i128 = 10_000_000;

pub const DAY_IN_SECONDS: u64 = 24 * 60 * 60;
pub const WEEK_IN_SECONDS: u64 = 7 * DAY_IN_SECONDS;
pub const MONTH_IN_SECONDS: u64 = 30 * DAY_IN_SECONDS;

pub const fn xlm(whole: i128) -> i128 {
    whole * STROOPS_PER_XLM
}

/// Render a stroop amount as XLM with all seven decimals, trailing zeros
/// trimmed (`15_000_000` -> `"1.5"`).
pub fn format_xlm(stroops: i128) -> String {
    let sign = if stroops < 0 { "-" } else { "" };
    let abs = stroops.unsigned_abs();
    let unit = STROOPS_PER_XLM as u128;
    let whole = abs / unit;
    let frac = abs % unit;
    if frac == 0 {
        return format!("{sign}{whole}");
    }
    let frac = format!("{frac:07}");
    format!("{sign}{whole}.{}", frac.trim_end_matches('0'))
}
