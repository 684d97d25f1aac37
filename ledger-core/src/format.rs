//! Human-facing magnitude formatting
//!
//! Output-time only. Formatted strings never feed back into stored or
//! compared values.

use rust_decimal::Decimal;

/// Format a LY/ECY magnitude with K/M/B/T suffixes.
pub fn format_magnitude(value: Decimal) -> String {
    let sign = if value < Decimal::ZERO { "-" } else { "" };
    let abs = value.abs();

    let thousand = Decimal::from(1_000u32);
    let million = Decimal::from(1_000_000u32);
    let billion = Decimal::from(1_000_000_000u64);
    let trillion = Decimal::from(1_000_000_000_000u64);

    if abs < thousand {
        format!("{}{}", sign, abs.round_dp(0).normalize())
    } else if abs < million {
        format!("{}{}K", sign, (abs / thousand).round_dp(1).normalize())
    } else if abs < billion {
        format!("{}{}M", sign, (abs / million).round_dp(1).normalize())
    } else if abs < trillion {
        format!("{}{}B", sign, (abs / billion).round_dp(2).normalize())
    } else {
        format!("{}{}T", sign, (abs / trillion).round_dp(2).normalize())
    }
}
