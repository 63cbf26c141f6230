use std::time::Duration;

pub(crate) fn format_rate(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.0}")
    } else {
        "0".to_string()
    }
}

/// Renders as a single rounded component in one of: us, ms, s.
pub(crate) fn format_duration_single(d: Duration) -> String {
    const NS_PER_US: u128 = 1_000;
    const NS_PER_MS: u128 = 1_000_000;
    const NS_PER_S: u128 = 1_000_000_000;

    fn round_div(value: u128, unit: u128) -> u128 {
        // Ties round up.
        (value + (unit / 2)) / unit
    }

    let total_ns = d.as_nanos();
    if total_ns >= NS_PER_S {
        return format!("{}s", round_div(total_ns, NS_PER_S));
    }
    if total_ns >= NS_PER_MS {
        return format!("{}ms", round_div(total_ns, NS_PER_MS));
    }

    format!("{}us", round_div(total_ns, NS_PER_US))
}

/// Latency values are kept in microseconds; show them with two decimals in the
/// largest unit that keeps the integer part non-zero.
pub(crate) fn format_micros(us: f64) -> String {
    if !us.is_finite() || us < 0.0 {
        return "n/a".to_string();
    }
    if us >= 1_000_000.0 {
        return format!("{:.2}s", us / 1_000_000.0);
    }
    if us >= 1_000.0 {
        return format!("{:.2}ms", us / 1_000.0);
    }
    format!("{us:.0}us")
}
