//! Sample lookup and display formatting on top of a parsed [`MetricSet`].

use serde::{Deserialize, Serialize};

use crate::exposition::{MetricSet, Sample};

/// Returns the last sample of `metric_name` whose label `label_key` equals `label_value`.
///
/// Later samples win over earlier ones when several match.
pub fn lookup<'a>(
    metrics: &'a MetricSet,
    metric_name: &str,
    label_key: &str,
    label_value: &str,
) -> Option<&'a Sample> {
    metrics
        .samples(metric_name)?
        .iter()
        .rev()
        .find(|sample| sample.label(label_key) == Some(label_value))
}

/// A displayed measurement kind: which metric to read and how to print it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    /// Caption shown next to the value.
    pub label: String,
    /// Metric name in the exposition text.
    pub metric: String,
    /// Number of decimal places.
    pub precision: usize,
    /// Unit suffix, separated from the number by a space.
    pub unit: String,
}

impl Quantity {
    pub fn new(label: &str, metric: &str, precision: usize, unit: &str) -> Self {
        Self {
            label: label.to_string(),
            metric: metric.to_string(),
            precision,
            unit: unit.to_string(),
        }
    }

    pub fn temperature() -> Self {
        Self::new("Temperatur", "air_temperature", 1, "°C")
    }

    pub fn relative_humidity() -> Self {
        Self::new("rel. Feuchte", "humidity_relative", 0, "%")
    }

    pub fn absolute_humidity() -> Self {
        Self::new("abs. Feuchte", "humidity_absolute", 1, "g")
    }

    /// Looks up this quantity for one sensor and formats it.
    pub fn display(
        &self,
        metrics: &MetricSet,
        sensor_label: &str,
        sensor_id: &str,
        unknown: &str,
    ) -> String {
        format_reading(
            lookup(metrics, &self.metric, sensor_label, sensor_id),
            self,
            unknown,
        )
    }
}

/// Formats a lookup result, or returns `unknown` when there is none.
///
/// A sample whose value is not numeric still renders, as `NaN <unit>`.
pub fn format_reading(sample: Option<&Sample>, quantity: &Quantity, unknown: &str) -> String {
    match sample {
        Some(sample) => format!(
            "{} {}",
            format_fixed(sample.value(), quantity.precision),
            quantity.unit
        ),
        None => unknown.to_string(),
    }
}

/// Fixed-point formatting of the exact binary value.
///
/// `{:.N}` already rounds correctly from the stored value, so `21.15` (really
/// `21.149999...`) becomes `21.1`. Only values sitting exactly on a tie are
/// rounded away from zero, so `44.5` with zero decimals becomes `45`.
/// Infinities keep the exposition spelling `+Inf` / `-Inf`.
pub fn format_fixed(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }

    let formatted = if is_exact_tie(value, precision) {
        // The tie has exactly one more digit than requested, all of it exact.
        round_last_digit_up(&format!("{:.*}", precision + 1, value))
    } else {
        format!("{:.*}", precision, value)
    };

    // Small negatives that round to zero print without a sign.
    match formatted.strip_prefix('-') {
        Some(magnitude) if magnitude.bytes().all(|b| b == b'0' || b == b'.') => {
            magnitude.to_string()
        }
        _ => formatted,
    }
}

/// True when `value * 10^precision` lies exactly halfway between two integers.
///
/// Writing `|value| = m * 2^e` with `m` odd, that holds iff `e == -(precision + 1)`,
/// because `5^precision` is odd.
fn is_exact_tie(value: f64, precision: usize) -> bool {
    let bits = value.abs().to_bits();
    let exponent_bits = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if exponent_bits == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), exponent_bits - 1075)
    };
    if mantissa == 0 {
        return false;
    }
    let exponent = exponent + i64::from(mantissa.trailing_zeros());
    exponent == -(precision as i64 + 1)
}

/// Drops the final digit (a `5`) and bumps the magnitude of what remains.
fn round_last_digit_up(text: &str) -> String {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let mut digits: Vec<u8> = digits.as_bytes()[..digits.len() - 1].to_vec();
    if digits.last() == Some(&b'.') {
        digits.pop();
    }

    let mut carry = true;
    for digit in digits.iter_mut().rev() {
        match *digit {
            b'.' => continue,
            b'9' => *digit = b'0',
            _ => {
                *digit += 1;
                carry = false;
                break;
            }
        }
    }
    if carry {
        digits.insert(0, b'1');
    }

    format!("{sign}{}", String::from_utf8_lossy(&digits))
}
