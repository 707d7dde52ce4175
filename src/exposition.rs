//! Parser for the Prometheus text exposition format.
//!
//! The parser is deliberately forgiving: it never fails. Comment lines
//! (`# HELP`, `# TYPE`, ...) are skipped, every other non-empty line becomes
//! one [`Sample`], and malformed lines degrade into partially populated
//! samples instead of errors.
//!
//! ```text
//! metric_name{label1="value1",label2="value2"} 21.37 [timestamp]
//! metric_name 7
//! ```

use ahash::AHashMap as HashMap;
use serde::Serialize;
use std::collections::BTreeMap;

/// Label name to label value. Keys are unique; a repeated key keeps the last value.
pub type Labels = BTreeMap<String, String>;

/// One parsed observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub metric_name: String,
    /// Raw value token as it appeared in the input.
    pub value_text: String,
    pub labels: Labels,
}

impl Sample {
    /// Numeric value of the sample, `NaN` when the value text is not a number.
    pub fn value(&self) -> f64 {
        self.value_text.parse::<f64>().unwrap_or(f64::NAN)
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

/// All samples of one scrape, grouped by metric name.
///
/// Samples under a name keep the order in which they appeared in the input.
#[derive(Debug, Clone, Default)]
pub struct MetricSet {
    series: HashMap<String, Vec<Sample>>,
}

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples recorded under `metric_name`, in input order.
    pub fn samples(&self, metric_name: &str) -> Option<&[Sample]> {
        self.series.get(metric_name).map(Vec::as_slice)
    }

    /// Metric names in sorted order.
    pub fn metric_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.series.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of distinct metric names.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Total number of samples across all metric names.
    pub fn sample_count(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    /// Iterates `(name, samples)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Sample])> {
        self.series
            .iter()
            .map(|(name, samples)| (name.as_str(), samples.as_slice()))
    }

    /// Appends a sample to the sequence of its own metric name.
    pub fn push(&mut self, sample: Sample) {
        self.series
            .entry(sample.metric_name.clone())
            .or_default()
            .push(sample);
    }

    /// Sorted, serializable view used for dumps.
    pub fn to_sorted(&self) -> BTreeMap<&str, &[Sample]> {
        self.iter().collect()
    }
}

/// Parses exposition text into a [`MetricSet`].
pub fn parse(text: &str) -> MetricSet {
    let mut metrics = MetricSet::new();

    for line in text.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        metrics.push(parse_line(line));
    }

    metrics
}

/// Parses a single non-comment line.
pub fn parse_line(line: &str) -> Sample {
    let (name_and_labels, rest) = match line.split_once(' ') {
        Some((head, rest)) => (head, rest),
        None => (line, ""),
    };
    let value_text = rest.split_whitespace().next().unwrap_or("").to_string();

    let (metric_name, labels) = match name_and_labels.find('{') {
        None => (name_and_labels.to_string(), Labels::new()),
        Some(open) => {
            let body = &name_and_labels[open + 1..];
            let body = match body.find('}') {
                Some(close) => &body[..close],
                None => body,
            };
            (name_and_labels[..open].to_string(), parse_labels(body))
        }
    };

    Sample {
        metric_name,
        labels,
        value_text,
    }
}

/// Parses the text between `{` and `}`.
fn parse_labels(body: &str) -> Labels {
    let mut labels = Labels::new();

    for assignment in body.split(',') {
        let Some((key, raw_value)) = assignment.split_once('=') else {
            continue;
        };
        labels.insert(key.to_string(), quoted_value(raw_value).to_string());
    }

    labels
}

/// Text between the first pair of double quotes, empty when there is no opening quote.
fn quoted_value(raw: &str) -> &str {
    let Some(open) = raw.find('"') else {
        return "";
    };
    let inner = &raw[open + 1..];
    match inner.find('"') {
        Some(close) => &inner[..close],
        None => inner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let metrics = parse("");
        assert!(metrics.is_empty());
        assert_eq!(metrics.sample_count(), 0);
    }

    #[test]
    fn test_labeled_line() {
        let metrics = parse("foo{a=\"1\",b=\"2\"} 3.5");
        let samples = metrics.samples("foo").expect("foo missing");

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].metric_name, "foo");
        assert_eq!(samples[0].labels, labels(&[("a", "1"), ("b", "2")]));
        assert_eq!(samples[0].value_text, "3.5");
        assert_eq!(samples[0].value(), 3.5);
    }

    #[test]
    fn test_unlabeled_line() {
        let metrics = parse("bar 7");
        let samples = metrics.samples("bar").expect("bar missing");

        assert_eq!(samples.len(), 1);
        assert!(samples[0].labels.is_empty());
        assert_eq!(samples[0].value_text, "7");
    }

    #[test]
    fn test_comments_are_skipped() {
        let text = "# HELP air_temperature Air temperature\n\
                    # TYPE air_temperature gauge\n\
                    #air_temperature{sensorId=\"1\"} 3\n";
        assert!(parse(text).is_empty());
    }

    #[test]
    fn test_trailing_timestamp_is_ignored() {
        let sample = parse_line("up{job=\"node\"} 1 1700000000000");
        assert_eq!(sample.value_text, "1");
    }

    #[test]
    fn test_missing_value() {
        let sample = parse_line("lonely_metric");
        assert_eq!(sample.metric_name, "lonely_metric");
        assert_eq!(sample.value_text, "");
        assert!(sample.value().is_nan());
    }

    #[test]
    fn test_non_adjacent_lines_are_grouped() {
        let text = "a{id=\"1\"} 1\nb 2\na{id=\"2\"} 3\n";
        let metrics = parse(text);

        assert_eq!(metrics.len(), 2);
        let a = metrics.samples("a").expect("a missing");
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].label("id"), Some("1"));
        assert_eq!(a[1].label("id"), Some("2"));
    }

    #[test]
    fn test_grouping_key_matches_metric_name() {
        let text = "x 1\ny{k=\"v\"} 2\nx{k=\"w\"} 3\nz 4\n";
        for (name, samples) in parse(text).iter() {
            assert!(samples.iter().all(|s| s.metric_name == name));
        }
    }

    #[test]
    fn test_duplicate_label_last_wins() {
        let sample = parse_line("m{k=\"first\",k=\"second\"} 1");
        assert_eq!(sample.labels, labels(&[("k", "second")]));
    }

    #[test]
    fn test_text_after_closing_brace_is_ignored() {
        let sample = parse_line("m{a=\"1\"}b=\"2\" 4");
        assert_eq!(sample.metric_name, "m");
        assert_eq!(sample.labels, labels(&[("a", "1")]));
        assert_eq!(sample.value_text, "4");
    }

    #[test]
    fn test_malformed_labels_degrade() {
        let sample = parse_line("m{a=\"1\",,noequals,b=2,c=\"open} 5");
        assert_eq!(
            sample.labels,
            labels(&[("a", "1"), ("b", ""), ("c", "open")])
        );
        assert_eq!(sample.value_text, "5");
    }

    #[test]
    fn test_unclosed_brace() {
        let sample = parse_line("m{a=\"1\" 2");
        assert_eq!(sample.metric_name, "m");
        assert_eq!(sample.labels, labels(&[("a", "1")]));
        assert_eq!(sample.value_text, "2");
    }

    #[test]
    fn test_crlf_line_endings() {
        let metrics = parse("a 1\r\nb 2\r\n");
        assert_eq!(metrics.samples("a").expect("a missing")[0].value_text, "1");
        assert_eq!(metrics.samples("b").expect("b missing")[0].value_text, "2");
    }

    #[test]
    fn test_non_numeric_value() {
        let sample = parse_line("m garbage");
        assert_eq!(sample.value_text, "garbage");
        assert!(sample.value().is_nan());
    }
}
