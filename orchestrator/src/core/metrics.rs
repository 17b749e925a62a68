//! Minimal reader for the Prometheus text exposition format
//!
//! Only what the gates need: summing every sample of a metric name.

/// Sum all samples of `name` in `exposition`. `None` when no sample exists.
pub fn sum_samples(exposition: &str, name: &str) -> Option<f64> {
    let mut found = false;
    let mut sum = 0.0;

    for line in exposition.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((sample_name, value)) = parse_sample(line) else {
            continue;
        };
        if sample_name == name {
            found = true;
            sum += value;
        }
    }

    found.then_some(sum)
}

/// Split `name{labels} value [timestamp]` into name and value.
fn parse_sample(line: &str) -> Option<(&str, f64)> {
    let (name, rest) = match line.find('{') {
        Some(open) => {
            let close = line.rfind('}')?;
            if close < open {
                return None;
            }
            (&line[..open], &line[close + 1..])
        }
        None => {
            let split = line.find(char::is_whitespace)?;
            (&line[..split], &line[split..])
        }
    };
    let value = rest.split_whitespace().next()?.parse::<f64>().ok()?;
    Some((name.trim(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPOSITION: &str = r#"
# HELP thanos_store_nodes_grpc_connections Number of gRPC connection to Store APIs.
# TYPE thanos_store_nodes_grpc_connections gauge
thanos_store_nodes_grpc_connections{external_labels="{cluster=\"eu-1\", replica=\"0\"}",store_type="sidecar"} 2
thanos_store_nodes_grpc_connections{external_labels="{cluster=\"us-1\", replica=\"0\"}",store_type="store"} 3
go_goroutines 42
process_start_time_seconds 1.6e+09 1627344000000
"#;

    #[test]
    fn test_sums_labelled_series() {
        assert_eq!(sum_samples(EXPOSITION, "thanos_store_nodes_grpc_connections"), Some(5.0));
    }

    #[test]
    fn test_plain_series_and_timestamps() {
        assert_eq!(sum_samples(EXPOSITION, "go_goroutines"), Some(42.0));
        assert_eq!(sum_samples(EXPOSITION, "process_start_time_seconds"), Some(1.6e9));
    }

    #[test]
    fn test_missing_metric_is_none() {
        assert_eq!(sum_samples(EXPOSITION, "thanos_store_nodes"), None);
        assert_eq!(sum_samples("", "go_goroutines"), None);
    }
}
