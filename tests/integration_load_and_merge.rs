use std::io::Write;
use tempfile::NamedTempFile;
use wsperf_analyze::{load_file, merge_results, AnalyzeError, Quantile, Sample};

fn result_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(json.as_bytes()).expect("write fixture");
    file
}

/// A wsperf-style document with `n` successful connections and extra fields
fn large_run(n: u64) -> String {
    let mut json = String::from(
        r#"{"name": "large", "started": 1700000000000000, "ended": 1700000010000000, "total_duration": 9999000, "connection_stats": ["#,
    );
    for i in 0..n {
        if i > 0 {
            json.push(',');
        }
        json.push_str(&format!(
            r#"{{"tcp_pre_init": {}, "tcp_post_init": 2, "open": {}, "close": {}, "failed": false}}"#,
            1_000 + i % 97,
            i + 1,
            2 * (i + 1)
        ));
    }
    json.push_str("]}");
    json
}

#[test]
fn merged_files_match_expected_aggregate() {
    let a = result_file(
        r#"{"started": 1000000, "ended": 2000000, "total_duration": 1000000,
            "connection_stats": [
              {"tcp_pre_init": 20594, "open": 100, "close": 300, "failed": false},
              {"failed": false, "close": 400, "open": 200, "tcp_pre_init": 10}
            ]}"#,
    );
    let b = result_file(
        r#"{"started": 1500000, "ended": 3000000, "total_duration": 1500000,
            "connection_stats": [
              {"tcp_pre_init": 1, "open": 5, "close": 6, "failed": true}
            ]}"#,
    );

    let runs = vec![
        load_file(a.path()).expect("load a"),
        load_file(b.path()).expect("load b"),
    ];
    for run in &runs {
        assert_eq!(run.total_count, run.success_count + run.fail_count);
        assert_eq!(run.open_timestamps.len() as u64, run.success_count);
        assert_eq!(run.close_timestamps.len() as u64, run.success_count);
    }

    let merged = merge_results(runs).expect("merge");
    assert_eq!(merged.started_at_micros, 1_000_000);
    assert_eq!(merged.ended_at_micros, 3_000_000);
    assert_eq!(merged.wall_clock_duration_micros, 2_000_000);
    assert_eq!(merged.total_count, 3);
    assert_eq!(merged.success_count, 2);
    assert_eq!(merged.fail_count, 1);
    assert_eq!(merged.open_timestamps, vec![100, 200]);
    assert_eq!(merged.pre_init_min, Some(10));
    assert_eq!(merged.pre_init_max, Some(20594));
}

#[test]
fn large_file_percentiles_use_floor_ranks() {
    let file = result_file(&large_run(20_000));
    let run = load_file(file.path()).expect("load large run");

    assert_eq!(run.success_count, 20_000);
    assert_eq!(run.wall_clock_duration_micros, 10_000_000);

    let sample = Sample::new(run.open_timestamps).expect("non-empty");
    let at = |q: f64| sample.percentile(Quantile::new(q).expect("valid quantile"));

    // n - floor(n * tail), 0-indexed, over the values 1..=20000
    assert_eq!(at(90.0), 18_001);
    assert_eq!(at(99.0), 19_801);
    assert_eq!(at(99.9), 19_981);
    assert_eq!(at(99.99), 19_999);
    assert_eq!(sample.median(), 10_001);
    assert_eq!(sample.max(), 20_000);
}

#[test]
fn all_failed_file_has_no_open_sample() {
    let file = result_file(
        r#"{"started": 1, "ended": 2, "total_duration": 1,
            "connection_stats": [{"failed": true}, {"failed": true}]}"#,
    );
    let run = load_file(file.path()).expect("load");

    assert_eq!(run.fail_count, 2);
    assert!(matches!(
        Sample::new(run.open_timestamps),
        Err(AnalyzeError::EmptyInput(_))
    ));
}

#[test]
fn truncated_file_is_a_load_error() {
    let json = large_run(10);
    let file = result_file(&json[..json.len() / 2]);

    match load_file(file.path()) {
        Err(AnalyzeError::Load { source, .. }) => {
            assert!(matches!(*source, AnalyzeError::Parse { .. }))
        }
        other => panic!("expected a load error, got {:?}", other),
    }
}
