use feedsift::{
    extract_json, DateFormat, ErrorKind, FieldMap, Record, Settings, Severity, SourceConfig,
    SourceType, Status,
};

const API_URL: &str = "https://api.example.com/v1/notices";

fn timestamp_source(path: &str) -> SourceConfig {
    let mut source = SourceConfig::new("api", API_URL).with_json_path(path);
    source.field_map.date_format = DateFormat::Timestamp;
    source
}

#[test]
fn timestamp_date_is_utc_calendar_date() {
    let text = r#"{"data": {"list": [{"title": "T", "url": "/u", "date": 1700000000}]}}"#;
    let extraction = extract_json(text, &timestamp_source("data.list"));

    assert_eq!(
        extraction.records,
        vec![Record::new("T", "https://api.example.com/u", Some("2023-11-14".to_string()))]
    );
}

#[test]
fn timestamp_just_before_midnight_utc() {
    // 2024-01-01T23:59:59Z
    let text = r#"[{"title": "late", "url": "https://y.com/a", "date": 1704153599},
                   {"title": "float", "url": "https://y.com/b", "date": 1704153599.9},
                   {"title": "string", "url": "https://y.com/c", "date": "1704153600"}]"#;
    let extraction = extract_json(text, &timestamp_source(""));

    let dates: Vec<Option<&str>> = extraction.records.iter().map(|r| r.date.as_deref()).collect();
    assert_eq!(dates, vec![Some("2024-01-01"), Some("2024-01-01"), Some("2024-01-02")]);
}

#[test]
fn field_map_from_yaml() {
    let yaml = r#"
websites:
  - name: feed
    url: https://feeds.example.com/latest
    type: json
    json_path: result.items
    field_map:
      title: headline
      url: link
      date: published_at
      date_format: timestamp
"#;
    let settings = match Settings::from_yaml_str(yaml) {
        Ok(settings) => settings,
        Err(err) => panic!("expected Ok(_), got Err({err:?})"),
    };
    let Some(source) = settings.source("feed") else {
        panic!("source `feed` missing");
    };
    assert_eq!(source.source_type, SourceType::Json);

    let text = r#"{"result": {"items": [
        {"headline": "First", "link": "/p/1", "published_at": 1700000000},
        {"headline": "Second", "link": "https://other.example.com/p/2", "published_at": null}
    ]}}"#;
    let extraction = extract_json(text, source);
    assert_eq!(
        extraction.records,
        vec![
            Record::new("First", "https://feeds.example.com/p/1", Some("2023-11-14".to_string())),
            Record::new("Second", "https://other.example.com/p/2", None),
        ]
    );
}

#[test]
fn raw_dates_pass_through() {
    let text = r#"{"list": [{"title": "a", "url": "/a", "date": "2024-05-06 10:00"}]}"#;
    let source = SourceConfig::new("api", API_URL).with_json_path("list");
    let extraction = extract_json(text, &source);
    assert_eq!(extraction.records[0].date.as_deref(), Some("2024-05-06 10:00"));
}

#[test]
fn items_without_title_or_url_are_kept() {
    let text = r#"{"list": [{"title": "complete", "url": "/a"}, {"title": "no url"}, {"url": "/b"}]}"#;
    let source = SourceConfig::new("api", API_URL).with_json_path("list");
    let extraction = extract_json(text, &source);

    assert_eq!(extraction.records.len(), 3);
    let complete: Vec<&Record> = extraction.records.iter().filter(|r| r.is_complete()).collect();
    assert_eq!(complete.len(), 1);
    assert_eq!(complete[0].url, "https://api.example.com/a");
}

#[test]
fn single_key_object_is_unwrapped() {
    let text = r#"{"data": {"rows": [{"title": "r", "url": "/r"}]}}"#;
    let source = SourceConfig::new("api", API_URL).with_json_path("data");
    let extraction = extract_json(text, &source);
    assert_eq!(extraction.records, vec![Record::new("r", "https://api.example.com/r", None)]);
}

#[test]
fn missing_path_key_is_empty() {
    let source = SourceConfig::new("api", API_URL).with_json_path("data.list");
    let extraction = extract_json(r#"{"data": {"other": []}}"#, &source);

    assert!(extraction.records.is_empty());
    assert_eq!(extraction.status(), Status::Empty);
    assert!(!extraction.has_errors());
}

#[test]
fn non_list_at_path_fails_with_configuration_error() {
    let source = SourceConfig::new("api", API_URL).with_json_path("data.list");
    for text in [r#"{"data": {"list": "x"}}"#, r#"{"data": {"list": {"a": 1, "b": 2}}}"#] {
        let extraction = extract_json(text, &source);
        assert_eq!(extraction.status(), Status::Failed, "{text}");
        assert_eq!(extraction.diagnostics_of(ErrorKind::Configuration).count(), 1, "{text}");
    }
}

#[test]
fn path_through_non_object_is_a_warning() {
    let source = SourceConfig::new("api", API_URL).with_json_path("data.list");
    for text in [r#"{"data": [1, 2]}"#, r#"{"data": 7}"#, r#"[{"title": "t"}]"#] {
        let extraction = extract_json(text, &source);
        assert!(extraction.records.is_empty(), "{text}");
        assert_eq!(extraction.status(), Status::Empty, "{text}");
        assert!(!extraction.has_errors(), "{text}");
        let severities: Vec<Severity> = extraction
            .diagnostics_of(ErrorKind::Configuration)
            .map(|d| d.severity)
            .collect();
        assert_eq!(severities, vec![Severity::Warning], "{text}");
    }
}

#[test]
fn invalid_json_fails_with_parse_error() {
    let source = SourceConfig::new("api", API_URL).with_json_path("data");
    let extraction = extract_json("<html>not json</html>", &source);
    assert_eq!(extraction.status(), Status::Failed);
    assert_eq!(extraction.diagnostics_of(ErrorKind::Parse).count(), 1);
}

#[test]
fn empty_list_is_empty() {
    let source = SourceConfig::new("api", API_URL).with_json_path("list");
    let extraction = extract_json(r#"{"list": []}"#, &source);
    assert_eq!(extraction.status(), Status::Empty);
}

#[test]
fn non_navigable_url_kept_verbatim() {
    let source = SourceConfig::new("api", API_URL)
        .with_json_path("list")
        .with_field_map(FieldMap::default());
    let extraction = extract_json(r#"{"list": [{"title": "x", "url": "javascript:void(0)"}]}"#, &source);
    assert_eq!(extraction.records[0].url, "javascript:void(0)");
}

#[test]
fn millisecond_timestamp_keeps_raw_value() {
    let text = r#"[{"title": "T", "url": "/u", "date": 1700000000000}]"#;
    let extraction = extract_json(text, &timestamp_source(""));

    assert_eq!(extraction.records[0].date.as_deref(), Some("1700000000000"));
    let units: Vec<Option<usize>> = extraction
        .diagnostics_of(ErrorKind::Parse)
        .map(|d| d.unit)
        .collect();
    assert_eq!(units, vec![Some(0)]);
}
