use chrono::TimeDelta;
use cmdroute_core::{FlagSet, ParseError, SchemaSpec, Value, ValueError, ValueKind};

fn build_set() -> FlagSet {
    let mut fs = FlagSet::new("build");
    fs.add_bool("verbose", Some('v'), false, "verbose output")
        .add_string("output", Some('o'), "a.out", "output file")
        .add_int("jobs", Some('j'), 1, "parallel jobs")
        .add_duration("timeout", Some('t'), TimeDelta::minutes(5), "build timeout")
        .add_string_list("features", Some('F'), &[], "features to enable");
    fs
}

// ---------------------------------------------------------------------------
// Flag forms
// ---------------------------------------------------------------------------

#[test]
fn attached_long_values_reproduce_every_scalar() {
    let mut fs = build_set();
    fs.parse([
        "--verbose=true",
        "--output=bin/app",
        "--jobs=-3",
        "--timeout=1h30m",
        "--features=simd,ssl",
    ])
    .unwrap();

    assert_eq!(fs.get_bool("verbose"), Some(true));
    assert_eq!(fs.get_str("output"), Some("bin/app"));
    assert_eq!(fs.get_int("jobs"), Some(-3));
    assert_eq!(fs.get_duration("timeout"), Some(TimeDelta::minutes(90)));
    assert_eq!(
        fs.get_string_list("features"),
        Some(&["simd".to_string(), "ssl".to_string()][..])
    );
    assert!(fs.args().is_empty());
}

#[test]
fn attached_value_may_contain_equals() {
    let mut fs = build_set();
    fs.parse(["--output=key=value"]).unwrap();
    assert_eq!(fs.get_str("output"), Some("key=value"));
}

#[test]
fn boolean_cluster_sets_every_flag() {
    let mut fs = FlagSet::new("ls");
    fs.add_bool("verbose", Some('v'), false, "")
        .add_bool("long", Some('l'), false, "")
        .add_bool("all", Some('a'), false, "");

    fs.parse(["-vla"]).unwrap();

    assert_eq!(fs.get_bool("verbose"), Some(true));
    assert_eq!(fs.get_bool("long"), Some(true));
    assert_eq!(fs.get_bool("all"), Some(true));
    assert!(fs.args().is_empty());
}

#[test]
fn cluster_value_flag_takes_remaining_characters() {
    let mut fs = build_set();
    fs.parse(["-vj8", "-obin"]).unwrap();
    assert_eq!(fs.get_bool("verbose"), Some(true));
    assert_eq!(fs.get_int("jobs"), Some(8));
    assert_eq!(fs.get_str("output"), Some("bin"));
}

#[test]
fn two_value_flags_cannot_share_a_cluster() {
    let mut fs = FlagSet::new("x");
    fs.add_string("alpha", Some('a'), "", "")
        .add_string("beta", Some('b'), "", "");

    let err = fs.parse(["-ab", "value"]).unwrap_err();
    assert!(matches!(err, ParseError::MissingValue(ref token) if token == "-a"));
    assert_eq!(err.to_string(), "flag needs an argument: -a");
}

#[test]
fn terminator_turns_remaining_tokens_into_literals() {
    let mut fs = FlagSet::new("x");
    fs.add_bool("verbose", Some('v'), false, "");

    fs.parse(["-v", "--", "-v", "--verbose"]).unwrap();

    assert_eq!(fs.get_bool("verbose"), Some(true));
    assert_eq!(fs.args(), ["-v", "--verbose"]);
}

#[test]
fn short_value_flag_consumes_terminator_as_value() {
    let mut fs = build_set();
    fs.parse(["-o", "--", "file"]).unwrap();
    assert_eq!(fs.get_str("output"), Some("--"));
    assert_eq!(fs.args(), ["file"]);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn error_messages_carry_the_offending_token() {
    let mut fs = build_set();

    let err = fs.parse(["--nope"]).unwrap_err();
    assert_eq!(err.to_string(), "unknown flag: --nope");

    let err = fs.parse(["-vz"]).unwrap_err();
    assert_eq!(err.to_string(), "unknown flag: -z");

    let err = fs.parse(["build", "--jobs"]).unwrap_err();
    assert_eq!(err.to_string(), "flag needs an argument: --jobs");

    let err = fs.parse(["-j", "four"]).unwrap_err();
    assert!(matches!(
        err,
        ParseError::InvalidValue { ref flag, source: ValueError::Int { ref input, .. } }
            if flag == "-j" && input == "four"
    ));
    assert!(err.to_string().starts_with("invalid flag value: -j: "));

    let err = fs.parse(["--timeout", "soon"]).unwrap_err();
    assert!(matches!(err, ParseError::InvalidValue { source: ValueError::Duration { .. }, .. }));
}

#[test]
fn positional_conversion_failure_reports_position() {
    let mut fs = FlagSet::new("x");
    fs.add_positional("Command", 0, Value::String(String::new()), "")
        .add_positional("Target", 1, Value::String(String::new()), "")
        .add_positional("Count", 2, Value::Int(0), "");

    let err = fs.parse(["build", "main.go", "notanumber"]).unwrap_err();

    assert!(matches!(err, ParseError::PositionalConversion { position: 2, .. }));
    assert!(err.to_string().starts_with("invalid value for position 2: "));
    // Earlier positions were already bound.
    assert_eq!(fs.positional("Command"), Some(&Value::String("build".into())));
}

// ---------------------------------------------------------------------------
// Captures
// ---------------------------------------------------------------------------

#[test]
fn unknown_capture_absorbs_everything_after_first_unknown() {
    let mut fs = FlagSet::new("x");
    fs.add_bool("verbose", Some('v'), false, "")
        .capture_unknown("passthrough", "");

    fs.parse(["--verbose", "--unknown", "arg1", "arg2"]).unwrap();

    assert_eq!(fs.get_bool("verbose"), Some(true));
    assert_eq!(fs.unknown_flags(), ["--unknown", "arg1", "arg2"]);
    assert!(fs.args().is_empty());
}

#[test]
fn unknown_capture_keeps_terminator_verbatim() {
    let mut fs = FlagSet::new("x");
    fs.allow_unknown_flags(true);
    fs.parse(["-q", "--", "tail"]).unwrap();
    assert_eq!(fs.unknown_flags(), ["-q", "--", "tail"]);
    assert!(fs.args().is_empty());
}

#[test]
fn positionals_rest_and_flags_together() {
    let mut fs = FlagSet::new("cp");
    fs.add_bool("recursive", Some('r'), false, "")
        .add_positional("source", 0, Value::String(String::new()), "")
        .add_positional("dest", 1, Value::String(String::new()), "")
        .capture_rest("all", "");

    fs.parse(["src/", "-r", "dst/", "extra"]).unwrap();

    assert_eq!(fs.positional("source"), Some(&Value::String("src/".into())));
    assert_eq!(fs.positional("dest"), Some(&Value::String("dst/".into())));
    assert_eq!(fs.rest().unwrap(), ["src/", "dst/", "extra"]);
    assert_eq!(fs.get_bool("recursive"), Some(true));
}

#[test]
fn string_list_positional_splits_on_commas() {
    let mut fs = FlagSet::new("tag");
    fs.add_positional("labels", 0, Value::StringList(Vec::new()), "");

    fs.parse(["web,api", "ignored"]).unwrap();

    assert_eq!(
        fs.positional("labels"),
        Some(&Value::StringList(vec!["web".into(), "api".into()]))
    );
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn reparse_does_not_restore_defaults() {
    let mut fs = build_set();

    fs.parse(["-v", "-j", "4", "first"]).unwrap();
    fs.parse(["second"]).unwrap();

    assert_eq!(fs.get_bool("verbose"), Some(true));
    assert_eq!(fs.get_int("jobs"), Some(4));
    assert_eq!(fs.args(), ["second"]);
}

#[test]
fn bindings_snapshot_serializes() {
    let spec: SchemaSpec = serde_yaml::from_str(
        r#"
flags:
  - long: verbose
    short: v
  - long: timeout
    kind: duration
    default: 10s
positional:
  - name: target
    position: 0
rest:
  name: files
"#,
    )
    .unwrap();
    let mut fs = spec.build("run").unwrap();
    fs.parse(["-v", "app", "x.txt"]).unwrap();

    let json = serde_json::to_value(fs.bindings()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "flags": { "timeout": "10s", "verbose": true },
            "positional": { "target": "app" },
            "rest": ["app", "x.txt"],
            "args": ["app", "x.txt"],
        })
    );
}

#[test]
fn value_kinds_from_schema_names() {
    let kinds: Vec<ValueKind> = serde_yaml::from_str("[bool, string, int, duration, string_list, list]").unwrap();
    assert_eq!(kinds[4], ValueKind::StringList);
    assert_eq!(kinds[5], ValueKind::StringList);
}
