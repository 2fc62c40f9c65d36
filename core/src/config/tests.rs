use super::*;
use std::path::PathBuf;
use tempfile::tempdir;

fn map(pairs: &[(&str, &str)]) -> EnvMap {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[test]
fn empty_mapping_resolves_to_documented_defaults() {
    let config = resolve(&EnvMap::new()).expect("defaults are valid");

    assert_eq!(config.environment_mode, EnvironmentMode::Development);
    assert_eq!(config.device_preference, DevicePreference::Auto);
    assert_eq!(config.worker_count, 1);
    assert_eq!(config.max_memory_gigabytes, 4.0);
    assert_eq!(config.model_cache_directory, PathBuf::from("/app/model_cache"));
    assert_eq!(config.sample_data_directory, PathBuf::from("/app/sample_data"));
    assert_eq!(config.output_directory, PathBuf::from("/app/outputs"));
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.log_format, LogFormat::Json);
    assert_eq!(
        config.default_model_identifier,
        "tts_models/en/ljspeech/tacotron2-DDC"
    );
    assert!(config.models_auto_download);
    assert_eq!(config.default_sample_rate_hz, 22_050);
    assert_eq!(config.default_audio_format, AudioFormat::Wav);
    assert_eq!(config.service_port, 8000);
    assert_eq!(config.pipeline_name, "tone");
    assert_eq!(config, RuntimeConfiguration::default());
}

#[test]
fn each_omitted_key_falls_back_to_its_default() {
    let full = RuntimeConfiguration {
        environment_mode: EnvironmentMode::Production,
        device_preference: DevicePreference::Cuda,
        worker_count: 3,
        max_memory_gigabytes: 12.5,
        model_cache_directory: PathBuf::from("/srv/cache"),
        sample_data_directory: PathBuf::from("/srv/samples"),
        output_directory: PathBuf::from("/srv/out"),
        log_level: LogLevel::Debug,
        log_format: LogFormat::Text,
        default_model_identifier: "tts_models/multilingual/multi-dataset/xtts_v2".into(),
        models_auto_download: false,
        default_sample_rate_hz: 44_100,
        default_audio_format: AudioFormat::Wav,
        service_port: 9000,
        pipeline_name: "custom".into(),
        model_base_url: "https://models.example.com/releases".into(),
    }
    .to_env_map();

    let defaults_map = RuntimeConfiguration::default().to_env_map();
    for key in keys::ALL {
        let mut partial = full.clone();
        partial.remove(*key);
        let resolved = resolve(&partial)
            .expect("partial mapping resolves")
            .to_env_map();
        assert_eq!(
            resolved.get(*key),
            defaults_map.get(*key),
            "{key} should fall back to its default"
        );
    }
}

#[test]
fn invalid_enums_are_all_reported_in_one_pass() {
    let source = map(&[
        (keys::DEVICE, "tpu"),
        (keys::LOG_LEVEL, "VERBOSE"),
        (keys::LOG_FORMAT, "xml"),
        (keys::ENVIRONMENT_MODE, "staging"),
        (keys::DEFAULT_AUDIO_FORMAT, "mp3"),
        (keys::WORKERS, "abc"),
    ]);

    let errors = resolve(&source).expect_err("invalid mapping must fail");
    let mut failing = errors.keys();
    failing.sort_unstable();

    assert_eq!(
        failing,
        vec![
            keys::DEFAULT_AUDIO_FORMAT,
            keys::DEVICE,
            keys::ENVIRONMENT_MODE,
            keys::LOG_FORMAT,
            keys::LOG_LEVEL,
            keys::WORKERS,
        ]
    );

    let device = errors
        .iter()
        .find(|error| error.key == keys::DEVICE)
        .expect("device error present");
    assert_eq!(device.value, "tpu");
    assert_eq!(
        device.problem,
        ConfigProblem::UnknownVariant {
            expected: DevicePreference::VARIANTS
        }
    );
    assert!(errors.to_string().contains("TTS_DEVICE=tpu"));
    assert!(errors.to_string().contains("TTS_WORKERS=abc: expected an integer"));
}

#[test]
fn worker_count_must_be_positive() {
    for bad in ["0", "-1"] {
        let errors = resolve(&map(&[(keys::WORKERS, bad)])).expect_err("rejects non-positive");
        assert_eq!(errors.keys(), vec![keys::WORKERS]);
        assert_eq!(
            errors.iter().next().map(|error| error.problem.clone()),
            Some(ConfigProblem::NotPositive)
        );
    }

    for good in [("1", 1), ("16", 16)] {
        let config = resolve(&map(&[(keys::WORKERS, good.0)])).expect("accepts positive");
        assert_eq!(config.worker_count, good.1);
    }
}

#[test]
fn numeric_ranges_are_enforced() {
    let errors = resolve(&map(&[
        (keys::MAX_MEMORY_GB, "0"),
        (keys::DEFAULT_SAMPLE_RATE, "-22050"),
        (keys::PORT, "70000"),
    ]))
    .expect_err("out-of-range values rejected");
    assert_eq!(errors.len(), 3);

    let errors = resolve(&map(&[(keys::DEFAULT_SAMPLE_RATE, "0")]))
        .expect_err("zero sample rate rejected");
    assert_eq!(errors.keys(), vec![keys::DEFAULT_SAMPLE_RATE]);
    assert_eq!(
        errors.iter().next().map(|error| error.problem.clone()),
        Some(ConfigProblem::NotPositive)
    );

    let errors = resolve(&map(&[(keys::MAX_MEMORY_GB, "inf")])).expect_err("non-finite rejected");
    assert_eq!(
        errors.iter().next().map(|error| error.problem.clone()),
        Some(ConfigProblem::NotANumber)
    );

    let config = resolve(&map(&[(keys::MAX_MEMORY_GB, "0.5")])).expect("fraction accepted");
    assert_eq!(config.max_memory_gigabytes, 0.5);
}

#[test]
fn present_but_invalid_values_are_not_defaulted() {
    let errors = resolve(&map(&[
        (keys::DEFAULT_MODEL, "   "),
        (keys::MODELS_AUTO_DOWNLOAD, "maybe"),
        (keys::OUTPUT_DIR, "outputs"),
        (keys::MODEL_CACHE_DIR, ""),
        (keys::MODEL_BASE_URL, "ftp://mirror"),
    ]))
    .expect_err("invalid values fail");

    let problems: Vec<_> = errors
        .iter()
        .map(|error| (error.key, error.problem.clone()))
        .collect();
    assert!(problems.contains(&(keys::DEFAULT_MODEL, ConfigProblem::Empty)));
    assert!(problems.contains(&(keys::MODELS_AUTO_DOWNLOAD, ConfigProblem::NotABoolean)));
    assert!(problems.contains(&(keys::OUTPUT_DIR, ConfigProblem::NotAbsolute)));
    assert!(problems.contains(&(keys::MODEL_CACHE_DIR, ConfigProblem::Empty)));
    assert!(problems.contains(&(keys::MODEL_BASE_URL, ConfigProblem::NotHttpUrl)));
}

#[test]
fn enum_values_must_use_documented_spelling() {
    for (key, value) in [
        (keys::LOG_LEVEL, "info"),
        (keys::DEVICE, "CUDA"),
        (keys::LOG_FORMAT, " Json "),
        (keys::ENVIRONMENT_MODE, "Production"),
    ] {
        let errors = resolve(&map(&[(key, value)])).expect_err("respelled value rejected");
        assert_eq!(errors.keys(), vec![key]);
        assert!(matches!(
            errors.iter().next().map(|error| &error.problem),
            Some(ConfigProblem::UnknownVariant { .. })
        ));
    }
}

#[test]
fn boolean_values_accept_common_spellings() {
    let config = resolve(&map(&[(keys::MODELS_AUTO_DOWNLOAD, "OFF")])).expect("boolean accepted");
    assert!(!config.models_auto_download);

    let config = resolve(&map(&[(keys::MODELS_AUTO_DOWNLOAD, " yes ")])).expect("trimmed");
    assert!(config.models_auto_download);
}

#[test]
fn serialized_configuration_resolves_to_itself() {
    let original = resolve(&map(&[
        (keys::ENVIRONMENT_MODE, "production"),
        (keys::DEVICE, "cpu"),
        (keys::WORKERS, "8"),
        (keys::MAX_MEMORY_GB, "0.75"),
        (keys::OUTPUT_DIR, "/data/out"),
        (keys::LOG_FORMAT, "text"),
        (keys::MODEL_BASE_URL, "http://127.0.0.1:9000/models/"),
    ]))
    .expect("valid mapping");

    let reparsed = resolve(&original.to_env_map()).expect("canonical form is valid");
    assert_eq!(reparsed, original);

    let from_file = parse_env_file(&original.to_env_file()).expect("rendered env file parses");
    assert_eq!(resolve(&from_file).expect("env file resolves"), original);
}

#[test]
fn unrecognized_keys_are_ignored() {
    let config = resolve(&map(&[("FOO_BAR", "1"), ("PATH", "/usr/bin")]))
        .expect("unknown keys do not fail resolution");
    assert_eq!(config, RuntimeConfiguration::default());
    assert!(!config.to_env_map().contains_key("FOO_BAR"));
}

#[test]
fn partial_mapping_scenario() {
    let config = resolve(&map(&[
        ("TTS_DEVICE", "auto"),
        ("TTS_WORKERS", "2"),
        ("TTS_DEFAULT_SAMPLE_RATE", "16000"),
    ]))
    .expect("scenario resolves");

    assert_eq!(config.device_preference, DevicePreference::Auto);
    assert_eq!(config.worker_count, 2);
    assert_eq!(config.default_sample_rate_hz, 16_000);
    assert_eq!(config.environment_mode, EnvironmentMode::Development);
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(
        config,
        RuntimeConfiguration {
            worker_count: 2,
            default_sample_rate_hz: 16_000,
            ..RuntimeConfiguration::default()
        }
    );
}

#[test]
fn env_file_skips_comments_and_keeps_literal_values() {
    let contents = "\
# runtime settings
TTS_ENV=production

  TTS_DEFAULT_MODEL=tts_models/en/vctk/vits # not a comment
TTS_LOG_LEVEL=\"DEBUG\"
TTS_WORKERS=2
TTS_WORKERS=4
EMPTY=
";
    let parsed = parse_env_file(contents).expect("env file parses");

    assert_eq!(parsed.get("TTS_ENV").map(String::as_str), Some("production"));
    assert_eq!(
        parsed.get("TTS_DEFAULT_MODEL").map(String::as_str),
        Some("tts_models/en/vctk/vits # not a comment")
    );
    assert_eq!(
        parsed.get("TTS_LOG_LEVEL").map(String::as_str),
        Some("\"DEBUG\"")
    );
    assert_eq!(parsed.get("TTS_WORKERS").map(String::as_str), Some("4"));
    assert_eq!(parsed.get("EMPTY").map(String::as_str), Some(""));
    assert_eq!(parsed.len(), 5);

    let errors = resolve(&parsed).expect_err("quoted enum is not unquoted");
    assert_eq!(errors.keys(), vec![keys::LOG_LEVEL]);
}

#[test]
fn env_file_rejects_lines_without_assignment() {
    let err = parse_env_file("TTS_ENV=production\nnot an assignment\n")
        .expect_err("malformed line fails");
    match err {
        EnvFileError::MalformedLine { line, content } => {
            assert_eq!(line, 2);
            assert_eq!(content, "not an assignment");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(matches!(
        parse_env_file("=value"),
        Err(EnvFileError::MalformedLine { line: 1, .. })
    ));
}

#[test]
fn process_environment_overrides_env_file() {
    let directory = tempdir().expect("tempdir");
    let path = directory.path().join(".env");
    std::fs::write(&path, "TTS_WORKERS=2\nTTS_DEVICE=cpu\n").expect("write env file");

    let layered = load_layered(
        Some(&path),
        false,
        vec![("TTS_WORKERS".to_string(), "6".to_string())],
    )
    .expect("layered load");
    let config = resolve(&layered).expect("layered mapping resolves");
    assert_eq!(config.worker_count, 6);
    assert_eq!(config.device_preference, DevicePreference::Cpu);

    let missing = directory.path().join("absent.env");
    let optional = load_layered(Some(&missing), true, Vec::new()).expect("optional file");
    assert!(optional.is_empty());
    assert!(matches!(
        load_layered(Some(&missing), false, Vec::new()),
        Err(EnvFileError::Io { .. })
    ));
}
