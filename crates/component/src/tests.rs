use std::fs;
use std::io;
use std::sync::{Arc, Mutex};

use serde_yaml::{Mapping, Value};
use tempfile::tempdir;

use crate::fixtures::{Centroid, CentroidConfig, Splat, SplatConfig};
use crate::persist::{self, PARAMETER_KEY, PROPERTY_KEY};
use crate::{
    with_scope, Component, ComponentError, ComponentRegistry, HandleSettings, RawArgs, Trainable,
};

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, logs.text())
}

fn rows() -> Vec<Vec<f64>> {
    vec![vec![0.0, 2.0], vec![2.0, 4.0]]
}

fn trained_centroid() -> Centroid {
    let mut config = CentroidConfig::new(2);
    config.label = Some("origin".into());
    let mut c = Centroid::build(config, RawArgs::default()).unwrap();
    c.train(rows().as_slice()).unwrap();
    c
}

fn settings_in(dir: &std::path::Path) -> HandleSettings {
    HandleSettings::default().with_cache_root(dir.join("cache"))
}

#[test]
fn capture_records_every_effective_parameter_in_order() {
    let c = Centroid::build(CentroidConfig::new(3), RawArgs::default()).unwrap();
    let args = c.base().init_args();
    assert_eq!(args.keys().collect::<Vec<_>>(), vec!["dims", "label", "scale"]);
    assert_eq!(args.get("dims").and_then(Value::as_u64), Some(3));
    assert_eq!(args.get("scale").and_then(Value::as_f64), Some(1.0));
    assert_eq!(c.base().kind(), "Centroid");
}

#[test]
fn failed_constructor_is_reported() {
    let err = Centroid::build(CentroidConfig::new(0), RawArgs::default()).unwrap_err();
    assert!(matches!(err, ComponentError::Configuration(_)));
}

#[test]
fn guarded_operation_requires_training() {
    let mut c = Centroid::build(CentroidConfig::new(2), RawArgs::default()).unwrap();
    assert!(!c.is_trained());
    let err = c.distance(&[0.0, 0.0]).unwrap_err();
    assert!(matches!(&err, ComponentError::Precondition(op) if op == "distance"));
    assert!(err.to_string().contains("\"distance\""));

    c.train(rows().as_slice()).unwrap();
    assert!(c.is_trained());
    assert!(c.require_trained("distance").is_ok());
    assert_eq!(c.distance(&[1.0, 3.0]).unwrap(), 0.0);
}

#[test]
fn failed_fit_leaves_component_untrained() {
    let mut c = Centroid::build(CentroidConfig::new(2), RawArgs::default()).unwrap();
    assert!(c.train(&[]).is_err());
    assert!(!c.is_trained());
}

#[test]
fn retraining_warns_once_and_overrides() {
    let mut c = Centroid::build(CentroidConfig::new(2), RawArgs::default()).unwrap();
    let (_, first) = with_captured_logs(|| c.train(rows().as_slice()).unwrap());
    assert!(!first.contains("retrain_override"));
    assert!(first.contains("train_success"));

    let (_, second) = with_captured_logs(|| c.train(&[vec![10.0, 10.0]]).unwrap());
    assert_eq!(second.matches("retrain_override").count(), 1);
    assert!(second.contains("Centroid"));
    assert!(c.is_trained());
    assert_eq!(c.centroid, vec![10.0, 10.0]);
}

#[test]
fn recapture_merges_instead_of_replacing() {
    let mut c = Splat::build(
        SplatConfig { name: "a".into() },
        RawArgs::new(vec![Value::from(1)], Mapping::new()),
    )
    .unwrap();
    let mut kwargs = Mapping::new();
    kwargs.insert("extra".into(), Value::from(true));
    c.base
        .recapture::<Splat>(&SplatConfig { name: "b".into() }, &RawArgs::new(vec![], kwargs))
        .unwrap();

    let args = c.base().init_args();
    assert_eq!(args.get("name"), Some(&Value::from("b")));
    assert!(args.get("args").is_some());
    assert!(args.get("kwargs").is_some());
}

#[test]
fn structured_document_holds_parameters_and_non_default_properties() {
    let c = trained_centroid();
    let doc = persist::structured_document(&c).unwrap();
    let Value::Tagged(tagged) = doc else {
        panic!("document is not tagged");
    };
    assert_eq!(tagged.tag.to_string(), "!Centroid");
    let body = tagged.value.as_mapping().unwrap();
    let parameter = body.get(PARAMETER_KEY).unwrap().as_mapping().unwrap();
    assert_eq!(parameter.get("label"), Some(&Value::from("origin")));
    let property = body.get(PROPERTY_KEY).unwrap().as_mapping().unwrap();
    assert_eq!(property.len(), 1);
    assert_eq!(property.get("is_trained"), Some(&Value::Bool(true)));
}

#[test]
fn untrained_structured_dump_has_no_property_section() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("c.yml");
    let c = Centroid::build(CentroidConfig::new(2), RawArgs::default()).unwrap();
    c.dump_structured(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("!Centroid"));
    assert!(text.contains("parameter:"));
    assert!(!text.contains("property:"));
}

#[test]
fn structured_round_trip_is_stable() {
    let dir = tempdir().unwrap();
    let settings = settings_in(dir.path());
    let first = dir.path().join("first.yml");
    let second = dir.path().join("second.yml");

    let mut c = trained_centroid();
    c.base_mut().properties_mut().batch_size = Some(16);
    c.dump_structured(&first).unwrap();

    let loaded = Centroid::load_structured_with(&first, &settings).unwrap();
    assert_eq!(loaded.base().init_args(), c.base().init_args());
    assert_eq!(loaded.base().properties(), c.base().properties());
    assert_eq!(loaded.base().cache().root(), dir.path().join("cache").join("Centroid"));

    loaded.dump_structured(&second).unwrap();
    assert_eq!(
        fs::read_to_string(&first).unwrap(),
        fs::read_to_string(&second).unwrap()
    );
}

#[test]
fn structured_load_reruns_constructor_without_learned_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("c.yml");
    let c = trained_centroid();
    c.dump_structured(&path).unwrap();

    let loaded = Centroid::load_structured_with(&path, &settings_in(dir.path())).unwrap();
    assert!(loaded.is_trained());
    assert_eq!(loaded.centroid, vec![0.0, 0.0]);
}

#[test]
fn hand_written_structured_file_uses_config_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("c.yml");
    fs::write(&path, "!Centroid\nparameter:\n  dims: 4\n").unwrap();

    let c = Centroid::load_structured_with(&path, &settings_in(dir.path())).unwrap();
    assert_eq!(c.config, CentroidConfig::new(4));
    assert!(!c.is_trained());
}

#[test]
fn structured_load_rejects_bad_documents() {
    let dir = tempdir().unwrap();
    let settings = settings_in(dir.path());
    let path = dir.path().join("c.yml");

    fs::write(&path, "!Centroid\nparameter:\n  label: x\n").unwrap();
    let err = Centroid::load_structured_with(&path, &settings).unwrap_err();
    assert!(matches!(err, ComponentError::Configuration(_)));

    fs::write(&path, "!Splat\nparameter:\n  name: x\n").unwrap();
    let err = Centroid::load_structured_with(&path, &settings).unwrap_err();
    assert!(matches!(err, ComponentError::Deserialization(_)));

    fs::write(&path, "!Centroid\nparameter:\n  dims: 2\nproperty:\n  colour: red\n").unwrap();
    let err = Centroid::load_structured_with(&path, &settings).unwrap_err();
    assert!(matches!(err, ComponentError::Configuration(_)));

    fs::write(&path, "!Centroid\n- 1\n- 2\n").unwrap();
    let err = Centroid::load_structured_with(&path, &settings).unwrap_err();
    assert!(matches!(err, ComponentError::Deserialization(_)));

    let missing = dir.path().join("missing.yml");
    let err = Centroid::load_structured_with(&missing, &settings).unwrap_err();
    assert!(matches!(err, ComponentError::Io(_)));
}

#[test]
fn raw_arguments_survive_structured_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("splat.yml");
    let mut kwargs = Mapping::new();
    kwargs.insert("threshold".into(), Value::from(0.5));
    kwargs.insert("name".into(), Value::from("shadowed"));
    let raw = RawArgs::new(vec![Value::from("first"), Value::from(2)], kwargs);
    let s = Splat::build(SplatConfig { name: "explicit".into() }, raw.clone()).unwrap();
    s.dump_structured(&path).unwrap();

    let loaded = Splat::load_structured_with(&path, &settings_in(dir.path())).unwrap();
    assert_eq!(loaded.config.name, "explicit");
    assert_eq!(loaded.raw, raw);
    assert_eq!(loaded.base().init_args(), s.base().init_args());
}

#[test]
fn binary_round_trip_restores_state_and_handles() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("c.bin");
    let c = trained_centroid();
    c.dump_binary(&path).unwrap();

    let loaded = Centroid::load_binary_with(&path, &settings_in(dir.path())).unwrap();
    assert!(loaded.is_trained());
    assert_eq!(loaded.centroid, c.centroid);
    assert_eq!(loaded.config, c.config);
    assert_eq!(loaded.base().init_args(), c.base().init_args());
    assert_eq!(
        loaded.distance(&[0.0, 0.0]).unwrap(),
        c.distance(&[0.0, 0.0]).unwrap()
    );

    let cache = loaded.base().cache();
    cache.put("k", b"v").unwrap();
    assert_eq!(cache.get("k").unwrap(), Some(b"v".to_vec()));
}

#[test]
fn raw_arguments_survive_binary_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("splat.bin");
    let mut kwargs = Mapping::new();
    kwargs.insert("threshold".into(), Value::from(0.5));
    kwargs.insert("tags".into(), Value::from(vec!["a", "b"]));
    let raw = RawArgs::new(vec![Value::from("first"), Value::from(2)], kwargs);
    let s = Splat::build(SplatConfig { name: "packed".into() }, raw.clone()).unwrap();
    s.dump_binary(&path).unwrap();

    let loaded = Splat::load_binary_with(&path, &settings_in(dir.path())).unwrap();
    assert_eq!(loaded.config, s.config);
    assert_eq!(loaded.raw, raw);
    assert_eq!(loaded.raw, s.raw);
    assert_eq!(loaded.base().init_args(), s.base().init_args());
    assert!(!loaded.is_trained());
}

#[test]
fn binary_load_rejects_missing_corrupt_and_foreign_files() {
    let dir = tempdir().unwrap();
    let settings = settings_in(dir.path());

    let missing = dir.path().join("missing.bin");
    let err = Centroid::load_binary_with(&missing, &settings).unwrap_err();
    assert!(matches!(err, ComponentError::Deserialization(_)));

    let corrupt = dir.path().join("corrupt.bin");
    fs::write(&corrupt, b"definitely not zstd").unwrap();
    let err = Centroid::load_binary_with(&corrupt, &settings).unwrap_err();
    assert!(matches!(err, ComponentError::Deserialization(_)));

    let foreign = dir.path().join("splat.bin");
    Splat::build(SplatConfig { name: "s".into() }, RawArgs::default())
        .unwrap()
        .dump_binary(&foreign)
        .unwrap();
    let err = Centroid::load_binary_with(&foreign, &settings).unwrap_err();
    assert!(matches!(err, ComponentError::Deserialization(_)));
}

#[test]
fn binary_load_rejects_other_component_version() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("old.bin");
    let bytes = persist::encode_binary(&trained_centroid()).unwrap();
    let mut envelope = persist::decode_envelope(&bytes).unwrap();
    envelope.component_version += 1;
    let raw = bincode::serde::encode_to_vec(&envelope, bincode::config::standard()).unwrap();
    fs::write(&path, zstd::encode_all(raw.as_slice(), 3).unwrap()).unwrap();

    let err = Centroid::load_binary_with(&path, &settings_in(dir.path())).unwrap_err();
    assert!(matches!(&err, ComponentError::Deserialization(msg) if msg.contains("version")));
}

#[test]
fn scope_closes_exactly_once() {
    let mut c = trained_centroid();
    {
        let scope = c.scope();
        assert!(scope.distance(&[0.0, 0.0]).is_ok());
    }
    assert_eq!(c.closes, 1);

    let scope = c.scope();
    scope.finish().unwrap();
    assert_eq!(c.closes, 2);
}

#[test]
fn scope_closes_when_the_body_fails() {
    let mut c = Centroid::build(CentroidConfig::new(2), RawArgs::default()).unwrap();
    let result = with_scope(&mut c, |c| c.distance(&[1.0, 1.0]));
    assert!(matches!(result, Err(ComponentError::Precondition(_))));
    assert_eq!(c.closes, 1);
}

#[test]
fn body_error_wins_over_close_error() {
    let mut c = Centroid::build(CentroidConfig::new(2), RawArgs::default()).unwrap();
    c.fail_close = true;
    let result = with_scope(&mut c, |c| c.distance(&[1.0, 1.0]));
    assert!(matches!(result, Err(ComponentError::Precondition(_))));

    let result = with_scope(&mut c, |_| Ok(()));
    assert!(matches!(result, Err(ComponentError::Io(_))));
    assert_eq!(c.closes, 2);
}

#[test]
fn close_failure_on_drop_is_logged() {
    let mut c = Centroid::build(CentroidConfig::new(2), RawArgs::default()).unwrap();
    c.fail_close = true;
    let (_, logs) = with_captured_logs(|| {
        let _scope = c.scope();
    });
    assert!(logs.contains("close_failure"));
    assert_eq!(c.closes, 1);
}

#[test]
fn registry_loads_by_stored_kind() {
    let dir = tempdir().unwrap();
    let mut registry = ComponentRegistry::new(settings_in(dir.path()));
    registry.register::<Centroid>().register::<Splat>();
    assert_eq!(registry.kinds().collect::<Vec<_>>(), vec!["Centroid", "Splat"]);

    let bin = dir.path().join("c.bin");
    let yml = dir.path().join("s.yml");
    trained_centroid().dump_binary(&bin).unwrap();
    Splat::build(SplatConfig { name: "s".into() }, RawArgs::default())
        .unwrap()
        .dump_structured(&yml)
        .unwrap();

    let loaded = registry.load_binary(&bin).unwrap();
    assert_eq!(loaded.kind(), "Centroid");
    assert!(loaded.lifecycle().is_trained());
    let centroid = loaded.downcast::<Centroid>().unwrap();
    assert_eq!(centroid.centroid, vec![1.0, 3.0]);

    let mut loaded = registry.load_structured(&yml).unwrap();
    assert_eq!(loaded.kind(), "Splat");
    assert!(loaded.downcast_ref::<Centroid>().is_none());
    assert_eq!(loaded.downcast_ref::<Splat>().unwrap().config.name, "s");
    loaded.erased_close().unwrap();
}

#[test]
fn loaded_components_debug_print_their_kind() {
    let dir = tempdir().unwrap();
    let mut registry = ComponentRegistry::new(settings_in(dir.path()));
    registry.register::<Centroid>();

    let bin = dir.path().join("c.bin");
    trained_centroid().dump_binary(&bin).unwrap();
    let loaded = registry.load_binary(&bin).unwrap();
    let printed = format!("{loaded:?}");
    assert!(printed.contains("Centroid"));
    assert!(printed.contains("is_trained: true"));
}

#[test]
fn registry_rejects_unknown_and_untagged_files() {
    let dir = tempdir().unwrap();
    let mut registry = ComponentRegistry::new(settings_in(dir.path()));
    registry.register::<Splat>();

    let bin = dir.path().join("c.bin");
    trained_centroid().dump_binary(&bin).unwrap();
    let err = registry.load_binary(&bin).unwrap_err();
    assert!(matches!(&err, ComponentError::UnknownKind(kind) if kind == "Centroid"));

    let yml = dir.path().join("plain.yml");
    fs::write(&yml, "parameter:\n  name: s\n").unwrap();
    let err = registry.load_structured(&yml).unwrap_err();
    assert!(matches!(err, ComponentError::Deserialization(_)));
}
