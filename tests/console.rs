#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)]

use std::sync::Arc;

use command_console::demo::{create_demo_scene, DemoHost};
use command_console::loader::{discover_blocking, spawn_discovery};
use command_console::registry::command::CommandBuilder;
use command_console::registry::types::TypeTag;
use command_console::settings::{load_settings, save_settings, ConsoleSettings};
use command_console::sink::{LogLevel, SharedLog};
use command_console::{CommandError, Engine, Value};

fn demo_engine() -> (Engine, SharedLog) {
    let registry = discover_blocking(&DemoHost::default()).unwrap();
    let log = SharedLog::new(64);
    let engine = Engine::new(registry, ConsoleSettings::default(), log.clone());
    (engine, log)
}

fn texts(log: &SharedLog) -> Vec<String> {
    log.drain().into_iter().map(|e| e.text).collect()
}

// ── Console scenarios ───────────────────────────────────────────

#[test]
fn echo_prints_quoted_result() {
    let (mut engine, log) = demo_engine();
    let result = engine.submit("echo 'hi'").unwrap();
    assert_eq!(result, Value::from("hi"));
    assert_eq!(texts(&log), vec!["'hi'"]);
}

#[test]
fn unknown_variable_echoes_input_and_message() {
    let (mut engine, log) = demo_engine();
    let err = engine.submit("echo $missing").unwrap_err();
    assert!(matches!(err, CommandError::UnknownVariable { .. }));
    let entries = log.drain();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "echo $missing");
    assert_eq!(entries[1].text, "Unknown variable 'missing'");
    assert!(entries.iter().all(|e| e.level == LogLevel::Exception));
}

#[test]
fn concatenation_and_indexing() {
    let (mut engine, _) = demo_engine();
    assert_eq!(engine.run("'a'.'b'").unwrap(), Value::from("ab"));

    engine
        .registry_mut()
        .set_variable("list", Value::from(vec![10_i64, 20, 30]));
    assert_eq!(engine.run("$list[1]").unwrap(), Value::Int(20));
}

#[test]
fn instance_command_without_target_fails() {
    let (mut engine, _) = demo_engine();
    assert!(matches!(engine.run("zoom 2"), Err(CommandError::ExpectedTarget { .. })));
}

#[test]
fn last_result_chains_into_next_line() {
    let (mut engine, _) = demo_engine();
    engine.run("echo 'Main'").unwrap();
    assert_eq!(engine.run("@.' Camera'").unwrap(), Value::from("Main Camera"));
    let found = engine.run("find Camera @").unwrap();
    assert_eq!(found.to_string(), "Main Camera (Camera)");
}

#[test]
fn string_argument_converts_to_float_parameter() {
    let (mut engine, _) = demo_engine();
    engine
        .registry_mut()
        .register_command(
            CommandBuilder::new("half")
                .param("x", TypeTag::FLOAT)
                .host(|_, args| Ok(args[0].clone())),
        )
        .unwrap();
    assert_eq!(engine.run("half 2").unwrap(), Value::Float(2.0));
}

#[test]
fn hint_tracks_argument_slot() {
    let (engine, _) = demo_engine();
    let sim = engine.simulate("find Type 'Came", 15).unwrap();
    assert_eq!(sim.command.name, "find");
    assert_eq!(sim.slot, 2);
    assert_eq!(engine.hint("find Type 'Came", 15).unwrap(), "find type:type [name:string]");
}

// ── Demo scene flows ────────────────────────────────────────────

#[test]
fn zoom_through_main_global() {
    let (mut engine, _) = demo_engine();
    assert_eq!(engine.run("@main {zoom 2}").unwrap(), Value::Float(30.0));
    assert_eq!(engine.run("@main->fov").unwrap(), Value::Float(30.0));
}

#[test]
fn find_resolves_type_and_name() {
    let (mut engine, log) = demo_engine();
    let found = engine.submit("find Camera 'Main'").unwrap();
    assert_eq!(found.to_string(), "Main Camera (Camera)");
    let out = texts(&log);
    assert_eq!(out.last().unwrap(), "'Main Camera (Camera)'");
}

#[test]
fn object_parameter_converts_from_name() {
    let (mut engine, _) = demo_engine();
    let light = engine.run("getcomponent 'Sun' Light").unwrap();
    assert_eq!(light.to_string(), "Sun (Light)");
    assert_eq!(engine.run("@ {dim 2}").unwrap(), Value::Float(2.0));
}

#[test]
fn wrong_target_type_is_rejected() {
    let (mut engine, _) = demo_engine();
    assert!(matches!(
        engine.run("@main {rename 'x'}"),
        Err(CommandError::InvalidTarget { .. })
    ));
}

#[test]
fn spawned_objects_are_presented() {
    let scene = create_demo_scene();
    let registry = discover_blocking(&DemoHost::new(Arc::clone(&scene))).unwrap();
    let log = SharedLog::new(16);
    let mut engine = Engine::new(registry, ConsoleSettings::default(), log.clone());

    engine.submit("spawn 'Enemy'").unwrap();
    assert!(scene.by_name("Enemy").is_some());
    let out = texts(&log);
    assert_eq!(out[0], "Enemy (GameObject)\n  [0] Transform");

    engine.submit("spawn 'Enemy'").unwrap();
    assert_eq!(texts(&log), Vec::<String>::new());
}

#[test]
fn failing_host_command_yields_null() {
    let (mut engine, _) = demo_engine();
    assert!(engine.run("crash").unwrap().is_null());
    assert!(engine.run("@").unwrap().is_null());
}

// ── Startup and settings ────────────────────────────────────────

#[tokio::test]
async fn background_discovery_loads_demo_host() {
    let handle = spawn_discovery(DemoHost::default());
    let registry = handle.ready().await.unwrap();
    assert!(registry.is_enabled());
    assert!(registry.command("getcomponent").is_some());
    assert!(registry.global("main").is_some());
}

#[test]
fn settings_round_trip_changes_symbols() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("console").join("settings.json");

    let mut settings = ConsoleSettings::default();
    settings.symbols.identifier = '%';
    settings.last_result = "last".to_string();
    save_settings(&path, &settings).unwrap();

    let loaded = load_settings(&path).unwrap();
    assert_eq!(loaded, settings);

    let registry = discover_blocking(&DemoHost::default()).unwrap();
    let mut engine = Engine::new(registry, loaded, SharedLog::new(8));
    engine.registry_mut().set_variable("x", Value::from("y"));
    assert_eq!(engine.run("echo %x").unwrap(), Value::from("y"));
    assert_eq!(engine.run("@last").unwrap(), Value::from("y"));
}
