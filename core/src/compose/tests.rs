use super::*;
use crate::config::{resolve, EnvMap, RuntimeConfiguration};
use std::path::PathBuf;

fn default_plan() -> DeploymentPlan {
    DeploymentPlan::from_config(&RuntimeConfiguration::default())
}

#[test]
fn standard_plan_has_one_active_engine() {
    let plan = default_plan();

    let active: Vec<UnitKind> = plan.active_units().map(|unit| unit.kind).collect();
    assert_eq!(active, vec![UnitKind::Engine]);
    assert_eq!(plan.units().count(), 3);

    let engine = plan.unit(UnitKind::Engine).expect("engine declared");
    assert_eq!(engine.restart, RestartPolicy::UnlessStopped);
    assert_eq!(engine.env_file, ".env");
    assert_eq!(engine.working_dir.as_deref(), Some("/app"));
    assert_eq!(
        engine.ports,
        vec![PortMapping {
            host: 8000,
            container: 8000
        }]
    );
    assert_eq!(
        engine.volumes,
        vec![
            VolumeMount::named(MODEL_CACHE_VOLUME, "/app/model_cache"),
            VolumeMount::named(OUTPUT_VOLUME, "/app/outputs"),
            VolumeMount::bind(
                SAMPLE_DATA_HOST_PATH,
                "/app/sample_data",
                MountMode::ReadWrite,
            ),
        ]
    );

    for kind in [UnitKind::Backend, UnitKind::Frontend] {
        let unit = plan.unit(kind).expect("companion declared");
        assert_eq!(unit.activation, Activation::Inactive);
        assert_eq!(unit.depends_on, vec![UnitKind::Engine]);
        assert_eq!(unit.networks, vec![DEFAULT_NETWORK.to_string()]);
    }

    assert!(plan.validate().is_ok());
}

#[test]
fn engine_mounts_follow_resolved_configuration() {
    let mut source = EnvMap::new();
    source.insert("TTS_OUTPUT_DIR".into(), "/srv/renders".into());
    source.insert("TTS_PORT".into(), "9100".into());
    let config = resolve(&source).expect("valid configuration");

    let plan = DeploymentPlan::from_config(&config);
    let engine = plan.unit(UnitKind::Engine).expect("engine declared");

    assert_eq!(engine.ports[0].host, 9100);
    assert_eq!(engine.ports[0].container, ENGINE_CONTAINER_PORT);
    assert_eq!(engine.volumes[1].target, PathBuf::from("/srv/renders"));
    assert_eq!(engine.volumes[1].compose_entry(), "outputs:/srv/renders");
}

#[test]
fn compose_document_only_runs_active_units() {
    let plan = default_plan();
    let document = plan.render_compose();

    let services = document["services"].as_object().expect("services map");
    assert_eq!(services.len(), 1);
    let engine = &services["engine"];
    assert_eq!(engine["restart"], "unless-stopped");
    assert_eq!(engine["ports"][0], "8000:8000");
    assert_eq!(engine["volumes"][2], "./sample_data:/app/sample_data");
    assert_eq!(engine["networks"][0], DEFAULT_NETWORK);
    assert_eq!(engine["env_file"][0], ".env");

    let inactive = document["x-inactive-services"]
        .as_object()
        .expect("inactive units retained");
    assert!(inactive.contains_key("backend"));
    assert!(inactive.contains_key("frontend"));

    let volumes = document["volumes"].as_object().expect("named volumes");
    assert!(volumes.contains_key(MODEL_CACHE_VOLUME));
    assert!(volumes.contains_key(OUTPUT_VOLUME));
    assert!(!volumes.contains_key(SAMPLE_DATA_HOST_PATH));
    assert_eq!(document["networks"][DEFAULT_NETWORK]["driver"], "bridge");
}

#[test]
fn activating_a_unit_is_a_data_change() {
    let mut plan = default_plan();
    plan.activate(UnitKind::Backend).expect("backend declared");

    assert!(plan.validate().is_ok());
    let document = plan.render_compose();
    let backend = &document["services"]["backend"];
    assert_eq!(backend["depends_on"][0], "engine");
    assert_eq!(backend["environment"]["TTS_ENGINE_URL"], "http://engine:8000");
    assert!(document["x-inactive-services"].get("backend").is_none());
}

#[test]
fn validation_collects_every_violation() {
    let mut plan = default_plan();
    plan.activate(UnitKind::Backend).expect("declared");
    plan.activate(UnitKind::Frontend).expect("declared");
    plan.deactivate(UnitKind::Engine).expect("declared");

    let mut frontend = plan.unit(UnitKind::Frontend).cloned().expect("declared");
    frontend.networks.clear();
    frontend.ports = vec![PortMapping {
        host: 5000,
        container: 3000,
    }];
    frontend.volumes = vec![VolumeMount::bind("./web", "web", MountMode::ReadOnly)];
    plan.declare(frontend);

    let errors = plan.validate().expect_err("plan is invalid");
    assert!(errors.contains(&CompositionError::InactiveDependency {
        unit: UnitKind::Backend,
        dependency: UnitKind::Engine,
    }));
    assert!(errors.contains(&CompositionError::InactiveDependency {
        unit: UnitKind::Frontend,
        dependency: UnitKind::Engine,
    }));
    assert!(errors.contains(&CompositionError::OffNetwork {
        unit: UnitKind::Frontend,
        network: DEFAULT_NETWORK.to_string(),
    }));
    assert!(errors.contains(&CompositionError::DuplicateHostPort {
        port: 5000,
        first: UnitKind::Backend,
        second: UnitKind::Frontend,
    }));
    assert!(errors.contains(&CompositionError::RelativeMountTarget {
        unit: UnitKind::Frontend,
        target: "web".into(),
    }));
    assert_eq!(errors.len(), 5);
}

#[test]
fn activating_an_undeclared_unit_fails() {
    let mut plan = DeploymentPlan::new("bare", DEFAULT_NETWORK);
    assert_eq!(
        plan.activate(UnitKind::Frontend),
        Err(CompositionError::UndeclaredUnit(UnitKind::Frontend))
    );
}

#[test]
fn read_only_binds_render_with_mode_suffix() {
    let mount = VolumeMount::bind("./voices", "/app/voices", MountMode::ReadOnly);
    assert_eq!(mount.compose_entry(), "./voices:/app/voices:ro");
}

#[test]
fn engine_dockerfile_installs_in_editable_mode() {
    let dockerfile = default_plan().engine_dockerfile().expect("engine recipe");

    assert!(dockerfile.starts_with("FROM python:3.10-slim\n"));
    assert!(dockerfile.contains("WORKDIR /app"));
    assert!(dockerfile.contains("apt-get install -y --no-install-recommends"));
    assert!(dockerfile.contains("libsndfile1"));
    assert!(dockerfile.contains("RUN pip install --no-cache-dir -r requirements.txt"));
    assert!(dockerfile.contains("RUN pip install --no-cache-dir -e ."));
    assert!(dockerfile.contains("CMD [\"python\",\"engine/examples/coqui_example.py\"]"));

    let install = dockerfile.find("-r requirements.txt").expect("deps step");
    let editable = dockerfile.find("-e .").expect("package step");
    assert!(install < editable);
}

#[test]
fn unless_stopped_restarts_after_crash_but_not_manual_stop() {
    let policy = RestartPolicy::UnlessStopped;

    let crashed = UnitState::Running.next(UnitEvent::ProcessExited { success: false }, policy);
    assert_eq!(crashed, UnitState::Restarting);
    assert_eq!(crashed.next(UnitEvent::Start, policy), UnitState::Running);

    let stopped = UnitState::Running.next(UnitEvent::ManualStop, policy);
    assert_eq!(
        stopped,
        UnitState::Stopped {
            cause: StopCause::ManualStop
        }
    );
    assert_eq!(stopped.next(UnitEvent::HostReboot, policy), stopped);

    let rebooted = UnitState::Running.next(UnitEvent::HostReboot, policy);
    assert_eq!(rebooted, UnitState::Restarting);
}

#[test]
fn restart_policies_differ_on_clean_exit_and_reboot() {
    let exit = UnitEvent::ProcessExited { success: true };
    let crash = UnitEvent::ProcessExited { success: false };

    assert_eq!(
        UnitState::Running.next(exit, RestartPolicy::OnFailure),
        UnitState::Stopped {
            cause: StopCause::Exited
        }
    );
    assert_eq!(
        UnitState::Running.next(exit, RestartPolicy::Always),
        UnitState::Restarting
    );
    assert_eq!(
        UnitState::Running.next(crash, RestartPolicy::No),
        UnitState::Stopped {
            cause: StopCause::Crashed
        }
    );

    let manual = UnitState::Stopped {
        cause: StopCause::ManualStop,
    };
    assert_eq!(
        manual.next(UnitEvent::HostReboot, RestartPolicy::Always),
        UnitState::Restarting
    );
}

#[test]
fn inactive_units_ignore_runtime_events() {
    let policy = RestartPolicy::UnlessStopped;
    let state = UnitState::initial(false);
    assert_eq!(state, UnitState::DeclaredInactive);
    assert_eq!(state.next(UnitEvent::Start, policy), UnitState::DeclaredInactive);
    assert_eq!(state.next(UnitEvent::Activate, policy), UnitState::Building);
    assert!(UnitState::Building
        .next(UnitEvent::BuildSucceeded, policy)
        .is_running());
    assert_eq!(
        UnitState::Running.next(UnitEvent::Deactivate, policy),
        UnitState::DeclaredInactive
    );
}
