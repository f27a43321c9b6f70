//! Integration test: TOML description → running system.

use std::fs;
use std::path::PathBuf;

use approx::assert_relative_eq;
use mech_common::config::{load_validated, ConfigError, ConfigLoader};
use mech_control::{BuildError, DistributionPolicy, MechanismType, SystemConfig};
use mech_hal::ActuatorRegistry;
use nalgebra::Vector3;
use tempfile::TempDir;

fn example_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../config/example_robot.toml")
}

#[test]
fn example_description_builds() {
    let config: SystemConfig = load_validated(&example_path()).unwrap();
    assert_eq!(config.shared.service_name, "example-robot");
    assert_eq!(config.mechanisms.len(), 2);

    let system = config.build(&ActuatorRegistry::with_builtin()).unwrap();
    assert_eq!(system.root(), Some("elevator"));
    assert_eq!(system.children("elevator"), vec!["arm"]);

    let lift = system.mechanism("elevator").unwrap();
    assert_eq!(lift.mechanism_type(), MechanismType::Linear);
    assert_eq!(lift.actuator_count(), 2);
    assert!(lift.setpoint().is_some());

    let arm = system.mechanism("arm").unwrap();
    assert_eq!(arm.distribution(), DistributionPolicy::EqualSplit);
    assert_eq!(arm.tolerances(), (0.02, 0.1));
    assert!(arm.properties().material().is_some());
}

#[test]
fn example_plan_matches_hand_calculation() {
    let config = SystemConfig::load(&example_path()).unwrap();
    let mut system = config.build(&ActuatorRegistry::with_builtin()).unwrap();
    let plan = system.calculate_system_feedforward(&config.setpoint_map());

    assert_relative_eq!(
        *plan.get("elevator").unwrap(),
        Vector3::new(0.0, -1.4715, -98.1),
        epsilon = 1e-9
    );
    assert_relative_eq!(
        *plan.get("arm").unwrap(),
        Vector3::new(0.0, 14.715, 0.0),
        epsilon = 1e-9
    );
}

#[test]
fn missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let r = SystemConfig::load(&dir.path().join("nope.toml"));
    assert!(matches!(r, Err(ConfigError::FileNotFound(_))));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[system\nname = 1").unwrap();
    assert!(matches!(
        SystemConfig::load(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn cyclic_relations_fail_validation_before_build() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cyclic.toml");
    let body = fs::read_to_string(example_path()).unwrap()
        + "\n[[relations]]\nparent = \"arm\"\nchild = \"elevator\"\n";
    fs::write(&path, body).unwrap();

    let config = SystemConfig::load(&path).unwrap();
    let r = config.build(&ActuatorRegistry::with_builtin());
    assert!(matches!(
        r,
        Err(BuildError::Config(ConfigError::ValidationError(_)))
    ));
    assert!(load_validated::<SystemConfig>(&path).is_err());
}

#[test]
fn bad_mass_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("massless.toml");
    let body = fs::read_to_string(example_path())
        .unwrap()
        .replace("mass = 5.0", "mass = 0.0");
    fs::write(&path, body).unwrap();
    let err = load_validated::<SystemConfig>(&path).unwrap_err();
    assert!(err.to_string().contains("arm"));
}
