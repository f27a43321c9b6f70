//! Loading actuator and physical-property tables from TOML files.

use std::fs;

use mech_common::actuator::ActuatorConfig;
use mech_common::config::{ConfigError, ConfigLoader};
use mech_common::physics::PhysicalPropertiesConfig;
use serde::Deserialize;
use tempfile::TempDir;

#[derive(Debug, Deserialize)]
struct Body {
    properties: PhysicalPropertiesConfig,
    #[serde(default)]
    actuators: Vec<ActuatorConfig>,
}

fn write(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn body_with_two_actuators() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "elevator.toml",
        r#"
[properties]
mass = 10.0
center_of_gravity = [0.0, 0.0, 0.5]
moment_of_inertia = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.1]]

[[actuators]]
name = "left"
id = 1
gear_ratio = 10.0
supply_current_limit = 40.0

[[actuators]]
name = "right"
id = 2
gear_ratio = 10.0
reversed = true
"#,
    );

    let body = Body::load(&path).unwrap();
    let props = body.properties.to_properties().unwrap();
    assert_eq!(props.mass(), 10.0);
    assert_eq!(props.center_of_gravity().z, 0.5);

    assert_eq!(body.actuators.len(), 2);
    assert_eq!(body.actuators[0].driver, "simulation");
    assert_eq!(body.actuators[0].current_limit(), Some(40.0));
    assert!(body.actuators[1].reversed);
    for a in &body.actuators {
        a.validate().unwrap();
    }
}

#[test]
fn missing_mass_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bad.toml", "[properties]\ncenter_of_gravity = [0.0, 0.0, 0.0]\n");
    assert!(matches!(Body::load(&path), Err(ConfigError::ParseError(_))));
}

#[test]
fn zero_mass_parses_but_fails_conversion() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "zero.toml", "[properties]\nmass = 0.0\n");
    let body = Body::load(&path).unwrap();
    assert!(body.properties.to_properties().is_err());
}

#[test]
fn material_table() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "arm.toml",
        r#"
[properties]
mass = 5.0

[properties.material]
friction = 0.4
restitution = 0.1
damping = 0.05
"#,
    );
    let props = Body::load(&path).unwrap().properties.to_properties().unwrap();
    let material = props.material().unwrap();
    assert_eq!(material.friction, 0.4);
}
