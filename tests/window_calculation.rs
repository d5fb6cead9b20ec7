//! End-to-end calculations against a YAML records file.

use rstest::{fixture, rstest};
use std::sync::Arc;

use solar_window_controller::domain::{ConfigLayer, ScenarioEnables, SensorSnapshot, ShadingTrigger};
use solar_window_controller::resolver::SystemConfig;
use solar_window_controller::state::InMemoryStateReader;
use solar_window_controller::WindowCalculator;

const RECORDS: &str = r#"
global:
  g_value: 0.5
  diffuse_factor: 0.15
  threshold_direct: 200
  threshold_diffuse: 150
  solar_radiation_sensor: sensor.solar_radiation
  outdoor_temperature_sensor: sensor.outdoor_temperature
  weather_warning_sensor: binary_sensor.weather_warning
  scenario_b_enabled: true
  scenario_c_enabled: false
  options:
    global_sensitivity: 1.0

groups:
  south_facade:
    diffuse_factor: 0.3
    azimuth: 180
    scenario_c_enable: enable
  kids:
    group_type: children
    children_factor: 0.5

windows:
  living_room:
    name: Living Room
    linked_group_id: south_facade
    diffuse_factor: "-1"
    azimuth: -1
    window_width: 2.25
    window_height: 1.25
    indoor_temperature_sensor: sensor.living_room_temperature
  bedroom:
    name: Bedroom
    linked_group_id: kids
    azimuth: 180
    window_width: 1.25
    window_height: 1.25
    room_temp_entity: sensor.bedroom_temperature
    scenario_b_enable: disable
  garage:
    azimuth: 0
    shadow_depth: 0.8
    shadow_offset: ""
"#;

#[fixture]
fn calculator() -> WindowCalculator {
    let records = SystemConfig::from_yaml_str(RECORDS).expect("records parse");
    WindowCalculator::new(Arc::new(records))
}

#[rstest]
fn window_sentinel_takes_group_value(calculator: WindowCalculator) {
    let resolved = calculator.resolve_effective_config("living_room").unwrap();

    assert_eq!(resolved.effective.physical.diffuse_factor, 0.3);
    assert_eq!(resolved.sources["diffuse_factor"], ConfigLayer::Group);
    assert_eq!(resolved.sources["azimuth"], ConfigLayer::Group);
    assert_eq!(resolved.sources["g_value"], ConfigLayer::Global);
    assert_eq!(resolved.sources["name"], ConfigLayer::Window);
}

#[rstest]
fn resolution_is_idempotent_and_sentinel_free(calculator: WindowCalculator) {
    for window_id in calculator.window_ids() {
        let first = calculator.resolve_effective_config(&window_id).unwrap();
        let second = calculator.resolve_effective_config(&window_id).unwrap();
        assert_eq!(first, second);
        assert!(first.effective.is_resolved(), "{window_id} kept a sentinel");
    }
}

#[rstest]
fn scenario_enables_follow_layers(calculator: WindowCalculator) {
    let living = calculator.resolve_effective_config("living_room").unwrap();
    assert_eq!(living.scenarios, ScenarioEnables::new(true, true));

    let bedroom = calculator.resolve_effective_config("bedroom").unwrap();
    assert_eq!(bedroom.scenarios, ScenarioEnables::new(false, false));
}

#[rstest]
fn children_factor_lowers_threshold(calculator: WindowCalculator) {
    let snapshot = SensorSnapshot::new(500.0, 40.0, 180.0);
    let result = calculator.calculate_window("bedroom", &snapshot).unwrap();
    assert_eq!(result.shading.effective_threshold, 100.0);
}

#[rstest]
fn sunny_noon_shades_south_windows(calculator: WindowCalculator) {
    let snapshot = SensorSnapshot::new(800.0, 50.0, 180.0);
    let batch = calculator.calculate_cycle(&snapshot);

    assert_eq!(batch.summary.window_count, 3);
    assert!(batch.windows["living_room"].should_shade());
    assert!(batch.windows["bedroom"].should_shade());
    assert!(!batch.windows["garage"].should_shade());
    assert!(!batch.windows["garage"].power.is_visible);
    assert_eq!(batch.summary.windows_with_shading, 2);
    assert_eq!(batch.groups["south_facade"].window_count, 1);
    assert_eq!(batch.groups["kids"].shading_count, 1);
    assert_eq!(batch.groups["kids"].name, "kids");
}

#[rstest]
fn diffuse_heat_scenario_uses_room_sensor(calculator: WindowCalculator) {
    let snapshot = SensorSnapshot::new(50.0, 10.0, 90.0)
        .with_outdoor_temp(33.0)
        .with_indoor_temp("sensor.living_room_temperature", 26.0)
        .with_indoor_temp("sensor.bedroom_temperature", 26.0);

    let living = calculator.calculate_window("living_room", &snapshot).unwrap();
    assert_eq!(living.shading.trigger, Some(ShadingTrigger::ScenarioB));

    // scenario B disabled on the bedroom window itself
    let bedroom = calculator.calculate_window("bedroom", &snapshot).unwrap();
    assert!(!bedroom.should_shade());
}

#[rstest]
fn weather_warning_overrides_everything_but_night(calculator: WindowCalculator) {
    let snapshot = SensorSnapshot::new(20.0, 5.0, 0.0).with_weather_warning(true);
    let result = calculator.calculate_window("garage", &snapshot).unwrap();
    assert!(result.should_shade());
    assert_eq!(result.shading.reason, "Weather warning active");
}

#[rstest]
fn snapshot_captured_from_state_store(calculator: WindowCalculator) {
    let states = InMemoryStateReader::new();
    states.set_state("sensor.solar_radiation", "720.5", None);
    states.set_state("sensor.outdoor_temperature", "unavailable", None);
    states.set_state("binary_sensor.weather_warning", "off", None);
    states.set_state("sensor.living_room_temperature", "24.0", None);
    states.set_state("sensor.bedroom_temperature", "23.1", None);
    states.set_sun_position(38.0, 165.0);

    let snapshot = calculator.capture_snapshot(&states);

    assert_eq!(snapshot.solar_radiation_w_m2, 720.5);
    assert_eq!(snapshot.sun_elevation_deg, 38.0);
    assert_eq!(snapshot.outdoor_temp_c, None);
    assert!(!snapshot.weather_warning);
    assert_eq!(snapshot.indoor_temp("sensor.living_room_temperature"), Some(24.0));
    assert_eq!(snapshot.indoor_temp("sensor.bedroom_temperature"), Some(23.1));
}

#[rstest]
#[case(0.0, 45.0)]
#[case(500.0, 0.0)]
#[case(500.0, -12.0)]
fn night_or_dark_yields_zero_power(
    calculator: WindowCalculator,
    #[case] radiation: f64,
    #[case] elevation: f64,
) {
    let batch = calculator.calculate_cycle(&SensorSnapshot::new(radiation, elevation, 180.0));
    assert_eq!(batch.summary.total_power, 0.0);
    assert_eq!(batch.summary.windows_with_shading, 0);
    assert!(batch.windows.values().all(|w| w.power.shadow_factor == 1.0));
}
