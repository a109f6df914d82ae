use super::*;
use crate::error::EngineError;
use crate::model::{AirflowFilter, AirflowRoom, Room};

fn filter(num: &str, speeds: &[&str]) -> AirflowFilter {
    AirflowFilter {
        filter_num: num.to_string(),
        speeds: speeds.iter().map(|speed| speed.to_string()).collect(),
    }
}

fn airflow_room(area: &str, criterion: Option<&str>, filters: Vec<AirflowFilter>) -> AirflowRoom {
    AirflowRoom {
        num: "101".to_string(),
        name: "Gowning".to_string(),
        class: "C".to_string(),
        area: area.to_string(),
        criterion: criterion.map(str::to_string),
        filters,
    }
}

#[test]
fn sampling_points_follow_area_thresholds() {
    assert_eq!(calc_points("2"), 1);
    assert_eq!(calc_points("2,5"), 2);
    assert_eq!(calc_points("10"), 5);
    assert_eq!(calc_points("10.01"), 6);
    assert_eq!(calc_points("1000"), 27);
    assert_eq!(calc_points("1500"), 27);
    assert_eq!(calc_points("abc"), 1);
    assert_eq!(calc_points(""), 1);
}

#[test]
fn filter_flow_scales_mean_speed_by_area() {
    let flow = filter_flow(0.5, &[0.4, 0.5, 0.6]).expect("flow");
    assert!((flow - 900.0).abs() < 1e-9);
    assert_eq!(filter_flow(0.5, &[]), None);
    assert_eq!(mean(&[]), None);
}

#[test]
fn room_total_sums_filters_and_checks_criterion() {
    let room = airflow_room(
        "0,5",
        Some("1500"),
        vec![filter("", &["0,4", "0,5", "0,6"]), filter("F2", &["0.5", "0.5"])],
    );
    let result = room_airflow(&room).expect("airflow");
    assert_eq!(result.filters.len(), 2);
    assert_eq!(result.filters[0].filter_num, "1");
    assert_eq!(result.filters[1].filter_num, "F2");
    assert!((result.total - 1800.0).abs() < 1e-9);
    assert_eq!(result.criterion_text.as_deref(), Some("1500,00"));
    assert_eq!(result.passed(), Some(true));
    assert_eq!(result.label(), "101:Gowning");
}

#[test]
fn verdict_is_inclusive() {
    assert!(verdict(100.0, 100.0));
    assert!(!verdict(99.99, 100.0));
}

#[test]
fn room_without_criterion_has_no_verdict() {
    let result = room_airflow(&airflow_room("1", None, vec![filter("1", &["0.2"])])).expect("airflow");
    assert_eq!(result.passed(), None);
    assert_eq!(result.criterion_text, None);
}

#[test]
fn invalid_measurements_are_mismatches() {
    let bad_speed = airflow_room("1", None, vec![filter("1", &["0.2", "fast"])]);
    let err = room_airflow(&bad_speed).expect_err("speed is not a number");
    assert!(matches!(err, EngineError::StructuralMismatch { .. }));
    assert!(err.to_string().contains("point 2"));

    let no_area = airflow_room("0", None, vec![filter("1", &["0.2"])]);
    assert!(room_airflow(&no_area).is_err());

    let no_filters = airflow_room("1", None, Vec::new());
    assert!(compute_airflow(&[no_filters]).is_err());
}

#[test]
fn exchange_prefers_measured_totals() {
    let mut rooms = vec![
        Room {
            num: "101".to_string(),
            volume: "30".to_string(),
            airflow: "600".to_string(),
            ..Room::default()
        },
        Room {
            num: "102".to_string(),
            volume: "20".to_string(),
            airflow: "400".to_string(),
            ..Room::default()
        },
        Room {
            num: "103".to_string(),
            volume: "".to_string(),
            airflow: "n/a".to_string(),
            ..Room::default()
        },
    ];
    apply_exchange(&mut rooms, &[Some(900.0)]);

    assert_eq!(rooms[0].total_flow, "900,00");
    assert_eq!(rooms[0].exchange_actual, "30,00");
    assert_eq!(rooms[1].total_flow, "400,00");
    assert_eq!(rooms[1].exchange_actual, "20,00");
    assert_eq!(rooms[2].total_flow, "n/a");
    assert_eq!(rooms[2].exchange_actual, "");
}

#[test]
fn exchange_needs_positive_volume() {
    assert_eq!(exchange_actual(100.0, 0.0), None);
    assert_eq!(exchange_actual(100.0, 4.0), Some(25.0));
}
