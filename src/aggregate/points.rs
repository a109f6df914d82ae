use crate::text::parse_number;

// ISO 14644-1 Table A.1: upper area bound (m²) to minimum sampling locations.
const AREA_THRESHOLDS: [(f64, u32); 27] = [
    (2.0, 1),
    (4.0, 2),
    (6.0, 3),
    (8.0, 4),
    (10.0, 5),
    (24.0, 6),
    (28.0, 7),
    (32.0, 8),
    (36.0, 9),
    (52.0, 10),
    (56.0, 11),
    (64.0, 12),
    (68.0, 13),
    (72.0, 14),
    (76.0, 15),
    (104.0, 16),
    (108.0, 17),
    (116.0, 18),
    (148.0, 19),
    (156.0, 20),
    (192.0, 21),
    (232.0, 22),
    (276.0, 23),
    (352.0, 24),
    (436.0, 25),
    (636.0, 26),
    (1000.0, 27),
];

pub fn points_for_area(area: f64) -> u32 {
    AREA_THRESHOLDS
        .iter()
        .find(|(bound, _)| area <= *bound)
        .map(|(_, points)| *points)
        .unwrap_or(27)
}

pub fn calc_points(area: &str) -> u32 {
    match parse_number(area) {
        Some(value) => points_for_area(value),
        None => 1,
    }
}
