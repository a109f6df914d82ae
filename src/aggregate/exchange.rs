use tracing::debug;

use crate::model::Room;
use crate::text::{format_decimal, parse_number};

pub fn exchange_actual(total_flow: f64, volume: f64) -> Option<f64> {
    (volume > 0.0).then(|| total_flow / volume)
}

// Extracted Test 11 totals win; otherwise the room's design airflow stands in.
pub fn apply_exchange(rooms: &mut [Room], totals: &[Option<f64>]) {
    for (index, room) in rooms.iter_mut().enumerate() {
        let measured = totals.get(index).copied().flatten();
        let total = measured.or_else(|| parse_number(&room.airflow));

        room.total_flow = match total {
            Some(value) => format_decimal(value, 2),
            None => room.airflow.trim().to_string(),
        };
        room.exchange_actual = total
            .zip(parse_number(&room.volume))
            .and_then(|(total, volume)| exchange_actual(total, volume))
            .map(|rate| format_decimal(rate, 2))
            .unwrap_or_default();

        debug!(
            room = %room.num,
            measured = measured.is_some(),
            total_flow = %room.total_flow,
            exchange = %room.exchange_actual,
            "computed air exchange"
        );
    }
}
