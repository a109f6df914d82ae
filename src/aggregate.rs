mod airflow;
mod exchange;
mod points;

#[cfg(test)]
mod tests;

pub use airflow::{
    FilterResult, RoomAirflow, SECONDS_PER_HOUR, compute_airflow, filter_flow, mean, room_airflow,
    verdict,
};
pub use exchange::{apply_exchange, exchange_actual};
pub use points::{calc_points, points_for_area};
