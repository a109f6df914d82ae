use crate::error::{EngineError, EngineResult};
use crate::model::AirflowRoom;
use crate::text::{format_decimal, parse_number};

pub const SECONDS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FilterResult {
    pub filter_num: String,
    pub speeds: Vec<f64>,
    pub avg_speed: f64,
    pub flow: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomAirflow {
    pub num: String,
    pub name: String,
    pub class: String,
    pub area: f64,
    pub filters: Vec<FilterResult>,
    pub total: f64,
    pub criterion: Option<f64>,
    pub criterion_text: Option<String>,
}

impl RoomAirflow {
    pub fn passed(&self) -> Option<bool> {
        self.criterion.map(|criterion| verdict(self.total, criterion))
    }

    pub fn label(&self) -> String {
        let num = self.num.trim();
        let name = self.name.trim();
        match (num.is_empty(), name.is_empty()) {
            (false, false) => format!("{num}:{name}"),
            (false, true) => num.to_string(),
            _ => name.to_string(),
        }
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn filter_flow(area: f64, speeds: &[f64]) -> Option<f64> {
    mean(speeds).map(|average| area * average * SECONDS_PER_HOUR)
}

pub fn verdict(total: f64, criterion: f64) -> bool {
    total >= criterion
}

fn invalid(room: &AirflowRoom, detail: String) -> EngineError {
    EngineError::mismatch(format!("airflow data for room {}: {detail}", room.label_hint()))
}

impl AirflowRoom {
    fn label_hint(&self) -> &str {
        if self.num.trim().is_empty() {
            self.name.trim()
        } else {
            self.num.trim()
        }
    }
}

pub fn room_airflow(room: &AirflowRoom) -> EngineResult<RoomAirflow> {
    let area = parse_number(&room.area)
        .filter(|area| *area > 0.0)
        .ok_or_else(|| invalid(room, format!("filter area `{}` is not positive", room.area)))?;
    if room.filters.is_empty() {
        return Err(invalid(room, "no filters measured".to_string()));
    }

    let mut filters = Vec::with_capacity(room.filters.len());
    for (index, filter) in room.filters.iter().enumerate() {
        let mut speeds = Vec::with_capacity(filter.speeds.len());
        for (point, raw) in filter.speeds.iter().enumerate() {
            let speed = parse_number(raw).filter(|speed| *speed >= 0.0).ok_or_else(|| {
                invalid(
                    room,
                    format!("filter {}, point {}: speed `{raw}` is invalid", index + 1, point + 1),
                )
            })?;
            speeds.push(speed);
        }
        let avg_speed = mean(&speeds)
            .ok_or_else(|| invalid(room, format!("filter {} has no speed points", index + 1)))?;
        let filter_num = if filter.filter_num.trim().is_empty() {
            (index + 1).to_string()
        } else {
            filter.filter_num.trim().to_string()
        };
        filters.push(FilterResult {
            filter_num,
            speeds,
            avg_speed,
            flow: area * avg_speed * SECONDS_PER_HOUR,
        });
    }

    let total = filters.iter().map(|filter| filter.flow).sum();
    let criterion = room.criterion.as_deref().and_then(parse_number);
    let criterion_text = room.criterion.as_deref().map(|raw| match parse_number(raw) {
        Some(value) => format_decimal(value, 2),
        None => raw.trim().to_string(),
    });

    Ok(RoomAirflow {
        num: room.num.clone(),
        name: room.name.clone(),
        class: room.class.clone(),
        area,
        filters,
        total,
        criterion,
        criterion_text,
    })
}

pub fn compute_airflow(rooms: &[AirflowRoom]) -> EngineResult<Vec<RoomAirflow>> {
    rooms.iter().map(room_airflow).collect()
}
