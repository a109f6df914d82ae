mod airflow;
mod context;
mod equipment;
mod exchange;
mod records;
mod report;
mod risk_table;
mod rooms;
mod test_bank;
mod test_results;


pub use airflow::{extract_total_flows, fill_airflow_table};
pub use context::fill_context;
pub use equipment::{EQUIPMENT_PLACEHOLDERS, fill_equipment, format_validity};
pub use exchange::fill_exchange_table;
pub use records::RiskRecord;
pub use report::{REPORT_PLACEHOLDERS, fill_report_table, glue_caption};
pub use risk_table::{RISK_TEMPLATE_MARKER, fill_risk_table};
pub use rooms::{ROOM_PLACEHOLDERS, fill_rooms};
pub use test_bank::{BankInsertion, TABLE_PLACEHOLDERS, insert_test_tables, retitle};
pub use test_results::{POINT_PLACEHOLDERS, fill_test_results};
