use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod accident_investigation;
pub mod action_item;
pub mod attachment;
pub mod employee_safety_induction;
pub mod employee_suggestion;
pub mod fire_extinguisher;
pub mod incident_report;
pub mod inspection;
pub mod insurance_claim;
pub mod insurance_type;
pub mod office_inspection;
pub mod report;
pub mod user;
pub mod vehicle_inspection;
pub mod welding_machine_inspection;

/// `(collection, field)` pairs kept unique by the store: sequenced references,
/// and the one claim an incident may have.
pub const UNIQUE_INDEXES: &[(&str, &str)] = &[
    (incident_report::COLLECTION, "reference"),
    (accident_investigation::COLLECTION, "reference"),
    (office_inspection::COLLECTION, "reference"),
    (vehicle_inspection::COLLECTION, "reference"),
    (welding_machine_inspection::COLLECTION, "reference"),
    (employee_suggestion::COLLECTION, "reference"),
    (insurance_claim::COLLECTION, "reference"),
    (insurance_claim::COLLECTION, "incident_id"),
    (employee_safety_induction::COLLECTION, "reference"),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Record kinds reachable through the generic attachment and report endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    IncidentReport,
    AccidentInvestigation,
    OfficeInspection,
    VehicleInspection,
    WeldingMachineInspection,
    FireExtinguisher,
    EmployeeSuggestion,
    InsuranceClaim,
    EmployeeSafetyInduction,
}

impl RecordKind {
    pub fn collection(&self) -> &'static str {
        match self {
            RecordKind::IncidentReport => incident_report::COLLECTION,
            RecordKind::AccidentInvestigation => accident_investigation::COLLECTION,
            RecordKind::OfficeInspection => office_inspection::COLLECTION,
            RecordKind::VehicleInspection => vehicle_inspection::COLLECTION,
            RecordKind::WeldingMachineInspection => welding_machine_inspection::COLLECTION,
            RecordKind::FireExtinguisher => fire_extinguisher::COLLECTION,
            RecordKind::EmployeeSuggestion => employee_suggestion::COLLECTION,
            RecordKind::InsuranceClaim => insurance_claim::COLLECTION,
            RecordKind::EmployeeSafetyInduction => employee_safety_induction::COLLECTION,
        }
    }
}

/// Fails unless `value` holds non-blank text.
pub fn require_text(value: Option<&str>, message: &str) -> Result<()> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(()),
        _ => Err(Error::guard(message)),
    }
}
