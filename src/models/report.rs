use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{
    accident_investigation::AccidentInvestigation,
    employee_safety_induction::EmployeeSafetyInduction,
    employee_suggestion::EmployeeSuggestion,
    fire_extinguisher::FireExtinguisher,
    incident_report::IncidentReport,
    insurance_claim::InsuranceClaim,
    office_inspection::OfficeInspection,
    vehicle_inspection::{ConditionStatus, VehicleInspection},
    welding_machine_inspection::{WeldingMachineInspection, CHECKLIST_QUESTIONS},
    RecordKind,
};
use crate::{
    database::{Record, RecordStore},
    error::{Error, Result},
};

/// What a report renderer receives for one print job.
#[derive(Debug, Serialize)]
pub struct ReportValues {
    pub doc_ids: Vec<ObjectId>,
    pub doc_model: &'static str,
    pub docs: Vec<Value>,
    pub data: Value,
}

pub fn doc_model(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::IncidentReport => "incident.report",
        RecordKind::AccidentInvestigation => "accident.investigation",
        RecordKind::OfficeInspection => "office.inspection",
        RecordKind::VehicleInspection => "vehicle.inspection",
        RecordKind::WeldingMachineInspection => "welding.machine.inspection",
        RecordKind::FireExtinguisher => "fire.extinguisher",
        RecordKind::EmployeeSuggestion => "employee.suggestion",
        RecordKind::InsuranceClaim => "insurance.claim",
        RecordKind::EmployeeSafetyInduction => "employee.safety.induction",
    }
}

/// `[✓]` when the recorded value is `status`, `[ ]` otherwise.
pub fn checkbox(value: Option<ConditionStatus>, status: ConditionStatus) -> &'static str {
    if value == Some(status) {
        "[✓]"
    } else {
        "[ ]"
    }
}

async fn fetch<R: Record>(
    store: &dyn RecordStore,
    company_id: &ObjectId,
    ids: &[ObjectId],
) -> Result<Vec<R>> {
    let company: Value = serde_json::to_value(company_id)?;
    let mut records: Vec<R> = Vec::with_capacity(ids.len());
    for _id in ids {
        let record: R = R::get(store, _id).await?;
        let value: Value = to_value(&record)?;
        if value.get("company_id") != Some(&company) {
            return Err(Error::NotFound(R::NAME));
        }
        records.push(record);
    }
    Ok(records)
}

fn to_value<T: Serialize>(record: &T) -> Result<Value> {
    Ok(serde_json::to_value(record)?)
}

fn to_values<T: Serialize>(records: &[T]) -> Result<Vec<Value>> {
    records.iter().map(to_value).collect()
}

fn vehicle_data(inspections: &[VehicleInspection]) -> Value {
    let status_display: Map<String, Value> = ConditionStatus::ALL
        .iter()
        .map(|status| {
            (
                to_value(status)
                    .ok()
                    .and_then(|value| value.as_str().map(str::to_string))
                    .unwrap_or_default(),
                Value::from(status.display()),
            )
        })
        .collect();
    let checklists: Vec<Value> = inspections
        .iter()
        .map(|inspection| {
            let lines: Vec<Value> = inspection
                .conditions
                .entries()
                .iter()
                .map(|(name, _, value)| {
                    json!({
                        "name": name,
                        "status": value.map(|status| status.display()),
                        "ok": checkbox(*value, ConditionStatus::Ok),
                        "defective": checkbox(*value, ConditionStatus::Defective),
                        "missing": checkbox(*value, ConditionStatus::Missing),
                        "fade": checkbox(*value, ConditionStatus::Fade),
                    })
                })
                .collect();
            json!({ "reference": inspection.reference(), "lines": lines })
        })
        .collect();
    json!({ "status_display": status_display, "checklists": checklists })
}

fn welding_data() -> Value {
    json!({ "questions": CHECKLIST_QUESTIONS })
}

fn merge(data: Value, extra: Value) -> Value {
    match (data, extra) {
        (Value::Object(mut data), Value::Object(extra)) => {
            for (key, value) in extra {
                data.entry(key).or_insert(value);
            }
            Value::Object(data)
        }
        (Value::Null, extra) => extra,
        (data, _) => data,
    }
}

/// Collects the records named by `ids` for the renderer. Records of another
/// company are reported as missing.
pub async fn report_values(
    store: &dyn RecordStore,
    company_id: &ObjectId,
    kind: RecordKind,
    ids: Vec<ObjectId>,
    data: Value,
) -> Result<ReportValues> {
    let (docs, data): (Vec<Value>, Value) = match kind {
        RecordKind::IncidentReport => (
            to_values(&fetch::<IncidentReport>(store, company_id, &ids).await?)?,
            data,
        ),
        RecordKind::AccidentInvestigation => (
            to_values(&fetch::<AccidentInvestigation>(store, company_id, &ids).await?)?,
            data,
        ),
        RecordKind::OfficeInspection => (
            to_values(&fetch::<OfficeInspection>(store, company_id, &ids).await?)?,
            data,
        ),
        RecordKind::VehicleInspection => {
            let inspections: Vec<VehicleInspection> = fetch(store, company_id, &ids).await?;
            let extra: Value = vehicle_data(&inspections);
            (to_values(&inspections)?, merge(data, extra))
        }
        RecordKind::WeldingMachineInspection => (
            to_values(&fetch::<WeldingMachineInspection>(store, company_id, &ids).await?)?,
            merge(data, welding_data()),
        ),
        RecordKind::FireExtinguisher => (
            to_values(&fetch::<FireExtinguisher>(store, company_id, &ids).await?)?,
            data,
        ),
        RecordKind::EmployeeSuggestion => (
            to_values(&fetch::<EmployeeSuggestion>(store, company_id, &ids).await?)?,
            data,
        ),
        RecordKind::InsuranceClaim => (
            to_values(&fetch::<InsuranceClaim>(store, company_id, &ids).await?)?,
            data,
        ),
        RecordKind::EmployeeSafetyInduction => (
            to_values(&fetch::<EmployeeSafetyInduction>(store, company_id, &ids).await?)?,
            data,
        ),
    };

    Ok(ReportValues {
        doc_ids: ids,
        doc_model: doc_model(kind),
        docs,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::Env,
        models::{
            user::Actor,
            vehicle_inspection::{VehicleConditions, VehicleInspectionRequest},
        },
    };
    use chrono::NaiveDate;

    fn actor() -> Actor {
        Actor {
            user_id: ObjectId::new(),
            company_id: ObjectId::new(),
        }
    }

    #[test]
    fn checkbox_marks_only_the_recorded_status() {
        assert_eq!(checkbox(Some(ConditionStatus::Ok), ConditionStatus::Ok), "[✓]");
        assert_eq!(checkbox(Some(ConditionStatus::Ok), ConditionStatus::Defective), "[ ]");
        assert_eq!(checkbox(None, ConditionStatus::Missing), "[ ]");
    }

    #[actix_web::test]
    async fn vehicle_reports_carry_display_labels_and_checkboxes() {
        let env = Env::memory();
        let actor = actor();
        let inspection = VehicleInspection::create(
            &env,
            &actor,
            VehicleInspectionRequest {
                vehicle_id: Some(ObjectId::new()),
                conditions: VehicleConditions {
                    headlight_left_low: Some(ConditionStatus::Fade),
                    ..Default::default()
                },
                ..Default::default()
            },
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        )
        .await
        .unwrap();
        let _id = inspection._id.unwrap();

        let values = report_values(
            env.store(),
            &actor.company_id,
            RecordKind::VehicleInspection,
            vec![_id],
            Value::Null,
        )
        .await
        .unwrap();

        assert_eq!(values.doc_model, "vehicle.inspection");
        assert_eq!(values.doc_ids, vec![_id]);
        assert_eq!(values.docs.len(), 1);
        assert_eq!(values.data["status_display"]["fade"], "Fade-out");
        assert_eq!(values.data["status_display"]["ok"], "OK");
        let lines = values.data["checklists"][0]["lines"].as_array().unwrap();
        let headlight = lines
            .iter()
            .find(|line| line["name"] == "headlight_left_low")
            .unwrap();
        assert_eq!(headlight["fade"], "[✓]");
        assert_eq!(headlight["ok"], "[ ]");
    }

    #[actix_web::test]
    async fn other_companies_records_are_not_reported() {
        let env = Env::memory();
        let owner = actor();
        let inspection = VehicleInspection::create(
            &env,
            &owner,
            VehicleInspectionRequest {
                vehicle_id: Some(ObjectId::new()),
                ..Default::default()
            },
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        )
        .await
        .unwrap();

        let result = report_values(
            env.store(),
            &ObjectId::new(),
            RecordKind::VehicleInspection,
            vec![inspection._id.unwrap()],
            Value::Null,
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound("VEHICLE_INSPECTION"))));
    }
}
