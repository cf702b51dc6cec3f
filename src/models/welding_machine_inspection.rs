use chrono::NaiveDate;
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::{
    inspection::{InspectionAction, InspectionStatus},
    user::Actor,
};
use crate::{
    database::{assign_reference, Attachable, Env, Record, RecordStore, Sequence, UnitOfWork},
    error::{Error, Result},
    workflow::Lifecycle,
};

pub const COLLECTION: &str = "welding_machine_inspections";

pub const CHECKLIST_QUESTIONS: [&str; 6] = [
    "Welding machine should be physically sound and in working condition. Eg proper cover in all side",
    "Switches and power breaker should be free from damage and properly insulated.",
    "Welding and return led cable should be mechanically strong and Electrically adequate connection should be properly tight by means of socket/terminal lugs.",
    "Welding and return led should be free from damage for eg. Cut, Open, too many joints, etc..",
    "Welding holder should be in good condition without any metal contact.",
    "All Cable should be damage free and always use industrial plug to take power connection.",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChecklistItem {
    pub answer: Option<Answer>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeldingMachineInspection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    version: i64,
    reference: String,
    pub company_id: ObjectId,
    pub inspection_date: NaiveDate,
    pub inspector_id: ObjectId,
    pub reviewer_id: Option<ObjectId>,
    pub sign_inspector: Option<String>,
    pub sign_reviewer: Option<String>,
    pub checklist: [ChecklistItem; 6],
    pub notes: Option<String>,
    pub attachment_ids: Vec<ObjectId>,
    status: InspectionStatus,
}
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct WeldingMachineInspectionRequest {
    pub reference: Option<String>,
    pub inspection_date: Option<NaiveDate>,
    pub inspector_id: Option<ObjectId>,
    pub reviewer_id: Option<ObjectId>,
    pub sign_inspector: Option<String>,
    pub sign_reviewer: Option<String>,
    #[serde(default)]
    pub checklist: [ChecklistItem; 6],
    pub notes: Option<String>,
}

impl Record for WeldingMachineInspection {
    const COLLECTION: &'static str = COLLECTION;
    const NAME: &'static str = "WELDING_MACHINE_INSPECTION";
    const SEQUENCE: Option<Sequence> = Some(Sequence::new("welding.machine.inspection", "WMI"));

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
    fn version_mut(&mut self) -> &mut i64 {
        &mut self.version
    }
}

impl Attachable for WeldingMachineInspection {
    fn company_id(&self) -> ObjectId {
        self.company_id
    }
    fn attachment_ids_mut(&mut self) -> &mut Vec<ObjectId> {
        &mut self.attachment_ids
    }
}

impl WeldingMachineInspection {
    pub fn new(
        reference: String,
        actor: &Actor,
        request: WeldingMachineInspectionRequest,
        today: NaiveDate,
    ) -> Self {
        let mut inspection: WeldingMachineInspection = Self {
            _id: Some(ObjectId::new()),
            version: 0,
            reference,
            company_id: actor.company_id,
            inspection_date: today,
            inspector_id: actor.user_id,
            reviewer_id: None,
            sign_inspector: None,
            sign_reviewer: None,
            checklist: Default::default(),
            notes: None,
            attachment_ids: Vec::new(),
            status: InspectionStatus::Draft,
        };
        inspection.apply_request(request);
        inspection
    }

    pub fn apply_request(&mut self, request: WeldingMachineInspectionRequest) {
        if let Some(inspection_date) = request.inspection_date {
            self.inspection_date = inspection_date;
        }
        if let Some(inspector_id) = request.inspector_id {
            self.inspector_id = inspector_id;
        }
        self.reviewer_id = request.reviewer_id;
        self.sign_inspector = request.sign_inspector;
        self.sign_reviewer = request.sign_reviewer;
        self.checklist = request.checklist;
        self.notes = request.notes;
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
    pub fn status(&self) -> InspectionStatus {
        self.status
    }

    pub fn run(&mut self, action: InspectionAction) -> Result<()> {
        let next: InspectionStatus = self.status.next(action)?;
        if action == InspectionAction::Complete {
            let unanswered: Vec<String> = self
                .checklist
                .iter()
                .enumerate()
                .filter(|(_, item)| item.answer.is_none())
                .map(|(index, _)| (index + 1).to_string())
                .collect();
            if !unanswered.is_empty() {
                return Err(Error::guard(format!(
                    "Please answer every checklist item before completing the inspection. Unanswered: {}.",
                    unanswered.join(", ")
                )));
            }
        }
        self.status = next;
        Ok(())
    }

    pub async fn find_by_company(
        store: &dyn RecordStore,
        company_id: &ObjectId,
    ) -> Result<Vec<WeldingMachineInspection>> {
        let mut inspections: Vec<WeldingMachineInspection> =
            Self::find_many(store, doc! { "company_id": company_id }).await?;
        inspections.sort_by(|a, b| b.inspection_date.cmp(&a.inspection_date));
        Ok(inspections)
    }

    pub async fn create(
        env: &Env,
        actor: &Actor,
        mut request: WeldingMachineInspectionRequest,
        today: NaiveDate,
    ) -> Result<WeldingMachineInspection> {
        let reference: String = assign_reference::<Self>(env, request.reference.take()).await?;
        let inspection: WeldingMachineInspection =
            WeldingMachineInspection::new(reference, actor, request, today);

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.insert(&inspection)?;
        uow.commit(env.store()).await?;

        tracing::info!(reference = %inspection.reference, "welding machine inspection created");
        Ok(inspection)
    }

    pub async fn update(
        env: &Env,
        _id: &ObjectId,
        request: WeldingMachineInspectionRequest,
    ) -> Result<WeldingMachineInspection> {
        let mut inspection: WeldingMachineInspection = Self::get(env.store(), _id).await?;
        inspection.apply_request(request);

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut inspection)?;
        uow.commit(env.store()).await?;
        Ok(inspection)
    }

    pub async fn apply(
        env: &Env,
        _id: &ObjectId,
        action: InspectionAction,
    ) -> Result<WeldingMachineInspection> {
        let mut inspection: WeldingMachineInspection = Self::get(env.store(), _id).await?;
        inspection.run(action)?;

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut inspection)?;
        uow.commit(env.store()).await?;

        tracing::info!(reference = %inspection.reference, ?action, status = ?inspection.status, "welding machine inspection updated");
        Ok(inspection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor() -> Actor {
        Actor {
            user_id: ObjectId::new(),
            company_id: ObjectId::new(),
        }
    }
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 12).unwrap()
    }

    #[test]
    fn completion_names_unanswered_items() {
        let mut inspection = WeldingMachineInspection::new(
            "WMI1".to_string(),
            &actor(),
            WeldingMachineInspectionRequest::default(),
            today(),
        );
        inspection.run(InspectionAction::Start).unwrap();
        for item in inspection.checklist.iter_mut().take(4) {
            item.answer = Some(Answer::Yes);
        }
        let error = inspection.run(InspectionAction::Complete).unwrap_err();
        assert!(error.is_guard_violation());
        assert!(error.to_string().contains("5, 6"));

        inspection.checklist[4].answer = Some(Answer::No);
        inspection.checklist[5].answer = Some(Answer::Yes);
        inspection.run(InspectionAction::Complete).unwrap();
        assert_eq!(inspection.status(), InspectionStatus::Done);
    }

    #[actix_web::test]
    async fn cancelled_inspections_can_be_reset() {
        let env = Env::memory();
        let inspection = WeldingMachineInspection::create(
            &env,
            &actor(),
            WeldingMachineInspectionRequest::default(),
            today(),
        )
        .await
        .unwrap();
        let _id = inspection._id.unwrap();
        assert_eq!(inspection.reference(), "WMI00001");

        WeldingMachineInspection::apply(&env, &_id, InspectionAction::Cancel).await.unwrap();
        let reset = WeldingMachineInspection::apply(&env, &_id, InspectionAction::ResetToDraft)
            .await
            .unwrap();
        assert_eq!(reset.status(), InspectionStatus::Draft);
    }
}
