use chrono::NaiveDate;
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::{
    action_item::{ActionItem, ActionItemOwner, ActionItemRequest},
    inspection::{InspectionAction, InspectionStatus},
    require_text,
    user::Actor,
};
use crate::{
    database::{assign_reference, Attachable, Env, Record, RecordStore, Sequence, UnitOfWork},
    error::{Error, Result},
    workflow::Lifecycle,
};

pub const COLLECTION: &str = "office_inspections";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OfficeChecklist {
    pub fire_safety_ok: bool,
    pub emergency_exits_ok: bool,
    pub first_aid_ok: bool,
    pub electrical_safety_ok: bool,
    pub workspace_safety_ok: bool,
}

impl OfficeChecklist {
    pub fn is_complete(&self) -> bool {
        self.fire_safety_ok
            && self.emergency_exits_ok
            && self.first_aid_ok
            && self.electrical_safety_ok
            && self.workspace_safety_ok
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OfficeInspection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    version: i64,
    reference: String,
    pub inspection_date: NaiveDate,
    pub inspector_id: ObjectId,
    pub department_id: Option<ObjectId>,
    pub location: String,
    pub company_id: ObjectId,
    pub checklist: OfficeChecklist,
    pub notes: Option<String>,
    pub recommendation: Option<String>,
    pub attachment_ids: Vec<ObjectId>,
    status: InspectionStatus,
}
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OfficeInspectionRequest {
    pub reference: Option<String>,
    pub inspection_date: Option<NaiveDate>,
    pub inspector_id: Option<ObjectId>,
    pub department_id: Option<ObjectId>,
    pub location: String,
    #[serde(default)]
    pub checklist: OfficeChecklist,
    pub notes: Option<String>,
    pub recommendation: Option<String>,
}

impl Record for OfficeInspection {
    const COLLECTION: &'static str = COLLECTION;
    const NAME: &'static str = "OFFICE_INSPECTION";
    const SEQUENCE: Option<Sequence> = Some(Sequence::new("office.inspection", "OFI"));

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
    fn version_mut(&mut self) -> &mut i64 {
        &mut self.version
    }
    fn validate(&self) -> Result<()> {
        require_text(Some(self.location.as_str()), "Please set the inspected location.")
    }
}

impl Attachable for OfficeInspection {
    fn company_id(&self) -> ObjectId {
        self.company_id
    }
    fn attachment_ids_mut(&mut self) -> &mut Vec<ObjectId> {
        &mut self.attachment_ids
    }
}

impl OfficeInspection {
    pub fn new(reference: String, actor: &Actor, request: OfficeInspectionRequest, today: NaiveDate) -> Self {
        let mut inspection: OfficeInspection = Self {
            _id: Some(ObjectId::new()),
            version: 0,
            reference,
            inspection_date: today,
            inspector_id: actor.user_id,
            department_id: None,
            location: String::new(),
            company_id: actor.company_id,
            checklist: OfficeChecklist::default(),
            notes: None,
            recommendation: None,
            attachment_ids: Vec::new(),
            status: InspectionStatus::Draft,
        };
        inspection.apply_request(request);
        inspection
    }

    pub fn apply_request(&mut self, request: OfficeInspectionRequest) {
        if let Some(inspection_date) = request.inspection_date {
            self.inspection_date = inspection_date;
        }
        if let Some(inspector_id) = request.inspector_id {
            self.inspector_id = inspector_id;
        }
        self.department_id = request.department_id;
        self.location = request.location;
        self.checklist = request.checklist;
        self.notes = request.notes;
        self.recommendation = request.recommendation;
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
    pub fn status(&self) -> InspectionStatus {
        self.status
    }

    pub fn run(&mut self, action: InspectionAction) -> Result<()> {
        let next: InspectionStatus = self.status.next(action)?;
        if action == InspectionAction::Complete && !self.checklist.is_complete() {
            return Err(Error::guard(
                "All safety checks must be completed before marking as done.",
            ));
        }
        self.status = next;
        Ok(())
    }

    pub async fn find_by_company(
        store: &dyn RecordStore,
        company_id: &ObjectId,
    ) -> Result<Vec<OfficeInspection>> {
        let mut inspections: Vec<OfficeInspection> =
            Self::find_many(store, doc! { "company_id": company_id }).await?;
        inspections.sort_by(|a, b| b.inspection_date.cmp(&a.inspection_date));
        Ok(inspections)
    }

    pub async fn create(
        env: &Env,
        actor: &Actor,
        mut request: OfficeInspectionRequest,
        today: NaiveDate,
    ) -> Result<OfficeInspection> {
        let reference: String = assign_reference::<Self>(env, request.reference.take()).await?;
        let inspection: OfficeInspection = OfficeInspection::new(reference, actor, request, today);

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.insert(&inspection)?;
        uow.commit(env.store()).await?;

        tracing::info!(reference = %inspection.reference, "office inspection created");
        Ok(inspection)
    }

    pub async fn update(
        env: &Env,
        _id: &ObjectId,
        request: OfficeInspectionRequest,
    ) -> Result<OfficeInspection> {
        let mut inspection: OfficeInspection = Self::get(env.store(), _id).await?;
        inspection.apply_request(request);

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut inspection)?;
        uow.commit(env.store()).await?;
        Ok(inspection)
    }

    pub async fn apply(env: &Env, _id: &ObjectId, action: InspectionAction) -> Result<OfficeInspection> {
        let mut inspection: OfficeInspection = Self::get(env.store(), _id).await?;
        inspection.run(action)?;

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut inspection)?;
        uow.commit(env.store()).await?;

        tracing::info!(reference = %inspection.reference, ?action, status = ?inspection.status, "office inspection updated");
        Ok(inspection)
    }

    pub async fn add_corrective_action(
        env: &Env,
        _id: &ObjectId,
        request: ActionItemRequest,
    ) -> Result<ActionItem> {
        let inspection: OfficeInspection = Self::get(env.store(), _id).await?;
        let item: ActionItem = ActionItem::new(
            ActionItemOwner::OfficeInspection,
            *_id,
            inspection.company_id,
            request,
        );
        item.save(env).await?;
        Ok(item)
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
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }
    fn request() -> OfficeInspectionRequest {
        OfficeInspectionRequest {
            location: "Third floor open space".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn completion_needs_every_check() {
        let mut inspection = OfficeInspection::new("OFI1".to_string(), &actor(), request(), today());
        inspection.run(InspectionAction::Start).unwrap();
        inspection.checklist = OfficeChecklist {
            fire_safety_ok: true,
            emergency_exits_ok: true,
            first_aid_ok: true,
            electrical_safety_ok: true,
            workspace_safety_ok: false,
        };
        assert!(inspection
            .run(InspectionAction::Complete)
            .unwrap_err()
            .is_guard_violation());
        assert_eq!(inspection.status(), InspectionStatus::InProgress);

        inspection.checklist.workspace_safety_ok = true;
        inspection.run(InspectionAction::Complete).unwrap();
        assert_eq!(inspection.status(), InspectionStatus::Done);
    }

    #[actix_web::test]
    async fn defaults_to_the_current_user_and_date() {
        let env = Env::memory();
        let actor = actor();
        let inspection = OfficeInspection::create(&env, &actor, request(), today()).await.unwrap();
        assert_eq!(inspection.inspector_id, actor.user_id);
        assert_eq!(inspection.inspection_date, today());
        assert_eq!(inspection.reference(), "OFI00001");
    }

    #[actix_web::test]
    async fn corrective_actions_belong_to_the_inspection() {
        let env = Env::memory();
        let inspection = OfficeInspection::create(&env, &actor(), request(), today()).await.unwrap();
        let _id = inspection._id.unwrap();
        OfficeInspection::add_corrective_action(
            &env,
            &_id,
            ActionItemRequest {
                name: "Clear blocked exit".to_string(),
                deadline: Some(today()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let items = ActionItem::find_by_owner(env.store(), ActionItemOwner::OfficeInspection, &_id)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].company_id, inspection.company_id);
    }
}
