use chrono::NaiveDate;
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::user::Actor;
use crate::{
    database::{assign_reference, Attachable, Env, Record, RecordStore, Sequence, UnitOfWork},
    error::{Error, Result},
    workflow::{Lifecycle, Transition},
};

pub const COLLECTION: &str = "employee_safety_inductions";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InductionStatus {
    #[default]
    Draft,
    Completed,
    Cancelled,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InductionAction {
    Complete,
    Cancel,
    ResetToDraft,
}

impl Lifecycle for InductionStatus {
    type Action = InductionAction;

    const TRANSITIONS: &'static [Transition<Self, Self::Action>] = &[
        Transition {
            action: InductionAction::Complete,
            from: &[InductionStatus::Draft],
            to: InductionStatus::Completed,
        },
        Transition {
            action: InductionAction::Cancel,
            from: &[InductionStatus::Draft, InductionStatus::Completed],
            to: InductionStatus::Cancelled,
        },
        Transition {
            action: InductionAction::ResetToDraft,
            from: &[InductionStatus::Completed, InductionStatus::Cancelled],
            to: InductionStatus::Draft,
        },
    ];
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmployeeSafetyInduction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    version: i64,
    reference: String,
    pub employee_id: ObjectId,
    pub date: NaiveDate,
    pub attachment_ids: Vec<ObjectId>,
    pub notes: Option<String>,
    pub company_id: ObjectId,
    status: InductionStatus,
}
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EmployeeSafetyInductionRequest {
    pub reference: Option<String>,
    pub employee_id: Option<ObjectId>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Record for EmployeeSafetyInduction {
    const COLLECTION: &'static str = COLLECTION;
    const NAME: &'static str = "EMPLOYEE_SAFETY_INDUCTION";
    const SEQUENCE: Option<Sequence> = Some(Sequence::new("employee.safety.induction", "IND"));

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
    fn version_mut(&mut self) -> &mut i64 {
        &mut self.version
    }
}

impl Attachable for EmployeeSafetyInduction {
    fn company_id(&self) -> ObjectId {
        self.company_id
    }
    fn attachment_ids_mut(&mut self) -> &mut Vec<ObjectId> {
        &mut self.attachment_ids
    }
}

impl EmployeeSafetyInduction {
    pub fn reference(&self) -> &str {
        &self.reference
    }
    pub fn status(&self) -> InductionStatus {
        self.status
    }

    pub fn run(&mut self, action: InductionAction) -> Result<()> {
        let next: InductionStatus = self.status.next(action)?;
        if action == InductionAction::Complete && self.attachment_ids.is_empty() {
            return Err(Error::guard(
                "Please attach at least one document before completing the induction.",
            ));
        }
        self.status = next;
        Ok(())
    }

    pub async fn find_by_company(
        store: &dyn RecordStore,
        company_id: &ObjectId,
    ) -> Result<Vec<EmployeeSafetyInduction>> {
        Self::find_many(store, doc! { "company_id": company_id }).await
    }

    pub async fn create(
        env: &Env,
        actor: &Actor,
        mut request: EmployeeSafetyInductionRequest,
        today: NaiveDate,
    ) -> Result<EmployeeSafetyInduction> {
        let employee_id: ObjectId = request
            .employee_id
            .ok_or_else(|| Error::guard("Please select the inducted employee."))?;
        let reference: String = assign_reference::<Self>(env, request.reference.take()).await?;
        let induction: EmployeeSafetyInduction = EmployeeSafetyInduction {
            _id: Some(ObjectId::new()),
            version: 0,
            reference,
            employee_id,
            date: request.date.unwrap_or(today),
            attachment_ids: Vec::new(),
            notes: request.notes,
            company_id: actor.company_id,
            status: InductionStatus::Draft,
        };

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.insert(&induction)?;
        uow.commit(env.store()).await?;

        tracing::info!(reference = %induction.reference, "safety induction created");
        Ok(induction)
    }

    pub async fn update(
        env: &Env,
        _id: &ObjectId,
        request: EmployeeSafetyInductionRequest,
    ) -> Result<EmployeeSafetyInduction> {
        let mut induction: EmployeeSafetyInduction = Self::get(env.store(), _id).await?;
        if let Some(employee_id) = request.employee_id {
            induction.employee_id = employee_id;
        }
        if let Some(date) = request.date {
            induction.date = date;
        }
        induction.notes = request.notes;

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut induction)?;
        uow.commit(env.store()).await?;
        Ok(induction)
    }

    pub async fn apply(
        env: &Env,
        _id: &ObjectId,
        action: InductionAction,
    ) -> Result<EmployeeSafetyInduction> {
        let mut induction: EmployeeSafetyInduction = Self::get(env.store(), _id).await?;
        induction.run(action)?;

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut induction)?;
        uow.commit(env.store()).await?;

        tracing::info!(reference = %induction.reference, ?action, status = ?induction.status, "safety induction updated");
        Ok(induction)
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
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[actix_web::test]
    async fn completion_needs_a_document() {
        let env = Env::memory();
        let induction = EmployeeSafetyInduction::create(
            &env,
            &actor(),
            EmployeeSafetyInductionRequest {
                employee_id: Some(ObjectId::new()),
                ..Default::default()
            },
            today(),
        )
        .await
        .unwrap();
        let _id = induction._id.unwrap();
        assert_eq!(induction.date, today());

        let blocked = EmployeeSafetyInduction::apply(&env, &_id, InductionAction::Complete).await;
        assert!(blocked.unwrap_err().is_guard_violation());

        let mut stored = EmployeeSafetyInduction::get(env.store(), &_id).await.unwrap();
        stored.attachment_ids_mut().push(ObjectId::new());
        let mut uow = UnitOfWork::new();
        uow.update(&mut stored).unwrap();
        uow.commit(env.store()).await.unwrap();

        let completed = EmployeeSafetyInduction::apply(&env, &_id, InductionAction::Complete)
            .await
            .unwrap();
        assert_eq!(completed.status(), InductionStatus::Completed);
    }

    #[test]
    fn cancelled_inductions_return_to_draft() {
        let mut status = InductionStatus::Draft;
        status = status.next(InductionAction::Cancel).unwrap();
        assert_eq!(status.next(InductionAction::ResetToDraft).unwrap(), InductionStatus::Draft);
        assert!(!InductionStatus::Draft.can(InductionAction::ResetToDraft));
    }
}
