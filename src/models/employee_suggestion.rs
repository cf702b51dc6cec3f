use chrono::NaiveDate;
use mongodb::bson::{doc, oid::ObjectId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    action_item::{ActionItem, ActionItemOwner, ActionItemRequest},
    require_text,
    user::Actor,
    Priority,
};
use crate::{
    database::{assign_reference, Attachable, Env, Record, RecordStore, Sequence, UnitOfWork},
    error::{Error, Result},
    workflow::{Lifecycle, Transition},
};

pub const COLLECTION: &str = "employee_suggestions";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Workplace,
    Equipment,
    Procedure,
    Training,
    Emergency,
    Other,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Improvement,
    Hazard,
    Prevention,
    Training,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    #[default]
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Implemented,
    Rejected,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionAction {
    Submit,
    Review,
    Approve,
    Implement,
    Reject,
    ResetToDraft,
}

impl Lifecycle for SuggestionStatus {
    type Action = SuggestionAction;

    const TRANSITIONS: &'static [Transition<Self, Self::Action>] = &[
        Transition {
            action: SuggestionAction::Submit,
            from: &[SuggestionStatus::Draft],
            to: SuggestionStatus::Submitted,
        },
        Transition {
            action: SuggestionAction::Review,
            from: &[SuggestionStatus::Submitted],
            to: SuggestionStatus::UnderReview,
        },
        Transition {
            action: SuggestionAction::Approve,
            from: &[SuggestionStatus::UnderReview],
            to: SuggestionStatus::Approved,
        },
        Transition {
            action: SuggestionAction::Implement,
            from: &[SuggestionStatus::Approved],
            to: SuggestionStatus::Implemented,
        },
        Transition {
            action: SuggestionAction::Reject,
            from: &[SuggestionStatus::UnderReview],
            to: SuggestionStatus::Rejected,
        },
        Transition {
            action: SuggestionAction::ResetToDraft,
            from: &[
                SuggestionStatus::Draft,
                SuggestionStatus::Submitted,
                SuggestionStatus::UnderReview,
                SuggestionStatus::Approved,
                SuggestionStatus::Implemented,
                SuggestionStatus::Rejected,
            ],
            to: SuggestionStatus::Draft,
        },
    ];
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmployeeSuggestion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    version: i64,
    reference: String,
    pub company_id: ObjectId,
    employee_id: Option<ObjectId>,
    pub department_id: Option<ObjectId>,
    pub submission_date: NaiveDate,
    pub category: SuggestionCategory,
    pub kind: SuggestionKind,
    pub title: String,
    pub description: String,
    pub current_situation: Option<String>,
    pub proposed_solution: Option<String>,
    pub expected_benefits: Option<String>,
    pub priority: Priority,
    anonymous: bool,
    reviewer_id: Option<ObjectId>,
    review_date: Option<NaiveDate>,
    pub review_notes: Option<String>,
    implementation_date: Option<NaiveDate>,
    pub rejection_reason: Option<String>,
    pub cost_estimate: Option<Decimal>,
    pub implementation_time: Option<u32>,
    pub attachment_ids: Vec<ObjectId>,
    status: SuggestionStatus,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct EmployeeSuggestionRequest {
    pub reference: Option<String>,
    pub employee_id: Option<ObjectId>,
    pub department_id: Option<ObjectId>,
    pub submission_date: Option<NaiveDate>,
    pub category: SuggestionCategory,
    pub kind: SuggestionKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub current_situation: Option<String>,
    pub proposed_solution: Option<String>,
    pub expected_benefits: Option<String>,
    pub priority: Option<Priority>,
    #[serde(default)]
    pub anonymous: bool,
    pub review_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub cost_estimate: Option<Decimal>,
    pub implementation_time: Option<u32>,
}

impl Record for EmployeeSuggestion {
    const COLLECTION: &'static str = COLLECTION;
    const NAME: &'static str = "EMPLOYEE_SUGGESTION";
    const SEQUENCE: Option<Sequence> = Some(Sequence::new("employee.suggestion", "SUG"));

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
    fn version_mut(&mut self) -> &mut i64 {
        &mut self.version
    }
    fn validate(&self) -> Result<()> {
        if self.anonymous && self.employee_id.is_some() {
            return Err(Error::guard("Anonymous suggestions cannot name an employee."));
        }
        if matches!(self.cost_estimate, Some(cost) if cost < Decimal::ZERO) {
            return Err(Error::guard("Cost estimate cannot be negative."));
        }
        Ok(())
    }
}

impl Attachable for EmployeeSuggestion {
    fn company_id(&self) -> ObjectId {
        self.company_id
    }
    fn attachment_ids_mut(&mut self) -> &mut Vec<ObjectId> {
        &mut self.attachment_ids
    }
}

impl EmployeeSuggestion {
    pub fn new(
        reference: String,
        actor: &Actor,
        request: EmployeeSuggestionRequest,
        today: NaiveDate,
    ) -> Self {
        let mut suggestion: EmployeeSuggestion = Self {
            _id: Some(ObjectId::new()),
            version: 0,
            reference,
            company_id: actor.company_id,
            employee_id: None,
            department_id: None,
            submission_date: today,
            category: request.category,
            kind: request.kind,
            title: String::new(),
            description: String::new(),
            current_situation: None,
            proposed_solution: None,
            expected_benefits: None,
            priority: Priority::Medium,
            anonymous: false,
            reviewer_id: None,
            review_date: None,
            review_notes: None,
            implementation_date: None,
            rejection_reason: None,
            cost_estimate: None,
            implementation_time: None,
            attachment_ids: Vec::new(),
            status: SuggestionStatus::Draft,
        };
        suggestion.apply_request(request);
        suggestion
    }

    /// Copies the editable fields. An anonymous suggestion never keeps an
    /// employee.
    pub fn apply_request(&mut self, request: EmployeeSuggestionRequest) {
        self.anonymous = request.anonymous;
        self.employee_id = if request.anonymous {
            None
        } else {
            request.employee_id
        };
        self.department_id = request.department_id;
        if let Some(submission_date) = request.submission_date {
            self.submission_date = submission_date;
        }
        self.category = request.category;
        self.kind = request.kind;
        self.title = request.title;
        self.description = request.description;
        self.current_situation = request.current_situation;
        self.proposed_solution = request.proposed_solution;
        self.expected_benefits = request.expected_benefits;
        self.priority = request.priority.unwrap_or_default();
        self.review_notes = request.review_notes;
        self.rejection_reason = request.rejection_reason;
        self.cost_estimate = request.cost_estimate;
        self.implementation_time = request.implementation_time;
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
    pub fn employee_id(&self) -> Option<ObjectId> {
        self.employee_id
    }
    pub fn anonymous(&self) -> bool {
        self.anonymous
    }
    pub fn reviewer_id(&self) -> Option<ObjectId> {
        self.reviewer_id
    }
    pub fn review_date(&self) -> Option<NaiveDate> {
        self.review_date
    }
    pub fn implementation_date(&self) -> Option<NaiveDate> {
        self.implementation_date
    }
    pub fn status(&self) -> SuggestionStatus {
        self.status
    }

    pub fn run(
        &mut self,
        action: SuggestionAction,
        actor: &Actor,
        plan: &[ActionItem],
        today: NaiveDate,
    ) -> Result<()> {
        let next: SuggestionStatus = self.status.next(action)?;
        match action {
            SuggestionAction::Submit => {
                let message: &str = "Please provide both title and description before submitting.";
                require_text(Some(self.title.as_str()), message)?;
                require_text(Some(self.description.as_str()), message)?;
            }
            SuggestionAction::Review => {
                self.reviewer_id = Some(actor.user_id);
                self.review_date = Some(today);
            }
            SuggestionAction::Approve => {
                require_text(self.review_notes.as_deref(), "Please add review notes before approving.")?;
            }
            SuggestionAction::Implement => {
                if plan.is_empty() {
                    return Err(Error::guard(
                        "Please create an implementation plan before marking as implemented.",
                    ));
                }
                self.implementation_date = Some(today);
            }
            SuggestionAction::Reject => {
                require_text(self.rejection_reason.as_deref(), "Please provide a rejection reason.")?;
            }
            SuggestionAction::ResetToDraft => (),
        }
        self.status = next;
        Ok(())
    }

    pub async fn find_by_company(
        store: &dyn RecordStore,
        company_id: &ObjectId,
    ) -> Result<Vec<EmployeeSuggestion>> {
        let mut suggestions: Vec<EmployeeSuggestion> =
            Self::find_many(store, doc! { "company_id": company_id }).await?;
        suggestions.sort_by(|a, b| b.submission_date.cmp(&a.submission_date));
        Ok(suggestions)
    }

    pub async fn implementation_plan(&self, store: &dyn RecordStore) -> Result<Vec<ActionItem>> {
        match self._id {
            Some(_id) => ActionItem::find_by_owner(store, ActionItemOwner::EmployeeSuggestion, &_id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn create(
        env: &Env,
        actor: &Actor,
        mut request: EmployeeSuggestionRequest,
        today: NaiveDate,
    ) -> Result<EmployeeSuggestion> {
        let reference: String = assign_reference::<Self>(env, request.reference.take()).await?;
        let suggestion: EmployeeSuggestion = EmployeeSuggestion::new(reference, actor, request, today);

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.insert(&suggestion)?;
        uow.commit(env.store()).await?;

        tracing::info!(reference = %suggestion.reference, anonymous = suggestion.anonymous, "employee suggestion created");
        Ok(suggestion)
    }

    pub async fn update(
        env: &Env,
        _id: &ObjectId,
        request: EmployeeSuggestionRequest,
    ) -> Result<EmployeeSuggestion> {
        let mut suggestion: EmployeeSuggestion = Self::get(env.store(), _id).await?;
        suggestion.apply_request(request);

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut suggestion)?;
        uow.commit(env.store()).await?;
        Ok(suggestion)
    }

    pub async fn apply(
        env: &Env,
        actor: &Actor,
        _id: &ObjectId,
        action: SuggestionAction,
        today: NaiveDate,
    ) -> Result<EmployeeSuggestion> {
        let mut suggestion: EmployeeSuggestion = Self::get(env.store(), _id).await?;
        let plan: Vec<ActionItem> = suggestion.implementation_plan(env.store()).await?;
        suggestion.run(action, actor, &plan, today)?;

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut suggestion)?;
        uow.commit(env.store()).await?;

        tracing::info!(reference = %suggestion.reference, ?action, status = ?suggestion.status, "employee suggestion updated");
        Ok(suggestion)
    }

    pub async fn add_plan_step(
        env: &Env,
        _id: &ObjectId,
        request: ActionItemRequest,
    ) -> Result<ActionItem> {
        let suggestion: EmployeeSuggestion = Self::get(env.store(), _id).await?;
        let item: ActionItem = ActionItem::new(
            ActionItemOwner::EmployeeSuggestion,
            *_id,
            suggestion.company_id,
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
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
    }
    fn request() -> EmployeeSuggestionRequest {
        EmployeeSuggestionRequest {
            reference: None,
            employee_id: Some(ObjectId::new()),
            department_id: None,
            submission_date: None,
            category: SuggestionCategory::Equipment,
            kind: SuggestionKind::Hazard,
            title: "Anti-slip mats at the wash station".to_string(),
            description: "The floor is wet most of the shift.".to_string(),
            current_situation: None,
            proposed_solution: None,
            expected_benefits: None,
            priority: None,
            anonymous: false,
            review_notes: None,
            rejection_reason: None,
            cost_estimate: None,
            implementation_time: None,
        }
    }

    #[test]
    fn anonymous_suggestions_drop_the_employee() {
        let mut request = request();
        request.anonymous = true;
        let suggestion = EmployeeSuggestion::new("SUG1".to_string(), &actor(), request, today());
        assert!(suggestion.anonymous());
        assert_eq!(suggestion.employee_id(), None);
    }

    #[test]
    fn submitting_needs_title_and_description() {
        let mut request = request();
        request.title = String::new();
        let mut suggestion = EmployeeSuggestion::new("SUG1".to_string(), &actor(), request, today());
        let error = suggestion
            .run(SuggestionAction::Submit, &actor(), &[], today())
            .unwrap_err();
        assert!(error.is_guard_violation());
        assert_eq!(suggestion.status(), SuggestionStatus::Draft);
    }

    #[test]
    fn review_records_reviewer_and_date() {
        let reviewer = actor();
        let mut suggestion = EmployeeSuggestion::new("SUG1".to_string(), &actor(), request(), today());
        suggestion.run(SuggestionAction::Submit, &reviewer, &[], today()).unwrap();
        suggestion.run(SuggestionAction::Review, &reviewer, &[], today()).unwrap();
        assert_eq!(suggestion.status(), SuggestionStatus::UnderReview);
        assert_eq!(suggestion.reviewer_id(), Some(reviewer.user_id));
        assert_eq!(suggestion.review_date(), Some(today()));
    }

    #[test]
    fn approval_and_rejection_need_their_notes() {
        let actor = actor();
        let mut suggestion = EmployeeSuggestion::new("SUG1".to_string(), &actor, request(), today());
        suggestion.run(SuggestionAction::Submit, &actor, &[], today()).unwrap();
        suggestion.run(SuggestionAction::Review, &actor, &[], today()).unwrap();

        assert!(suggestion.run(SuggestionAction::Approve, &actor, &[], today()).is_err());
        assert!(suggestion.run(SuggestionAction::Reject, &actor, &[], today()).is_err());

        suggestion.rejection_reason = Some("Already covered by the Q3 refit.".to_string());
        suggestion.run(SuggestionAction::Reject, &actor, &[], today()).unwrap();
        assert_eq!(suggestion.status(), SuggestionStatus::Rejected);

        suggestion.run(SuggestionAction::ResetToDraft, &actor, &[], today()).unwrap();
        assert_eq!(suggestion.status(), SuggestionStatus::Draft);
    }

    #[actix_web::test]
    async fn implementing_needs_a_plan_step() {
        let env = Env::memory();
        let actor = actor();
        let mut request = request();
        request.review_notes = Some("Cheap and effective.".to_string());
        let suggestion = EmployeeSuggestion::create(&env, &actor, request, today()).await.unwrap();
        let _id = suggestion._id.unwrap();
        for action in [SuggestionAction::Submit, SuggestionAction::Review, SuggestionAction::Approve] {
            EmployeeSuggestion::apply(&env, &actor, &_id, action, today()).await.unwrap();
        }

        let blocked = EmployeeSuggestion::apply(&env, &actor, &_id, SuggestionAction::Implement, today()).await;
        assert!(blocked.unwrap_err().is_guard_violation());

        EmployeeSuggestion::add_plan_step(
            &env,
            &_id,
            ActionItemRequest {
                name: "Order mats".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let implemented = EmployeeSuggestion::apply(&env, &actor, &_id, SuggestionAction::Implement, today())
            .await
            .unwrap();
        assert_eq!(implemented.status(), SuggestionStatus::Implemented);
        assert_eq!(implemented.implementation_date(), Some(today()));
    }
}
