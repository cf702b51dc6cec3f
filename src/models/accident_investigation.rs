use chrono::NaiveDate;
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::{
    action_item::{ActionItem, ActionItemOwner, ActionItemRequest},
    incident_report::{IncidentReport, IncidentReportAction},
    require_text,
    user::Actor,
};
use crate::{
    database::{assign_reference, Attachable, Env, Record, RecordStore, Sequence, UnitOfWork},
    error::{Error, Result},
    workflow::{Lifecycle, Transition},
};

pub const COLLECTION: &str = "accident_investigations";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationInjury {
    Fatality,
    LostTime,
    MedicalTreatment,
    FirstAid,
    PropertyDamage,
    NearMiss,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsafeCondition {
    Guards,
    Defective,
    Congestion,
    Warning,
    Fire,
    Housekeeping,
    Noise,
    Radiation,
    Temperature,
    Ventilation,
    Lighting,
    Other,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsafeAct {
    Unauthorized,
    FailureWarn,
    FailureSecure,
    Speed,
    Disabling,
    Defective,
    Loading,
    Placing,
    Lifting,
    Position,
    Servicing,
    Horseplay,
    Ppe,
    Other,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationStatus {
    #[default]
    Draft,
    InProgress,
    Review,
    Approved,
    Closed,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationAction {
    Start,
    SubmitReview,
    Approve,
    Close,
}

impl Lifecycle for InvestigationStatus {
    type Action = InvestigationAction;

    const TRANSITIONS: &'static [Transition<Self, Self::Action>] = &[
        Transition {
            action: InvestigationAction::Start,
            from: &[InvestigationStatus::Draft],
            to: InvestigationStatus::InProgress,
        },
        Transition {
            action: InvestigationAction::SubmitReview,
            from: &[InvestigationStatus::InProgress],
            to: InvestigationStatus::Review,
        },
        Transition {
            action: InvestigationAction::Approve,
            from: &[InvestigationStatus::Review],
            to: InvestigationStatus::Approved,
        },
        Transition {
            action: InvestigationAction::Close,
            from: &[
                InvestigationStatus::Draft,
                InvestigationStatus::InProgress,
                InvestigationStatus::Review,
                InvestigationStatus::Approved,
            ],
            to: InvestigationStatus::Closed,
        },
    ];
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccidentInvestigation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    version: i64,
    reference: String,
    pub title: String,
    pub company_id: ObjectId,
    pub incident_id: ObjectId,
    pub investigation_date: NaiveDate,
    pub investigator_id: Vec<ObjectId>,
    pub injury: Vec<InvestigationInjury>,
    pub unsafe_condition: Vec<UnsafeCondition>,
    pub unsafe_condition_other: Option<String>,
    pub unsafe_act: Vec<UnsafeAct>,
    pub unsafe_act_other: Option<String>,
    pub root_cause: Option<String>,
    pub contributing_factors: Option<String>,
    pub immediate_causes: Option<String>,
    pub underlying_causes: Option<String>,
    pub basic_causes: Option<String>,
    pub physical_evidence: Option<String>,
    pub witness_statements: Option<String>,
    pub document_review: Option<String>,
    pub recommendations: Option<String>,
    pub preventive_measures: Option<String>,
    pub attachment_ids: Vec<ObjectId>,
    status: InvestigationStatus,
}
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AccidentInvestigationRequest {
    pub reference: Option<String>,
    pub title: Option<String>,
    pub incident_id: Option<ObjectId>,
    pub investigation_date: Option<NaiveDate>,
    #[serde(default)]
    pub investigator_id: Vec<ObjectId>,
    #[serde(default)]
    pub injury: Vec<InvestigationInjury>,
    #[serde(default)]
    pub unsafe_condition: Vec<UnsafeCondition>,
    pub unsafe_condition_other: Option<String>,
    #[serde(default)]
    pub unsafe_act: Vec<UnsafeAct>,
    pub unsafe_act_other: Option<String>,
    pub root_cause: Option<String>,
    pub contributing_factors: Option<String>,
    pub immediate_causes: Option<String>,
    pub underlying_causes: Option<String>,
    pub basic_causes: Option<String>,
    pub physical_evidence: Option<String>,
    pub witness_statements: Option<String>,
    pub document_review: Option<String>,
    pub recommendations: Option<String>,
    pub preventive_measures: Option<String>,
}

impl Record for AccidentInvestigation {
    const COLLECTION: &'static str = COLLECTION;
    const NAME: &'static str = "ACCIDENT_INVESTIGATION";
    const SEQUENCE: Option<Sequence> = Some(Sequence::new("accident.investigation", "INV"));

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
    fn version_mut(&mut self) -> &mut i64 {
        &mut self.version
    }
    fn validate(&self) -> Result<()> {
        require_text(Some(self.title.as_str()), "An investigation needs a title.")
    }
}

impl Attachable for AccidentInvestigation {
    fn company_id(&self) -> ObjectId {
        self.company_id
    }
    fn attachment_ids_mut(&mut self) -> &mut Vec<ObjectId> {
        &mut self.attachment_ids
    }
}

impl AccidentInvestigation {
    /// The investigation opened automatically when `incident` is reported.
    pub fn for_incident(
        incident_id: ObjectId,
        incident: &IncidentReport,
        reference: String,
        actor: &Actor,
        today: NaiveDate,
    ) -> Self {
        let mut investigation: AccidentInvestigation =
            Self::empty(reference, incident.company_id, incident_id, today);
        investigation.title = format!("Investigation for {}", incident.reference());
        investigation.investigator_id = vec![actor.user_id];
        investigation
    }

    fn empty(reference: String, company_id: ObjectId, incident_id: ObjectId, today: NaiveDate) -> Self {
        Self {
            _id: Some(ObjectId::new()),
            version: 0,
            title: reference.clone(),
            reference,
            company_id,
            incident_id,
            investigation_date: today,
            investigator_id: Vec::new(),
            injury: Vec::new(),
            unsafe_condition: Vec::new(),
            unsafe_condition_other: None,
            unsafe_act: Vec::new(),
            unsafe_act_other: None,
            root_cause: None,
            contributing_factors: None,
            immediate_causes: None,
            underlying_causes: None,
            basic_causes: None,
            physical_evidence: None,
            witness_statements: None,
            document_review: None,
            recommendations: None,
            preventive_measures: None,
            attachment_ids: Vec::new(),
            status: InvestigationStatus::Draft,
        }
    }

    pub fn apply_request(&mut self, request: AccidentInvestigationRequest) {
        if let Some(title) = request.title {
            self.title = title;
        }
        if let Some(investigation_date) = request.investigation_date {
            self.investigation_date = investigation_date;
        }
        self.investigator_id = request.investigator_id;
        self.injury = request.injury;
        self.unsafe_condition = request.unsafe_condition;
        self.unsafe_condition_other = request.unsafe_condition_other;
        self.unsafe_act = request.unsafe_act;
        self.unsafe_act_other = request.unsafe_act_other;
        self.root_cause = request.root_cause;
        self.contributing_factors = request.contributing_factors;
        self.immediate_causes = request.immediate_causes;
        self.underlying_causes = request.underlying_causes;
        self.basic_causes = request.basic_causes;
        self.physical_evidence = request.physical_evidence;
        self.witness_statements = request.witness_statements;
        self.document_review = request.document_review;
        self.recommendations = request.recommendations;
        self.preventive_measures = request.preventive_measures;
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
    pub fn status(&self) -> InvestigationStatus {
        self.status
    }

    /// Guards one action against the investigation's corrective actions.
    pub fn run(&mut self, action: InvestigationAction, corrective_actions: &[ActionItem]) -> Result<()> {
        let next: InvestigationStatus = self.status.next(action)?;
        match action {
            InvestigationAction::SubmitReview if corrective_actions.is_empty() => {
                return Err(Error::guard(
                    "Please add at least one corrective action before submitting for review.",
                ));
            }
            InvestigationAction::Close
                if corrective_actions.iter().any(|item| !item.is_completed()) =>
            {
                return Err(Error::guard(
                    "All corrective actions must be completed before closing the investigation.",
                ));
            }
            _ => (),
        }
        self.status = next;
        Ok(())
    }

    pub async fn find_by_incident(
        store: &dyn RecordStore,
        incident_id: &ObjectId,
    ) -> Result<Vec<AccidentInvestigation>> {
        Self::find_many(store, doc! { "incident_id": incident_id }).await
    }

    pub async fn find_by_company(
        store: &dyn RecordStore,
        company_id: &ObjectId,
    ) -> Result<Vec<AccidentInvestigation>> {
        Self::find_many(store, doc! { "company_id": company_id }).await
    }

    pub async fn corrective_actions(&self, store: &dyn RecordStore) -> Result<Vec<ActionItem>> {
        match self._id {
            Some(_id) => {
                ActionItem::find_by_owner(store, ActionItemOwner::AccidentInvestigation, &_id).await
            }
            None => Ok(Vec::new()),
        }
    }

    pub async fn create(
        env: &Env,
        actor: &Actor,
        mut request: AccidentInvestigationRequest,
        today: NaiveDate,
    ) -> Result<AccidentInvestigation> {
        let incident_id: ObjectId = request
            .incident_id
            .ok_or_else(|| Error::guard("Please select the incident under investigation."))?;
        let incident: IncidentReport = IncidentReport::get(env.store(), &incident_id).await?;

        let reference: String = assign_reference::<Self>(env, request.reference.take()).await?;
        let mut investigation: AccidentInvestigation =
            Self::empty(reference, incident.company_id, incident_id, today);
        investigation.investigator_id = vec![actor.user_id];
        investigation.apply_request(request);
        if investigation.investigator_id.is_empty() {
            investigation.investigator_id = vec![actor.user_id];
        }

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.insert(&investigation)?;
        uow.commit(env.store()).await?;

        tracing::info!(reference = %investigation.reference, incident = %incident.reference(), "accident investigation created");
        Ok(investigation)
    }

    pub async fn update(
        env: &Env,
        _id: &ObjectId,
        request: AccidentInvestigationRequest,
    ) -> Result<AccidentInvestigation> {
        let mut investigation: AccidentInvestigation = Self::get(env.store(), _id).await?;
        investigation.apply_request(request);

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut investigation)?;
        uow.commit(env.store()).await?;
        Ok(investigation)
    }

    /// Runs `action`. Closing also resolves the parent incident unless it is
    /// already resolved or closed.
    pub async fn apply(
        env: &Env,
        _id: &ObjectId,
        action: InvestigationAction,
    ) -> Result<AccidentInvestigation> {
        let mut investigation: AccidentInvestigation = Self::get(env.store(), _id).await?;
        let corrective_actions: Vec<ActionItem> = investigation.corrective_actions(env.store()).await?;
        investigation.run(action, &corrective_actions)?;

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut investigation)?;

        if action == InvestigationAction::Close {
            let mut incident: IncidentReport =
                IncidentReport::get(env.store(), &investigation.incident_id).await?;
            if incident
                .status()
                .can(IncidentReportAction::InvestigationClosed)
            {
                incident.transition(IncidentReportAction::InvestigationClosed)?;
                uow.update(&mut incident)?;
                tracing::info!(incident = %incident.reference(), "incident resolved by its investigation");
            }
        }

        uow.commit(env.store()).await?;
        tracing::info!(reference = %investigation.reference, ?action, status = ?investigation.status, "accident investigation updated");
        Ok(investigation)
    }

    pub async fn add_corrective_action(
        env: &Env,
        _id: &ObjectId,
        request: ActionItemRequest,
    ) -> Result<ActionItem> {
        let investigation: AccidentInvestigation = Self::get(env.store(), _id).await?;
        if investigation.status == InvestigationStatus::Closed {
            return Err(Error::guard(
                "Cannot add corrective actions to a closed investigation.",
            ));
        }
        let item: ActionItem = ActionItem::new(
            ActionItemOwner::AccidentInvestigation,
            *_id,
            investigation.company_id,
            request,
        );
        item.save(env).await?;
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        action_item::ActionItemAction,
        incident_report::{IncidentKind, IncidentReportRequest, IncidentReportStatus},
    };

    fn actor() -> Actor {
        Actor {
            user_id: ObjectId::new(),
            company_id: ObjectId::new(),
        }
    }
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    async fn reported_fire(env: &Env, actor: &Actor) -> (IncidentReport, AccidentInvestigation) {
        let incident = IncidentReport::create(
            env,
            actor,
            IncidentReportRequest {
                employee_id: Some(ObjectId::new()),
                location: "Kitchen".to_string(),
                description: "Fryer caught fire".to_string(),
                kind: Some(IncidentKind::Fire),
                ..Default::default()
            },
            today(),
        )
        .await
        .unwrap();
        let _id = incident._id.unwrap();
        let incident = IncidentReport::run(env, actor, &_id, IncidentReportAction::Report, today())
            .await
            .unwrap();
        let investigation = AccidentInvestigation::find_by_incident(env.store(), &_id)
            .await
            .unwrap()
            .pop()
            .unwrap();
        (incident, investigation)
    }

    fn corrective(name: &str) -> ActionItemRequest {
        ActionItemRequest {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[actix_web::test]
    async fn investigation_for_a_missing_incident_is_rejected() {
        let env = Env::memory();
        let result = AccidentInvestigation::create(
            &env,
            &actor(),
            AccidentInvestigationRequest {
                incident_id: Some(ObjectId::new()),
                ..Default::default()
            },
            today(),
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound("INCIDENT_REPORT"))));

        let result =
            AccidentInvestigation::create(&env, &actor(), AccidentInvestigationRequest::default(), today()).await;
        assert!(result.unwrap_err().is_guard_violation());
    }

    #[actix_web::test]
    async fn auto_created_investigation_is_titled_after_the_incident() {
        let env = Env::memory();
        let (incident, investigation) = reported_fire(&env, &actor()).await;
        assert_eq!(investigation.title, format!("Investigation for {}", incident.reference()));
        assert_eq!(investigation.reference(), "INV00001");
    }

    #[actix_web::test]
    async fn review_needs_a_corrective_action() {
        let env = Env::memory();
        let (_, investigation) = reported_fire(&env, &actor()).await;
        let _id = investigation._id.unwrap();

        AccidentInvestigation::apply(&env, &_id, InvestigationAction::Start)
            .await
            .unwrap();
        let blocked = AccidentInvestigation::apply(&env, &_id, InvestigationAction::SubmitReview).await;
        assert!(blocked.unwrap_err().is_guard_violation());

        AccidentInvestigation::add_corrective_action(&env, &_id, corrective("Install extinguisher"))
            .await
            .unwrap();
        let reviewed = AccidentInvestigation::apply(&env, &_id, InvestigationAction::SubmitReview)
            .await
            .unwrap();
        assert_eq!(reviewed.status(), InvestigationStatus::Review);

        let approved = AccidentInvestigation::apply(&env, &_id, InvestigationAction::Approve)
            .await
            .unwrap();
        assert_eq!(approved.status(), InvestigationStatus::Approved);
    }

    #[actix_web::test]
    async fn closing_waits_for_corrective_actions_then_resolves_the_incident() {
        let env = Env::memory();
        let (incident, investigation) = reported_fire(&env, &actor()).await;
        let incident_id = incident._id.unwrap();
        let _id = investigation._id.unwrap();

        let item = AccidentInvestigation::add_corrective_action(&env, &_id, corrective("Train staff"))
            .await
            .unwrap();

        let blocked = AccidentInvestigation::apply(&env, &_id, InvestigationAction::Close).await;
        assert!(blocked.unwrap_err().is_guard_violation());
        let unchanged = AccidentInvestigation::get(env.store(), &_id).await.unwrap();
        assert_eq!(unchanged.status(), InvestigationStatus::Draft);
        let incident = IncidentReport::get(env.store(), &incident_id).await.unwrap();
        assert_eq!(incident.status(), IncidentReportStatus::Investigation);

        ActionItem::apply(&env, &item._id.unwrap(), ActionItemAction::Complete, today())
            .await
            .unwrap();
        let closed = AccidentInvestigation::apply(&env, &_id, InvestigationAction::Close)
            .await
            .unwrap();
        assert_eq!(closed.status(), InvestigationStatus::Closed);
        let incident = IncidentReport::get(env.store(), &incident_id).await.unwrap();
        assert_eq!(incident.status(), IncidentReportStatus::Resolved);
    }

    #[actix_web::test]
    async fn closing_leaves_a_closed_incident_alone() {
        let env = Env::memory();
        let actor = actor();
        let (incident, investigation) = reported_fire(&env, &actor).await;
        let incident_id = incident._id.unwrap();
        IncidentReport::run(&env, &actor, &incident_id, IncidentReportAction::Close, today())
            .await
            .unwrap();

        AccidentInvestigation::apply(&env, &investigation._id.unwrap(), InvestigationAction::Close)
            .await
            .unwrap();
        let incident = IncidentReport::get(env.store(), &incident_id).await.unwrap();
        assert_eq!(incident.status(), IncidentReportStatus::Closed);
    }

    #[actix_web::test]
    async fn closed_investigations_take_no_new_actions() {
        let env = Env::memory();
        let (_, investigation) = reported_fire(&env, &actor()).await;
        let _id = investigation._id.unwrap();
        AccidentInvestigation::apply(&env, &_id, InvestigationAction::Close)
            .await
            .unwrap();
        let result = AccidentInvestigation::add_corrective_action(&env, &_id, corrective("Late")).await;
        assert!(result.unwrap_err().is_guard_violation());
    }
}
