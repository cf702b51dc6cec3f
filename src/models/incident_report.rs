use chrono::NaiveDate;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::{
    accident_investigation::AccidentInvestigation,
    insurance_claim::{InsuranceClaim, InsuranceClaimRequest},
    require_text,
    user::Actor,
};
use crate::{
    database::{assign_reference, Attachable, Env, Record, RecordStore, Sequence, UnitOfWork},
    error::{Error, Result},
    workflow::{Lifecycle, Transition},
};

pub const COLLECTION: &str = "incident_reports";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    #[default]
    FullTime,
    Contractual,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    Injury,
    PropertyDamage,
    NearMiss,
    Fire,
    Environmental,
}
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSeverity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjuryKind {
    StrainSprain,
    Amputation,
    AnimalBite,
    Puncture,
    Laceration,
    Hearing,
    Hernia,
    SoftTissue,
    Contusion,
    ForeignBody,
    Welding,
    Heat,
    BurnHeat,
    BurnChemical,
    BurnOther,
    Dermatitis,
    Dental,
    Pain,
    Respiratory,
    Twist,
    Disease,
    Toxic,
    Whiplash,
    Swelling,
    Fracture,
    Internal,
    Crush,
    Other,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Chest,
    Abdomen,
    Hip,
    Genitals,
    Groin,
    Circulatory,
    ArmUpper,
    ArmLower,
    Elbow,
    Wrist,
    Hand,
    Shoulder,
    Head,
    Scalp,
    Nose,
    Ears,
    Eyes,
    Neck,
    BackUpper,
    BackMiddle,
    BackLower,
    LegUpper,
    LegLower,
    Knee,
    Foot,
    Ankle,
    Finger,
    Toe,
    Other,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySide {
    Left,
    Right,
    Multiple,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Treatment {
    FirstAid,
    Doctor,
    Hospital,
    Returned,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Normal,
    Left,
    Alternative,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentReportStatus {
    #[default]
    Draft,
    Reported,
    Investigation,
    Action,
    Resolved,
    Closed,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentReportAction {
    Report,
    StartInvestigation,
    MarkActionRequired,
    Resolve,
    Close,
    /// Written by a closing investigation; not a user action.
    #[serde(skip_deserializing)]
    InvestigationClosed,
}

impl Lifecycle for IncidentReportStatus {
    type Action = IncidentReportAction;

    const TRANSITIONS: &'static [Transition<Self, <IncidentReportStatus as Lifecycle>::Action>] = &[
        Transition {
            action: IncidentReportAction::Report,
            from: &[IncidentReportStatus::Draft],
            to: IncidentReportStatus::Reported,
        },
        Transition {
            action: IncidentReportAction::StartInvestigation,
            from: &[IncidentReportStatus::Reported, IncidentReportStatus::Action],
            to: IncidentReportStatus::Investigation,
        },
        Transition {
            action: IncidentReportAction::MarkActionRequired,
            from: &[
                IncidentReportStatus::Reported,
                IncidentReportStatus::Investigation,
            ],
            to: IncidentReportStatus::Action,
        },
        Transition {
            action: IncidentReportAction::Resolve,
            from: &[
                IncidentReportStatus::Reported,
                IncidentReportStatus::Investigation,
                IncidentReportStatus::Action,
            ],
            to: IncidentReportStatus::Resolved,
        },
        Transition {
            action: IncidentReportAction::InvestigationClosed,
            from: &[
                IncidentReportStatus::Draft,
                IncidentReportStatus::Reported,
                IncidentReportStatus::Investigation,
                IncidentReportStatus::Action,
            ],
            to: IncidentReportStatus::Resolved,
        },
        Transition {
            action: IncidentReportAction::Close,
            from: &[
                IncidentReportStatus::Draft,
                IncidentReportStatus::Reported,
                IncidentReportStatus::Investigation,
                IncidentReportStatus::Action,
                IncidentReportStatus::Resolved,
            ],
            to: IncidentReportStatus::Closed,
        },
    ];
}

/// Whether an incident of this kind and severity must be investigated.
pub fn requires_investigation(kind: IncidentKind, severity: IncidentSeverity) -> bool {
    matches!(
        kind,
        IncidentKind::Injury | IncidentKind::PropertyDamage | IncidentKind::Fire
    ) || severity >= IncidentSeverity::High
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IncidentReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    version: i64,
    reference: String,
    pub company_id: ObjectId,
    pub employee_id: ObjectId,
    pub employee_number: Option<String>,
    pub occupation: Option<String>,
    pub time_in_job: Option<String>,
    pub department_id: Option<ObjectId>,
    pub supervisor_id: Option<ObjectId>,
    pub employment_status: EmploymentStatus,
    pub employer_name: Option<String>,
    pub incident_date: DateTime,
    pub report_date: NaiveDate,
    pub work_activity: Option<String>,
    pub location: String,
    pub description: String,
    pub witness_id: Vec<ObjectId>,
    kind: IncidentKind,
    severity: IncidentSeverity,
    requires_investigation: bool,
    pub injury: Vec<InjuryKind>,
    pub injury_other: Option<String>,
    pub body_part: Vec<BodyPart>,
    pub body_part_other: Option<String>,
    pub body_side: Option<BodySide>,
    pub property_damage_description: Option<String>,
    pub treatment: Option<Treatment>,
    pub first_aid_attendant: Option<String>,
    pub first_aid_treatment: Option<String>,
    pub work_status: Option<WorkStatus>,
    pub miss_shift: bool,
    pub insurance_claim_required: bool,
    insurance_claim_id: Option<ObjectId>,
    pub police_report_required: bool,
    pub police_report_number: Option<String>,
    pub attachment_ids: Vec<ObjectId>,
    status: IncidentReportStatus,
}
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct IncidentReportRequest {
    pub reference: Option<String>,
    pub employee_id: Option<ObjectId>,
    pub employee_number: Option<String>,
    pub occupation: Option<String>,
    pub time_in_job: Option<String>,
    pub department_id: Option<ObjectId>,
    pub supervisor_id: Option<ObjectId>,
    pub employment_status: Option<EmploymentStatus>,
    pub employer_name: Option<String>,
    pub incident_date: Option<DateTime>,
    pub report_date: Option<NaiveDate>,
    pub work_activity: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub witness_id: Vec<ObjectId>,
    pub kind: Option<IncidentKind>,
    pub severity: Option<IncidentSeverity>,
    #[serde(default)]
    pub injury: Vec<InjuryKind>,
    pub injury_other: Option<String>,
    #[serde(default)]
    pub body_part: Vec<BodyPart>,
    pub body_part_other: Option<String>,
    pub body_side: Option<BodySide>,
    pub property_damage_description: Option<String>,
    pub treatment: Option<Treatment>,
    pub first_aid_attendant: Option<String>,
    pub first_aid_treatment: Option<String>,
    pub work_status: Option<WorkStatus>,
    #[serde(default)]
    pub miss_shift: bool,
    #[serde(default)]
    pub insurance_claim_required: bool,
    #[serde(default)]
    pub police_report_required: bool,
    pub police_report_number: Option<String>,
}

impl Record for IncidentReport {
    const COLLECTION: &'static str = COLLECTION;
    const NAME: &'static str = "INCIDENT_REPORT";
    const SEQUENCE: Option<Sequence> = Some(Sequence::new("incident.report", "INC"));

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
    fn version_mut(&mut self) -> &mut i64 {
        &mut self.version
    }
    fn validate(&self) -> Result<()> {
        require_text(Some(self.location.as_str()), "Please state where the incident happened.")?;
        require_text(Some(self.description.as_str()), "Please describe the incident.")?;
        Ok(())
    }
}

impl Attachable for IncidentReport {
    fn company_id(&self) -> ObjectId {
        self.company_id
    }
    fn attachment_ids_mut(&mut self) -> &mut Vec<ObjectId> {
        &mut self.attachment_ids
    }
}

impl IncidentReport {
    pub fn new(
        reference: String,
        actor: &Actor,
        employee_id: ObjectId,
        request: IncidentReportRequest,
        today: NaiveDate,
    ) -> Self {
        let kind: IncidentKind = request.kind.unwrap_or(IncidentKind::NearMiss);
        let severity: IncidentSeverity = request.severity.unwrap_or_default();
        let mut incident: IncidentReport = IncidentReport {
            _id: Some(ObjectId::new()),
            version: 0,
            reference,
            company_id: actor.company_id,
            employee_id,
            employee_number: None,
            occupation: None,
            time_in_job: None,
            department_id: None,
            supervisor_id: None,
            employment_status: EmploymentStatus::FullTime,
            employer_name: None,
            incident_date: DateTime::now(),
            report_date: today,
            work_activity: None,
            location: String::new(),
            description: String::new(),
            witness_id: Vec::new(),
            kind,
            severity,
            requires_investigation: requires_investigation(kind, severity),
            injury: Vec::new(),
            injury_other: None,
            body_part: Vec::new(),
            body_part_other: None,
            body_side: None,
            property_damage_description: None,
            treatment: None,
            first_aid_attendant: None,
            first_aid_treatment: None,
            work_status: None,
            miss_shift: false,
            insurance_claim_required: false,
            insurance_claim_id: None,
            police_report_required: false,
            police_report_number: None,
            attachment_ids: Vec::new(),
            status: IncidentReportStatus::Draft,
        };
        incident.apply_request(request);
        incident
    }

    /// Copies the editable fields of `request`. The reference, status and
    /// derived fields are never taken from a request.
    pub fn apply_request(&mut self, request: IncidentReportRequest) {
        if let Some(employee_id) = request.employee_id {
            self.employee_id = employee_id;
        }
        self.employee_number = request.employee_number;
        self.occupation = request.occupation;
        self.time_in_job = request.time_in_job;
        self.department_id = request.department_id;
        self.supervisor_id = request.supervisor_id;
        self.employment_status = request.employment_status.unwrap_or_default();
        self.employer_name = request.employer_name;
        if let Some(incident_date) = request.incident_date {
            self.incident_date = incident_date;
        }
        if let Some(report_date) = request.report_date {
            self.report_date = report_date;
        }
        self.work_activity = request.work_activity;
        self.location = request.location;
        self.description = request.description;
        self.witness_id = request.witness_id;
        self.classify(
            request.kind.unwrap_or(self.kind),
            request.severity.unwrap_or(self.severity),
        );
        self.injury = request.injury;
        self.injury_other = request.injury_other;
        self.body_part = request.body_part;
        self.body_part_other = request.body_part_other;
        self.body_side = request.body_side;
        self.property_damage_description = request.property_damage_description;
        self.treatment = request.treatment;
        self.first_aid_attendant = request.first_aid_attendant;
        self.first_aid_treatment = request.first_aid_treatment;
        self.work_status = request.work_status;
        self.miss_shift = request.miss_shift;
        self.insurance_claim_required = request.insurance_claim_required;
        self.police_report_required = request.police_report_required;
        self.police_report_number = request.police_report_number;
    }

    /// Writes kind and severity and recomputes `requires_investigation`.
    pub fn classify(&mut self, kind: IncidentKind, severity: IncidentSeverity) {
        self.kind = kind;
        self.severity = severity;
        self.requires_investigation = requires_investigation(kind, severity);
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
    pub fn kind(&self) -> IncidentKind {
        self.kind
    }
    pub fn severity(&self) -> IncidentSeverity {
        self.severity
    }
    pub fn requires_investigation(&self) -> bool {
        self.requires_investigation
    }
    pub fn insurance_claim_id(&self) -> Option<ObjectId> {
        self.insurance_claim_id
    }
    pub fn status(&self) -> IncidentReportStatus {
        self.status
    }

    pub(crate) fn link_insurance_claim(&mut self, claim_id: ObjectId) {
        self.insurance_claim_id = Some(claim_id);
    }

    pub fn transition(&mut self, action: IncidentReportAction) -> Result<()> {
        self.status = self.status.next(action)?;
        Ok(())
    }

    /// Moves a draft to `reported`, then straight on to `investigation` when one
    /// is required. Returns whether the incident now awaits an investigation.
    pub fn report(&mut self) -> Result<bool> {
        let mut status: IncidentReportStatus = self.status.next(IncidentReportAction::Report)?;
        if self.requires_investigation {
            status = status.next(IncidentReportAction::StartInvestigation)?;
        }
        self.status = status;
        Ok(self.requires_investigation)
    }

    pub fn close(&mut self, has_investigation: bool) -> Result<()> {
        let next: IncidentReportStatus = self.status.next(IncidentReportAction::Close)?;
        if self.requires_investigation && !has_investigation {
            return Err(Error::guard(
                "Cannot close incident that requires investigation without completing the investigation.",
            ));
        }
        self.status = next;
        Ok(())
    }

    pub async fn find_by_company(
        store: &dyn RecordStore,
        company_id: &ObjectId,
    ) -> Result<Vec<IncidentReport>> {
        Self::find_many(store, doc! { "company_id": company_id }).await
    }

    pub async fn create(
        env: &Env,
        actor: &Actor,
        mut request: IncidentReportRequest,
        today: NaiveDate,
    ) -> Result<IncidentReport> {
        let employee_id: ObjectId = request
            .employee_id
            .ok_or_else(|| Error::guard("Please select the employee involved."))?;
        let reference: String = assign_reference::<Self>(env, request.reference.take()).await?;
        let incident: IncidentReport =
            IncidentReport::new(reference, actor, employee_id, request, today);

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.insert(&incident)?;
        uow.commit(env.store()).await?;

        tracing::info!(reference = %incident.reference, "incident report created");
        Ok(incident)
    }

    pub async fn update(
        env: &Env,
        _id: &ObjectId,
        request: IncidentReportRequest,
    ) -> Result<IncidentReport> {
        let mut incident: IncidentReport = Self::get(env.store(), _id).await?;
        incident.apply_request(request);

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut incident)?;
        uow.commit(env.store()).await?;
        Ok(incident)
    }

    pub async fn run(
        env: &Env,
        actor: &Actor,
        _id: &ObjectId,
        action: IncidentReportAction,
        today: NaiveDate,
    ) -> Result<IncidentReport> {
        let mut incident: IncidentReport = Self::get(env.store(), _id).await?;
        let mut uow: UnitOfWork = UnitOfWork::new();

        match action {
            IncidentReportAction::Report => {
                if incident.report()? {
                    let existing: Vec<AccidentInvestigation> =
                        AccidentInvestigation::find_by_incident(env.store(), _id).await?;
                    if existing.is_empty() {
                        let reference: String =
                            assign_reference::<AccidentInvestigation>(env, None).await?;
                        let investigation: AccidentInvestigation =
                            AccidentInvestigation::for_incident(*_id, &incident, reference, actor, today);
                        uow.insert(&investigation)?;
                        tracing::info!(
                            incident = %incident.reference,
                            investigation = %investigation.reference(),
                            "investigation opened for incident"
                        );
                    }
                }
            }
            IncidentReportAction::Close => {
                let investigations: Vec<AccidentInvestigation> =
                    AccidentInvestigation::find_by_incident(env.store(), _id).await?;
                incident.close(!investigations.is_empty())?;
            }
            _ => incident.transition(action)?,
        }

        uow.update(&mut incident)?;
        uow.commit(env.store()).await?;

        tracing::info!(reference = %incident.reference, ?action, status = ?incident.status, "incident report updated");
        Ok(incident)
    }

    /// Opens the insurance claim of this incident. Returns the claim already
    /// linked when there is one.
    pub async fn create_insurance_claim(
        env: &Env,
        _id: &ObjectId,
        request: InsuranceClaimRequest,
        today: NaiveDate,
    ) -> Result<InsuranceClaim> {
        let incident: IncidentReport = Self::get(env.store(), _id).await?;
        if let Some(claim_id) = incident.insurance_claim_id {
            return InsuranceClaim::get(env.store(), &claim_id).await;
        }
        let request: InsuranceClaimRequest = InsuranceClaimRequest {
            incident_id: Some(*_id),
            ..request
        };
        InsuranceClaim::create(env, request, today).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        accident_investigation::{AccidentInvestigationRequest, InvestigationStatus},
        insurance_claim::InsuranceClaimStatus,
    };
    use rust_decimal::Decimal;

    fn actor() -> Actor {
        Actor {
            user_id: ObjectId::new(),
            company_id: ObjectId::new(),
        }
    }
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }
    fn request(kind: IncidentKind) -> IncidentReportRequest {
        IncidentReportRequest {
            employee_id: Some(ObjectId::new()),
            location: "Warehouse B, loading bay".to_string(),
            description: "Pallet fell from forklift".to_string(),
            kind: Some(kind),
            ..Default::default()
        }
    }

    #[test]
    fn investigation_requirement_follows_kind_and_severity() {
        assert!(requires_investigation(IncidentKind::Fire, IncidentSeverity::Low));
        assert!(requires_investigation(IncidentKind::Injury, IncidentSeverity::Low));
        assert!(requires_investigation(IncidentKind::PropertyDamage, IncidentSeverity::Low));
        assert!(!requires_investigation(IncidentKind::NearMiss, IncidentSeverity::Medium));
        assert!(requires_investigation(IncidentKind::NearMiss, IncidentSeverity::High));
        assert!(requires_investigation(IncidentKind::Environmental, IncidentSeverity::Critical));
    }

    #[test]
    fn reclassifying_recomputes_the_requirement() {
        let mut incident =
            IncidentReport::new("INC1".to_string(), &actor(), ObjectId::new(), request(IncidentKind::NearMiss), today());
        assert!(!incident.requires_investigation());
        incident.classify(IncidentKind::NearMiss, IncidentSeverity::Critical);
        assert!(incident.requires_investigation());
        incident.classify(IncidentKind::NearMiss, IncidentSeverity::Low);
        assert!(!incident.requires_investigation());
    }

    #[test]
    fn location_and_description_are_required() {
        let mut missing = request(IncidentKind::NearMiss);
        missing.description = "  ".to_string();
        let incident = IncidentReport::new("INC1".to_string(), &actor(), ObjectId::new(), missing, today());
        assert!(incident.validate().unwrap_err().is_guard_violation());
    }

    #[test]
    fn only_drafts_can_be_reported() {
        let mut incident =
            IncidentReport::new("INC1".to_string(), &actor(), ObjectId::new(), request(IncidentKind::NearMiss), today());
        assert!(!incident.report().unwrap());
        assert_eq!(incident.status(), IncidentReportStatus::Reported);
        assert!(incident.report().unwrap_err().is_guard_violation());
        assert_eq!(incident.status(), IncidentReportStatus::Reported);
    }

    #[actix_web::test]
    async fn references_are_distinct_and_ordered() {
        let env = Env::memory();
        let mut references = Vec::new();
        for _ in 0..5 {
            let incident = IncidentReport::create(&env, &actor(), request(IncidentKind::NearMiss), today())
                .await
                .unwrap();
            references.push(incident.reference().to_string());
        }
        assert_eq!(references, vec!["INC00001", "INC00002", "INC00003", "INC00004", "INC00005"]);
    }

    #[actix_web::test]
    async fn reporting_a_fire_opens_exactly_one_investigation() {
        let env = Env::memory();
        let actor = actor();
        let incident = IncidentReport::create(&env, &actor, request(IncidentKind::Fire), today())
            .await
            .unwrap();
        let _id = incident._id.unwrap();
        assert!(incident.requires_investigation());

        let reported = IncidentReport::run(&env, &actor, &_id, IncidentReportAction::Report, today())
            .await
            .unwrap();
        assert_eq!(reported.status(), IncidentReportStatus::Investigation);

        let investigations = AccidentInvestigation::find_by_incident(env.store(), &_id)
            .await
            .unwrap();
        assert_eq!(investigations.len(), 1);
        assert_eq!(investigations[0].incident_id, _id);
        assert_eq!(investigations[0].status(), InvestigationStatus::Draft);
        assert_eq!(investigations[0].investigation_date, today());
    }

    #[actix_web::test]
    async fn reporting_a_near_miss_stops_at_reported() {
        let env = Env::memory();
        let actor = actor();
        let incident = IncidentReport::create(&env, &actor, request(IncidentKind::NearMiss), today())
            .await
            .unwrap();
        let _id = incident._id.unwrap();

        let reported = IncidentReport::run(&env, &actor, &_id, IncidentReportAction::Report, today())
            .await
            .unwrap();
        assert_eq!(reported.status(), IncidentReportStatus::Reported);
        assert!(AccidentInvestigation::find_by_incident(env.store(), &_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[actix_web::test]
    async fn closing_needs_an_investigation_when_one_is_required() {
        let env = Env::memory();
        let actor = actor();
        let incident = IncidentReport::create(&env, &actor, request(IncidentKind::Fire), today())
            .await
            .unwrap();
        let _id = incident._id.unwrap();

        let blocked = IncidentReport::run(&env, &actor, &_id, IncidentReportAction::Close, today()).await;
        assert!(blocked.unwrap_err().is_guard_violation());
        let unchanged = IncidentReport::get(env.store(), &_id).await.unwrap();
        assert_eq!(unchanged.status(), IncidentReportStatus::Draft);

        AccidentInvestigation::create(
            &env,
            &actor,
            AccidentInvestigationRequest {
                incident_id: Some(_id),
                ..Default::default()
            },
            today(),
        )
        .await
        .unwrap();

        let closed = IncidentReport::run(&env, &actor, &_id, IncidentReportAction::Close, today())
            .await
            .unwrap();
        assert_eq!(closed.status(), IncidentReportStatus::Closed);
    }

    #[test]
    fn investigation_closed_cannot_be_triggered_by_users() {
        let parsed: std::result::Result<IncidentReportAction, _> =
            serde_json::from_str("\"investigation_closed\"");
        assert!(parsed.is_err());
        let parsed: IncidentReportAction = serde_json::from_str("\"mark_action_required\"").unwrap();
        assert_eq!(parsed, IncidentReportAction::MarkActionRequired);
    }

    #[actix_web::test]
    async fn insurance_claim_creation_is_idempotent() {
        let env = Env::memory();
        let actor = actor();
        let incident = IncidentReport::create(&env, &actor, request(IncidentKind::PropertyDamage), today())
            .await
            .unwrap();
        let _id = incident._id.unwrap();
        let claim_request = || InsuranceClaimRequest {
            amount: Decimal::new(250000, 2),
            ..Default::default()
        };

        let first = IncidentReport::create_insurance_claim(&env, &_id, claim_request(), today())
            .await
            .unwrap();
        let second = IncidentReport::create_insurance_claim(&env, &_id, claim_request(), today())
            .await
            .unwrap();

        assert_eq!(first._id, second._id);
        assert_eq!(first.incident_id, _id);
        assert_eq!(first.status(), InsuranceClaimStatus::Draft);
        let linked = IncidentReport::get(env.store(), &_id).await.unwrap();
        assert_eq!(linked.insurance_claim_id(), first._id);
        assert_eq!(
            InsuranceClaim::find_by_incident(env.store(), &_id).await.unwrap().len(),
            1
        );
    }
}
