use chrono::NaiveDate;
use mongodb::bson::{doc, oid::ObjectId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{incident_report::IncidentReport, insurance_type::InsuranceType};
use crate::{
    database::{assign_reference, Attachable, Env, Record, RecordStore, Sequence, UnitOfWork},
    error::{Error, Result},
    workflow::{Lifecycle, Transition},
};

pub const COLLECTION: &str = "insurance_claims";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceClaimStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Processed,
    Rejected,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceClaimAction {
    Submit,
    Approve,
    Process,
    Reject,
    ResetToDraft,
}

impl Lifecycle for InsuranceClaimStatus {
    type Action = InsuranceClaimAction;

    const TRANSITIONS: &'static [Transition<Self, Self::Action>] = &[
        Transition {
            action: InsuranceClaimAction::Submit,
            from: &[InsuranceClaimStatus::Draft],
            to: InsuranceClaimStatus::Submitted,
        },
        Transition {
            action: InsuranceClaimAction::Approve,
            from: &[InsuranceClaimStatus::Submitted],
            to: InsuranceClaimStatus::Approved,
        },
        Transition {
            action: InsuranceClaimAction::Process,
            from: &[InsuranceClaimStatus::Approved],
            to: InsuranceClaimStatus::Processed,
        },
        Transition {
            action: InsuranceClaimAction::Reject,
            from: &[
                InsuranceClaimStatus::Draft,
                InsuranceClaimStatus::Submitted,
                InsuranceClaimStatus::Approved,
                InsuranceClaimStatus::Processed,
            ],
            to: InsuranceClaimStatus::Rejected,
        },
        Transition {
            action: InsuranceClaimAction::ResetToDraft,
            from: &[
                InsuranceClaimStatus::Draft,
                InsuranceClaimStatus::Submitted,
                InsuranceClaimStatus::Approved,
                InsuranceClaimStatus::Processed,
                InsuranceClaimStatus::Rejected,
            ],
            to: InsuranceClaimStatus::Draft,
        },
    ];
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InsuranceClaim {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    version: i64,
    reference: String,
    pub incident_id: ObjectId,
    pub insurance_type_id: Option<ObjectId>,
    pub claim_date: NaiveDate,
    pub amount: Decimal,
    pub currency: String,
    pub employee_id: ObjectId,
    pub department_id: Option<ObjectId>,
    pub company_id: ObjectId,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub attachment_ids: Vec<ObjectId>,
    status: InsuranceClaimStatus,
}
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct InsuranceClaimRequest {
    pub reference: Option<String>,
    pub incident_id: Option<ObjectId>,
    pub insurance_type_id: Option<ObjectId>,
    pub claim_date: Option<NaiveDate>,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub employee_id: Option<ObjectId>,
    pub department_id: Option<ObjectId>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

impl Record for InsuranceClaim {
    const COLLECTION: &'static str = COLLECTION;
    const NAME: &'static str = "INSURANCE_CLAIM";
    const SEQUENCE: Option<Sequence> = Some(Sequence::new("insurance.claim", "CLM"));

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
    fn version_mut(&mut self) -> &mut i64 {
        &mut self.version
    }
    fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(Error::guard("The claim amount must be positive."));
        }
        Ok(())
    }
}

impl Attachable for InsuranceClaim {
    fn company_id(&self) -> ObjectId {
        self.company_id
    }
    fn attachment_ids_mut(&mut self) -> &mut Vec<ObjectId> {
        &mut self.attachment_ids
    }
}

impl InsuranceClaim {
    pub fn reference(&self) -> &str {
        &self.reference
    }
    pub fn status(&self) -> InsuranceClaimStatus {
        self.status
    }

    pub fn run(&mut self, action: InsuranceClaimAction) -> Result<()> {
        self.status = self.status.next(action)?;
        Ok(())
    }

    fn apply_request(&mut self, request: InsuranceClaimRequest) {
        self.insurance_type_id = request.insurance_type_id;
        if let Some(claim_date) = request.claim_date {
            self.claim_date = claim_date;
        }
        self.amount = request.amount;
        if let Some(currency) = request.currency {
            self.currency = currency;
        }
        if let Some(employee_id) = request.employee_id {
            self.employee_id = employee_id;
        }
        if request.department_id.is_some() {
            self.department_id = request.department_id;
        }
        self.description = request.description;
        self.notes = request.notes;
    }

    async fn check_insurance_type(store: &dyn RecordStore, request: &InsuranceClaimRequest) -> Result<()> {
        if let Some(insurance_type_id) = &request.insurance_type_id {
            InsuranceType::get(store, insurance_type_id).await?;
        }
        Ok(())
    }

    pub async fn find_by_incident(
        store: &dyn RecordStore,
        incident_id: &ObjectId,
    ) -> Result<Vec<InsuranceClaim>> {
        Self::find_many(store, doc! { "incident_id": incident_id }).await
    }

    pub async fn find_by_company(
        store: &dyn RecordStore,
        company_id: &ObjectId,
    ) -> Result<Vec<InsuranceClaim>> {
        Self::find_many(store, doc! { "company_id": company_id }).await
    }

    /// Opens a claim for an existing incident and links it to that incident.
    /// Employee, department and company default to the incident's.
    pub async fn create(
        env: &Env,
        mut request: InsuranceClaimRequest,
        today: NaiveDate,
    ) -> Result<InsuranceClaim> {
        let incident_id: ObjectId = request
            .incident_id
            .ok_or_else(|| Error::guard("Please select the incident this claim is for."))?;
        let mut incident: IncidentReport = IncidentReport::get(env.store(), &incident_id).await?;
        if incident.insurance_claim_id().is_some() {
            return Err(Error::guard(format!(
                "Incident {} already has an insurance claim.",
                incident.reference()
            )));
        }
        Self::check_insurance_type(env.store(), &request).await?;

        let requested: Option<String> = request.reference.take();
        let claim_id: ObjectId = ObjectId::new();
        let mut claim: InsuranceClaim = InsuranceClaim {
            _id: Some(claim_id),
            version: 0,
            reference: String::new(),
            incident_id,
            insurance_type_id: None,
            claim_date: today,
            amount: Decimal::ZERO,
            currency: env.currency.clone(),
            employee_id: incident.employee_id,
            department_id: incident.department_id,
            company_id: incident.company_id,
            description: None,
            notes: None,
            attachment_ids: Vec::new(),
            status: InsuranceClaimStatus::Draft,
        };
        claim.apply_request(request);
        if claim.description.is_none() {
            claim.description = Some(format!("Claim for {}", incident.reference()));
        }
        claim.validate()?;
        claim.reference = assign_reference::<Self>(env, requested).await?;

        incident.link_insurance_claim(claim_id);

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.insert(&claim)?;
        uow.update(&mut incident)?;
        uow.commit(env.store()).await?;

        tracing::info!(reference = %claim.reference, incident = %incident.reference(), amount = %claim.amount, "insurance claim created");
        Ok(claim)
    }

    pub async fn update(
        env: &Env,
        _id: &ObjectId,
        request: InsuranceClaimRequest,
    ) -> Result<InsuranceClaim> {
        let mut claim: InsuranceClaim = Self::get(env.store(), _id).await?;
        Self::check_insurance_type(env.store(), &request).await?;
        claim.apply_request(request);

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut claim)?;
        uow.commit(env.store()).await?;
        Ok(claim)
    }

    pub async fn apply(
        env: &Env,
        _id: &ObjectId,
        action: InsuranceClaimAction,
    ) -> Result<InsuranceClaim> {
        let mut claim: InsuranceClaim = Self::get(env.store(), _id).await?;
        claim.run(action)?;

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut claim)?;
        uow.commit(env.store()).await?;

        tracing::info!(reference = %claim.reference, ?action, status = ?claim.status, "insurance claim updated");
        Ok(claim)
    }
}
