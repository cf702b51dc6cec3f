use chrono::{Days, NaiveDate};
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::{require_text, user::Actor};
use crate::{
    database::{Env, Record, RecordStore, UnitOfWork},
    error::{Error, Result},
    workflow::{Lifecycle, Transition},
};

pub const COLLECTION: &str = "fire_extinguishers";
pub const MAINTENANCE_COLLECTION: &str = "fire_extinguisher_maintenance";

/// Days between an inspection and the next one due.
pub const INSPECTION_INTERVAL_DAYS: u64 = 90;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtinguisherClass {
    A,
    B,
    C,
    D,
    K,
    Abc,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FireExtinguisherStatus {
    #[default]
    Active,
    Maintenance,
    Expired,
    Replaced,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FireExtinguisherAction {
    SetMaintenance,
    SetActive,
    SetExpired,
    SetReplaced,
}

impl Lifecycle for FireExtinguisherStatus {
    type Action = FireExtinguisherAction;

    const TRANSITIONS: &'static [Transition<Self, Self::Action>] = &[
        Transition {
            action: FireExtinguisherAction::SetMaintenance,
            from: &[FireExtinguisherStatus::Active],
            to: FireExtinguisherStatus::Maintenance,
        },
        Transition {
            action: FireExtinguisherAction::SetActive,
            from: &[FireExtinguisherStatus::Maintenance],
            to: FireExtinguisherStatus::Active,
        },
        Transition {
            action: FireExtinguisherAction::SetExpired,
            from: &[
                FireExtinguisherStatus::Active,
                FireExtinguisherStatus::Maintenance,
            ],
            to: FireExtinguisherStatus::Expired,
        },
        Transition {
            action: FireExtinguisherAction::SetReplaced,
            from: &[
                FireExtinguisherStatus::Active,
                FireExtinguisherStatus::Maintenance,
                FireExtinguisherStatus::Expired,
            ],
            to: FireExtinguisherStatus::Replaced,
        },
    ];
}

pub fn next_inspection_date(last_inspection_date: Option<NaiveDate>) -> Option<NaiveDate> {
    last_inspection_date?.checked_add_days(Days::new(INSPECTION_INTERVAL_DAYS))
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FireExtinguisher {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    version: i64,
    pub serial_number: String,
    pub company_id: ObjectId,
    pub location: String,
    pub building: String,
    pub floor: Option<String>,
    pub class: ExtinguisherClass,
    pub capacity: f64,
    pub manufacture_date: NaiveDate,
    pub installation_date: NaiveDate,
    pub expiry_date: NaiveDate,
    last_inspection_date: Option<NaiveDate>,
    next_inspection_date: Option<NaiveDate>,
    pub notes: Option<String>,
    status: FireExtinguisherStatus,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct FireExtinguisherRequest {
    pub serial_number: String,
    pub location: String,
    pub building: String,
    pub floor: Option<String>,
    pub class: ExtinguisherClass,
    pub capacity: f64,
    pub manufacture_date: NaiveDate,
    pub installation_date: NaiveDate,
    pub expiry_date: NaiveDate,
    /// Only read when the extinguisher is created.
    pub last_inspection_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Record for FireExtinguisher {
    const COLLECTION: &'static str = COLLECTION;
    const NAME: &'static str = "FIRE_EXTINGUISHER";

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
    fn version_mut(&mut self) -> &mut i64 {
        &mut self.version
    }
    fn validate(&self) -> Result<()> {
        require_text(Some(self.serial_number.as_str()), "A fire extinguisher needs a serial number.")?;
        require_text(Some(self.location.as_str()), "Please set the extinguisher location.")?;
        require_text(Some(self.building.as_str()), "Please set the extinguisher building.")?;
        if self.installation_date < self.manufacture_date {
            return Err(Error::guard(
                "Installation date cannot be before manufacturing date.",
            ));
        }
        if self.expiry_date < self.manufacture_date {
            return Err(Error::guard("Expiry date cannot be before manufacturing date."));
        }
        Ok(())
    }
}

impl FireExtinguisher {
    pub fn new(actor: &Actor, request: FireExtinguisherRequest) -> Self {
        let last_inspection_date: Option<NaiveDate> = request.last_inspection_date;
        let mut extinguisher: FireExtinguisher = Self {
            _id: Some(ObjectId::new()),
            version: 0,
            serial_number: String::new(),
            company_id: actor.company_id,
            location: String::new(),
            building: String::new(),
            floor: None,
            class: request.class,
            capacity: request.capacity,
            manufacture_date: request.manufacture_date,
            installation_date: request.installation_date,
            expiry_date: request.expiry_date,
            last_inspection_date: None,
            next_inspection_date: None,
            notes: None,
            status: FireExtinguisherStatus::Active,
        };
        extinguisher.apply_request(request);
        extinguisher.record_inspection(last_inspection_date);
        extinguisher
    }

    pub fn apply_request(&mut self, request: FireExtinguisherRequest) {
        self.serial_number = request.serial_number;
        self.location = request.location;
        self.building = request.building;
        self.floor = request.floor;
        self.class = request.class;
        self.capacity = request.capacity;
        self.manufacture_date = request.manufacture_date;
        self.installation_date = request.installation_date;
        self.expiry_date = request.expiry_date;
        self.notes = request.notes;
    }

    /// Writes the last inspection date and recomputes the next one.
    fn record_inspection(&mut self, date: Option<NaiveDate>) {
        self.last_inspection_date = date;
        self.next_inspection_date = next_inspection_date(date);
    }

    pub fn last_inspection_date(&self) -> Option<NaiveDate> {
        self.last_inspection_date
    }
    pub fn next_inspection_date(&self) -> Option<NaiveDate> {
        self.next_inspection_date
    }
    pub fn status(&self) -> FireExtinguisherStatus {
        self.status
    }

    pub fn run(&mut self, action: FireExtinguisherAction) -> Result<()> {
        self.status = self.status.next(action)?;
        Ok(())
    }

    pub async fn find_by_company(
        store: &dyn RecordStore,
        company_id: &ObjectId,
    ) -> Result<Vec<FireExtinguisher>> {
        let mut extinguishers: Vec<FireExtinguisher> =
            Self::find_many(store, doc! { "company_id": company_id }).await?;
        extinguishers.sort_by(|a, b| a.serial_number.cmp(&b.serial_number));
        Ok(extinguishers)
    }

    pub async fn create(env: &Env, actor: &Actor, request: FireExtinguisherRequest) -> Result<FireExtinguisher> {
        let extinguisher: FireExtinguisher = FireExtinguisher::new(actor, request);

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.insert(&extinguisher)?;
        uow.commit(env.store()).await?;

        tracing::info!(serial_number = %extinguisher.serial_number, "fire extinguisher registered");
        Ok(extinguisher)
    }

    pub async fn update(
        env: &Env,
        _id: &ObjectId,
        request: FireExtinguisherRequest,
    ) -> Result<FireExtinguisher> {
        let mut extinguisher: FireExtinguisher = Self::get(env.store(), _id).await?;
        extinguisher.apply_request(request);

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut extinguisher)?;
        uow.commit(env.store()).await?;
        Ok(extinguisher)
    }

    pub async fn apply(
        env: &Env,
        _id: &ObjectId,
        action: FireExtinguisherAction,
    ) -> Result<FireExtinguisher> {
        let mut extinguisher: FireExtinguisher = Self::get(env.store(), _id).await?;
        extinguisher.run(action)?;

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut extinguisher)?;
        uow.commit(env.store()).await?;

        tracing::info!(serial_number = %extinguisher.serial_number, ?action, status = ?extinguisher.status, "fire extinguisher updated");
        Ok(extinguisher)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceKind {
    Inspection,
    Refill,
    Repair,
    Certification,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FireExtinguisherMaintenance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    version: i64,
    pub extinguisher_id: ObjectId,
    pub company_id: ObjectId,
    pub maintenance_date: NaiveDate,
    pub technician_id: ObjectId,
    pub kind: MaintenanceKind,
    pub pressure_check: bool,
    pub nozzle_check: bool,
    pub seal_check: bool,
    pub weight_check: bool,
    pub notes: Option<String>,
    pub next_maintenance_date: Option<NaiveDate>,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct MaintenanceRequest {
    pub maintenance_date: Option<NaiveDate>,
    pub technician_id: Option<ObjectId>,
    pub kind: MaintenanceKind,
    #[serde(default)]
    pub pressure_check: bool,
    #[serde(default)]
    pub nozzle_check: bool,
    #[serde(default)]
    pub seal_check: bool,
    #[serde(default)]
    pub weight_check: bool,
    pub notes: Option<String>,
    pub next_maintenance_date: Option<NaiveDate>,
}

impl Record for FireExtinguisherMaintenance {
    const COLLECTION: &'static str = MAINTENANCE_COLLECTION;
    const NAME: &'static str = "FIRE_EXTINGUISHER_MAINTENANCE";

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
    fn version_mut(&mut self) -> &mut i64 {
        &mut self.version
    }
}

impl FireExtinguisherMaintenance {
    /// Maintenance history of one extinguisher, newest first.
    pub async fn find_by_extinguisher(
        store: &dyn RecordStore,
        extinguisher_id: &ObjectId,
    ) -> Result<Vec<FireExtinguisherMaintenance>> {
        let mut history: Vec<FireExtinguisherMaintenance> =
            Self::find_many(store, doc! { "extinguisher_id": extinguisher_id }).await?;
        history.sort_by(|a, b| b.maintenance_date.cmp(&a.maintenance_date));
        Ok(history)
    }

    /// Logs a maintenance visit. The extinguisher's last inspection date takes
    /// the visit date, even when it is older than the current one.
    pub async fn create(
        env: &Env,
        actor: &Actor,
        extinguisher_id: &ObjectId,
        request: MaintenanceRequest,
        today: NaiveDate,
    ) -> Result<(FireExtinguisherMaintenance, FireExtinguisher)> {
        let mut extinguisher: FireExtinguisher = FireExtinguisher::get(env.store(), extinguisher_id).await?;

        let maintenance: FireExtinguisherMaintenance = FireExtinguisherMaintenance {
            _id: Some(ObjectId::new()),
            version: 0,
            extinguisher_id: *extinguisher_id,
            company_id: extinguisher.company_id,
            maintenance_date: request.maintenance_date.unwrap_or(today),
            technician_id: request.technician_id.unwrap_or(actor.user_id),
            kind: request.kind,
            pressure_check: request.pressure_check,
            nozzle_check: request.nozzle_check,
            seal_check: request.seal_check,
            weight_check: request.weight_check,
            notes: request.notes,
            next_maintenance_date: request.next_maintenance_date,
        };
        extinguisher.record_inspection(Some(maintenance.maintenance_date));

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.insert(&maintenance)?;
        uow.update(&mut extinguisher)?;
        uow.commit(env.store()).await?;

        tracing::info!(
            serial_number = %extinguisher.serial_number,
            kind = ?maintenance.kind,
            date = %maintenance.maintenance_date,
            "fire extinguisher maintenance logged"
        );
        Ok((maintenance, extinguisher))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }
    fn actor() -> Actor {
        Actor {
            user_id: ObjectId::new(),
            company_id: ObjectId::new(),
        }
    }
    fn request() -> FireExtinguisherRequest {
        FireExtinguisherRequest {
            serial_number: "FE-0042".to_string(),
            location: "Server room".to_string(),
            building: "HQ".to_string(),
            floor: Some("2".to_string()),
            class: ExtinguisherClass::C,
            capacity: 6.0,
            manufacture_date: date(2023, 1, 1),
            installation_date: date(2023, 3, 1),
            expiry_date: date(2028, 1, 1),
            last_inspection_date: Some(date(2024, 1, 1)),
            notes: None,
        }
    }
    fn maintenance(on: NaiveDate) -> MaintenanceRequest {
        MaintenanceRequest {
            maintenance_date: Some(on),
            technician_id: None,
            kind: MaintenanceKind::Inspection,
            pressure_check: true,
            nozzle_check: true,
            seal_check: true,
            weight_check: true,
            notes: None,
            next_maintenance_date: None,
        }
    }

    #[test]
    fn next_inspection_is_ninety_days_out() {
        assert_eq!(next_inspection_date(Some(date(2024, 2, 1))), Some(date(2024, 5, 1)));
        assert_eq!(next_inspection_date(None), None);
    }

    #[actix_web::test]
    async fn maintenance_moves_the_inspection_dates() {
        let env = Env::memory();
        let actor = actor();
        let extinguisher = FireExtinguisher::create(&env, &actor, request()).await.unwrap();
        let _id = extinguisher._id.unwrap();
        assert_eq!(extinguisher.next_inspection_date(), Some(date(2024, 3, 31)));

        let (log, _) = FireExtinguisherMaintenance::create(&env, &actor, &_id, maintenance(date(2024, 2, 1)), date(2024, 2, 1))
            .await
            .unwrap();
        assert_eq!(log.technician_id, actor.user_id);

        let stored = FireExtinguisher::get(env.store(), &_id).await.unwrap();
        assert_eq!(stored.last_inspection_date(), Some(date(2024, 2, 1)));
        assert_eq!(stored.next_inspection_date(), Some(date(2024, 5, 1)));
    }

    #[actix_web::test]
    async fn older_maintenance_still_overwrites_the_last_inspection() {
        let env = Env::memory();
        let actor = actor();
        let extinguisher = FireExtinguisher::create(&env, &actor, request()).await.unwrap();
        let _id = extinguisher._id.unwrap();

        FireExtinguisherMaintenance::create(&env, &actor, &_id, maintenance(date(2023, 12, 1)), date(2024, 2, 1))
            .await
            .unwrap();
        let stored = FireExtinguisher::get(env.store(), &_id).await.unwrap();
        assert_eq!(stored.last_inspection_date(), Some(date(2023, 12, 1)));

        let history = FireExtinguisherMaintenance::find_by_extinguisher(env.store(), &_id)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[actix_web::test]
    async fn installation_before_manufacture_is_rejected() {
        let env = Env::memory();
        let mut bad = request();
        bad.installation_date = date(2022, 12, 31);
        let result = FireExtinguisher::create(&env, &actor(), bad).await;
        assert!(result.unwrap_err().is_guard_violation());

        let mut bad = request();
        bad.expiry_date = date(2022, 1, 1);
        let result = FireExtinguisher::create(&env, &actor(), bad).await;
        assert!(result.unwrap_err().is_guard_violation());
    }

    #[test]
    fn replaced_is_terminal_and_expiry_is_manual() {
        let mut extinguisher = FireExtinguisher::new(&actor(), request());
        assert_eq!(extinguisher.status(), FireExtinguisherStatus::Active);
        extinguisher.run(FireExtinguisherAction::SetMaintenance).unwrap();
        extinguisher.run(FireExtinguisherAction::SetExpired).unwrap();
        assert!(extinguisher.run(FireExtinguisherAction::SetActive).is_err());
        extinguisher.run(FireExtinguisherAction::SetReplaced).unwrap();
        for action in [
            FireExtinguisherAction::SetActive,
            FireExtinguisherAction::SetMaintenance,
            FireExtinguisherAction::SetExpired,
        ] {
            assert!(extinguisher.run(action).unwrap_err().is_guard_violation());
        }
    }
}
