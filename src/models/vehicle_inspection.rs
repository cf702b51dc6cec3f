use chrono::{Days, NaiveDate};
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::{
    action_item::{ActionItem, ActionItemOwner, ActionItemRequest},
    inspection::{InspectionAction, InspectionStatus},
    user::Actor,
    Priority,
};
use crate::{
    database::{assign_reference, Attachable, Env, Record, RecordStore, Sequence, UnitOfWork},
    error::{Error, Result},
    workflow::Lifecycle,
};

pub const COLLECTION: &str = "vehicle_inspections";

pub const INSPECTION_INTERVAL_DAYS: u64 = 90;
pub const INITIAL_MAINTENANCE_NAME: &str = "Initial Inspection";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionStatus {
    Ok,
    Fade,
    Defective,
    Missing,
}

impl ConditionStatus {
    pub const ALL: [ConditionStatus; 4] = [
        ConditionStatus::Ok,
        ConditionStatus::Defective,
        ConditionStatus::Missing,
        ConditionStatus::Fade,
    ];

    /// Label printed on the inspection report.
    pub fn display(&self) -> &'static str {
        match self {
            ConditionStatus::Ok => "OK",
            ConditionStatus::Defective => "Defective",
            ConditionStatus::Missing => "Missing",
            ConditionStatus::Fade => "Fade-out",
        }
    }
}

/// Values a single checklist line accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scale {
    /// ok or defective
    Working,
    /// ok, defective or missing
    Fitted,
    /// ok, fade-out or defective
    Lamp,
}

impl Scale {
    pub fn allows(&self, status: ConditionStatus) -> bool {
        match self {
            Scale::Working => matches!(status, ConditionStatus::Ok | ConditionStatus::Defective),
            Scale::Fitted => status != ConditionStatus::Fade,
            Scale::Lamp => status != ConditionStatus::Missing,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct VehicleConditions {
    pub service_brake: Option<ConditionStatus>,
    pub parking_brake: Option<ConditionStatus>,
    pub door_front_left: Option<ConditionStatus>,
    pub door_front_right: Option<ConditionStatus>,
    pub door_rear_left: Option<ConditionStatus>,
    pub door_rear_right: Option<ConditionStatus>,
    pub door_hatch: Option<ConditionStatus>,
    pub seat_belt_front_left: Option<ConditionStatus>,
    pub seat_belt_front_right: Option<ConditionStatus>,
    pub rear_view_mirror: Option<ConditionStatus>,
    pub headlight_right_high: Option<ConditionStatus>,
    pub headlight_right_low: Option<ConditionStatus>,
    pub headlight_left_high: Option<ConditionStatus>,
    pub headlight_left_low: Option<ConditionStatus>,
    pub side_mirror_left: Option<ConditionStatus>,
    pub side_mirror_right: Option<ConditionStatus>,
    pub windshield_left: Option<ConditionStatus>,
    pub windshield_right: Option<ConditionStatus>,
    pub wiper_left: Option<ConditionStatus>,
    pub wiper_right: Option<ConditionStatus>,
    pub warning_lamps: Option<ConditionStatus>,
    pub gauges: Option<ConditionStatus>,
    pub mileage_info: Option<ConditionStatus>,
    pub fire_extinguisher: Option<ConditionStatus>,
    pub first_aid_kit: Option<ConditionStatus>,
}

impl VehicleConditions {
    pub fn entries(&self) -> [(&'static str, Scale, Option<ConditionStatus>); 25] {
        [
            ("service_brake", Scale::Working, self.service_brake),
            ("parking_brake", Scale::Working, self.parking_brake),
            ("door_front_left", Scale::Working, self.door_front_left),
            ("door_front_right", Scale::Working, self.door_front_right),
            ("door_rear_left", Scale::Working, self.door_rear_left),
            ("door_rear_right", Scale::Working, self.door_rear_right),
            ("door_hatch", Scale::Working, self.door_hatch),
            ("seat_belt_front_left", Scale::Fitted, self.seat_belt_front_left),
            ("seat_belt_front_right", Scale::Fitted, self.seat_belt_front_right),
            ("rear_view_mirror", Scale::Fitted, self.rear_view_mirror),
            ("headlight_right_high", Scale::Lamp, self.headlight_right_high),
            ("headlight_right_low", Scale::Lamp, self.headlight_right_low),
            ("headlight_left_high", Scale::Lamp, self.headlight_left_high),
            ("headlight_left_low", Scale::Lamp, self.headlight_left_low),
            ("side_mirror_left", Scale::Fitted, self.side_mirror_left),
            ("side_mirror_right", Scale::Fitted, self.side_mirror_right),
            ("windshield_left", Scale::Fitted, self.windshield_left),
            ("windshield_right", Scale::Fitted, self.windshield_right),
            ("wiper_left", Scale::Fitted, self.wiper_left),
            ("wiper_right", Scale::Fitted, self.wiper_right),
            ("warning_lamps", Scale::Working, self.warning_lamps),
            ("gauges", Scale::Working, self.gauges),
            ("mileage_info", Scale::Working, self.mileage_info),
            ("fire_extinguisher", Scale::Working, self.fire_extinguisher),
            ("first_aid_kit", Scale::Working, self.first_aid_kit),
        ]
    }

    pub fn missing(&self) -> Vec<&'static str> {
        self.entries()
            .into_iter()
            .filter(|(_, _, status)| status.is_none())
            .map(|(name, _, _)| name)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VehicleInspection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    version: i64,
    reference: String,
    pub company_id: ObjectId,
    pub vehicle_id: ObjectId,
    inspection_date: NaiveDate,
    next_inspection_date: Option<NaiveDate>,
    pub inspector_id: ObjectId,
    pub mileage: Option<f64>,
    pub conditions: VehicleConditions,
    pub findings: Option<String>,
    pub recommendations: Option<String>,
    pub attachment_ids: Vec<ObjectId>,
    status: InspectionStatus,
}
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct VehicleInspectionRequest {
    pub reference: Option<String>,
    pub vehicle_id: Option<ObjectId>,
    pub inspection_date: Option<NaiveDate>,
    pub inspector_id: Option<ObjectId>,
    pub mileage: Option<f64>,
    #[serde(default)]
    pub conditions: VehicleConditions,
    pub findings: Option<String>,
    pub recommendations: Option<String>,
}

impl Record for VehicleInspection {
    const COLLECTION: &'static str = COLLECTION;
    const NAME: &'static str = "VEHICLE_INSPECTION";
    const SEQUENCE: Option<Sequence> = Some(Sequence::new("vehicle.inspection", "VHI"));

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
    fn version_mut(&mut self) -> &mut i64 {
        &mut self.version
    }
    fn validate(&self) -> Result<()> {
        for (name, scale, status) in self.conditions.entries() {
            if let Some(status) = status {
                if !scale.allows(status) {
                    return Err(Error::guard(format!(
                        "{name} cannot be recorded as {}.",
                        status.display()
                    )));
                }
            }
        }
        if matches!(self.mileage, Some(mileage) if mileage < 0.0) {
            return Err(Error::guard("Mileage cannot be negative."));
        }
        Ok(())
    }
}

impl Attachable for VehicleInspection {
    fn company_id(&self) -> ObjectId {
        self.company_id
    }
    fn attachment_ids_mut(&mut self) -> &mut Vec<ObjectId> {
        &mut self.attachment_ids
    }
}

impl VehicleInspection {
    pub fn new(
        reference: String,
        actor: &Actor,
        vehicle_id: ObjectId,
        request: VehicleInspectionRequest,
        today: NaiveDate,
    ) -> Self {
        let mut inspection: VehicleInspection = Self {
            _id: Some(ObjectId::new()),
            version: 0,
            reference,
            company_id: actor.company_id,
            vehicle_id,
            inspection_date: today,
            next_inspection_date: None,
            inspector_id: actor.user_id,
            mileage: None,
            conditions: VehicleConditions::default(),
            findings: None,
            recommendations: None,
            attachment_ids: Vec::new(),
            status: InspectionStatus::Draft,
        };
        inspection.set_inspection_date(today);
        inspection.apply_request(request);
        inspection
    }

    pub fn apply_request(&mut self, request: VehicleInspectionRequest) {
        if let Some(vehicle_id) = request.vehicle_id {
            self.vehicle_id = vehicle_id;
        }
        if let Some(inspection_date) = request.inspection_date {
            self.set_inspection_date(inspection_date);
        }
        if let Some(inspector_id) = request.inspector_id {
            self.inspector_id = inspector_id;
        }
        self.mileage = request.mileage;
        self.conditions = request.conditions;
        self.findings = request.findings;
        self.recommendations = request.recommendations;
    }

    pub fn set_inspection_date(&mut self, date: NaiveDate) {
        self.inspection_date = date;
        self.next_inspection_date = date.checked_add_days(Days::new(INSPECTION_INTERVAL_DAYS));
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
    pub fn inspection_date(&self) -> NaiveDate {
        self.inspection_date
    }
    pub fn next_inspection_date(&self) -> Option<NaiveDate> {
        self.next_inspection_date
    }
    pub fn status(&self) -> InspectionStatus {
        self.status
    }

    pub fn run(&mut self, action: InspectionAction) -> Result<()> {
        let next: InspectionStatus = self.status.next(action)?;
        if action == InspectionAction::Complete {
            let missing: Vec<&'static str> = self.conditions.missing();
            if !missing.is_empty() {
                return Err(Error::guard(format!(
                    "Please record every condition before completing the inspection. Missing: {}.",
                    missing.join(", ")
                )));
            }
        }
        self.status = next;
        Ok(())
    }

    pub async fn find_by_company(
        store: &dyn RecordStore,
        company_id: &ObjectId,
    ) -> Result<Vec<VehicleInspection>> {
        let mut inspections: Vec<VehicleInspection> =
            Self::find_many(store, doc! { "company_id": company_id }).await?;
        inspections.sort_by(|a, b| b.inspection_date.cmp(&a.inspection_date));
        Ok(inspections)
    }

    pub async fn maintenance_items(&self, store: &dyn RecordStore) -> Result<Vec<ActionItem>> {
        match self._id {
            Some(_id) => ActionItem::find_by_owner(store, ActionItemOwner::VehicleInspection, &_id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn create(
        env: &Env,
        actor: &Actor,
        mut request: VehicleInspectionRequest,
        today: NaiveDate,
    ) -> Result<VehicleInspection> {
        let vehicle_id: ObjectId = request
            .vehicle_id
            .ok_or_else(|| Error::guard("Please select the inspected vehicle."))?;
        let reference: String = assign_reference::<Self>(env, request.reference.take()).await?;
        let inspection: VehicleInspection = VehicleInspection::new(reference, actor, vehicle_id, request, today);

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.insert(&inspection)?;
        uow.commit(env.store()).await?;

        tracing::info!(reference = %inspection.reference, "vehicle inspection created");
        Ok(inspection)
    }

    pub async fn update(
        env: &Env,
        _id: &ObjectId,
        request: VehicleInspectionRequest,
    ) -> Result<VehicleInspection> {
        let mut inspection: VehicleInspection = Self::get(env.store(), _id).await?;
        inspection.apply_request(request);

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut inspection)?;
        uow.commit(env.store()).await?;
        Ok(inspection)
    }

    /// Runs `action`. Starting an inspection without maintenance items adds an
    /// initial one.
    pub async fn apply(env: &Env, _id: &ObjectId, action: InspectionAction) -> Result<VehicleInspection> {
        let mut inspection: VehicleInspection = Self::get(env.store(), _id).await?;
        inspection.run(action)?;

        let mut uow: UnitOfWork = UnitOfWork::new();
        if action == InspectionAction::Start && inspection.maintenance_items(env.store()).await?.is_empty() {
            let item: ActionItem = ActionItem::new(
                ActionItemOwner::VehicleInspection,
                *_id,
                inspection.company_id,
                ActionItemRequest {
                    name: INITIAL_MAINTENANCE_NAME.to_string(),
                    priority: Some(Priority::Medium),
                    ..Default::default()
                },
            );
            uow.insert(&item)?;
        }
        uow.update(&mut inspection)?;
        uow.commit(env.store()).await?;

        tracing::info!(reference = %inspection.reference, ?action, status = ?inspection.status, "vehicle inspection updated");
        Ok(inspection)
    }

    pub async fn add_maintenance_item(
        env: &Env,
        _id: &ObjectId,
        request: ActionItemRequest,
    ) -> Result<ActionItem> {
        let inspection: VehicleInspection = Self::get(env.store(), _id).await?;
        let item: ActionItem = ActionItem::new(
            ActionItemOwner::VehicleInspection,
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
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
    }
    fn request() -> VehicleInspectionRequest {
        VehicleInspectionRequest {
            vehicle_id: Some(ObjectId::new()),
            mileage: Some(48210.0),
            ..Default::default()
        }
    }
    fn all_ok() -> VehicleConditions {
        let ok = Some(ConditionStatus::Ok);
        VehicleConditions {
            service_brake: ok,
            parking_brake: ok,
            door_front_left: ok,
            door_front_right: ok,
            door_rear_left: ok,
            door_rear_right: ok,
            door_hatch: ok,
            seat_belt_front_left: ok,
            seat_belt_front_right: ok,
            rear_view_mirror: ok,
            headlight_right_high: ok,
            headlight_right_low: ok,
            headlight_left_high: ok,
            headlight_left_low: ok,
            side_mirror_left: ok,
            side_mirror_right: ok,
            windshield_left: ok,
            windshield_right: ok,
            wiper_left: ok,
            wiper_right: ok,
            warning_lamps: ok,
            gauges: ok,
            mileage_info: ok,
            fire_extinguisher: ok,
            first_aid_kit: ok,
        }
    }

    #[test]
    fn next_inspection_follows_the_inspection_date() {
        let mut inspection = VehicleInspection::new("VHI1".to_string(), &actor(), ObjectId::new(), request(), today());
        assert_eq!(
            inspection.next_inspection_date(),
            NaiveDate::from_ymd_opt(2024, 6, 30)
        );
        inspection.set_inspection_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(
            inspection.next_inspection_date(),
            NaiveDate::from_ymd_opt(2024, 3, 31)
        );
    }

    #[test]
    fn completion_needs_every_condition() {
        let mut inspection = VehicleInspection::new("VHI1".to_string(), &actor(), ObjectId::new(), request(), today());
        inspection.run(InspectionAction::Start).unwrap();
        inspection.conditions = all_ok();
        inspection.conditions.wiper_left = None;
        let error = inspection.run(InspectionAction::Complete).unwrap_err();
        assert!(error.to_string().contains("wiper_left"));
        assert_eq!(inspection.status(), InspectionStatus::InProgress);

        inspection.conditions.wiper_left = Some(ConditionStatus::Missing);
        inspection.run(InspectionAction::Complete).unwrap();
        assert_eq!(inspection.status(), InspectionStatus::Done);
    }

    #[test]
    fn conditions_stay_on_their_scale() {
        let mut inspection = VehicleInspection::new("VHI1".to_string(), &actor(), ObjectId::new(), request(), today());
        inspection.conditions.headlight_left_low = Some(ConditionStatus::Fade);
        assert!(inspection.validate().is_ok());
        inspection.conditions.service_brake = Some(ConditionStatus::Missing);
        assert!(inspection.validate().unwrap_err().is_guard_violation());
    }

    #[actix_web::test]
    async fn starting_adds_one_initial_maintenance_item() {
        let env = Env::memory();
        let inspection = VehicleInspection::create(&env, &actor(), request(), today()).await.unwrap();
        let _id = inspection._id.unwrap();

        let started = VehicleInspection::apply(&env, &_id, InspectionAction::Start).await.unwrap();
        let items = started.maintenance_items(env.store()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, INITIAL_MAINTENANCE_NAME);
        assert_eq!(items[0].priority, Priority::Medium);

        VehicleInspection::apply(&env, &_id, InspectionAction::ResetToDraft).await.unwrap();
        let restarted = VehicleInspection::apply(&env, &_id, InspectionAction::Start).await.unwrap();
        assert_eq!(restarted.maintenance_items(env.store()).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn existing_maintenance_items_suppress_the_initial_one() {
        let env = Env::memory();
        let inspection = VehicleInspection::create(&env, &actor(), request(), today()).await.unwrap();
        let _id = inspection._id.unwrap();
        VehicleInspection::add_maintenance_item(
            &env,
            &_id,
            ActionItemRequest {
                name: "Replace wiper blades".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let started = VehicleInspection::apply(&env, &_id, InspectionAction::Start).await.unwrap();
        let items = started.maintenance_items(env.store()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Replace wiper blades");
    }
}
