use chrono::NaiveDate;
use mongodb::bson::{doc, oid::ObjectId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{require_text, Priority};
use crate::{
    database::{Env, Record, RecordStore, UnitOfWork},
    error::{Error, Result},
    workflow::{Lifecycle, Transition},
};

pub const COLLECTION: &str = "action_items";

/// The record an action item belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionItemOwner {
    AccidentInvestigation,
    OfficeInspection,
    VehicleInspection,
    EmployeeSuggestion,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionItemKind {
    Immediate,
    ShortTerm,
    LongTerm,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionItemStatus {
    #[default]
    Draft,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionItemAction {
    Schedule,
    Start,
    Complete,
    Cancel,
}

impl Lifecycle for ActionItemStatus {
    type Action = ActionItemAction;

    const TRANSITIONS: &'static [Transition<Self, Self::Action>] = &[
        Transition {
            action: ActionItemAction::Schedule,
            from: &[ActionItemStatus::Draft],
            to: ActionItemStatus::Scheduled,
        },
        Transition {
            action: ActionItemAction::Start,
            from: &[ActionItemStatus::Draft, ActionItemStatus::Scheduled],
            to: ActionItemStatus::InProgress,
        },
        Transition {
            action: ActionItemAction::Complete,
            from: &[
                ActionItemStatus::Draft,
                ActionItemStatus::Scheduled,
                ActionItemStatus::InProgress,
            ],
            to: ActionItemStatus::Completed,
        },
        Transition {
            action: ActionItemAction::Cancel,
            from: &[
                ActionItemStatus::Draft,
                ActionItemStatus::Scheduled,
                ActionItemStatus::InProgress,
            ],
            to: ActionItemStatus::Cancelled,
        },
    ];
}

/// A remediation task, maintenance item or implementation-plan step owned by
/// another record.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActionItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    version: i64,
    pub owner: ActionItemOwner,
    pub owner_id: ObjectId,
    pub company_id: ObjectId,
    pub name: String,
    pub description: Option<String>,
    pub kind: Option<ActionItemKind>,
    pub priority: Priority,
    pub responsible_id: Option<ObjectId>,
    pub deadline: Option<NaiveDate>,
    pub scheduled_date: Option<NaiveDate>,
    pub cost: Option<Decimal>,
    pub sequence: u32,
    pub notes: Option<String>,
    status: ActionItemStatus,
    completion_date: Option<NaiveDate>,
}
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ActionItemRequest {
    pub name: String,
    pub description: Option<String>,
    pub kind: Option<ActionItemKind>,
    pub priority: Option<Priority>,
    pub responsible_id: Option<ObjectId>,
    pub deadline: Option<NaiveDate>,
    pub scheduled_date: Option<NaiveDate>,
    pub cost: Option<Decimal>,
    pub sequence: Option<u32>,
    pub notes: Option<String>,
}

impl Record for ActionItem {
    const COLLECTION: &'static str = COLLECTION;
    const NAME: &'static str = "ACTION_ITEM";

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
    fn version_mut(&mut self) -> &mut i64 {
        &mut self.version
    }
    fn validate(&self) -> Result<()> {
        require_text(Some(self.name.as_str()), "An action item needs a name.")?;
        if matches!(self.cost, Some(cost) if cost < Decimal::ZERO) {
            return Err(Error::guard("Estimated cost cannot be negative."));
        }
        Ok(())
    }
}

impl ActionItem {
    pub fn new(
        owner: ActionItemOwner,
        owner_id: ObjectId,
        company_id: ObjectId,
        request: ActionItemRequest,
    ) -> Self {
        Self {
            _id: Some(ObjectId::new()),
            version: 0,
            owner,
            owner_id,
            company_id,
            name: request.name,
            description: request.description,
            kind: request.kind,
            priority: request.priority.unwrap_or_default(),
            responsible_id: request.responsible_id,
            deadline: request.deadline,
            scheduled_date: request.scheduled_date,
            cost: request.cost,
            sequence: request.sequence.unwrap_or(10),
            notes: request.notes,
            status: ActionItemStatus::Draft,
            completion_date: None,
        }
    }
    pub fn status(&self) -> ActionItemStatus {
        self.status
    }
    pub fn completion_date(&self) -> Option<NaiveDate> {
        self.completion_date
    }
    pub fn is_completed(&self) -> bool {
        self.status == ActionItemStatus::Completed
    }

    pub fn run(&mut self, action: ActionItemAction, today: NaiveDate) -> Result<()> {
        let next: ActionItemStatus = self.status.next(action)?;
        match action {
            ActionItemAction::Schedule if self.scheduled_date.is_none() => {
                return Err(Error::guard(
                    "Please set a scheduled date before scheduling maintenance.",
                ));
            }
            ActionItemAction::Complete => self.completion_date = Some(today),
            _ => (),
        }
        self.status = next;
        Ok(())
    }

    pub async fn find_by_owner(
        store: &dyn RecordStore,
        owner: ActionItemOwner,
        owner_id: &ObjectId,
    ) -> Result<Vec<ActionItem>> {
        let mut items: Vec<ActionItem> = Self::find_many(
            store,
            doc! {
                "owner": mongodb::bson::to_bson(&owner)?,
                "owner_id": owner_id,
            },
        )
        .await?;
        items.sort_by_key(|item| item.sequence);
        Ok(items)
    }

    pub async fn save(&self, env: &Env) -> Result<()> {
        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.insert(self)?;
        uow.commit(env.store()).await
    }

    pub async fn apply(
        env: &Env,
        _id: &ObjectId,
        action: ActionItemAction,
        today: NaiveDate,
    ) -> Result<ActionItem> {
        let mut item: ActionItem = Self::get(env.store(), _id).await?;
        item.run(action, today)?;

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.update(&mut item)?;
        uow.commit(env.store()).await?;

        tracing::info!(item = %_id, ?action, status = ?item.status, "action item updated");
        Ok(item)
    }
}
