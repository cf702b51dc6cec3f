use serde::{Deserialize, Serialize};

use crate::workflow::{Lifecycle, Transition};

/// Lifecycle shared by office, vehicle and welding machine inspections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    #[default]
    Draft,
    InProgress,
    Done,
    Cancelled,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionAction {
    Start,
    Complete,
    Cancel,
    ResetToDraft,
}

impl Lifecycle for InspectionStatus {
    type Action = InspectionAction;

    const TRANSITIONS: &'static [Transition<Self, Self::Action>] = &[
        Transition {
            action: InspectionAction::Start,
            from: &[InspectionStatus::Draft],
            to: InspectionStatus::InProgress,
        },
        Transition {
            action: InspectionAction::Complete,
            from: &[InspectionStatus::InProgress],
            to: InspectionStatus::Done,
        },
        Transition {
            action: InspectionAction::Cancel,
            from: &[InspectionStatus::Draft, InspectionStatus::InProgress],
            to: InspectionStatus::Cancelled,
        },
        Transition {
            action: InspectionAction::ResetToDraft,
            from: &[
                InspectionStatus::InProgress,
                InspectionStatus::Done,
                InspectionStatus::Cancelled,
            ],
            to: InspectionStatus::Draft,
        },
    ];
}
