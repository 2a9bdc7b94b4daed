use crate::error::{AppError, Result};
use crate::planning::QueryState;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PLANNING_PARAM: &str = "planning";
pub const CALCULATING_PARAM: &str = "calculating";

/// Three-way mode of the map view. Persisted as two boolean query flags,
/// of which at most one is ever written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanningMode {
    #[default]
    Browsing,
    Planning,
    Calculating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeAction {
    PlanRoute,
    CalculateRoute,
    Cancel,
}

impl PlanningMode {
    /// Reads the mode flags. A URL carrying both flags (hand-edited or from
    /// an older client) resolves to `Calculating`.
    pub fn from_query(query: &QueryState) -> Self {
        if query.flag(CALCULATING_PARAM) {
            PlanningMode::Calculating
        } else if query.flag(PLANNING_PARAM) {
            PlanningMode::Planning
        } else {
            PlanningMode::Browsing
        }
    }

    pub fn write_to(&self, query: &mut QueryState) {
        query.delete(PLANNING_PARAM);
        query.delete(CALCULATING_PARAM);
        match self {
            PlanningMode::Browsing => {}
            PlanningMode::Planning => query.set(PLANNING_PARAM, "true"),
            PlanningMode::Calculating => query.set(CALCULATING_PARAM, "true"),
        }
    }

    /// Transition table:
    ///
    /// | from        | action          | to          |
    /// |-------------|-----------------|-------------|
    /// | Browsing    | PlanRoute       | Planning    |
    /// | Planning    | CalculateRoute  | Calculating |
    /// | any         | Cancel          | Browsing    |
    ///
    /// Every other pair is rejected.
    pub fn transition(self, action: ModeAction) -> Result<PlanningMode> {
        match (self, action) {
            (_, ModeAction::Cancel) => Ok(PlanningMode::Browsing),
            (PlanningMode::Browsing, ModeAction::PlanRoute) => Ok(PlanningMode::Planning),
            (PlanningMode::Planning, ModeAction::CalculateRoute) => Ok(PlanningMode::Calculating),
            (from, action) => Err(AppError::InvalidTransition(format!(
                "Cannot {} while {}",
                action, from
            ))),
        }
    }

    /// Marker checkboxes are interactive only while planning.
    pub fn allows_selection_changes(&self) -> bool {
        matches!(self, PlanningMode::Planning)
    }
}

impl fmt::Display for PlanningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanningMode::Browsing => write!(f, "browsing"),
            PlanningMode::Planning => write!(f, "planning"),
            PlanningMode::Calculating => write!(f, "calculating"),
        }
    }
}

impl fmt::Display for ModeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeAction::PlanRoute => write!(f, "plan a route"),
            ModeAction::CalculateRoute => write!(f, "calculate a route"),
            ModeAction::Cancel => write!(f, "cancel"),
        }
    }
}
