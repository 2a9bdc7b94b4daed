use crate::error::{AppError, Result};
use crate::planning::{FilterCriteria, ModeAction, PlanningMode, QueryState, SelectionSet};

/// Typed view of a planning URL. Every mutation is written back to the
/// query before it returns, so [`PlanningState::encode`] always reflects
/// the in-memory mode and selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanningState {
    query: QueryState,
    mode: PlanningMode,
    selection: SelectionSet,
}

impl PlanningState {
    pub fn from_query(raw: &str) -> Self {
        let query = QueryState::parse(raw);
        PlanningState {
            mode: PlanningMode::from_query(&query),
            selection: SelectionSet::from_query(&query),
            query,
        }
    }

    pub fn mode(&self) -> PlanningMode {
        self.mode
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn filters(&self) -> FilterCriteria {
        FilterCriteria::from_query(&self.query)
    }

    /// Applies a mode action. The selection is left untouched, including on
    /// cancel.
    pub fn transition(&mut self, action: ModeAction) -> Result<PlanningMode> {
        let next = self.mode.transition(action)?;
        tracing::debug!(from = %self.mode, to = %next, "Planning mode {} -> {}", self.mode, next);
        self.mode = next;
        next.write_to(&mut self.query);
        Ok(next)
    }

    pub fn toggle_marker(&mut self, id: &str, selected: bool) -> Result<()> {
        if !self.mode.allows_selection_changes() {
            return Err(AppError::InvalidTransition(format!(
                "Markers can only be selected while planning (currently {})",
                self.mode
            )));
        }
        SelectionSet::check_id(id).map_err(AppError::InvalidRequest)?;
        self.selection.toggle(id, selected);
        self.selection.write_to(&mut self.query);
        Ok(())
    }

    pub fn encode(&self) -> String {
        self.query.encode()
    }
}
