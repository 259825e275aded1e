//! Weekly planning grid.
//!
//! Each [`DaySlot`] has its own two-step assignment: [`PlanningService::begin_assign`] opens the
//! recipe picker for that slot, [`PlanningService::confirm`] writes the chosen recipe and closes
//! it again. Rows are append-only, so assigning the same slot twice keeps both rows.

use crate::backend::Backend;
use crate::config::CoreConfig;
use crate::constants::PLANNING_TABLE;
use crate::repositories::Query;
use crate::session::{Notice, Session};
use crate::{RepasError, RepasResult};
use repas_types::DaySlot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A row of the `planning` table. `recipe_id` is not checked against `recipes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningAssignment {
    pub week_label: String,
    pub day_slot: DaySlot,
    pub recipe_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    Assigned(PlanningAssignment),
    /// No recipe chosen, slot not open, or no backend: nothing written.
    Skipped,
}

impl AssignOutcome {
    pub fn notices(&self) -> Vec<Notice> {
        match self {
            AssignOutcome::Assigned(_) => vec![Notice::success("Affecté")],
            AssignOutcome::Skipped => Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PlanningService {
    cfg: Arc<CoreConfig>,
    backend: Backend,
}

impl PlanningService {
    pub fn new(cfg: Arc<CoreConfig>, backend: Backend) -> Self {
        Self { cfg, backend }
    }

    /// The grid rows, in display order.
    pub fn slots(&self) -> &'static [DaySlot] {
        &DaySlot::ALL
    }

    /// Opens the recipe picker for `slot`.
    pub fn begin_assign(&self, session: &mut Session, slot: DaySlot) {
        session.set_assigning(slot, true);
    }

    /// Writes `recipe_id` to `slot` for the configured week and closes the picker.
    ///
    /// The picker is closed whatever happens, including when the insert fails.
    pub async fn confirm(
        &self,
        session: &mut Session,
        slot: DaySlot,
        recipe_id: Option<String>,
    ) -> RepasResult<AssignOutcome> {
        let was_open = session.is_assigning(slot);
        session.set_assigning(slot, false);

        if !was_open {
            tracing::debug!("ignoring confirmation for {} with no open picker", slot);
            return Ok(AssignOutcome::Skipped);
        }
        let Some(recipe_id) = recipe_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
        else {
            return Ok(AssignOutcome::Skipped);
        };
        if !self.backend.is_configured() {
            tracing::info!("backend not configured, assignment of {} skipped", slot);
            return Ok(AssignOutcome::Skipped);
        }

        let assignment = PlanningAssignment {
            week_label: self.cfg.week_label().to_string(),
            day_slot: slot,
            recipe_id,
        };
        let record = serde_json::to_value(&assignment).map_err(RepasError::Serialization)?;
        if let Err(e) = self.backend.insert(PLANNING_TABLE, record).await {
            tracing::error!("assignment of {} failed: {}", slot, e);
            return Err(e);
        }
        tracing::info!(
            "assigned recipe {} to {} ({})",
            assignment.recipe_id,
            slot,
            assignment.week_label
        );
        Ok(AssignOutcome::Assigned(assignment))
    }

    /// Every assignment recorded for the configured week, oldest first.
    pub async fn assignments(&self) -> RepasResult<Vec<PlanningAssignment>> {
        let query = Query::table(PLANNING_TABLE)
            .select(&["week_label", "day_slot", "recipe_id"])
            .eq("week_label", self.cfg.week_label());
        let rows = self.backend.query(&query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(assignment) => Some(assignment),
                Err(e) => {
                    tracing::warn!("skipping unreadable planning row: {}", e);
                    None
                }
            })
            .collect())
    }
}
