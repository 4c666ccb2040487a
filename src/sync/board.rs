//! Project board synchronization.
//!
//! After an item's issue is created or updated it is linked into a
//! project board. Two optional DATE fields are maintained on the board
//! item:
//!
//! - **start**: stamped with today's date the first time the issue is
//!   linked, if the item is still open. Never touched again.
//! - **end**: the item's due date while it is open, cleared otherwise.
//!
//! The project and its fields are resolved on first use and reused for the
//! rest of the run.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::BoardSettings;
use crate::error::Result;
use crate::model::{ProjectContext, ProjectField};
use crate::tracker::ProjectBoard;

/// Links issues into one project board for the duration of a run.
pub struct BoardSync<'a, B> {
    board: &'a B,
    settings: BoardSettings,
    today: NaiveDate,
    context: Option<ProjectContext>,
}

impl<'a, B: ProjectBoard> BoardSync<'a, B> {
    /// `today` is the date written to start fields.
    pub fn new(board: &'a B, settings: BoardSettings, today: NaiveDate) -> Self {
        Self {
            board,
            settings,
            today,
            context: None,
        }
    }

    /// Resolved context, if [`Self::context`] ran already.
    #[must_use]
    pub fn resolved(&self) -> Option<&ProjectContext> {
        self.context.as_ref()
    }

    /// Resolve the project and its date fields, once.
    ///
    /// # Errors
    ///
    /// Returns an error if the project cannot be found or created, or its
    /// fields cannot be listed. A date field that cannot be created is
    /// skipped instead.
    pub async fn context(&mut self) -> Result<&ProjectContext> {
        let ctx = match self.context.take() {
            Some(ctx) => ctx,
            None => self.resolve().await?,
        };
        Ok(self.context.insert(ctx))
    }

    async fn resolve(&self) -> Result<ProjectContext> {
        let project = self
            .board
            .find_or_create_project(&self.settings.project_title)
            .await?;
        let fields = self.board.project_fields(&project.project_id).await?;

        let start_field_id = match self.settings.start_field.as_deref() {
            Some(name) => self.resolve_field(&project.project_id, &fields, name).await,
            None => None,
        };
        let end_field_id = match self.settings.end_field.as_deref() {
            Some(name) => self.resolve_field(&project.project_id, &fields, name).await,
            None => None,
        };

        info!(
            project = %self.settings.project_title,
            start_field = start_field_id.is_some(),
            end_field = end_field_id.is_some(),
            "Project board resolved"
        );
        Ok(ProjectContext {
            project_id: project.project_id,
            owner_id: project.owner_id,
            start_field_id,
            end_field_id,
        })
    }

    async fn resolve_field(
        &self,
        project_id: &str,
        fields: &[ProjectField],
        name: &str,
    ) -> Option<String> {
        if let Some(field) = fields.iter().find(|f| f.is_date_named(name)) {
            return Some(field.id.clone());
        }
        match self.board.create_date_field(project_id, name).await {
            Ok(field) => {
                debug!(field = name, "Created date field");
                Some(field.id)
            }
            Err(e) => {
                warn!(field = name, error = %e, "Date field unavailable, skipping it");
                None
            }
        }
    }

    /// Link `issue` into the board and maintain its date fields.
    ///
    /// Returns `true` when the issue was linked for the first time.
    ///
    /// # Errors
    ///
    /// Returns an error if any board call fails.
    pub async fn sync_item(
        &mut self,
        issue: Option<u64>,
        due: Option<NaiveDate>,
        checked: bool,
    ) -> Result<bool> {
        let Some(issue) = issue else {
            return Ok(false);
        };
        let today = self.today;
        let ctx = self.context().await?.clone();

        let Some(item) = self.board.find_or_create_item(&ctx.project_id, issue).await? else {
            debug!(issue, "Issue not found for board linking");
            return Ok(false);
        };

        if let Some(start) = &ctx.start_field_id {
            if item.created && !checked {
                self.board
                    .set_date_field(&ctx.project_id, &item.id, start, Some(today))
                    .await?;
            }
        }

        if let Some(end) = &ctx.end_field_id {
            let target = if checked { None } else { due };
            self.board
                .set_date_field(&ctx.project_id, &item.id, end, target)
                .await?;
        }

        Ok(item.created)
    }
}
