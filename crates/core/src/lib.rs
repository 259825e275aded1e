//! # Repas Core
//!
//! Core business logic for the Repas meal planner.
//!
//! This crate contains the workflows and the seams they talk through:
//! - Recipe creation with an optional image or PDF attachment, and listing with signed links
//! - The weekly planning grid and its per-slot assignment
//! - Page routing and flash notices, held in an explicit [`Session`]
//! - Table storage behind [`repositories::RowStore`], media storage behind
//!   [`repas_files::StorageGateway`]
//!
//! **No HTTP concerns**: page rendering, cookies and the JSON API belong in `repas-web`.

pub mod backend;
pub mod config;
pub mod constants;
pub mod error;
pub mod planning;
pub mod recipes;
pub mod repositories;
pub mod session;

pub use backend::Backend;
pub use config::{BackendMode, CoreConfig};
pub use error::{RepasError, RepasResult};
pub use planning::{AssignOutcome, PlanningAssignment, PlanningService};
pub use recipes::{
    CreateOutcome, NewRecipe, Recipe, RecipeChoice, RecipeService, RecipeView, UploadedFile,
};
pub use session::{Notice, NoticeLevel, Page, Session};

pub use repas_types::{BackendCredentials, DaySlot, NonEmptyText};
pub use repas_uuid::RecipeId;
