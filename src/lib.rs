//! School document renderer
//!
//! Produces single-page report cards and weekly timetables as PDF, each
//! carrying a verification code, a tamper-evident hash and a QR code that
//! points at the verification endpoint.

pub mod batch;
mod blocks;
pub mod bulletin;
pub mod canvas;
pub mod config;
pub mod content;
pub mod error;
pub mod fetch;
pub mod fonts;
pub mod image_embed;
pub mod labels;
pub mod layout;
pub mod model;
pub mod primitives;
pub mod serializer;
pub mod timetable;
pub mod types;
pub mod verification;
mod winansi;

pub use batch::{generate_bulletins, BatchFailure, BatchOutput};
pub use bulletin::{generate_bulletin, GeneratedDocument};
pub use config::{Language, RenderOptions};
pub use error::{RendererError, RendererResult};
pub use model::{OrganizationRecord, StudentRecord, SubjectRow, TimetableRecord};
pub use timetable::generate_timetable;
pub use verification::VerificationMetadata;
