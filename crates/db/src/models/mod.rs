//! Document models and create DTOs.

pub mod project;
pub mod sample;
pub mod user;

pub use project::{CreateProject, Division, Project};
pub use sample::{Comment, NewSample, Sample};
pub use user::User;
