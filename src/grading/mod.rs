//! Course grade computation.
//!
//! Records are grouped by category, averaged within each category, then
//! weighted and normalized by the weights of the categories that had grades.
//! [`Gradebook`] ties the computation to a [`RecordStore`](crate::services::record_store::RecordStore).

pub mod aggregate;
pub mod grade;
mod gradebook;
pub mod types;
pub mod utility;

pub use gradebook::Gradebook;
