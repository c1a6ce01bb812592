pub mod outcome;
pub mod submission;
