pub mod agent;
pub mod story;
pub mod workflow;
