pub mod planner;
pub mod queue;
pub mod scoring;
