pub mod job_tracker;

pub use job_tracker::JobTracker;
