pub mod scheduler;

pub use scheduler::TickScheduler;
