pub mod content;
pub mod twilio;
