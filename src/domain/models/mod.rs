pub mod message;
pub mod template;

pub use message::{DeliveryStatus, MessageRecord, ProviderStatusUpdate};
pub use template::{Template, TemplateCategory, TemplateStatus};
