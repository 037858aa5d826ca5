pub mod create_template;
pub mod enqueue_bulk;
pub mod get_message;
pub mod list_messages;
pub mod submit_template;
pub mod sync_template_approval;
