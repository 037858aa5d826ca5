pub mod dispatcher;
pub mod reconciler;
