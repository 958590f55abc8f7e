pub mod audio;
pub mod event_service;
pub mod event_store;
pub mod notification_session;
pub mod notifier_service;
pub mod reminder_engine;
pub mod reminder_evaluator;
pub mod reminder_message;
