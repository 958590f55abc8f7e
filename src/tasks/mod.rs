pub mod command_reader;
pub mod reminder_loop;
pub mod task_runner;
