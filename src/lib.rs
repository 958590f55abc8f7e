#![allow(non_snake_case)]

pub mod cli;
pub mod clients;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod runtime;
pub mod service;
pub mod storage;
pub mod tasks;
