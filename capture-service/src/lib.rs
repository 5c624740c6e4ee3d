//! capture-service: ingestion, analysis, and deletion lifecycle for scanned
//! financial documents (invoices and purchase orders).

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod testing;
pub mod validation;
pub mod workers;
