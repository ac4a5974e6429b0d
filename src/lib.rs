pub mod configuration;
pub mod container;
pub mod domain;
pub mod outbound;
pub mod provider;
pub mod startup;
