pub mod components;
pub mod projects;
pub mod startup;
