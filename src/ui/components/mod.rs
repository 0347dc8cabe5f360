pub mod project_card;
