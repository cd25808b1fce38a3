pub mod api_steps;
pub mod web_steps;
