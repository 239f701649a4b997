pub mod answer_routes;
pub mod health;
pub mod question_routes;
