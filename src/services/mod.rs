pub mod alert_service;
pub mod answer_service;
pub mod moderation_service;
pub mod question_service;
pub mod subscription_service;
pub mod vote_service;
