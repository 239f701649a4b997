pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::{
    alert_service::{AlertDispatcher, WebhookAlertDispatcher},
    answer_service::AnswerService,
    moderation_service::ModerationService,
    question_service::QuestionService,
    subscription_service::SubscriptionService,
    vote_service::VoteService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub question_service: QuestionService,
    pub answer_service: AnswerService,
    pub vote_service: VoteService,
    pub moderation_service: ModerationService,
    pub subscription_service: SubscriptionService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let dispatcher: Arc<dyn AlertDispatcher> = Arc::new(WebhookAlertDispatcher::new(
            config.alert_webhook_url.clone(),
        ));
        Self::with_dispatcher(pool, dispatcher, config.base_url.clone())
    }

    /// Wires the services around an explicit dispatcher and base URL, so
    /// tests can substitute the messaging boundary.
    pub fn with_dispatcher(
        pool: PgPool,
        dispatcher: Arc<dyn AlertDispatcher>,
        base_url: String,
    ) -> Self {
        let question_service = QuestionService::new(pool.clone());
        let answer_service = AnswerService::new(pool.clone(), dispatcher, base_url);
        let vote_service = VoteService::new(pool.clone());
        let moderation_service = ModerationService::new(pool.clone());
        let subscription_service = SubscriptionService::new(pool.clone());

        Self {
            pool,
            question_service,
            answer_service,
            vote_service,
            moderation_service,
            subscription_service,
        }
    }
}
