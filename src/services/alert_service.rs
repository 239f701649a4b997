use std::future::Future;
use std::pin::Pin;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::subscription::Subscriber;

/// One composed forum alert: a single batched message addressed to every
/// subscriber of a question, sent on behalf of the course professor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutboundAlert {
    pub subject: String,
    pub message: String,
    pub course_id: Uuid,
    /// Sender-of-record: forum alerts are routed through the course
    /// messaging feature, so the course professor signs them.
    pub sender_id: Uuid,
    pub recipients: Vec<Uuid>,
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub accepted: bool,
    pub recipients: usize,
}

pub type DispatchFuture<'a> = Pin<Box<dyn Future<Output = Result<DeliveryReport>> + Send + 'a>>;

/// Boundary to the external messaging channel. Delivery is best-effort from
/// the forum core's perspective; retry is the dispatcher's own concern.
pub trait AlertDispatcher: Send + Sync {
    fn send<'a>(&'a self, alert: &'a OutboundAlert) -> DispatchFuture<'a>;
}

/// Builds the alert for a new answer, or `None` when nobody is left to
/// notify. The answer's own author never receives their own alert.
pub fn compose_answer_alert(
    question_title: &str,
    question_slug: &str,
    course_id: Uuid,
    professor_id: Uuid,
    base_url: &str,
    subscribers: &[Subscriber],
    answer_author_id: Uuid,
) -> Option<OutboundAlert> {
    let recipients: Vec<Uuid> = subscribers
        .iter()
        .filter(|s| s.user_id != answer_author_id)
        .map(|s| s.user_id)
        .collect();

    if recipients.is_empty() {
        return None;
    }

    let link = format!(
        "{}/forum/question/{}",
        base_url.trim_end_matches('/'),
        question_slug
    );
    let message = format!(
        "The question '{}' has a new answer. Please access the link below to see this.\n\n{}",
        question_title, link
    );

    Some(OutboundAlert {
        subject: "A question that you follow has new answers".to_string(),
        message,
        course_id,
        sender_id: professor_id,
        recipients,
        link,
    })
}

/// Production dispatcher: POSTs the composed alert as JSON to the messaging
/// webhook, the same way other backend events leave this system.
#[derive(Clone)]
pub struct WebhookAlertDispatcher {
    client: Client,
    target_url: String,
}

impl WebhookAlertDispatcher {
    pub fn new(target_url: String) -> Self {
        Self {
            client: Client::new(),
            target_url,
        }
    }
}

impl AlertDispatcher for WebhookAlertDispatcher {
    fn send<'a>(&'a self, alert: &'a OutboundAlert) -> DispatchFuture<'a> {
        Box::pin(async move {
            let resp = self
                .client
                .post(&self.target_url)
                .json(alert)
                .send()
                .await
                .map_err(|e| Error::Dispatch(e.to_string()))?;

            if !resp.status().is_success() {
                return Err(Error::Dispatch(format!(
                    "webhook returned {}",
                    resp.status()
                )));
            }

            Ok(DeliveryReport {
                accepted: true,
                recipients: alert.recipients.len(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscriber(user_id: Uuid, username: &str) -> Subscriber {
        Subscriber {
            user_id,
            username: username.to_string(),
            email: format!("{}@example.com", username),
        }
    }

    #[test]
    fn composes_one_alert_for_all_subscribers() {
        let course = Uuid::new_v4();
        let professor = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let d = Uuid::new_v4();

        let alert = compose_answer_alert(
            "Why is the sky blue?",
            "why-is-the-sky-blue",
            course,
            professor,
            "https://campus.example.com/",
            &[subscriber(b, "b"), subscriber(c, "c")],
            d,
        )
        .expect("two recipients remain");

        assert_eq!(alert.recipients, vec![b, c]);
        assert_eq!(alert.sender_id, professor);
        assert_eq!(
            alert.link,
            "https://campus.example.com/forum/question/why-is-the-sky-blue"
        );
        assert!(alert
            .message
            .starts_with("The question 'Why is the sky blue?' has a new answer."));
        assert_eq!(alert.subject, "A question that you follow has new answers");
    }

    #[test]
    fn answer_author_is_never_a_recipient() {
        let course = Uuid::new_v4();
        let professor = Uuid::new_v4();
        let author = Uuid::new_v4();
        let other = Uuid::new_v4();

        let alert = compose_answer_alert(
            "T",
            "t",
            course,
            professor,
            "http://localhost",
            &[subscriber(author, "author"), subscriber(other, "other")],
            author,
        )
        .expect("one recipient remains");
        assert_eq!(alert.recipients, vec![other]);
    }

    #[test]
    fn no_alert_without_remaining_recipients() {
        let author = Uuid::new_v4();
        let alert = compose_answer_alert(
            "T",
            "t",
            Uuid::new_v4(),
            Uuid::new_v4(),
            "http://localhost",
            &[subscriber(author, "author")],
            author,
        );
        assert!(alert.is_none());

        let empty = compose_answer_alert(
            "T",
            "t",
            Uuid::new_v4(),
            Uuid::new_v4(),
            "http://localhost",
            &[],
            author,
        );
        assert!(empty.is_none());
    }
}
