//! End-to-end service tests against a real Postgres instance. Each test
//! skips itself when DATABASE_URL is not configured so the pure-logic suite
//! still runs in environments without a database.

use std::sync::{Arc, Mutex};

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use forum_backend::dto::forum_dto::CreateQuestionPayload;
use forum_backend::error::Error;
use forum_backend::models::course::Lesson;
use forum_backend::models::question::Question;
use forum_backend::models::user::User;
use forum_backend::models::vote::VoteTarget;
use forum_backend::services::alert_service::{
    AlertDispatcher, DeliveryReport, DispatchFuture, OutboundAlert,
};
use forum_backend::services::answer_service::AnswerService;
use forum_backend::services::moderation_service::ModerationService;
use forum_backend::services::question_service::QuestionService;
use forum_backend::services::subscription_service::SubscriptionService;
use forum_backend::services::vote_service::VoteService;

#[derive(Clone, Default)]
struct RecordingDispatcher {
    sent: Arc<Mutex<Vec<OutboundAlert>>>,
}

impl AlertDispatcher for RecordingDispatcher {
    fn send<'a>(&'a self, alert: &'a OutboundAlert) -> DispatchFuture<'a> {
        Box::pin(async move {
            self.sent.lock().unwrap().push(alert.clone());
            Ok(DeliveryReport {
                accepted: true,
                recipients: alert.recipients.len(),
            })
        })
    }
}

/// Stand-in for an alert channel that is down.
struct FailingDispatcher;

impl AlertDispatcher for FailingDispatcher {
    fn send<'a>(&'a self, _alert: &'a OutboundAlert) -> DispatchFuture<'a> {
        Box::pin(async move { Err(Error::Dispatch("webhook unreachable".to_string())) })
    }
}

async fn try_pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .ok()?;
    sqlx::migrate!("./migrations").run(&pool).await.ok()?;
    Some(pool)
}

async fn seed_user(pool: &PgPool, prefix: &str, moderator: bool) -> Uuid {
    let id = Uuid::new_v4();
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, email, moderator)
        VALUES ($1, $2, $3, $4)
        RETURNING id, username, email, moderator, created_at
        "#,
    )
    .bind(id)
    .bind(format!("{}-{}", prefix, id))
    .bind(format!("{}_{}@example.com", prefix, id))
    .bind(moderator)
    .fetch_one(pool)
    .await
    .expect("seed user");
    user.id
}

async fn seed_lesson(pool: &PgPool, course_id: Uuid) -> Lesson {
    let id = Uuid::new_v4();
    sqlx::query_as::<_, Lesson>(
        r#"
        INSERT INTO lessons (id, course_id, name, slug)
        VALUES ($1, $2, $3, $4)
        RETURNING id, course_id, name, slug, created_at
        "#,
    )
    .bind(id)
    .bind(course_id)
    .bind("Light and color")
    .bind(format!("light-and-color-{}", id))
    .fetch_one(pool)
    .await
    .expect("seed lesson")
}

async fn seed_course(pool: &PgPool, professor_id: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO courses (id, name, slug, professor_id) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind("Physics 101")
        .bind(format!("physics-101-{}", id))
        .bind(professor_id)
        .execute(pool)
        .await
        .expect("seed course");
    id
}

async fn seed_question(pool: &PgPool, user_id: Uuid, course_id: Uuid, title: &str) -> Question {
    QuestionService::new(pool.clone())
        .create(
            user_id,
            CreateQuestionPayload {
                title: title.to_string(),
                text: "Body".to_string(),
                course_id,
                lesson_id: None,
            },
        )
        .await
        .expect("seed question")
}

#[tokio::test]
async fn repeated_votes_keep_a_single_row() {
    let Some(pool) = try_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let professor = seed_user(&pool, "prof", false).await;
    let course = seed_course(&pool, professor).await;
    let alice = seed_user(&pool, "alice", false).await;
    let question = seed_question(&pool, alice, course, "Vote upsert").await;

    let votes = VoteService::new(pool.clone());
    let target = VoteTarget::Question(question.id);

    votes.cast(alice, target, 1).await.expect("cast +1");
    votes.cast(alice, target, -1).await.expect("cast -1");

    let rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM question_votes WHERE question_id = $1")
            .bind(question.id)
            .fetch_one(&pool)
            .await
            .expect("count");
    assert_eq!(rows, 1);

    let totals = votes.totals(target).await.expect("totals");
    assert_eq!(totals.votes, -1);
    assert_eq!(totals.likes, 0);
    assert_eq!(totals.unlikes, 1);
    assert_eq!(votes.current_value(alice, target).await.expect("value"), -1);
}

#[tokio::test]
async fn zero_votes_count_in_neither_bucket() {
    let Some(pool) = try_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let professor = seed_user(&pool, "prof", false).await;
    let course = seed_course(&pool, professor).await;
    let author = seed_user(&pool, "author", false).await;
    let liker = seed_user(&pool, "liker", false).await;
    let fencesitter = seed_user(&pool, "neutral", false).await;
    let question = seed_question(&pool, author, course, "Zero votes").await;

    let votes = VoteService::new(pool.clone());
    let target = VoteTarget::Question(question.id);
    votes.cast(liker, target, 1).await.expect("like");
    votes.cast(fencesitter, target, 0).await.expect("neutral");

    let totals = votes.totals(target).await.expect("totals");
    // Two distinct voters, but only one lands in a bucket.
    assert_eq!(totals.likes + totals.unlikes, 1);
    assert_eq!(totals.votes, 1);

    assert!(matches!(
        votes.cast(liker, target, 5).await,
        Err(Error::InvalidVoteValue(5))
    ));
}

#[tokio::test]
async fn new_answer_alerts_subscribers_but_never_the_author() {
    let Some(pool) = try_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let professor = seed_user(&pool, "prof", false).await;
    let course = seed_course(&pool, professor).await;
    let a = seed_user(&pool, "a", false).await;
    let b = seed_user(&pool, "b", false).await;
    let c = seed_user(&pool, "c", false).await;
    let d = seed_user(&pool, "d", false).await;
    let question = seed_question(&pool, a, course, "Why is the sky blue?").await;

    let subscriptions = SubscriptionService::new(pool.clone());
    subscriptions.subscribe(b, question.id).await.expect("b");
    // Subscribing twice is idempotent.
    subscriptions.subscribe(b, question.id).await.expect("b again");
    subscriptions.subscribe(c, question.id).await.expect("c");

    let dispatcher = RecordingDispatcher::default();
    let answers = AnswerService::new(
        pool.clone(),
        Arc::new(dispatcher.clone()),
        "https://campus.example.com".to_string(),
    );
    let answer = answers
        .create(question.id, d, "Rayleigh scattering.")
        .await
        .expect("answer persists");
    assert_eq!(answer.question_id, question.id);

    let subscribers = subscriptions
        .list_subscribers(question.id)
        .await
        .expect("subscribers");
    let ids: Vec<Uuid> = subscribers.iter().map(|s| s.user_id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&b) && ids.contains(&c));

    let sent = dispatcher.sent.lock().unwrap();
    assert_eq!(sent.len(), 1, "exactly one batched alert");
    assert_eq!(sent[0].recipients.len(), 2);
    assert!(sent[0].recipients.contains(&b));
    assert!(sent[0].recipients.contains(&c));
    assert!(!sent[0].recipients.contains(&d));
    assert_eq!(sent[0].sender_id, professor);
    assert!(sent[0]
        .message
        .contains("The question 'Why is the sky blue?' has a new answer."));
}

#[tokio::test]
async fn correct_answer_designation_checks_ownership_and_is_idempotent() {
    let Some(pool) = try_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let professor = seed_user(&pool, "prof", false).await;
    let course = seed_course(&pool, professor).await;
    let asker = seed_user(&pool, "asker", false).await;
    let helper = seed_user(&pool, "helper", false).await;
    let question = seed_question(&pool, asker, course, "Ownership").await;
    let other_question = seed_question(&pool, asker, course, "Borrowing").await;

    let dispatcher = RecordingDispatcher::default();
    let answers = AnswerService::new(
        pool.clone(),
        Arc::new(dispatcher),
        "http://localhost".to_string(),
    );
    let own_answer = answers
        .create(question.id, helper, "Move semantics.")
        .await
        .expect("answer");
    let foreign_answer = answers
        .create(other_question.id, helper, "References.")
        .await
        .expect("answer");

    let questions = QuestionService::new(pool.clone());

    let err = questions
        .designate_correct_answer(question.id, foreign_answer.id)
        .await
        .expect_err("foreign answer must be rejected");
    assert!(matches!(err, Error::AnswerMismatch));

    let updated = questions
        .designate_correct_answer(question.id, own_answer.id)
        .await
        .expect("designation");
    assert_eq!(updated.correct_answer_id, Some(own_answer.id));

    // Calling again with the same answer is a no-op, not an error.
    let repeated = questions
        .designate_correct_answer(question.id, own_answer.id)
        .await
        .expect("idempotent");
    assert_eq!(repeated.correct_answer_id, Some(own_answer.id));
}

#[tokio::test]
async fn views_are_counted_per_event_not_per_viewer() {
    let Some(pool) = try_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let professor = seed_user(&pool, "prof", false).await;
    let course = seed_course(&pool, professor).await;
    let asker = seed_user(&pool, "asker", false).await;
    let reader = seed_user(&pool, "reader", false).await;
    let question = seed_question(&pool, asker, course, "View counting").await;

    let questions = QuestionService::new(pool.clone());
    questions
        .record_view(question.id, reader)
        .await
        .expect("first view");
    questions
        .record_view(question.id, reader)
        .await
        .expect("second view");

    let meta = questions.get_with_meta(question.id).await.expect("meta");
    assert_eq!(meta.visualizations, 2);
}

#[tokio::test]
async fn hiding_requires_justification_and_unhiding_clears_it() {
    let Some(pool) = try_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let professor = seed_user(&pool, "prof", false).await;
    let course = seed_course(&pool, professor).await;
    let asker = seed_user(&pool, "asker", false).await;
    let moderator = seed_user(&pool, "mod", true).await;
    let question = seed_question(&pool, asker, course, "Moderation lifecycle").await;

    let moderation = ModerationService::new(pool.clone());

    let err = moderation
        .hide_question(question.id, moderator, "   ")
        .await
        .expect_err("blank justification rejected");
    assert!(matches!(err, Error::MissingJustification));

    moderation
        .hide_question(question.id, moderator, "duplicate of another thread")
        .await
        .expect("hide");

    let questions = QuestionService::new(pool.clone());
    let hidden = questions.get_by_id(question.id).await.expect("load");
    assert!(hidden.hidden);
    assert_eq!(hidden.hidden_by, Some(moderator));
    assert_eq!(
        hidden.hidden_justification.as_deref(),
        Some("duplicate of another thread")
    );
    let stranger = seed_user(&pool, "stranger", false).await;
    assert!(hidden.hidden_to_user(stranger, false));
    assert!(!hidden.hidden_to_user(moderator, true));
    assert!(!hidden.hidden_to_user(asker, false));

    moderation
        .unhide_question(question.id)
        .await
        .expect("unhide");
    let visible = questions.get_by_id(question.id).await.expect("load");
    assert!(!visible.hidden);
    assert_eq!(visible.hidden_by, None);
    assert_eq!(visible.hidden_justification, None);
}

#[tokio::test]
async fn slugs_stay_unique_per_title() {
    let Some(pool) = try_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let professor = seed_user(&pool, "prof", false).await;
    let course = seed_course(&pool, professor).await;
    let asker = seed_user(&pool, "asker", false).await;

    // Unique title per run; the table persists across test runs.
    let title = format!("Slug collision {}", Uuid::new_v4());
    let first = seed_question(&pool, asker, course, &title).await;
    let second = seed_question(&pool, asker, course, &title).await;

    assert_ne!(first.slug, second.slug);
    assert!(second.slug.starts_with(&first.slug));
    assert!(second.slug.ends_with("-2"));

    let third = seed_question(&pool, asker, course, &title).await;
    assert!(third.slug.ends_with("-3"));

    // A title whose slug happens to end in a counter must not steal the
    // suffix from an unrelated shorter title: "... 2" occupies "...-2", and
    // the plain title still gets the bare slug afterwards.
    let stem = format!("Numbered title {}", Uuid::new_v4());
    let numbered = seed_question(&pool, asker, course, &format!("{stem} 2")).await;
    let plain = seed_question(&pool, asker, course, &stem).await;
    assert!(numbered.slug.ends_with("-2"));
    assert_eq!(format!("{}-2", plain.slug), numbered.slug);

    // Questions can also be attached to a lesson within the course.
    let lesson = seed_lesson(&pool, course).await;
    let attached = QuestionService::new(pool.clone())
        .create(
            asker,
            CreateQuestionPayload {
                title: format!("Lesson question {}", Uuid::new_v4()),
                text: "Body".to_string(),
                course_id: course,
                lesson_id: Some(lesson.id),
            },
        )
        .await
        .expect("question with lesson");
    assert_eq!(attached.lesson_id, Some(lesson.id));
}

#[tokio::test]
async fn answer_survives_a_failed_alert_dispatch() {
    let Some(pool) = try_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let professor = seed_user(&pool, "prof", false).await;
    let course = seed_course(&pool, professor).await;
    let asker = seed_user(&pool, "asker", false).await;
    let follower = seed_user(&pool, "follower", false).await;
    let helper = seed_user(&pool, "helper", false).await;
    let question = seed_question(&pool, asker, course, "Broken webhook").await;

    SubscriptionService::new(pool.clone())
        .subscribe(follower, question.id)
        .await
        .expect("subscribe");

    let answers = AnswerService::new(
        pool.clone(),
        Arc::new(FailingDispatcher),
        "https://campus.example.com".to_string(),
    );
    let answer = answers
        .create(question.id, helper, "Still worth saving.")
        .await
        .expect("answer persists even when the alert channel is down");

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM answers WHERE id = $1")
        .bind(answer.id)
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(stored, 1);
}
