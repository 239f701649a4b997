pub mod answer;
pub mod course;
pub mod question;
pub mod subscription;
pub mod user;
pub mod visualization;
pub mod vote;
