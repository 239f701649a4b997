pub mod forum_dto;
