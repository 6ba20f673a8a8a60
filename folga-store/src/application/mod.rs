pub mod dto;
pub mod leave_service;
pub mod time;
