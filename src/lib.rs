pub mod audit;
pub mod chat;
pub mod config;
pub mod db;
pub mod dto;
pub mod email;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod search;
pub mod services;
pub mod state;
pub mod tier;
