// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod agent;
pub mod audit;
pub mod errors;
pub mod pagination;
pub mod repositories;
