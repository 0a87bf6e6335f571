pub mod pagination;
pub mod session;
