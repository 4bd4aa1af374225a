pub mod create;
pub mod extract;
pub mod locate;
pub mod prune;
