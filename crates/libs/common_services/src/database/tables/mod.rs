pub mod favorite;
pub mod gallery;
pub mod invite;
