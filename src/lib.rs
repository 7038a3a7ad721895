pub mod accounting;
pub mod data;
pub mod dates;
pub mod profile;
