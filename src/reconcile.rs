pub mod driver;
pub mod output;
pub mod prompt;
pub mod recovery;
