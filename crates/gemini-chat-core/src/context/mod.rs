mod history;

pub use history::Transcript;
