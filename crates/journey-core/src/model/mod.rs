pub mod answer;
pub mod chapter;
pub mod choice;
pub mod gset;
