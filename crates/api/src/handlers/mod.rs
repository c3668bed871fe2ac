pub mod catalog;
pub mod generate;
pub mod images;
pub mod logs;
pub mod metadata;
pub mod publish;
