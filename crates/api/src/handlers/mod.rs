pub mod planning;
pub mod templates;
