pub mod notifications;
pub mod shifts;
