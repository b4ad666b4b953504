pub mod flight;
pub(crate) mod lock;

pub use flight::SingleFlight;
