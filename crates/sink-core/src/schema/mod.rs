pub mod coerce;
pub mod translate;
