mod athlete;

pub use athlete::Athlete;
