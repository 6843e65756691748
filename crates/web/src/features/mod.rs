pub mod athletes;
