pub mod leads;
pub mod map;
pub mod normalizer;
