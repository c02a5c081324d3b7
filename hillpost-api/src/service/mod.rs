pub mod query;
pub mod write;

#[cfg(test)]
pub(crate) mod fakes;
