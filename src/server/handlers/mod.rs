pub mod chat;
pub mod documents;
pub mod health;

#[cfg(test)]
pub(crate) mod test_support;
