pub mod media;
pub mod parsing;
pub mod url;

#[cfg(test)]
mod media_test;
