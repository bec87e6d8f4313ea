#[cfg(test)]
mod sources_tests;
