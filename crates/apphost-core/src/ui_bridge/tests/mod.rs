// UI bridge test module
#[cfg(test)]
mod hosted_tests;
