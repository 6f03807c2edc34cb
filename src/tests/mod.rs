



#[cfg(test)]
mod lifecycle_tests;
