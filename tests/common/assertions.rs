//! Assertion helpers that give better failure messages than bare `unwrap()`.

/// Assert that a result is Ok and return the inner value.
#[allow(dead_code)]
pub fn assert_ok<T, E: std::fmt::Display>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("{} failed: {}", context, e),
    }
}

/// Assert that an error message (including its source chain) contains
/// `expected_text`, ignoring case.
#[allow(dead_code)]
pub fn assert_error_contains<E: std::error::Error>(error: &E, expected_text: &str, context: &str) {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    assert!(
        message.to_lowercase().contains(&expected_text.to_lowercase()),
        "{}: error message should contain '{}', got: {}",
        context,
        expected_text,
        message
    );
}
