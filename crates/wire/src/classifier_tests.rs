// SPDX-License-Identifier: MIT

use super::*;
use yare::parameterized;

#[parameterized(
    server_error = { CoordinatorError::ServerError { status: 503, body: String::new() }, true },
    rate_limited = { CoordinatorError::ServerError { status: 429, body: String::new() }, true },
    not_found = { CoordinatorError::Rejected { status: 404, body: String::new() }, false },
    unauthorized = { CoordinatorError::Rejected { status: 401, body: String::new() }, false },
)]
fn classifies_http_errors(err: CoordinatorError, expected_retryable: bool) {
    assert_eq!(HttpRetryClassifier.is_retryable(&err), expected_retryable);
}
