// End-to-end tests for the speech client
//
// Each test starts its own in-process mock of the speech endpoint on an
// ephemeral port and points a real client at it through the endpoint
// override, so tests are isolated and run in parallel.

mod helpers;
mod test_buffered;
mod test_errors;
mod test_reload;
