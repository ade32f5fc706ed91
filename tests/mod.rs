mod mirror_mock;

// Integration tests grouped by concern:
// - smoke_tests: configuration and wiring that needs no network
// - mirror_mock: reconciliation against an in-memory channel
// - calendar_api_mock: the calendar client against a mocked HTTP API
