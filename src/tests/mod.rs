//! End-to-end tests against a mocked Elasticsearch cluster.

mod sweep_e2e;
