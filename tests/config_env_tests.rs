//! Kept in its own binary: it mutates the process environment.

use tradestate::error::{ConfigError, Error};
use tradestate::infrastructure::config::settings::{Config, REDIS_URL_ENV};

#[test]
fn redis_url_env_overrides_and_is_validated() {
    std::env::set_var(REDIS_URL_ENV, "redis://cache.internal:6380/1");
    let config = Config::parse_toml("[store]\nurl = \"redis://localhost:6379\"\n");
    assert_eq!(
        config.unwrap().store.url.as_deref(),
        Some("redis://cache.internal:6380/1")
    );

    std::env::set_var(REDIS_URL_ENV, "memcached://cache.internal");
    let result = Config::parse_toml("");
    std::env::remove_var(REDIS_URL_ENV);

    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidValue { field: "url", .. }))
    ));
}
