// src/services/rate_limit.rs
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u32,
    pub window_seconds: u32,
    pub whitelist_ips: Vec<String>,
    /// Peers whose `X-Forwarded-For` / `X-Real-IP` headers are believed
    pub trusted_proxies: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 3,   // 3 credential attempts...
            window_seconds: 5, // ...per 5 seconds per IP
            whitelist_ips: Vec::new(),
            trusted_proxies: Vec::new(),
        }
    }
}

impl RateLimitConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // RATE_LIMIT_ENABLED - set to "false" to disable rate limiting
        if let Ok(enabled) = env::var("RATE_LIMIT_ENABLED") {
            config.enabled = enabled.to_lowercase() != "false";
        }

        // RATE_LIMIT_MAX_REQUESTS - requests per window per IP address
        if let Ok(limit) = env::var("RATE_LIMIT_MAX_REQUESTS") {
            if let Ok(val) = limit.parse::<u32>() {
                config.max_requests = val;
            }
        }

        // RATE_LIMIT_WINDOW_SECONDS - time window in seconds
        if let Ok(window) = env::var("RATE_LIMIT_WINDOW_SECONDS") {
            if let Ok(val) = window.parse::<u32>() {
                config.window_seconds = val;
            }
        }

        // RATE_LIMIT_WHITELIST_IPS - comma-separated list of whitelisted IPs
        if let Ok(whitelist) = env::var("RATE_LIMIT_WHITELIST_IPS") {
            config.whitelist_ips = whitelist
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // RATE_LIMIT_TRUSTED_PROXIES - comma-separated reverse proxy addresses
        if let Ok(proxies) = env::var("RATE_LIMIT_TRUSTED_PROXIES") {
            config.trusted_proxies = proxies
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        config
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds as u64)
    }
}

#[derive(Debug, Clone)]
struct RateLimitState {
    count: u32,
    window_start: Instant,
}

impl RateLimitState {
    fn new() -> Self {
        Self {
            count: 0,
            window_start: Instant::now(),
        }
    }

    fn reset(&mut self) {
        self.count = 0;
        self.window_start = Instant::now();
    }

    fn is_expired(&self, window_duration: Duration) -> bool {
        self.window_start.elapsed() > window_duration
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    Limited { retry_after: u32 },
}

/// Fixed-window request counter keyed by client IP
#[derive(Debug, Clone)]
pub struct RateLimitService {
    config: RateLimitConfig,
    rate_limiter: Arc<RwLock<HashMap<String, RateLimitState>>>,
}

impl RateLimitService {
    pub fn new(config: RateLimitConfig) -> Self {
        info!(
            enabled = config.enabled,
            max_requests = config.max_requests,
            window_seconds = config.window_seconds,
            whitelist_ips = ?config.whitelist_ips,
            trusted_proxies = ?config.trusted_proxies,
            "Initializing RateLimitService"
        );
        Self {
            config,
            rate_limiter: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn is_trusted_proxy(&self, ip: &str) -> bool {
        self.config.trusted_proxies.iter().any(|proxy| proxy == ip)
    }

    fn is_whitelisted(&self, ip: &str) -> bool {
        self.config.whitelist_ips.iter().any(|whitelisted_ip| whitelisted_ip == ip)
    }

    /// Counts one request from `ip_address` and reports whether it may proceed
    pub async fn check_rate_limit(&self, ip_address: &str) -> RateLimitResult {
        if !self.config.enabled || self.is_whitelisted(ip_address) {
            return RateLimitResult::Allowed;
        }

        let key = format!("ip:{}", ip_address);
        self.check_limit_for_key(&key, self.config.max_requests, self.config.window())
            .await
    }

    async fn check_limit_for_key(
        &self,
        key: &str,
        limit: u32,
        window_duration: Duration,
    ) -> RateLimitResult {
        let mut limiter = self.rate_limiter.write().await;

        let state = limiter
            .entry(key.to_string())
            .or_insert_with(RateLimitState::new);

        if state.is_expired(window_duration) {
            state.reset();
        }

        if state.count >= limit {
            let elapsed = state.window_start.elapsed().as_secs() as u32;
            let retry_after = (window_duration.as_secs() as u32)
                .saturating_sub(elapsed)
                .max(1);
            return RateLimitResult::Limited { retry_after };
        }

        state.count += 1;
        RateLimitResult::Allowed
    }

    pub fn log_violation(&self, ip_address: &str, endpoint: &str) {
        warn!(
            ip_address = %ip_address,
            endpoint = %endpoint,
            "Rate limit violation detected"
        );
    }

    /// Clean up expired entries (called periodically from main)
    pub async fn cleanup_expired(&self) {
        let window = self.config.window();
        let mut limiter = self.rate_limiter.write().await;
        let before = limiter.len();
        limiter.retain(|_, state| !state.is_expired(window));
        debug!(removed = before - limiter.len(), "Cleaned up expired rate limit entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(max_requests: u32, window_seconds: u32) -> RateLimitService {
        RateLimitService::new(RateLimitConfig {
            enabled: true,
            max_requests,
            window_seconds,
            whitelist_ips: vec!["127.0.0.1".to_string()],
            trusted_proxies: Vec::new(),
        })
    }

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_requests, 3);
        assert_eq!(config.window_seconds, 5);
    }

    #[tokio::test]
    async fn test_blocks_after_max_requests() {
        let service = service(3, 60);

        for _ in 0..3 {
            assert_eq!(
                service.check_rate_limit("192.168.1.1").await,
                RateLimitResult::Allowed
            );
        }

        match service.check_rate_limit("192.168.1.1").await {
            RateLimitResult::Limited { retry_after } => assert!(retry_after >= 1 && retry_after <= 60),
            other => panic!("expected Limited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_separate_ips_have_separate_limits() {
        let service = service(1, 60);

        assert_eq!(service.check_rate_limit("10.0.0.1").await, RateLimitResult::Allowed);
        assert!(matches!(
            service.check_rate_limit("10.0.0.1").await,
            RateLimitResult::Limited { .. }
        ));
        assert_eq!(service.check_rate_limit("10.0.0.2").await, RateLimitResult::Allowed);
    }

    #[tokio::test]
    async fn test_whitelist_bypasses_rate_limit() {
        let service = service(1, 60);

        for _ in 0..10 {
            assert_eq!(service.check_rate_limit("127.0.0.1").await, RateLimitResult::Allowed);
        }
    }

    #[tokio::test]
    async fn test_disabled_allows_everything() {
        let service = RateLimitService::new(RateLimitConfig::disabled());

        for _ in 0..10 {
            assert_eq!(service.check_rate_limit("10.0.0.9").await, RateLimitResult::Allowed);
        }
    }

    #[tokio::test]
    async fn test_window_expiry_resets_count() {
        let service = service(1, 0);

        assert_eq!(service.check_rate_limit("10.0.0.3").await, RateLimitResult::Allowed);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(service.check_rate_limit("10.0.0.3").await, RateLimitResult::Allowed);

        service.cleanup_expired().await;
    }
}
