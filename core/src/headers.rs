//! Request header composition
//!
//! Every request starts from the user supplied headers. Computed defaults are
//! only added when the user did not provide a header of the same name
//! (compared case-insensitively). Three of them are randomized per request so
//! that consecutive requests do not look identical to the target.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{ConfigError, SimulationSpec};

const CACHE_CONTROL: &str = "Cache-Control";
const ACCEPT_CHARSET: &str = "Accept-Charset";
const HOST: &str = "Host";
const USER_AGENT: &str = "User-Agent";
const KEEP_ALIVE: &str = "Keep-Alive";
const REFERER: &str = "Referer";

/// Read-only lookup data for the randomized headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderTables {
    /// Candidate `User-Agent` values
    pub user_agents: Vec<String>,
    /// Candidate `Referer` prefixes, a random token is appended to each pick
    pub referrers: Vec<String>,
}

impl HeaderTables {
    /// Build tables from explicit lists
    pub fn new(user_agents: Vec<String>, referrers: Vec<String>) -> Self {
        Self {
            user_agents,
            referrers,
        }
    }
}

impl Default for HeaderTables {
    fn default() -> Self {
        let user_agents = [
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
            "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1",
            "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36",
        ];
        let referrers = [
            "http://www.google.com/?q=",
            "http://www.bing.com/search?q=",
            "http://search.yahoo.com/search?p=",
            "http://www.usatoday.com/search/results?q=",
            "http://engadget.search.aol.com/search?q=",
        ];
        Self {
            user_agents: user_agents.iter().map(|s| s.to_string()).collect(),
            referrers: referrers.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Ordered header list with case-insensitive lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a header with this name exists, ignoring case
    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    /// Value of the first header with this name, ignoring case
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Append a header unconditionally
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Append a header unless one with the same name is already present.
    /// Returns whether the header was added.
    pub fn insert_if_absent(&mut self, name: &str, value: impl Into<String>) -> bool {
        if self.contains(name) {
            return false;
        }
        self.append(name, value);
        true
    }

    /// Iterate over `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of headers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Which randomized headers to add
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderOptions {
    /// Random `Referer`
    pub auto_referer: bool,
    /// Random `User-Agent`
    pub auto_user_agent: bool,
    /// Random `Keep-Alive`
    pub auto_keep_alive: bool,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            auto_referer: true,
            auto_user_agent: true,
            auto_keep_alive: true,
        }
    }
}

impl From<&SimulationSpec> for HeaderOptions {
    fn from(spec: &SimulationSpec) -> Self {
        Self {
            auto_referer: spec.auto_referer,
            auto_user_agent: spec.auto_user_agent,
            auto_keep_alive: spec.auto_keep_alive,
        }
    }
}

/// Builds the header set of every request of a simulation
///
/// The static part (user headers plus `Cache-Control`, `Accept-Charset` and
/// `Host`) is computed once; [`HeaderComposer::compose`] adds the randomized
/// part per request.
#[derive(Debug, Clone)]
pub struct HeaderComposer {
    base: HeaderSet,
    options: HeaderOptions,
    tables: Arc<HeaderTables>,
}

impl HeaderComposer {
    /// Create a composer for the given user headers and target host
    pub fn new(
        user_headers: &BTreeMap<String, String>,
        hostname: &str,
        options: HeaderOptions,
        tables: Arc<HeaderTables>,
    ) -> Self {
        let mut base: HeaderSet = user_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        base.insert_if_absent(CACHE_CONTROL, "no-cache");
        base.insert_if_absent(ACCEPT_CHARSET, "utf-8;q=0.7,*;q=0.7");
        base.insert_if_absent(HOST, hostname);

        Self {
            base,
            options,
            tables,
        }
    }

    /// Create a composer from a simulation spec
    pub fn from_spec(spec: &SimulationSpec, tables: Arc<HeaderTables>) -> Result<Self, ConfigError> {
        let target = spec.target()?;
        let hostname = target.host_str().unwrap_or_default();
        Ok(Self::new(
            &spec.headers,
            hostname,
            HeaderOptions::from(spec),
            tables,
        ))
    }

    /// Headers shared by every request
    pub fn base(&self) -> &HeaderSet {
        &self.base
    }

    /// Full header set for one request, using the thread-local RNG
    pub fn compose(&self) -> HeaderSet {
        self.compose_with(&mut rand::thread_rng())
    }

    /// Full header set for one request, drawing from `rng`
    pub fn compose_with<R: Rng + ?Sized>(&self, rng: &mut R) -> HeaderSet {
        let mut headers = self.base.clone();

        if self.options.auto_user_agent && !headers.contains(USER_AGENT) {
            if let Some(agent) = self.tables.user_agents.choose(rng) {
                headers.append(USER_AGENT, agent.clone());
            }
        }

        if self.options.auto_keep_alive && !headers.contains(KEEP_ALIVE) {
            let seconds: u32 = rng.gen_range(110..=120);
            headers.append(KEEP_ALIVE, seconds.to_string());
        }

        if self.options.auto_referer && !headers.contains(REFERER) {
            if let Some(referrer) = self.tables.referrers.choose(rng) {
                let token = random_token(rng);
                headers.append(
                    REFERER,
                    format!("{referrer}{}", urlencoding::encode(&token)),
                );
            }
        }

        headers
    }
}

/// Three characters with codes drawn from `[5,35)`, `[5,65)` and `[10,80)`
fn random_token<R: Rng + ?Sized>(rng: &mut R) -> String {
    [(5u8, 35u8), (5, 65), (10, 80)]
        .iter()
        .map(|&(low, high)| char::from(rng.gen_range(low..high)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn composer(user: &[(&str, &str)], options: HeaderOptions) -> HeaderComposer {
        let headers = user
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        HeaderComposer::new(
            &headers,
            "domain.com",
            options,
            Arc::new(HeaderTables::default()),
        )
    }

    fn no_auto() -> HeaderOptions {
        HeaderOptions {
            auto_referer: false,
            auto_user_agent: false,
            auto_keep_alive: false,
        }
    }

    #[test]
    fn test_base_defaults() {
        let composer = composer(&[], no_auto());
        let headers = composer.compose();

        assert_eq!(headers.get("cache-control"), Some("no-cache"));
        assert_eq!(headers.get("accept-charset"), Some("utf-8;q=0.7,*;q=0.7"));
        assert_eq!(headers.get("host"), Some("domain.com"));
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_user_headers_win_case_insensitively() {
        let composer = composer(
            &[
                ("cache-control", "max-age=10"),
                ("HOST", "other.com"),
                ("user-agent", "custom"),
                ("keep-alive", "5"),
                ("referer", "http://me"),
            ],
            HeaderOptions::default(),
        );
        let headers = composer.compose();

        assert_eq!(headers.get("Cache-Control"), Some("max-age=10"));
        assert_eq!(headers.get("Host"), Some("other.com"));
        assert_eq!(headers.get("User-Agent"), Some("custom"));
        assert_eq!(headers.get("Keep-Alive"), Some("5"));
        assert_eq!(headers.get("Referer"), Some("http://me"));
        // user headers plus Accept-Charset only
        assert_eq!(headers.len(), 6);
    }

    #[test]
    fn test_random_headers_present_when_enabled() {
        let tables = HeaderTables::default();
        let composer = composer(&[], HeaderOptions::default());
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let headers = composer.compose_with(&mut rng);

            let agent = headers.get("user-agent").unwrap();
            assert!(tables.user_agents.iter().any(|a| a == agent));

            let keep_alive: u32 = headers.get("keep-alive").unwrap().parse().unwrap();
            assert!((110..=120).contains(&keep_alive));

            let referer = headers.get("referer").unwrap();
            assert!(tables.referrers.iter().any(|r| referer.starts_with(r.as_str())));
        }
    }

    #[test]
    fn test_random_headers_absent_when_disabled() {
        let composer = composer(&[], no_auto());
        let headers = composer.compose();
        assert!(!headers.contains("user-agent"));
        assert!(!headers.contains("keep-alive"));
        assert!(!headers.contains("referer"));
    }

    #[test]
    fn test_empty_tables_skip_headers() {
        let composer = HeaderComposer::new(
            &BTreeMap::new(),
            "domain.com",
            HeaderOptions::default(),
            Arc::new(HeaderTables::new(Vec::new(), Vec::new())),
        );
        let headers = composer.compose();
        assert!(!headers.contains("user-agent"));
        assert!(!headers.contains("referer"));
        assert!(headers.contains("keep-alive"));
    }

    #[test]
    fn test_random_token_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let codes: Vec<u32> = random_token(&mut rng).chars().map(u32::from).collect();
            assert_eq!(codes.len(), 3);
            assert!((5..35).contains(&codes[0]));
            assert!((5..65).contains(&codes[1]));
            assert!((10..80).contains(&codes[2]));
        }
    }

    #[test]
    fn test_compose_is_deterministic_for_a_seed() {
        let composer = composer(&[], HeaderOptions::default());
        let a = composer.compose_with(&mut StdRng::seed_from_u64(1));
        let b = composer.compose_with(&mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_spec_uses_hostname() {
        let spec = SimulationSpec::new("http://127.0.0.1:8123/success", "GET");
        let composer =
            HeaderComposer::from_spec(&spec, Arc::new(HeaderTables::default())).unwrap();
        assert_eq!(composer.base().get("host"), Some("127.0.0.1"));
    }
}
