use std::time::Duration;

/// `SameSite` values a cookie can carry; mirrors the handful of values
/// browsers actually implement.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// One cookie's attributes, encoded as a plain struct rather than an
/// HTTP response — the out-of-scope router sets these literally
/// (spec.md §6: `access`/`refresh` cookie pair).
#[derive(Clone, Debug)]
pub struct CookieAttributes {
    pub name: String,
    pub value: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age: Duration,
}

impl CookieAttributes {
    /// Renders as a `Set-Cookie` header value, for callers that do own
    /// an HTTP layer and want to set it literally.
    pub fn to_header_value(&self) -> String {
        let mut parts = vec![format!("{}={}", self.name, self.value)];
        parts.push(format!("Path={}", self.path));
        parts.push(format!("Max-Age={}", self.max_age.as_secs()));
        parts.push(format!("SameSite={}", self.same_site.as_str()));
        if self.http_only {
            parts.push("HttpOnly".to_string());
        }
        if self.secure {
            parts.push("Secure".to_string());
        }
        parts.join("; ")
    }
}

/// Tunables for the access/refresh cookie pair (spec.md §6/§9).
#[derive(Clone, Debug)]
pub struct CookieSessionConfig {
    pub secure: bool,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub refresh_path: String,
}

impl Default for CookieSessionConfig {
    fn default() -> Self {
        Self {
            secure: true,
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            refresh_path: "/api/auth".to_string(),
        }
    }
}

/// Builds the `access`/`refresh` cookie pair's attributes per spec.md
/// §6: `access` is HttpOnly, SameSite=Lax, Path=/, short TTL; `refresh`
/// is HttpOnly, Path=/api/auth, longer TTL. `Secure` is configurable.
pub struct CookieSessionCodec {
    config: CookieSessionConfig,
}

impl CookieSessionCodec {
    pub fn new(config: CookieSessionConfig) -> Self {
        Self { config }
    }

    pub fn access_cookie(&self, token: &str) -> CookieAttributes {
        CookieAttributes {
            name: "access".to_string(),
            value: token.to_string(),
            http_only: true,
            secure: self.config.secure,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age: self.config.access_ttl,
        }
    }

    pub fn refresh_cookie(&self, token: &str) -> CookieAttributes {
        CookieAttributes {
            name: "refresh".to_string(),
            value: token.to_string(),
            http_only: true,
            secure: self.config.secure,
            same_site: SameSite::Lax,
            path: self.config.refresh_path.clone(),
            max_age: self.config.refresh_ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_cookie_is_http_only_and_site_wide() {
        let codec = CookieSessionCodec::new(CookieSessionConfig::default());
        let cookie = codec.access_cookie("tok");
        assert!(cookie.http_only);
        assert_eq!(cookie.path, "/");
        assert_eq!(cookie.same_site, SameSite::Lax);
    }

    #[test]
    fn refresh_cookie_is_scoped_to_auth_path() {
        let codec = CookieSessionCodec::new(CookieSessionConfig::default());
        let cookie = codec.refresh_cookie("tok");
        assert_eq!(cookie.path, "/api/auth");
        assert!(cookie.max_age > codec_access_ttl());
    }

    fn codec_access_ttl() -> Duration {
        CookieSessionConfig::default().access_ttl
    }

    #[test]
    fn header_value_includes_security_attributes() {
        let codec = CookieSessionCodec::new(CookieSessionConfig { secure: true, ..CookieSessionConfig::default() });
        let header = codec.access_cookie("tok").to_header_value();
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("SameSite=Lax"));
    }
}
