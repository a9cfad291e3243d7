//! Connection configuration.

use std::collections::HashMap;
use std::time::Duration;

/// Property names used in [`ConnectionConfig::properties`] and in the
/// request `PropertyList`.
pub mod property {
    /// Server endpoint.
    pub const URL: &str = "Url";
    /// Data source name as advertised by `DISCOVER_DATASOURCES`.
    pub const DATA_SOURCE_INFO: &str = "DataSourceInfo";
    /// Current catalog.
    pub const CATALOG: &str = "Catalog";
    /// Comma-separated role names.
    pub const ROLES: &str = "Roles";
    /// Locale identifier (LCID).
    pub const LOCALE_IDENTIFIER: &str = "LocaleIdentifier";
}

/// Settings shared by every statement created from one connection.
///
/// # Example
///
/// ```rust
/// use xmla_executor::ConnectionConfig;
/// use std::time::Duration;
///
/// let config = ConnectionConfig::builder()
///     .with_url("http://localhost:8080/xmla")
///     .with_data_source_info("Provider=Mondrian")
///     .with_catalog("FoodMart")
///     .with_locale(1033)
///     .with_timeout(Duration::from_secs(30))
///     .build();
///
/// assert_eq!(config.catalog.as_deref(), Some("FoodMart"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Server endpoint requests are submitted to.
    pub url: String,
    /// `DataSourceInfo` property (None = omitted from requests).
    pub data_source_info: Option<String>,
    /// Catalog (None = server default).
    pub catalog: Option<String>,
    /// Role restriction (None = no role).
    pub role: Option<String>,
    /// Locale identifier (None = server default).
    pub locale: Option<u32>,
    /// Default query timeout for new statements (None = wait indefinitely).
    pub timeout: Option<Duration>,
}

impl ConnectionConfig {
    /// Creates a new builder for ConnectionConfig.
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// Flat property map describing this connection.
    ///
    /// Handed to the response cache so that it can derive a session id.
    pub fn properties(&self) -> HashMap<String, String> {
        let mut props = HashMap::new();
        props.insert(property::URL.to_string(), self.url.clone());
        if let Some(dsi) = &self.data_source_info {
            props.insert(property::DATA_SOURCE_INFO.to_string(), dsi.clone());
        }
        if let Some(catalog) = &self.catalog {
            props.insert(property::CATALOG.to_string(), catalog.clone());
        }
        if let Some(role) = &self.role {
            props.insert(property::ROLES.to_string(), role.clone());
        }
        if let Some(locale) = self.locale {
            props.insert(property::LOCALE_IDENTIFIER.to_string(), locale.to_string());
        }
        props
    }
}

/// Builder for ConnectionConfig.
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    /// Sets the server URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Sets the `DataSourceInfo` property.
    pub fn with_data_source_info(mut self, info: impl Into<String>) -> Self {
        self.config.data_source_info = Some(info.into());
        self
    }

    /// Sets the catalog.
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.config.catalog = Some(catalog.into());
        self
    }

    /// Sets the role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.config.role = Some(role.into());
        self
    }

    /// Sets the locale identifier.
    pub fn with_locale(mut self, lcid: u32) -> Self {
        self.config.locale = Some(lcid);
        self
    }

    /// Sets the default query timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Builds the ConnectionConfig.
    pub fn build(self) -> ConnectionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_default() {
        let config = ConnectionConfig::default();
        assert!(config.url.is_empty());
        assert!(config.catalog.is_none());
        assert!(config.role.is_none());
        assert!(config.locale.is_none());
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_connection_config_builder() {
        let config = ConnectionConfig::builder()
            .with_url("http://olap/xmla")
            .with_catalog("FoodMart")
            .with_role("Analyst")
            .with_locale(1031)
            .with_timeout(Duration::from_secs(60))
            .build();

        assert_eq!(config.url, "http://olap/xmla");
        assert_eq!(config.catalog.as_deref(), Some("FoodMart"));
        assert_eq!(config.role.as_deref(), Some("Analyst"));
        assert_eq!(config.locale, Some(1031));
        assert_eq!(config.timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_properties_skip_unset_values() {
        let config = ConnectionConfig::builder()
            .with_url("http://olap/xmla")
            .with_catalog("FoodMart")
            .build();

        let props = config.properties();
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("Url").map(String::as_str), Some("http://olap/xmla"));
        assert_eq!(props.get("Catalog").map(String::as_str), Some("FoodMart"));
        assert!(!props.contains_key("Roles"));
    }

    #[test]
    fn test_properties_render_locale() {
        let config = ConnectionConfig::builder().with_locale(1033).build();
        assert_eq!(
            config.properties().get("LocaleIdentifier").map(String::as_str),
            Some("1033")
        );
    }
}
