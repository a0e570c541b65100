use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub girder: GirderSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub playback: PlaybackSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GirderSettings {
    /// Girder REST root used when the deployment host is not recognised
    pub api_root: String,
    /// Time-step data endpoint used when the deployment host is not recognised
    pub data_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Public host name of the deployment, e.g. "esimmon.kitware.com"
    #[serde(default)]
    pub hostname: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlaybackSettings {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
        }
    }
}

fn default_collection() -> String {
    "eSimMon".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_steps() -> usize {
    500
}

/// Where the data service lives for this deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub api_root: String,
    pub data_url: String,
    pub with_credentials: bool,
}

/// Hosted deployments serve Girder and the data endpoint from the same
/// API root; anything else uses the configured URLs without credentials.
pub fn resolve_endpoints(settings: &GirderSettings) -> Endpoints {
    let hostname = settings.hostname.as_deref().unwrap_or("");
    let labels: Vec<&str> = hostname.split('.').collect();
    let deployment = if labels.len() >= 2 {
        labels[labels.len() - 2]
    } else {
        ""
    };

    let hosted_root = match deployment {
        "kitware" => Some(format!("https://api.{}/api/v1", hostname)),
        "nersc" => Some(format!("https://{}/api/v1", hostname)),
        _ => None,
    };

    match hosted_root {
        Some(root) => Endpoints {
            api_root: root.clone(),
            data_url: root,
            with_credentials: true,
        },
        None => Endpoints {
            api_root: settings.api_root.trim_end_matches('/').to_string(),
            data_url: settings.data_url.trim_end_matches('/').to_string(),
            with_credentials: false,
        },
    }
}

pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .set_default("girder.api_root", "http://localhost:8080/api/v1")?
        .set_default("girder.data_url", "http://localhost:5000/api/v1")?
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("ESIMMON")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(hostname: Option<&str>) -> GirderSettings {
        GirderSettings {
            api_root: "http://localhost:8080/api/v1/".to_string(),
            data_url: "http://localhost:5000/api/v1".to_string(),
            token: None,
            collection: default_collection(),
            hostname: hostname.map(str::to_string),
        }
    }

    #[test]
    fn test_kitware_deployment() {
        let endpoints = resolve_endpoints(&settings(Some("esimmon.kitware.com")));
        assert_eq!(endpoints.api_root, "https://api.esimmon.kitware.com/api/v1");
        assert_eq!(endpoints.data_url, endpoints.api_root);
        assert!(endpoints.with_credentials);
    }

    #[test]
    fn test_nersc_deployment() {
        let endpoints = resolve_endpoints(&settings(Some("esimmon.nersc.gov")));
        assert_eq!(endpoints.api_root, "https://esimmon.nersc.gov/api/v1");
        assert!(endpoints.with_credentials);
    }

    #[test]
    fn test_local_deployment_uses_configured_urls() {
        for host in [None, Some("localhost"), Some("dashboard.example.org")] {
            let endpoints = resolve_endpoints(&settings(host));
            assert_eq!(endpoints.api_root, "http://localhost:8080/api/v1");
            assert_eq!(endpoints.data_url, "http://localhost:5000/api/v1");
            assert!(!endpoints.with_credentials);
        }
    }

    #[test]
    fn test_defaults_from_partial_config() {
        let config: DashboardConfig = serde_json::from_value(serde_json::json!({
            "girder": {"api_root": "http://g/api/v1", "data_url": "http://d/api/v1"}
        }))
        .unwrap();

        assert_eq!(config.girder.collection, "eSimMon");
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.playback.max_steps, 500);
    }
}
