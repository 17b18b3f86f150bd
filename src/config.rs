//! Runtime configuration.
//!
//! The deployment switch picks the gateway and media hosts; the user's data
//! directory decides where the theme preference is kept. Everything else is a
//! fixed constant of the binder.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::ConfigError;

const DEPLOYMENT_VAR: &str = "BINDER_DEPLOYMENT";

const LOCAL_GATEWAY: &str = "http://localhost:8080";
const LOCAL_MEDIA: &str = "http://localhost:8084";
// Placeholder hosts until the hosted services get their final names.
const PRODUCTION_GATEWAY: &str = "https://your-api-gateway.onrender.com";
const PRODUCTION_MEDIA: &str = "https://your-media-service.onrender.com";

/// Hostname the catalog service bakes into image urls.
pub const INTERNAL_MEDIA_HOST: &str = "http://media-service:8084";

const APP_DIRECTORY: &str = "tcg-binder";
const PREFS_FILE: &str = "binder-prefs.json";

pub const SET_CODE: &str = "SV01";
pub const USER_ID: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    Production,
    Local,
}

impl Deployment {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Deployment::Production),
            "local" | "" => Ok(Deployment::Local),
            other => Err(ConfigError::InvalidValue(
                DEPLOYMENT_VAR.to_string(),
                format!("'{}' is neither 'production' nor 'local'", other),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub deployment: Deployment,
    pub catalog_url: Url,
    pub collection_url: Url,
    pub media_url: String,
    pub set_code: String,
    pub user_id: i64,
    pub prefs_path: PathBuf,
    pub search_debounce: Duration,
    pub notification_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let deployment = match std::env::var(DEPLOYMENT_VAR) {
            Ok(value) => Deployment::parse(&value)?,
            Err(_) => Deployment::Local,
        };

        Self::for_deployment(deployment)
    }

    pub fn for_deployment(deployment: Deployment) -> Result<Self, ConfigError> {
        let (gateway, media) = match deployment {
            Deployment::Production => (PRODUCTION_GATEWAY, PRODUCTION_MEDIA),
            Deployment::Local => (LOCAL_GATEWAY, LOCAL_MEDIA),
        };

        Ok(Self {
            deployment,
            catalog_url: parse_base(&format!("{}/api/catalog/", gateway))?,
            collection_url: parse_base(&format!("{}/api/collections/", gateway))?,
            media_url: media.to_string(),
            set_code: SET_CODE.to_string(),
            user_id: USER_ID,
            prefs_path: prefs_path(
                std::env::var_os("XDG_DATA_HOME"),
                std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")),
            ),
            search_debounce: Duration::from_millis(300),
            notification_ttl: Duration::from_secs(3),
        })
    }

    /// Points an image url served from the internal media hostname at the
    /// reachable media host.
    pub fn image_url(&self, raw: &str) -> String {
        raw.replace(INTERNAL_MEDIA_HOST, &self.media_url)
    }
}

/// Where the theme preference lives: the per-user data directory
/// (`$XDG_DATA_HOME`, else `~/.local/share`), or the working directory when
/// neither is known.
pub fn prefs_path(xdg_data_home: Option<OsString>, home: Option<OsString>) -> PathBuf {
    let data_dir = xdg_data_home
        .filter(|x| !x.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            home.filter(|x| !x.is_empty())
                .map(|x| PathBuf::from(x).join(".local/share"))
        });

    match data_dir {
        Some(dir) => dir.join(APP_DIRECTORY).join(PREFS_FILE),
        None => PathBuf::from(PREFS_FILE),
    }
}

// Base urls keep a trailing slash so `Url::join` appends instead of replacing.
fn parse_base(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(raw.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_switch_selects_hosts() {
        let local = Config::for_deployment(Deployment::Local).unwrap();
        assert_eq!(
            local.catalog_url.as_str(),
            "http://localhost:8080/api/catalog/"
        );
        assert_eq!(
            local.collection_url.as_str(),
            "http://localhost:8080/api/collections/"
        );
        assert_eq!(local.media_url, LOCAL_MEDIA);

        let prod = Config::for_deployment(Deployment::Production).unwrap();
        assert!(prod.catalog_url.as_str().starts_with(PRODUCTION_GATEWAY));
        assert_eq!(prod.media_url, PRODUCTION_MEDIA);
    }

    #[test]
    fn deployment_parse_rejects_unknown_values() {
        assert_eq!(Deployment::parse("Production").unwrap(), Deployment::Production);
        assert_eq!(Deployment::parse("").unwrap(), Deployment::Local);
        assert!(matches!(
            Deployment::parse("staging"),
            Err(ConfigError::InvalidValue(..))
        ));
    }

    #[test]
    fn prefs_live_in_the_user_data_directory() {
        assert_eq!(
            prefs_path(Some("/data".into()), Some("/home/ash".into())),
            PathBuf::from("/data/tcg-binder/binder-prefs.json")
        );
        assert_eq!(
            prefs_path(None, Some("/home/ash".into())),
            PathBuf::from("/home/ash/.local/share/tcg-binder/binder-prefs.json")
        );
        assert_eq!(
            prefs_path(Some("".into()), Some("/home/ash".into())),
            PathBuf::from("/home/ash/.local/share/tcg-binder/binder-prefs.json")
        );
        assert_eq!(prefs_path(None, None), PathBuf::from("binder-prefs.json"));
    }

    #[test]
    fn image_urls_are_rewritten_to_media_host() {
        let config = Config::for_deployment(Deployment::Local).unwrap();
        assert_eq!(
            config.image_url("http://media-service:8084/images/SV01/001.png"),
            "http://localhost:8084/images/SV01/001.png"
        );
        assert_eq!(
            config.image_url("https://elsewhere.example/x.png"),
            "https://elsewhere.example/x.png"
        );
    }
}
