//! Request builder and client for the generator API
//!
//! A [`QrGenerator`] owns the parameter set and settings, validates them,
//! builds the query URL, sends the request and writes the returned artifact.
//! Requests are serialized through `&mut self`.

mod response;
mod transport;

pub use response::check_status;
pub use transport::{ApiResponse, HttpTransport, Transport};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::output::{OutputTarget, timestamped_name};
use crate::params::{ParamValue, Parameter, ParameterSet};
use chrono::{DateTime, Local};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};
use url::form_urlencoded;

/// Environment variable holding the access token
pub const ACCESS_TOKEN_ENV: &str = "ACCESS_TOKEN";

/// Where the API access token comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessToken {
    /// Token given directly
    Literal(String),
    /// Token read from `ACCESS_TOKEN`
    FromEnv,
}

impl AccessToken {
    /// Sentinel that requests the token from the environment
    pub const ENV_SENTINEL: &'static str = ".env";

    /// Interpret a user-supplied token, mapping `.env` to [`AccessToken::FromEnv`].
    pub fn parse(value: &str) -> Self {
        if value == Self::ENV_SENTINEL {
            AccessToken::FromEnv
        } else {
            AccessToken::Literal(value.to_string())
        }
    }

    fn resolve(self) -> Option<String> {
        match self {
            AccessToken::Literal(token) => Some(token),
            AccessToken::FromEnv => match env::var(ACCESS_TOKEN_ENV) {
                Ok(token) => Some(token),
                Err(_) => {
                    warn!("{ACCESS_TOKEN_ENV} is not set, continuing without an access token");
                    None
                }
            },
        }
    }
}

/// Client for the qr-code-generator.com API
pub struct QrGenerator {
    params: ParameterSet,
    settings: Settings,
    output_filename: Option<String>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for QrGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrGenerator")
            .field("settings", &self.settings)
            .field("output_filename", &self.output_filename)
            .finish_non_exhaustive()
    }
}

impl QrGenerator {
    /// Create a client talking to the real API over HTTP.
    pub fn new<I, K, V>(settings: Settings, token: Option<AccessToken>, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ParamValue>,
    {
        let transport = Arc::new(HttpTransport::new()?);
        Self::with_transport(settings, token, overrides, transport)
    }

    /// Create a client with a custom transport.
    ///
    /// Applies the token and overrides, then creates the output directory.
    pub fn with_transport<I, K, V>(
        settings: Settings,
        token: Option<AccessToken>,
        overrides: I,
        transport: Arc<dyn Transport>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ParamValue>,
    {
        let mut generator = Self {
            params: ParameterSet::new(),
            settings,
            output_filename: None,
            transport,
        };

        if let Some(token) = token.and_then(AccessToken::resolve) {
            generator.params.set(Parameter::AccessToken, token);
        }

        for (key, value) in overrides {
            generator.set_parameter(key.as_ref(), value)?;
        }

        generator.ensure_output_dir()?;
        Ok(generator)
    }

    fn ensure_output_dir(&self) -> Result<()> {
        if self.settings.out_folder.is_empty() || self.settings.output_folder.is_empty() {
            return Ok(());
        }
        let dir = self.settings.output_dir();
        if !dir.exists() {
            debug!(dir = %dir.display(), "Creating output directory");
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Overwrite a parameter by wire name. Unknown names fail.
    pub fn set_parameter(&mut self, key: &str, value: impl Into<ParamValue>) -> Result<()> {
        self.params.set_by_name(key, value)
    }

    /// Value of a parameter by wire name; `None` for unknown or unset keys.
    pub fn parameter(&self, key: &str) -> Option<&ParamValue> {
        self.params.get_by_name(key)
    }

    /// The full parameter set
    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    /// Mutable access to the parameter set
    pub fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    /// Operational settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable access to the settings
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Filename used by the next request, if one is pending
    pub fn output_filename(&self) -> Option<&str> {
        self.output_filename.as_deref()
    }

    /// Set the filename (without extension) for the next request
    pub fn set_output_filename(&mut self, name: impl Into<String>) {
        self.output_filename = Some(name.into());
    }

    /// Forget the pending filename
    pub fn cleanup(&mut self) {
        self.output_filename = None;
    }

    /// Base endpoint followed by every truthy parameter as `key=value`,
    /// in declaration order and joined by `&`.
    pub fn build_query_url(&self) -> String {
        let mut url = self.settings.api_uri.clone();
        let query = self
            .params
            .truthy()
            .map(|(p, v)| {
                let value: String = form_urlencoded::byte_serialize(v.to_string().as_bytes()).collect();
                format!("{}={}", p.name(), value)
            })
            .collect::<Vec<_>>()
            .join("&");

        if query.is_empty() {
            return url;
        }
        if !url.contains('?') {
            url.push('?');
        } else if !url.ends_with('?') && !url.ends_with('&') {
            url.push('&');
        }
        url.push_str(&query);
        url
    }

    /// Check settings, filename and required parameters before sending.
    ///
    /// Derives a timestamped filename when none is pending and returns the
    /// resolved output target.
    pub fn validate(&mut self) -> Result<OutputTarget> {
        self.validate_at(Local::now())
    }

    fn validate_at(&mut self, now: DateTime<Local>) -> Result<OutputTarget> {
        if self.settings.out_folder.is_empty() {
            return Err(Error::PathConfiguration("out_folder is empty".to_string()));
        }
        if self.settings.output_folder.is_empty() {
            return Err(Error::PathConfiguration("output_folder is empty".to_string()));
        }

        if self.output_filename.as_deref() == Some("") {
            self.output_filename = None;
        }
        if let Some(name) = &self.output_filename {
            if name.contains('.') {
                return Err(Error::InvalidFilename(name.clone()));
            }
        }

        let extension = self.params.image_extension().ok_or_else(|| {
            Error::MissingRequiredParameter(Parameter::ImageFormat.name().to_string())
        })?;
        let dir = self.settings.output_dir();

        let target = match self.output_filename.clone() {
            Some(name) => OutputTarget::new(dir, name, extension),
            None => {
                let target = OutputTarget::first_free(&dir, &timestamped_name(now), &extension);
                debug!(name = target.name(), "Derived output filename");
                self.output_filename = Some(target.name().to_string());
                target
            }
        };

        for parameter in Parameter::ALL {
            if self.settings.required_parameters.contains(&parameter)
                && !self.params.is_truthy(parameter)
            {
                return Err(Error::MissingRequiredParameter(parameter.name().to_string()));
            }
        }

        Ok(target)
    }

    /// Request a QR code and write it to disk, returning the written path.
    ///
    /// The pending filename is cleared afterwards whatever the outcome.
    pub async fn request(&mut self, filename: Option<&str>) -> Result<PathBuf> {
        if let Some(name) = filename.filter(|n| !n.is_empty()) {
            self.output_filename = Some(name.to_string());
        }

        let result = self.send().await;
        self.cleanup();
        result
    }

    async fn send(&mut self) -> Result<PathBuf> {
        let target = self.validate()?;
        let url = self.build_query_url();
        debug!(
            endpoint = %self.settings.api_uri,
            target = %target.path().display(),
            "Sending QR code request"
        );

        let response = self
            .transport
            .post_form(&url, &self.params.form_pairs())
            .await?;
        self.handle_response(&response, &target)
    }

    /// Write a successful response to `target`, or map the status to an error.
    pub fn handle_response(&self, response: &ApiResponse, target: &OutputTarget) -> Result<PathBuf> {
        check_status(response.status, &response.body, &self.settings.api_uri)?;
        target.write(&response.body, self.settings.force_overwrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct Canned {
        response: ApiResponse,
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for Canned {
        async fn post_form(&self, url: &str, _form: &[(&'static str, String)]) -> Result<ApiResponse> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(self.response.clone())
        }
    }

    fn settings_in(root: &std::path::Path) -> Settings {
        Settings {
            out_folder: root.join("out").to_string_lossy().into_owned(),
            output_folder: "demo".to_string(),
            ..Settings::default()
        }
    }

    fn generator(settings: Settings, response: ApiResponse) -> QrGenerator {
        let transport = Arc::new(Canned {
            response,
            urls: Mutex::new(Vec::new()),
        });
        QrGenerator::with_transport(
            settings,
            Some(AccessToken::Literal("tok".to_string())),
            Vec::<(String, ParamValue)>::new(),
            transport,
        )
        .unwrap()
    }

    #[test]
    fn test_token_sentinel() {
        assert_eq!(AccessToken::parse(".env"), AccessToken::FromEnv);
        assert_eq!(
            AccessToken::parse("abc"),
            AccessToken::Literal("abc".to_string())
        );
    }

    #[test]
    fn test_construction_applies_token_overrides_and_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let generator = QrGenerator::with_transport(
            settings.clone(),
            Some(AccessToken::Literal("secret".to_string())),
            [("qr_code_text", "TEST")],
            Arc::new(Canned {
                response: ApiResponse::new(200, ""),
                urls: Mutex::new(Vec::new()),
            }),
        )
        .unwrap();

        assert_eq!(generator.parameter("qr_code_text"), Some(&ParamValue::from("TEST")));
        assert_eq!(generator.parameter("access-token"), Some(&ParamValue::from("secret")));
        assert!(settings.output_dir().is_dir());
    }

    #[test]
    fn test_construction_rejects_unknown_override() {
        let dir = tempfile::tempdir().unwrap();
        let result = QrGenerator::with_transport(
            settings_in(dir.path()),
            None,
            [("colour", "red")],
            Arc::new(Canned {
                response: ApiResponse::new(200, ""),
                urls: Mutex::new(Vec::new()),
            }),
        );
        assert!(matches!(result, Err(Error::UnknownParameter(ref k)) if k == "colour"));
    }

    #[test]
    fn test_query_url_skips_falsy_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = generator(settings_in(dir.path()), ApiResponse::new(200, ""));
        generator.set_parameter("frame_text", "").unwrap();

        let url = generator.build_query_url();
        let query = url.strip_prefix(crate::config::DEFAULT_API_URI).unwrap();
        assert!(query.starts_with("access-token=tok&qr_code_text=SPERZIEBONEN&image_format=SVG&image_width=500&"));
        assert!(!query.starts_with('&'));
        assert!(!query.contains("&&"));
        assert!(!query.contains("download="));
        assert!(!query.contains("frame_text="));
        assert!(query.contains("foreground_color=%23000000"));
        assert!(query.ends_with("frame_name=no-frame"));
    }

    #[test]
    fn test_query_url_without_question_mark() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(dir.path());
        settings.api_uri = "http://localhost/create".to_string();
        let generator = generator(settings, ApiResponse::new(200, ""));
        assert!(generator
            .build_query_url()
            .starts_with("http://localhost/create?access-token=tok&"));
    }

    #[test]
    fn test_validate_missing_required_parameter() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = generator(settings_in(dir.path()), ApiResponse::new(200, ""));
        generator.parameters_mut().clear(Parameter::QrCodeText);

        let err = generator.validate().unwrap_err();
        assert!(matches!(err, Error::MissingRequiredParameter(ref k) if k == "qr_code_text"));
    }

    #[test]
    fn test_validate_path_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = generator(settings_in(dir.path()), ApiResponse::new(200, ""));
        generator.settings_mut().output_folder.clear();
        assert!(matches!(generator.validate(), Err(Error::PathConfiguration(_))));
    }

    #[test]
    fn test_validate_rejects_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = generator(settings_in(dir.path()), ApiResponse::new(200, ""));
        generator.set_output_filename("card.svg");
        assert!(matches!(
            generator.validate(),
            Err(Error::InvalidFilename(ref n)) if n == "card.svg"
        ));
    }

    #[test]
    fn test_validate_derives_free_timestamp_name() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let mut generator = generator(settings.clone(), ApiResponse::new(200, ""));
        let now = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        fs::write(settings.output_dir().join("QR-20240506-070809.svg"), "<svg/>").unwrap();

        let target = generator.validate_at(now).unwrap();
        assert_eq!(target.name(), "QR-20240506-070809-1");
        assert_eq!(generator.output_filename(), Some("QR-20240506-070809-1"));
    }

    #[test]
    fn test_validate_treats_empty_filename_as_unset() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = generator(settings_in(dir.path()), ApiResponse::new(200, ""));
        generator.set_output_filename("");
        let now = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

        let target = generator.validate_at(now).unwrap();
        assert_eq!(target.name(), "QR-20240506-070809");
        assert_eq!(generator.output_filename(), Some("QR-20240506-070809"));
    }

    #[tokio::test]
    async fn test_empty_pending_filename_never_writes_hidden_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let mut generator = generator(settings.clone(), ApiResponse::new(200, "<svg>X</svg>"));
        generator.set_output_filename("");

        let path = generator.request(None).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("QR-") && name.ends_with(".svg"), "unexpected name {name}");
        assert!(!settings.output_dir().join(".svg").exists());
    }

    #[tokio::test]
    async fn test_request_writes_and_resets_filename() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let mut generator = generator(settings.clone(), ApiResponse::new(200, "<svg>X</svg>"));

        let path = generator.request(Some("card")).await.unwrap();
        assert_eq!(path, settings.output_dir().join("card.svg"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "<svg>X</svg>");
        assert_eq!(generator.output_filename(), None);
    }

    #[tokio::test]
    async fn test_failed_request_still_resets_filename() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = generator(settings_in(dir.path()), ApiResponse::new(429, ""));

        let err = generator.request(Some("card")).await.unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded));
        assert_eq!(generator.output_filename(), None);
    }
}
