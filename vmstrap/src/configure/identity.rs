//! Operator-supplied identity of the new system.

use crate::prompt::Prompter;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use vmstrap_shared::{VmstrapError, VmstrapResult};

/// RFC 1123 host name: dot-separated labels of 1-63 alphanumerics and
/// inner hyphens.
static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
        .expect("hostname regex is valid")
});

/// Login name accepted by `useradd` without `--badname`.
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_-]{0,31}$").expect("username regex is valid"));

const MAX_HOSTNAME_LEN: usize = 253;

/// A password. Never shown by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The plain value. Only the script renderer should need this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    pub hostname: String,
    pub username: String,
    pub user_password: Secret,
    pub root_password: Secret,
}

impl IdentityConfig {
    /// Build and validate an identity.
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        user_password: Secret,
        root_password: Secret,
    ) -> VmstrapResult<Self> {
        let identity = Self {
            hostname: hostname.into(),
            username: username.into(),
            user_password,
            root_password,
        };
        identity.validate()?;
        Ok(identity)
    }

    /// Hostname and username end up verbatim in the control script, so
    /// they must match their strict grammars. Passwords are quoted but may
    /// not span lines (chpasswd reads one `user:password` per line).
    pub fn validate(&self) -> VmstrapResult<()> {
        if self.hostname.len() > MAX_HOSTNAME_LEN || !HOSTNAME_RE.is_match(&self.hostname) {
            return Err(VmstrapError::InvalidArgument(format!(
                "'{}' is not a valid hostname",
                self.hostname
            )));
        }
        if !USERNAME_RE.is_match(&self.username) {
            return Err(VmstrapError::InvalidArgument(format!(
                "'{}' is not a valid username",
                self.username
            )));
        }
        if self.username == "root" {
            return Err(VmstrapError::InvalidArgument(
                "the primary user cannot be root".into(),
            ));
        }
        check_secret("user password", &self.user_password)?;
        check_secret("root password", &self.root_password)?;
        Ok(())
    }
}

fn check_secret(label: &str, secret: &Secret) -> VmstrapResult<()> {
    if secret.is_empty() {
        return Err(VmstrapError::InvalidArgument(format!("{label} must not be empty")));
    }
    if secret.expose().contains(['\n', '\r', '\0']) {
        return Err(VmstrapError::InvalidArgument(format!(
            "{label} must be a single line"
        )));
    }
    Ok(())
}

/// Ask the operator for hostname, username and both passwords.
///
/// Plain answers are trimmed; passwords are trimmed of surrounding
/// whitespace too, as they are typed at a terminal.
pub fn collect_identity(prompter: &dyn Prompter) -> VmstrapResult<IdentityConfig> {
    let hostname = prompter.input("Enter hostname: ")?.trim().to_string();
    let username = prompter.input("Enter username: ")?.trim().to_string();
    let user_password = Secret::new(prompter.secret("Enter user password: ")?.expose().trim());
    let root_password = Secret::new(prompter.secret("Enter root password: ")?.expose().trim());

    let identity = IdentityConfig::new(hostname, username, user_password, root_password)?;
    tracing::info!(hostname = %identity.hostname, username = %identity.username, "Identity collected");
    Ok(identity)
}
