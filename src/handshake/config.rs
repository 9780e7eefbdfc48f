//! What a local endpoint is willing to negotiate.
//!
//! 本端愿意协商的参数。
use crate::error::{HandshakeError, Result};
use crate::protocol::types::{CipherSuite, NamedGroup, ProtocolVersion, SignatureScheme};
use serde::{Deserialize, Serialize};

/// Negotiation preferences, most preferred first in every list.
///
/// Missing fields take their default when deserialized.
///
/// 协商偏好，各列表均按优先级从高到低排列。反序列化时缺失字段取默认值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub versions: Vec<ProtocolVersion>,
    pub cipher_suites: Vec<CipherSuite>,
    pub groups: Vec<NamedGroup>,
    pub signature_schemes: Vec<SignatureScheme>,
    pub server_name: Option<String>,
    pub extended_master_secret: bool,
    pub allow_psk_resumption: bool,
    pub allow_dhe_resumption: bool,
    pub allow_early_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            versions: vec![ProtocolVersion::TLS13, ProtocolVersion::TLS12],
            cipher_suites: vec![
                CipherSuite::TLS13_AES_128_GCM_SHA256,
                CipherSuite::TLS13_AES_256_GCM_SHA384,
                CipherSuite::TLS13_CHACHA20_POLY1305_SHA256,
            ],
            groups: vec![NamedGroup::X25519, NamedGroup::SECP256R1, NamedGroup::SECP384R1],
            signature_schemes: vec![
                SignatureScheme::ECDSA_SECP256R1_SHA256,
                SignatureScheme::RSA_PSS_RSAE_SHA256,
                SignatureScheme::ED25519,
            ],
            server_name: None,
            extended_master_secret: true,
            allow_psk_resumption: true,
            allow_dhe_resumption: true,
            allow_early_data: false,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Rejects configurations that cannot complete any handshake.
    pub fn validate(&self) -> Result<()> {
        if self.versions.is_empty() {
            return Err(HandshakeError::BuilderMissingField("versions"));
        }
        if self.cipher_suites.is_empty() {
            return Err(HandshakeError::BuilderMissingField("cipher_suites"));
        }
        if self.groups.is_empty() {
            return Err(HandshakeError::BuilderMissingField("groups"));
        }
        if self.signature_schemes.is_empty() {
            return Err(HandshakeError::BuilderMissingField("signature_schemes"));
        }
        Ok(())
    }

    pub fn supports_version(&self, version: ProtocolVersion) -> bool {
        self.versions.contains(&version)
    }

    /// The highest version both this config and `offered` contain, in local preference order.
    pub fn select_version(&self, offered: &[ProtocolVersion]) -> Option<ProtocolVersion> {
        self.versions.iter().copied().find(|v| offered.contains(v))
    }
}

/// A builder for [`Config`].
///
/// Starts from the defaults; any list that is set replaces the default list.
///
/// [`Config`] 的构建器。以默认值为起点，设置的列表将替换默认列表。
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn versions(mut self, versions: Vec<ProtocolVersion>) -> Self {
        self.config.versions = versions;
        self
    }

    pub fn cipher_suites(mut self, suites: Vec<CipherSuite>) -> Self {
        self.config.cipher_suites = suites;
        self
    }

    pub fn groups(mut self, groups: Vec<NamedGroup>) -> Self {
        self.config.groups = groups;
        self
    }

    pub fn signature_schemes(mut self, schemes: Vec<SignatureScheme>) -> Self {
        self.config.signature_schemes = schemes;
        self
    }

    /// Sets the host name sent in `server_name`.
    ///
    /// 设置在 `server_name` 中发送的主机名。
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.config.server_name = Some(name.into());
        self
    }

    pub fn extended_master_secret(mut self, enabled: bool) -> Self {
        self.config.extended_master_secret = enabled;
        self
    }

    pub fn allow_psk_resumption(mut self, allowed: bool) -> Self {
        self.config.allow_psk_resumption = allowed;
        self
    }

    pub fn allow_dhe_resumption(mut self, allowed: bool) -> Self {
        self.config.allow_dhe_resumption = allowed;
        self
    }

    pub fn allow_early_data(mut self, allowed: bool) -> Self {
        self.config.allow_early_data = allowed;
        self
    }

    /// Builds the `Config`.
    ///
    /// Returns an error if any required list is empty.
    ///
    /// 构建 `Config`。如果任何必需列表为空，则返回错误。
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
