//! Extension negotiation.
//!
//! The client builds its extension list from a [`Config`] and a [`ClientOffer`].
//! The server answers each client extension with at most one of its own, in
//! the client's order. The client then folds the server's list into a
//! [`NegotiatedExtensions`], rejecting anything it never asked for.
//!
//! 扩展协商。
//!
//! 客户端根据 [`Config`] 与 [`ClientOffer`] 构造扩展列表。服务器按客户端的顺序，
//! 对每个客户端扩展至多回应一个扩展。客户端随后将服务器的列表折叠为
//! [`NegotiatedExtensions`]，并拒绝任何未曾请求的扩展。
use crate::error::NegotiationError;
use crate::handshake::config::Config;
use crate::protocol::extension::{
    self, EarlyDataExt, Extension, KeyShareEntry, KeyShareExt, PreSharedKeyExt, PskModes,
    PskOffer, ServerNameEntry, ServerNameExt, SupportedVersionsExt,
};
use crate::protocol::message::{ClientHello, ServerHello};
use crate::protocol::types::{
    CipherSuite, EcPointFormat, ExtensionType, NamedGroup, ProtocolVersion, SignatureScheme,
};
use tracing::debug;

type Result<T> = std::result::Result<T, NegotiationError>;

/// The per-handshake inputs to the client's extension list that do not come from [`Config`].
///
/// Key-share material is produced by the caller's key exchange.
#[derive(Debug, Clone, Default)]
pub struct ClientOffer {
    /// One share per group, in preference order. May be empty to ask for a retry.
    pub key_shares: Vec<KeyShareEntry>,
    /// Resumption offer; binders are computed by the caller over the binder prefix.
    pub psk: Option<PskOffer>,
    /// Cookie echoed from a HelloRetryRequest.
    pub cookie: Option<Vec<u8>>,
    pub early_data: bool,
}

/// Parameters both sides agreed on. Built once per handshake.
///
/// 双方协商一致的参数。每次握手构建一次。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedExtensions {
    version: ProtocolVersion,
    cipher_suite: CipherSuite,
    key_share: Option<KeyShareEntry>,
    signature_schemes: Vec<SignatureScheme>,
    groups: Vec<NamedGroup>,
    extended_master_secret: bool,
    server_name_acknowledged: bool,
    selected_psk: Option<u16>,
    early_data_accepted: bool,
    ec_point_formats: Vec<EcPointFormat>,
}

impl NegotiatedExtensions {
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn cipher_suite(&self) -> CipherSuite {
        self.cipher_suite
    }

    /// The server's key share, absent for PSK-only and TLS 1.2 handshakes.
    pub fn key_share(&self) -> Option<&KeyShareEntry> {
        self.key_share.as_ref()
    }

    /// The group of the agreed key share.
    pub fn group(&self) -> Option<NamedGroup> {
        self.key_share.as_ref().map(|k| k.group)
    }

    /// Signature schemes acceptable to both sides, in client preference order.
    pub fn signature_schemes(&self) -> &[SignatureScheme] {
        &self.signature_schemes
    }

    pub fn groups(&self) -> &[NamedGroup] {
        &self.groups
    }

    pub fn extended_master_secret(&self) -> bool {
        self.extended_master_secret
    }

    pub fn server_name_acknowledged(&self) -> bool {
        self.server_name_acknowledged
    }

    pub fn selected_psk(&self) -> Option<u16> {
        self.selected_psk
    }

    pub fn early_data_accepted(&self) -> bool {
        self.early_data_accepted
    }

    pub fn ec_point_formats(&self) -> &[EcPointFormat] {
        &self.ec_point_formats
    }

    /// Whether the server resumed without an ephemeral key exchange.
    pub fn is_psk_only(&self) -> bool {
        self.selected_psk.is_some() && self.key_share.is_none()
    }
}

// --- Lookups into a client list ---

fn offered_versions(exts: &[Extension]) -> &[ProtocolVersion] {
    match extension::find(exts, ExtensionType::SUPPORTED_VERSIONS) {
        Some(Extension::SupportedVersions(SupportedVersionsExt::Offered(v))) => v.as_slice(),
        _ => &[],
    }
}

fn offered_shares(exts: &[Extension]) -> &[KeyShareEntry] {
    match extension::find(exts, ExtensionType::KEY_SHARE) {
        Some(Extension::KeyShare(KeyShareExt::ClientShares(s))) => s.as_slice(),
        _ => &[],
    }
}

fn offered_groups(exts: &[Extension]) -> &[NamedGroup] {
    match extension::find(exts, ExtensionType::SUPPORTED_GROUPS) {
        Some(Extension::SupportedGroups(g)) => g.as_slice(),
        _ => &[],
    }
}

fn offered_signature_schemes(exts: &[Extension]) -> Option<&[SignatureScheme]> {
    match extension::find(exts, ExtensionType::SIGNATURE_ALGORITHMS) {
        Some(Extension::SignatureAlgorithms(s)) => Some(s.as_slice()),
        _ => None,
    }
}

fn offered_psk(exts: &[Extension]) -> Option<&PskOffer> {
    match extension::find(exts, ExtensionType::PRE_SHARED_KEY) {
        Some(Extension::PreSharedKey(PreSharedKeyExt::Offer(o))) => Some(o),
        _ => None,
    }
}

fn offered_psk_modes(exts: &[Extension]) -> Option<PskModes> {
    match extension::find(exts, ExtensionType::PSK_KEY_EXCHANGE_MODES) {
        Some(Extension::PskKeyExchangeModes(m)) => Some(*m),
        _ => None,
    }
}

fn intersect<T: Copy + PartialEq>(preferred: &[T], allowed: &[T]) -> Vec<T> {
    preferred.iter().copied().filter(|x| allowed.contains(x)).collect()
}

// --- Client side ---

/// Builds the client's extension list.
///
/// Order: server_name, supported_versions, key_share, extended_master_secret,
/// signature_algorithms, ec_point_formats (ECDHE suite offered),
/// supported_groups (ECDHE, DHE or TLS 1.3 suite offered), cookie, early_data,
/// psk_key_exchange_modes, pre_shared_key. `pre_shared_key` is always last.
///
/// 构造客户端扩展列表。`pre_shared_key` 总是位于最后。
pub fn prepare_client_extensions(config: &Config, offer: &ClientOffer) -> Vec<Extension> {
    let suites = &config.cipher_suites;
    let tls13 = config.supports_version(ProtocolVersion::TLS13);
    let psk = offer.psk.as_ref().filter(|_| config.allow_psk_resumption);
    let mut exts = Vec::new();

    if let Some(name) = &config.server_name {
        exts.push(Extension::ServerName(ServerNameExt::Names(vec![
            ServerNameEntry::host_name(name.as_bytes()),
        ])));
    }
    if tls13 {
        exts.push(Extension::SupportedVersions(SupportedVersionsExt::Offered(
            config.versions.clone(),
        )));
        exts.push(Extension::KeyShare(KeyShareExt::ClientShares(
            offer.key_shares.clone(),
        )));
    }
    if config.extended_master_secret || psk.is_some() {
        exts.push(Extension::ExtendedMasterSecret);
    }
    exts.push(Extension::SignatureAlgorithms(config.signature_schemes.clone()));
    if suites.iter().any(|s| s.is_ecdhe()) {
        exts.push(Extension::EcPointFormats(vec![EcPointFormat::UNCOMPRESSED]));
    }
    if suites.iter().any(|s| s.is_ecdhe() || s.is_dhe() || s.is_tls13()) {
        exts.push(Extension::SupportedGroups(config.groups.clone()));
    }
    if let Some(cookie) = &offer.cookie {
        exts.push(Extension::Cookie(cookie.clone()));
    }
    if let Some(psk) = psk {
        if offer.early_data && config.allow_early_data {
            exts.push(Extension::EarlyData(EarlyDataExt::Indication));
        }
        let modes = if config.allow_dhe_resumption {
            PskModes::PskDheKeThenKe
        } else {
            PskModes::PskKe
        };
        exts.push(Extension::PskKeyExchangeModes(modes));
        exts.push(Extension::PreSharedKey(PreSharedKeyExt::Offer(psk.clone())));
    }
    exts
}

/// Folds the extensions of a ServerHello into the agreed parameters.
///
/// Any server extension whose type the client did not send is rejected, as are
/// the HelloRetryRequest forms of `key_share` and `cookie`. Early data may only
/// be accepted together with the first offered PSK identity.
///
/// 将 ServerHello 的扩展折叠为协商结果。客户端未发送过的扩展类型一律拒绝，
/// HelloRetryRequest 专用的 `key_share` 与 `cookie` 形式同样拒绝。
/// 只有选中第一个 PSK 身份时才可接受早期数据。
pub fn negotiate_client_extensions(
    config: &Config,
    client_exts: &[Extension],
    server_exts: &[Extension],
    cipher_suite: CipherSuite,
) -> Result<NegotiatedExtensions> {
    let mut selected_version = None;
    let mut key_share = None;
    let mut server_schemes = None;
    let mut server_groups = None;
    let mut extended_master_secret = false;
    let mut server_name_acknowledged = false;
    let mut selected_psk = None;
    let mut early_data_accepted = false;
    let mut ec_point_formats = Vec::new();

    for ext in server_exts {
        let typ = ext.ext_type();
        if extension::find(client_exts, typ).is_none() {
            return Err(NegotiationError::UnsolicitedExtension(typ));
        }
        match ext {
            Extension::SupportedVersions(SupportedVersionsExt::Selected(v)) => {
                if *v == ProtocolVersion::TLS12 {
                    return Err(NegotiationError::IllegalForVersion {
                        ext: typ,
                        version: *v,
                    });
                }
                if !offered_versions(client_exts).contains(v) || !config.supports_version(*v) {
                    return Err(NegotiationError::UnsupportedVersion(*v));
                }
                selected_version = Some(*v);
            }
            Extension::KeyShare(KeyShareExt::ServerShare(share)) => {
                if !offered_shares(client_exts).iter().any(|s| s.group == share.group) {
                    return Err(NegotiationError::KeyShareMismatch(share.group));
                }
                key_share = Some(share.clone());
            }
            Extension::PreSharedKey(PreSharedKeyExt::Selected(index)) => {
                if !config.allow_psk_resumption {
                    return Err(NegotiationError::PskNotAllowed);
                }
                let offered = offered_psk(client_exts).map_or(0, |o| o.identities.len());
                if usize::from(*index) >= offered {
                    return Err(NegotiationError::PskIdentityOutOfRange {
                        selected: *index,
                        offered,
                    });
                }
                selected_psk = Some(*index);
            }
            Extension::ServerName(ServerNameExt::Acknowledged) => server_name_acknowledged = true,
            Extension::EarlyData(EarlyDataExt::Indication) => early_data_accepted = true,
            Extension::ExtendedMasterSecret => extended_master_secret = true,
            Extension::EcPointFormats(formats) => {
                if !formats.contains(&EcPointFormat::UNCOMPRESSED) {
                    return Err(NegotiationError::UnsupportedPointFormat);
                }
                ec_point_formats = formats.clone();
            }
            Extension::SignatureAlgorithms(schemes) => server_schemes = Some(schemes.as_slice()),
            Extension::SupportedGroups(groups) => server_groups = Some(groups.as_slice()),
            Extension::Unknown { .. } => {}
            Extension::SupportedVersions(_)
            | Extension::KeyShare(_)
            | Extension::PreSharedKey(_)
            | Extension::ServerName(_)
            | Extension::EarlyData(_)
            | Extension::Cookie(_)
            | Extension::PskKeyExchangeModes(_) => {
                return Err(NegotiationError::UnexpectedForm(typ));
            }
        }
    }

    let version = match selected_version {
        Some(v) => v,
        None if cipher_suite.is_tls13() => {
            return Err(NegotiationError::MissingExtension {
                ext: ExtensionType::SUPPORTED_VERSIONS,
                version: ProtocolVersion::TLS13,
            });
        }
        None if config.supports_version(ProtocolVersion::TLS12) => ProtocolVersion::TLS12,
        None => return Err(NegotiationError::UnsupportedVersion(ProtocolVersion::TLS12)),
    };
    if !cipher_suite.usable_with(version) {
        return Err(NegotiationError::UnofferedCipherSuite(cipher_suite));
    }

    if version == ProtocolVersion::TLS13 {
        for (present, ext) in [
            (extended_master_secret, ExtensionType::EXTENDED_MASTER_SECRET),
            (!ec_point_formats.is_empty(), ExtensionType::EC_POINT_FORMATS),
        ] {
            if present {
                return Err(NegotiationError::IllegalForVersion { ext, version });
            }
        }
        let psk_only_offered = selected_psk.is_some()
            && offered_psk_modes(client_exts).is_some_and(PskModes::allows_psk_only);
        if key_share.is_none() && !psk_only_offered {
            return Err(NegotiationError::MissingExtension {
                ext: ExtensionType::KEY_SHARE,
                version,
            });
        }
        if selected_psk.is_some() && key_share.is_some() && !config.allow_dhe_resumption {
            return Err(NegotiationError::PskNotAllowed);
        }
        if early_data_accepted && selected_psk != Some(0) {
            return Err(NegotiationError::EarlyDataWithoutPsk);
        }
    } else {
        for (present, ext) in [
            (key_share.is_some(), ExtensionType::KEY_SHARE),
            (selected_psk.is_some(), ExtensionType::PRE_SHARED_KEY),
            (early_data_accepted, ExtensionType::EARLY_DATA),
        ] {
            if present {
                return Err(NegotiationError::IllegalForVersion { ext, version });
            }
        }
    }

    let client_schemes = offered_signature_schemes(client_exts).unwrap_or(&[]);
    let signature_schemes = intersect(
        client_schemes,
        server_schemes.unwrap_or(config.signature_schemes.as_slice()),
    );
    if signature_schemes.is_empty() && selected_psk.is_none() {
        return Err(NegotiationError::IncompatibleSignatureAlgorithms);
    }
    let client_groups = offered_groups(client_exts);
    let groups = match server_groups {
        Some(server) => intersect(client_groups, server),
        None => client_groups.to_vec(),
    };

    let negotiated = NegotiatedExtensions {
        version,
        cipher_suite,
        key_share,
        signature_schemes,
        groups,
        extended_master_secret,
        server_name_acknowledged,
        selected_psk,
        early_data_accepted,
        ec_point_formats,
    };
    debug!(
        version = %negotiated.version,
        cipher_suite = %negotiated.cipher_suite,
        group = ?negotiated.group(),
        psk = ?negotiated.selected_psk,
        "client negotiation complete"
    );
    Ok(negotiated)
}

// --- Server side ---

/// Answers each client extension with zero or one server extension, keeping the client's order.
///
/// `key_share` is the server's share for the chosen group and `selected_psk`
/// the accepted identity index, both decided by the caller.
///
/// 对每个客户端扩展回应零个或一个服务器扩展，并保持客户端的顺序。
pub fn negotiate_server_extensions(
    client_exts: &[Extension],
    config: &Config,
    cipher_suite: CipherSuite,
    key_share: Option<&KeyShareEntry>,
    selected_psk: Option<u16>,
) -> Vec<Extension> {
    let version = if cipher_suite.is_tls13() {
        ProtocolVersion::TLS13
    } else {
        ProtocolVersion::TLS12
    };
    let tls12 = version == ProtocolVersion::TLS12;

    client_exts
        .iter()
        .filter_map(|ext| match ext {
            Extension::ServerName(ServerNameExt::Names(_)) if selected_psk.is_none() => {
                Some(Extension::ServerName(ServerNameExt::Acknowledged))
            }
            Extension::SupportedVersions(SupportedVersionsExt::Offered(offered)) if !tls12 => {
                offered.contains(&version).then_some(Extension::SupportedVersions(
                    SupportedVersionsExt::Selected(version),
                ))
            }
            Extension::KeyShare(KeyShareExt::ClientShares(_)) if !tls12 => key_share
                .cloned()
                .map(|share| Extension::KeyShare(KeyShareExt::ServerShare(share))),
            Extension::PreSharedKey(PreSharedKeyExt::Offer(_)) if !tls12 => selected_psk
                .map(|index| Extension::PreSharedKey(PreSharedKeyExt::Selected(index))),
            Extension::EarlyData(EarlyDataExt::Indication)
                if !tls12 && config.allow_early_data && selected_psk == Some(0) =>
            {
                Some(Extension::EarlyData(EarlyDataExt::Indication))
            }
            Extension::ExtendedMasterSecret if tls12 && config.extended_master_secret => {
                Some(Extension::ExtendedMasterSecret)
            }
            Extension::EcPointFormats(_) if tls12 && cipher_suite.is_ecdhe() => {
                Some(Extension::EcPointFormats(vec![EcPointFormat::UNCOMPRESSED]))
            }
            _ => None,
        })
        .collect()
}

/// Chooses the version, cipher suite, key share and PSK for `hello` and builds the ServerHello.
///
/// `key_shares` holds the server's own share for each group it can use.
/// Choices follow the server's preference order.
///
/// 为 `hello` 选择版本、密码套件、密钥共享与 PSK，并构造 ServerHello。
/// 选择遵循服务器的优先顺序。
pub fn negotiate_server_hello(
    config: &Config,
    hello: &ClientHello,
    random: [u8; 32],
    key_shares: &[KeyShareEntry],
    selected_psk: Option<u16>,
) -> Result<ServerHello> {
    let client_exts = &hello.extensions;

    let offered = offered_versions(client_exts);
    let version = if offered.is_empty() {
        if hello.legacy_version >= ProtocolVersion::TLS12
            && config.supports_version(ProtocolVersion::TLS12)
        {
            ProtocolVersion::TLS12
        } else {
            return Err(NegotiationError::UnsupportedVersion(hello.legacy_version));
        }
    } else {
        config
            .select_version(offered)
            .ok_or(NegotiationError::UnsupportedVersion(hello.legacy_version))?
    };

    let cipher_suite = config
        .cipher_suites
        .iter()
        .copied()
        .find(|s| s.usable_with(version) && hello.cipher_suites.contains(s))
        .ok_or(NegotiationError::NoCommonCipherSuite)?;

    let selected_psk = if version == ProtocolVersion::TLS13 {
        selected_psk
    } else {
        None
    };
    let modes = offered_psk_modes(client_exts);
    if let Some(index) = selected_psk {
        if !config.allow_psk_resumption || modes.is_none() {
            return Err(NegotiationError::PskNotAllowed);
        }
        let offered = offered_psk(client_exts).map_or(0, |o| o.identities.len());
        if usize::from(index) >= offered {
            return Err(NegotiationError::PskIdentityOutOfRange {
                selected: index,
                offered,
            });
        }
    }

    let psk_dhe = modes.is_some_and(PskModes::allows_psk_dhe) && config.allow_dhe_resumption;
    let needs_key_share =
        version == ProtocolVersion::TLS13 && (selected_psk.is_none() || psk_dhe);
    if selected_psk.is_some()
        && !needs_key_share
        && !modes.is_some_and(PskModes::allows_psk_only)
    {
        return Err(NegotiationError::PskNotAllowed);
    }

    let key_share = if needs_key_share {
        let client_shares = offered_shares(client_exts);
        let share = config
            .groups
            .iter()
            .filter(|g| client_shares.iter().any(|s| s.group == **g))
            .find_map(|g| key_shares.iter().find(|k| k.group == *g))
            .ok_or(NegotiationError::NoCommonGroup)?;
        Some(share)
    } else {
        None
    };

    if version == ProtocolVersion::TLS13 && selected_psk.is_none() {
        let schemes = offered_signature_schemes(client_exts).ok_or(
            NegotiationError::MissingExtension {
                ext: ExtensionType::SIGNATURE_ALGORITHMS,
                version,
            },
        )?;
        if intersect(schemes, &config.signature_schemes).is_empty() {
            return Err(NegotiationError::IncompatibleSignatureAlgorithms);
        }
    }

    let extensions =
        negotiate_server_extensions(client_exts, config, cipher_suite, key_share, selected_psk);
    debug!(
        version = %version,
        cipher_suite = %cipher_suite,
        group = ?key_share.map(|k| k.group),
        psk = ?selected_psk,
        extensions = extensions.len(),
        "server negotiation complete"
    );

    Ok(ServerHello {
        legacy_version: ProtocolVersion::TLS12,
        random,
        session_id: hello.session_id.clone(),
        cipher_suite,
        compression_method: 0,
        extensions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::extension::{PskBinder, PskIdentity};

    fn share(group: NamedGroup) -> KeyShareEntry {
        KeyShareEntry::new(group, vec![group.0 as u8; 32])
    }

    fn psk_offer(identities: usize) -> PskOffer {
        PskOffer {
            identities: (0..identities)
                .map(|i| PskIdentity {
                    identity: vec![i as u8 + 1; 16],
                    obfuscated_ticket_age: 0,
                })
                .collect(),
            binders: (0..identities)
                .map(|_| PskBinder::new(vec![0; 32]).unwrap())
                .collect(),
        }
    }

    fn client_hello(config: &Config, offer: &ClientOffer) -> ClientHello {
        ClientHello {
            legacy_version: ProtocolVersion::TLS12,
            random: [7; 32],
            session_id: vec![],
            cipher_suites: config.cipher_suites.clone(),
            compression_methods: vec![0],
            extensions: prepare_client_extensions(config, offer),
        }
    }

    fn types(exts: &[Extension]) -> Vec<ExtensionType> {
        exts.iter().map(Extension::ext_type).collect()
    }

    #[test]
    fn client_extension_order() {
        let config = Config::builder()
            .server_name("example.com")
            .cipher_suites(vec![
                CipherSuite::TLS13_AES_128_GCM_SHA256,
                CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
            ])
            .build()
            .unwrap();
        let offer = ClientOffer {
            key_shares: vec![share(NamedGroup::X25519)],
            psk: Some(psk_offer(1)),
            ..Default::default()
        };
        let exts = prepare_client_extensions(&config, &offer);
        assert_eq!(
            types(&exts),
            vec![
                ExtensionType::SERVER_NAME,
                ExtensionType::SUPPORTED_VERSIONS,
                ExtensionType::KEY_SHARE,
                ExtensionType::EXTENDED_MASTER_SECRET,
                ExtensionType::SIGNATURE_ALGORITHMS,
                ExtensionType::EC_POINT_FORMATS,
                ExtensionType::SUPPORTED_GROUPS,
                ExtensionType::PSK_KEY_EXCHANGE_MODES,
                ExtensionType::PRE_SHARED_KEY,
            ]
        );
    }

    #[test]
    fn psk_dropped_when_resumption_disabled() {
        let config = Config::builder().allow_psk_resumption(false).build().unwrap();
        let offer = ClientOffer {
            psk: Some(psk_offer(1)),
            early_data: true,
            ..Default::default()
        };
        let exts = prepare_client_extensions(&config, &offer);
        assert!(extension::find(&exts, ExtensionType::PRE_SHARED_KEY).is_none());
        assert!(extension::find(&exts, ExtensionType::EARLY_DATA).is_none());
    }

    #[test]
    fn full_handshake_negotiates_both_ways() {
        let config = Config::default();
        let offer = ClientOffer {
            key_shares: vec![share(NamedGroup::SECP256R1), share(NamedGroup::X25519)],
            ..Default::default()
        };
        let hello = client_hello(&config, &offer);
        let server_share = share(NamedGroup::X25519);
        let sh = negotiate_server_hello(&config, &hello, [9; 32], &[server_share.clone()], None)
            .unwrap();
        assert_eq!(sh.cipher_suite, CipherSuite::TLS13_AES_128_GCM_SHA256);
        assert_eq!(sh.selected_version(), ProtocolVersion::TLS13);
        assert_eq!(
            types(&sh.extensions),
            vec![ExtensionType::SUPPORTED_VERSIONS, ExtensionType::KEY_SHARE]
        );

        let negotiated =
            negotiate_client_extensions(&config, &hello.extensions, &sh.extensions, sh.cipher_suite)
                .unwrap();
        assert_eq!(negotiated.version(), ProtocolVersion::TLS13);
        assert_eq!(negotiated.key_share(), Some(&server_share));
        assert!(!negotiated.extended_master_secret());
        assert_eq!(negotiated.signature_schemes(), config.signature_schemes.as_slice());
    }

    #[test]
    fn unsolicited_extension_rejected() {
        let config = Config::default();
        let client = prepare_client_extensions(&config, &ClientOffer::default());
        let server = vec![
            Extension::SupportedVersions(SupportedVersionsExt::Selected(ProtocolVersion::TLS13)),
            Extension::EarlyData(EarlyDataExt::Indication),
        ];
        assert_eq!(
            negotiate_client_extensions(
                &config,
                &client,
                &server,
                CipherSuite::TLS13_AES_128_GCM_SHA256
            ),
            Err(NegotiationError::UnsolicitedExtension(ExtensionType::EARLY_DATA))
        );
    }

    #[test]
    fn ecdhe_only_client_advertises_groups() {
        let config = Config::builder()
            .versions(vec![ProtocolVersion::TLS12])
            .cipher_suites(vec![CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256])
            .build()
            .unwrap();
        let exts = prepare_client_extensions(&config, &ClientOffer::default());
        assert_eq!(
            types(&exts),
            vec![
                ExtensionType::EXTENDED_MASTER_SECRET,
                ExtensionType::SIGNATURE_ALGORITHMS,
                ExtensionType::EC_POINT_FORMATS,
                ExtensionType::SUPPORTED_GROUPS,
            ]
        );
    }

    #[test]
    fn hello_retry_forms_rejected_in_server_hello() {
        let config = Config::default();
        let offer = ClientOffer {
            key_shares: vec![share(NamedGroup::SECP256R1)],
            ..Default::default()
        };
        let client = prepare_client_extensions(&config, &offer);
        let suite = CipherSuite::TLS13_AES_128_GCM_SHA256;
        let selected =
            Extension::SupportedVersions(SupportedVersionsExt::Selected(ProtocolVersion::TLS13));

        let retry = vec![
            selected.clone(),
            Extension::KeyShare(KeyShareExt::HelloRetry(NamedGroup::X25519)),
        ];
        assert_eq!(
            negotiate_client_extensions(&config, &client, &retry, suite),
            Err(NegotiationError::UnexpectedForm(ExtensionType::KEY_SHARE))
        );

        // A cookie the client never sent is unsolicited.
        let with_cookie = vec![
            selected.clone(),
            Extension::KeyShare(KeyShareExt::ServerShare(share(NamedGroup::SECP256R1))),
            Extension::Cookie(vec![1, 2, 3]),
        ];
        assert_eq!(
            negotiate_client_extensions(&config, &client, &with_cookie, suite),
            Err(NegotiationError::UnsolicitedExtension(ExtensionType::COOKIE))
        );

        // An echoed cookie still has no place in a ServerHello.
        let echoing = ClientOffer {
            key_shares: vec![share(NamedGroup::SECP256R1)],
            cookie: Some(vec![1, 2, 3]),
            ..Default::default()
        };
        let client = prepare_client_extensions(&config, &echoing);
        assert_eq!(
            negotiate_client_extensions(&config, &client, &with_cookie, suite),
            Err(NegotiationError::UnexpectedForm(ExtensionType::COOKIE))
        );
    }

    #[test]
    fn early_data_requires_first_psk_identity() {
        let config = Config::builder().allow_early_data(true).build().unwrap();
        let offer = ClientOffer {
            key_shares: vec![share(NamedGroup::X25519)],
            psk: Some(psk_offer(2)),
            early_data: true,
            ..Default::default()
        };
        let client = prepare_client_extensions(&config, &offer);
        let suite = CipherSuite::TLS13_AES_128_GCM_SHA256;
        let base = vec![
            Extension::SupportedVersions(SupportedVersionsExt::Selected(ProtocolVersion::TLS13)),
            Extension::KeyShare(KeyShareExt::ServerShare(share(NamedGroup::X25519))),
        ];
        let with = |extra: Vec<Extension>| [base.clone(), extra].concat();

        // No PSK selected.
        assert_eq!(
            negotiate_client_extensions(
                &config,
                &client,
                &with(vec![Extension::EarlyData(EarlyDataExt::Indication)]),
                suite
            ),
            Err(NegotiationError::EarlyDataWithoutPsk)
        );

        // Second identity selected.
        let second = with(vec![
            Extension::EarlyData(EarlyDataExt::Indication),
            Extension::PreSharedKey(PreSharedKeyExt::Selected(1)),
        ]);
        assert_eq!(
            negotiate_client_extensions(&config, &client, &second, suite),
            Err(NegotiationError::EarlyDataWithoutPsk)
        );

        // The NewSessionTicket form does not belong in a ServerHello.
        let ticket_form = with(vec![
            Extension::EarlyData(EarlyDataExt::MaxSize(1024)),
            Extension::PreSharedKey(PreSharedKeyExt::Selected(0)),
        ]);
        assert_eq!(
            negotiate_client_extensions(&config, &client, &ticket_form, suite),
            Err(NegotiationError::UnexpectedForm(ExtensionType::EARLY_DATA))
        );

        let first = with(vec![
            Extension::EarlyData(EarlyDataExt::Indication),
            Extension::PreSharedKey(PreSharedKeyExt::Selected(0)),
        ]);
        let negotiated = negotiate_client_extensions(&config, &client, &first, suite).unwrap();
        assert!(negotiated.early_data_accepted());
        assert_eq!(negotiated.selected_psk(), Some(0));
    }

    #[test]
    fn tls13_requires_key_share() {
        let config = Config::default();
        let client = prepare_client_extensions(&config, &ClientOffer::default());
        let server = vec![Extension::SupportedVersions(SupportedVersionsExt::Selected(
            ProtocolVersion::TLS13,
        ))];
        assert_eq!(
            negotiate_client_extensions(
                &config,
                &client,
                &server,
                CipherSuite::TLS13_AES_128_GCM_SHA256
            ),
            Err(NegotiationError::MissingExtension {
                ext: ExtensionType::KEY_SHARE,
                version: ProtocolVersion::TLS13
            })
        );
    }

    #[test]
    fn tls13_suite_without_supported_versions() {
        let config = Config::default();
        let client = prepare_client_extensions(&config, &ClientOffer::default());
        let err = negotiate_client_extensions(
            &config,
            &client,
            &[],
            CipherSuite::TLS13_AES_128_GCM_SHA256,
        )
        .unwrap_err();
        assert!(matches!(err, NegotiationError::MissingExtension { .. }));
    }

    #[test]
    fn extended_master_secret_illegal_under_tls13() {
        let config = Config::default();
        let offer = ClientOffer {
            key_shares: vec![share(NamedGroup::X25519)],
            ..Default::default()
        };
        let client = prepare_client_extensions(&config, &offer);
        let server = vec![
            Extension::SupportedVersions(SupportedVersionsExt::Selected(ProtocolVersion::TLS13)),
            Extension::KeyShare(KeyShareExt::ServerShare(share(NamedGroup::X25519))),
            Extension::ExtendedMasterSecret,
        ];
        let err = negotiate_client_extensions(
            &config,
            &client,
            &server,
            CipherSuite::TLS13_AES_128_GCM_SHA256,
        )
        .unwrap_err();
        assert_eq!(
            err,
            NegotiationError::IllegalForVersion {
                ext: ExtensionType::EXTENDED_MASTER_SECRET,
                version: ProtocolVersion::TLS13
            }
        );
    }

    #[test]
    fn key_share_for_unoffered_group() {
        let config = Config::default();
        let offer = ClientOffer {
            key_shares: vec![share(NamedGroup::X25519)],
            ..Default::default()
        };
        let client = prepare_client_extensions(&config, &offer);
        let server = vec![
            Extension::SupportedVersions(SupportedVersionsExt::Selected(ProtocolVersion::TLS13)),
            Extension::KeyShare(KeyShareExt::ServerShare(share(NamedGroup::SECP384R1))),
        ];
        assert_eq!(
            negotiate_client_extensions(
                &config,
                &client,
                &server,
                CipherSuite::TLS13_AES_128_GCM_SHA256
            ),
            Err(NegotiationError::KeyShareMismatch(NamedGroup::SECP384R1))
        );
    }

    #[test]
    fn signature_algorithms_must_intersect() {
        let client_config = Config::builder()
            .signature_schemes(vec![SignatureScheme::RSA_PKCS1_SHA256])
            .build()
            .unwrap();
        let server_config = Config::default();
        let offer = ClientOffer {
            key_shares: vec![share(NamedGroup::X25519)],
            ..Default::default()
        };
        let hello = client_hello(&client_config, &offer);
        assert_eq!(
            negotiate_server_hello(
                &server_config,
                &hello,
                [0; 32],
                &[share(NamedGroup::X25519)],
                None
            ),
            Err(NegotiationError::IncompatibleSignatureAlgorithms)
        );
    }

    #[test]
    fn psk_only_resumption() {
        let config = Config::builder().allow_dhe_resumption(false).build().unwrap();
        let offer = ClientOffer {
            psk: Some(psk_offer(2)),
            ..Default::default()
        };
        let hello = client_hello(&config, &offer);
        let sh = negotiate_server_hello(&config, &hello, [0; 32], &[], Some(1)).unwrap();
        let negotiated =
            negotiate_client_extensions(&config, &hello.extensions, &sh.extensions, sh.cipher_suite)
                .unwrap();
        assert!(negotiated.is_psk_only());
        assert_eq!(negotiated.selected_psk(), Some(1));

        assert_eq!(
            negotiate_server_hello(&config, &hello, [0; 32], &[], Some(2)),
            Err(NegotiationError::PskIdentityOutOfRange {
                selected: 2,
                offered: 2
            })
        );
    }

    #[test]
    fn tls12_handshake_uses_legacy_extensions() {
        let config = Config::builder()
            .versions(vec![ProtocolVersion::TLS12])
            .cipher_suites(vec![CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256])
            .build()
            .unwrap();
        let hello = client_hello(&config, &ClientOffer::default());
        let sh = negotiate_server_hello(&config, &hello, [0; 32], &[], None).unwrap();
        assert_eq!(
            types(&sh.extensions),
            vec![
                ExtensionType::EXTENDED_MASTER_SECRET,
                ExtensionType::EC_POINT_FORMATS
            ]
        );
        let negotiated =
            negotiate_client_extensions(&config, &hello.extensions, &sh.extensions, sh.cipher_suite)
                .unwrap();
        assert_eq!(negotiated.version(), ProtocolVersion::TLS12);
        assert!(negotiated.extended_master_secret());
    }

    #[test]
    fn no_common_group() {
        let config = Config::default();
        let offer = ClientOffer {
            key_shares: vec![share(NamedGroup::SECP384R1)],
            ..Default::default()
        };
        let hello = client_hello(&config, &offer);
        assert_eq!(
            negotiate_server_hello(&config, &hello, [0; 32], &[share(NamedGroup::X25519)], None),
            Err(NegotiationError::NoCommonGroup)
        );
    }
}
