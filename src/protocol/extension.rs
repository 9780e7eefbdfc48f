//! Structured extension values and their wire encoding.
//!
//! Every extension is framed as `type(u16) || length(u16) || payload`. Several
//! payloads depend on the sender, so both directions of the codec take the
//! [`Role`] of the party that sends the extension.
//!
//! The codec obeys `decode(role, &encode(role, &e)?) == Ok(e)` for every value
//! `e` that `encode` accepts; `encode` refuses exactly the values `decode`
//! would reject.
//!
//! 结构化的扩展值及其线上编码。
//!
//! 每个扩展的格式为 `类型(u16) || 长度(u16) || 载荷`。部分载荷取决于发送方，
//! 因此编解码的两个方向都以发送方的 [`Role`] 为参数。
use crate::error::{Alert, DecodeError, EncodeError};
use crate::protocol::codec::{Reader, Writer};
use crate::protocol::types::{
    EcPointFormat, ExtensionType, NamedGroup, ProtocolVersion, PskKeyExchangeMode, Role,
    ServerNameType, SignatureScheme,
};

/// One entry of a client's `server_name` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerNameEntry {
    pub name_type: ServerNameType,
    pub name: Vec<u8>,
}

impl ServerNameEntry {
    pub fn host_name(name: impl Into<Vec<u8>>) -> Self {
        Self {
            name_type: ServerNameType::HOST_NAME,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerNameExt {
    /// Client: the names it wants to reach, at most one per name type.
    Names(Vec<ServerNameEntry>),
    /// Server: empty acknowledgement that a name was used.
    Acknowledged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyShareEntry {
    pub group: NamedGroup,
    pub key_exchange: Vec<u8>,
}

impl KeyShareEntry {
    pub fn new(group: NamedGroup, key_exchange: impl Into<Vec<u8>>) -> Self {
        Self {
            group,
            key_exchange: key_exchange.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyShareExt {
    /// Client: one share per group, possibly none.
    ClientShares(Vec<KeyShareEntry>),
    /// Server (ServerHello): the share matching one of the client's.
    ServerShare(KeyShareEntry),
    /// Server (HelloRetryRequest): the group the client should retry with.
    HelloRetry(NamedGroup),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PskIdentity {
    pub identity: Vec<u8>,
    pub obfuscated_ticket_age: u32,
}

/// A PSK binder value between 32 and 255 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PskBinder(Vec<u8>);

impl PskBinder {
    pub const MIN_LEN: usize = 32;
    pub const MAX_LEN: usize = 255;

    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, EncodeError> {
        let bytes = bytes.into();
        if !(Self::MIN_LEN..=Self::MAX_LEN).contains(&bytes.len()) {
            return Err(EncodeError::Invalid("PSK binder must be 32..=255 bytes"));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// The client's `pre_shared_key` offer: identities and one binder per identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PskOffer {
    pub identities: Vec<PskIdentity>,
    pub binders: Vec<PskBinder>,
}

impl PskOffer {
    pub const MAX_BINDERS: usize = 254;

    /// Wire length of the binders list, including its `u16` length prefix.
    ///
    /// This is the number of bytes cut from the end of a ClientHello to obtain
    /// the prefix the binders are computed over.
    pub fn binders_wire_len(&self) -> usize {
        2 + self.binders.iter().map(|b| 1 + b.0.len()).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreSharedKeyExt {
    Offer(PskOffer),
    /// Server: index into the client's identity list.
    Selected(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EarlyDataExt {
    /// Empty payload (ClientHello, EncryptedExtensions).
    Indication,
    /// NewSessionTicket: `max_early_data_size`.
    MaxSize(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupportedVersionsExt {
    Offered(Vec<ProtocolVersion>),
    Selected(ProtocolVersion),
}

/// The four admissible contents of `psk_key_exchange_modes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PskModes {
    PskKe,
    PskDheKe,
    PskKeThenDheKe,
    PskDheKeThenKe,
}

impl PskModes {
    pub fn modes(self) -> &'static [PskKeyExchangeMode] {
        use PskKeyExchangeMode as M;
        match self {
            PskModes::PskKe => &[M::PSK_KE],
            PskModes::PskDheKe => &[M::PSK_DHE_KE],
            PskModes::PskKeThenDheKe => &[M::PSK_KE, M::PSK_DHE_KE],
            PskModes::PskDheKeThenKe => &[M::PSK_DHE_KE, M::PSK_KE],
        }
    }

    pub fn from_modes(modes: &[PskKeyExchangeMode]) -> Option<Self> {
        use PskKeyExchangeMode as M;
        match modes {
            [M::PSK_KE] => Some(PskModes::PskKe),
            [M::PSK_DHE_KE] => Some(PskModes::PskDheKe),
            [M::PSK_KE, M::PSK_DHE_KE] => Some(PskModes::PskKeThenDheKe),
            [M::PSK_DHE_KE, M::PSK_KE] => Some(PskModes::PskDheKeThenKe),
            _ => None,
        }
    }

    pub fn allows_psk_only(self) -> bool {
        self.modes().contains(&PskKeyExchangeMode::PSK_KE)
    }

    pub fn allows_psk_dhe(self) -> bool {
        self.modes().contains(&PskKeyExchangeMode::PSK_DHE_KE)
    }
}

/// A single extension.
///
/// 单个扩展。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    ServerName(ServerNameExt),
    SupportedGroups(Vec<NamedGroup>),
    SignatureAlgorithms(Vec<SignatureScheme>),
    KeyShare(KeyShareExt),
    PreSharedKey(PreSharedKeyExt),
    EarlyData(EarlyDataExt),
    SupportedVersions(SupportedVersionsExt),
    Cookie(Vec<u8>),
    PskKeyExchangeModes(PskModes),
    ExtendedMasterSecret,
    EcPointFormats(Vec<EcPointFormat>),
    /// Any type the codec has no structure for, kept verbatim.
    Unknown {
        typ: ExtensionType,
        payload: Vec<u8>,
    },
}

impl Extension {
    pub fn ext_type(&self) -> ExtensionType {
        match self {
            Extension::ServerName(_) => ExtensionType::SERVER_NAME,
            Extension::SupportedGroups(_) => ExtensionType::SUPPORTED_GROUPS,
            Extension::SignatureAlgorithms(_) => ExtensionType::SIGNATURE_ALGORITHMS,
            Extension::KeyShare(_) => ExtensionType::KEY_SHARE,
            Extension::PreSharedKey(_) => ExtensionType::PRE_SHARED_KEY,
            Extension::EarlyData(_) => ExtensionType::EARLY_DATA,
            Extension::SupportedVersions(_) => ExtensionType::SUPPORTED_VERSIONS,
            Extension::Cookie(_) => ExtensionType::COOKIE,
            Extension::PskKeyExchangeModes(_) => ExtensionType::PSK_KEY_EXCHANGE_MODES,
            Extension::ExtendedMasterSecret => ExtensionType::EXTENDED_MASTER_SECRET,
            Extension::EcPointFormats(_) => ExtensionType::EC_POINT_FORMATS,
            Extension::Unknown { typ, .. } => *typ,
        }
    }

    /// Checks that this value has an encoding when sent by `role`.
    fn check(&self, role: Role) -> Result<(), EncodeError> {
        let wrong_role = || EncodeError::WrongRole {
            ext: self.ext_type(),
            role,
        };
        match (self, role) {
            (Extension::ServerName(ServerNameExt::Names(names)), Role::Client) => {
                if names.is_empty() {
                    return Err(EncodeError::Invalid("server_name list is empty"));
                }
                if names.iter().any(|n| n.name.is_empty()) {
                    return Err(EncodeError::Invalid("server_name entry is empty"));
                }
                if has_duplicates(names.iter().map(|n| n.name_type)) {
                    return Err(EncodeError::Invalid("duplicate server_name type"));
                }
                Ok(())
            }
            (Extension::ServerName(ServerNameExt::Acknowledged), Role::Server) => Ok(()),
            (Extension::ServerName(_), _) => Err(wrong_role()),

            (Extension::SupportedGroups(groups), _) => non_empty(groups, "supported_groups"),
            (Extension::SignatureAlgorithms(schemes), _) => {
                non_empty(schemes, "signature_algorithms")
            }

            (Extension::KeyShare(KeyShareExt::ClientShares(shares)), Role::Client) => {
                if shares.iter().any(|s| s.key_exchange.is_empty()) {
                    return Err(EncodeError::Invalid("empty key_exchange"));
                }
                if has_duplicates(shares.iter().map(|s| s.group)) {
                    return Err(EncodeError::Invalid("duplicate key_share group"));
                }
                Ok(())
            }
            (Extension::KeyShare(KeyShareExt::ServerShare(share)), Role::Server) => {
                if share.key_exchange.is_empty() {
                    return Err(EncodeError::Invalid("empty key_exchange"));
                }
                Ok(())
            }
            (Extension::KeyShare(KeyShareExt::HelloRetry(_)), Role::Server) => Ok(()),
            (Extension::KeyShare(_), _) => Err(wrong_role()),

            (Extension::PreSharedKey(PreSharedKeyExt::Offer(offer)), Role::Client) => {
                if offer.identities.is_empty() {
                    return Err(EncodeError::Invalid("no PSK identities"));
                }
                if offer.identities.iter().any(|i| i.identity.is_empty()) {
                    return Err(EncodeError::Invalid("empty PSK identity"));
                }
                if offer.binders.len() != offer.identities.len() {
                    return Err(EncodeError::Invalid("one binder per PSK identity required"));
                }
                if offer.binders.len() > PskOffer::MAX_BINDERS {
                    return Err(EncodeError::Invalid("more than 254 PSK binders"));
                }
                Ok(())
            }
            (Extension::PreSharedKey(PreSharedKeyExt::Selected(_)), Role::Server) => Ok(()),
            (Extension::PreSharedKey(_), _) => Err(wrong_role()),

            (Extension::EarlyData(EarlyDataExt::Indication), _) => Ok(()),
            (Extension::EarlyData(EarlyDataExt::MaxSize(_)), Role::Server) => Ok(()),
            (Extension::EarlyData(_), _) => Err(wrong_role()),

            (
                Extension::SupportedVersions(SupportedVersionsExt::Offered(versions)),
                Role::Client,
            ) => {
                non_empty(versions, "supported_versions")?;
                if versions.len() > 127 {
                    return Err(EncodeError::Invalid("more than 127 supported versions"));
                }
                Ok(())
            }
            (Extension::SupportedVersions(SupportedVersionsExt::Selected(_)), Role::Server) => {
                Ok(())
            }
            (Extension::SupportedVersions(_), _) => Err(wrong_role()),

            (Extension::Cookie(cookie), _) => non_empty(cookie, "cookie"),
            (Extension::PskKeyExchangeModes(_), Role::Client) => Ok(()),
            (Extension::PskKeyExchangeModes(_), _) => Err(wrong_role()),
            (Extension::ExtendedMasterSecret, _) => Ok(()),
            (Extension::EcPointFormats(formats), _) => non_empty(formats, "ec_point_formats"),

            (Extension::Unknown { typ, .. }, _) => {
                if typ.is_known() {
                    return Err(EncodeError::ReservedUnknownType(*typ));
                }
                Ok(())
            }
        }
    }
}

/// Returns the first extension of type `typ` in `list`.
pub fn find(list: &[Extension], typ: ExtensionType) -> Option<&Extension> {
    list.iter().find(|e| e.ext_type() == typ)
}

fn non_empty<T>(items: &[T], what: &'static str) -> Result<(), EncodeError> {
    if items.is_empty() {
        return Err(EncodeError::Invalid(what));
    }
    Ok(())
}

fn has_duplicates<T: PartialEq>(items: impl Iterator<Item = T>) -> bool {
    let mut seen = Vec::new();
    for item in items {
        if seen.contains(&item) {
            return true;
        }
        seen.push(item);
    }
    false
}

// --- Encoding ---

/// Encodes one extension as sent by `role`.
pub fn encode(role: Role, ext: &Extension) -> Result<Vec<u8>, EncodeError> {
    let mut w = Writer::new();
    write_extension(role, ext, &mut w)?;
    Ok(w.into_vec())
}

/// Encodes a `u16`-length-prefixed extension list as sent by `role`.
///
/// Duplicate kinds and a client `pre_shared_key` that is not last are refused,
/// as is any list whose body would exceed 65535 bytes.
pub fn encode_list(role: Role, exts: &[Extension]) -> Result<Vec<u8>, EncodeError> {
    let mut w = Writer::new();
    write_list(role, exts, &mut w)?;
    Ok(w.into_vec())
}

pub(crate) fn write_list(
    role: Role,
    exts: &[Extension],
    w: &mut Writer,
) -> Result<(), EncodeError> {
    let mut seen = Vec::with_capacity(exts.len());
    for (i, ext) in exts.iter().enumerate() {
        let typ = ext.ext_type();
        if seen.contains(&typ) {
            return Err(EncodeError::DuplicateExtension(typ));
        }
        if role == Role::Client && typ == ExtensionType::PRE_SHARED_KEY && i + 1 != exts.len() {
            return Err(EncodeError::Invalid("pre_shared_key must be the last extension"));
        }
        seen.push(typ);
    }

    w.with_u16_prefix("extension list", |w| {
        exts.iter().try_for_each(|ext| write_extension(role, ext, w))
    })
}

fn write_extension(role: Role, ext: &Extension, w: &mut Writer) -> Result<(), EncodeError> {
    ext.check(role)?;
    w.write_u16(ext.ext_type().0);
    w.with_u16_prefix("extension payload", |w| write_payload(ext, w))
}

fn write_payload(ext: &Extension, w: &mut Writer) -> Result<(), EncodeError> {
    match ext {
        Extension::ServerName(ServerNameExt::Names(names)) => {
            w.with_u16_prefix("server name list", |w| {
                for entry in names {
                    w.write_u8(entry.name_type.0);
                    w.with_u16_prefix("server name", |w| {
                        w.write_bytes(&entry.name);
                        Ok(())
                    })?;
                }
                Ok(())
            })
        }
        Extension::ServerName(ServerNameExt::Acknowledged)
        | Extension::EarlyData(EarlyDataExt::Indication)
        | Extension::ExtendedMasterSecret => Ok(()),
        Extension::SupportedGroups(groups) => w.with_u16_prefix("named group list", |w| {
            groups.iter().for_each(|g| w.write_u16(g.0));
            Ok(())
        }),
        Extension::SignatureAlgorithms(schemes) => {
            w.with_u16_prefix("signature scheme list", |w| {
                schemes.iter().for_each(|s| w.write_u16(s.0));
                Ok(())
            })
        }
        Extension::KeyShare(KeyShareExt::ClientShares(shares)) => {
            w.with_u16_prefix("client shares", |w| {
                shares.iter().try_for_each(|s| write_key_share(s, w))
            })
        }
        Extension::KeyShare(KeyShareExt::ServerShare(share)) => write_key_share(share, w),
        Extension::KeyShare(KeyShareExt::HelloRetry(group)) => {
            w.write_u16(group.0);
            Ok(())
        }
        Extension::PreSharedKey(PreSharedKeyExt::Offer(offer)) => {
            w.with_u16_prefix("PSK identities", |w| {
                for identity in &offer.identities {
                    w.with_u16_prefix("PSK identity", |w| {
                        w.write_bytes(&identity.identity);
                        Ok(())
                    })?;
                    w.write_u32(identity.obfuscated_ticket_age);
                }
                Ok(())
            })?;
            w.with_u16_prefix("PSK binders", |w| {
                for binder in &offer.binders {
                    w.with_u8_prefix("PSK binder", |w| {
                        w.write_bytes(binder.as_bytes());
                        Ok(())
                    })?;
                }
                Ok(())
            })
        }
        Extension::PreSharedKey(PreSharedKeyExt::Selected(index)) => {
            w.write_u16(*index);
            Ok(())
        }
        Extension::EarlyData(EarlyDataExt::MaxSize(size)) => {
            w.write_u32(*size);
            Ok(())
        }
        Extension::SupportedVersions(SupportedVersionsExt::Offered(versions)) => {
            w.with_u8_prefix("supported versions", |w| {
                versions.iter().for_each(|v| w.write_u16(v.0));
                Ok(())
            })
        }
        Extension::SupportedVersions(SupportedVersionsExt::Selected(version)) => {
            w.write_u16(version.0);
            Ok(())
        }
        Extension::Cookie(cookie) => w.with_u16_prefix("cookie", |w| {
            w.write_bytes(cookie);
            Ok(())
        }),
        Extension::PskKeyExchangeModes(modes) => w.with_u8_prefix("PSK modes", |w| {
            modes.modes().iter().for_each(|m| w.write_u8(m.0));
            Ok(())
        }),
        Extension::EcPointFormats(formats) => w.with_u8_prefix("point formats", |w| {
            formats.iter().for_each(|f| w.write_u8(f.0));
            Ok(())
        }),
        Extension::Unknown { payload, .. } => {
            w.write_bytes(payload);
            Ok(())
        }
    }
}

fn write_key_share(share: &KeyShareEntry, w: &mut Writer) -> Result<(), EncodeError> {
    w.write_u16(share.group.0);
    w.with_u16_prefix("key exchange", |w| {
        w.write_bytes(&share.key_exchange);
        Ok(())
    })
}

// --- Decoding ---

/// Decodes exactly one extension sent by `role`; trailing bytes are an error.
pub fn decode(role: Role, bytes: &[u8]) -> Result<Extension, DecodeError> {
    let mut r = Reader::new(bytes);
    let typ = ExtensionType(r.read_u16()?);
    let payload = r.sub_u16()?.rest();
    r.finish()?;
    decode_payload(role, typ, payload)
}

/// Decodes a `u16`-length-prefixed extension list sent by `role`.
///
/// Rejects a second extension of any kind (opaque extensions are compared by
/// raw type) and, for client lists, anything after `pre_shared_key`.
///
/// 解码由 `role` 发送的、带 `u16` 长度前缀的扩展列表。
///
/// 拒绝重复种类的扩展（未知扩展按原始类型比较），
/// 对客户端列表还拒绝出现在 `pre_shared_key` 之后的任何扩展。
pub fn decode_list(role: Role, bytes: &[u8]) -> Result<Vec<Extension>, DecodeError> {
    let mut r = Reader::new(bytes);
    let list = read_list(role, &mut r)?;
    r.finish()?;
    Ok(list)
}

pub(crate) fn read_list(role: Role, r: &mut Reader<'_>) -> Result<Vec<Extension>, DecodeError> {
    let mut body = r.sub_u16()?;
    let mut seen: Vec<ExtensionType> = Vec::new();
    let mut list = Vec::new();

    while !body.is_empty() {
        let typ = ExtensionType(body.read_u16()?);
        let payload = body.sub_u16()?.rest();

        if seen.contains(&typ) {
            return Err(DecodeError::malformed(format!("duplicate extension {typ}")));
        }
        if role == Role::Client && seen.last() == Some(&ExtensionType::PRE_SHARED_KEY) {
            return Err(DecodeError::illegal("pre_shared_key must be the last extension"));
        }
        seen.push(typ);
        list.push(decode_payload(role, typ, payload)?);
    }
    Ok(list)
}

fn decode_payload(
    role: Role,
    typ: ExtensionType,
    payload: &[u8],
) -> Result<Extension, DecodeError> {
    let mut r = Reader::new(payload);
    let ext = match typ {
        ExtensionType::SERVER_NAME => match role {
            Role::Client => Extension::ServerName(ServerNameExt::Names(read_server_names(&mut r)?)),
            Role::Server => Extension::ServerName(ServerNameExt::Acknowledged),
        },
        ExtensionType::SUPPORTED_GROUPS => Extension::SupportedGroups(
            read_u16_list(&mut r, "supported_groups")?
                .into_iter()
                .map(NamedGroup)
                .collect(),
        ),
        ExtensionType::SIGNATURE_ALGORITHMS => Extension::SignatureAlgorithms(
            read_u16_list(&mut r, "signature_algorithms")?
                .into_iter()
                .map(SignatureScheme)
                .collect(),
        ),
        ExtensionType::KEY_SHARE => Extension::KeyShare(match role {
            Role::Client => KeyShareExt::ClientShares(read_client_shares(&mut r)?),
            Role::Server if payload.len() == 2 => {
                KeyShareExt::HelloRetry(NamedGroup(r.read_u16()?))
            }
            Role::Server => KeyShareExt::ServerShare(read_key_share(&mut r)?),
        }),
        ExtensionType::PRE_SHARED_KEY => Extension::PreSharedKey(match role {
            Role::Client => PreSharedKeyExt::Offer(read_psk_offer(&mut r)?),
            Role::Server => PreSharedKeyExt::Selected(r.read_u16()?),
        }),
        ExtensionType::EARLY_DATA => Extension::EarlyData(match role {
            _ if payload.is_empty() => EarlyDataExt::Indication,
            Role::Server => EarlyDataExt::MaxSize(r.read_u32()?),
            Role::Client => return Err(DecodeError::malformed("client early_data must be empty")),
        }),
        ExtensionType::SUPPORTED_VERSIONS => Extension::SupportedVersions(match role {
            Role::Client => SupportedVersionsExt::Offered(read_versions(&mut r)?),
            Role::Server => SupportedVersionsExt::Selected(ProtocolVersion(r.read_u16()?)),
        }),
        ExtensionType::COOKIE => {
            let cookie = r.sub_u16()?.rest().to_vec();
            if cookie.is_empty() {
                return Err(DecodeError::malformed("empty cookie"));
            }
            Extension::Cookie(cookie)
        }
        ExtensionType::PSK_KEY_EXCHANGE_MODES => match role {
            Role::Client => {
                let modes: Vec<PskKeyExchangeMode> =
                    r.sub_u8()?.rest().iter().copied().map(PskKeyExchangeMode).collect();
                Extension::PskKeyExchangeModes(PskModes::from_modes(&modes).ok_or_else(|| {
                    DecodeError::illegal("psk_key_exchange_modes is not an admissible ordering")
                })?)
            }
            Role::Server => {
                return Err(DecodeError::illegal("psk_key_exchange_modes sent by server"));
            }
        },
        ExtensionType::EXTENDED_MASTER_SECRET => Extension::ExtendedMasterSecret,
        ExtensionType::EC_POINT_FORMATS => {
            let formats: Vec<EcPointFormat> =
                r.sub_u8()?.rest().iter().copied().map(EcPointFormat).collect();
            if formats.is_empty() {
                return Err(DecodeError::malformed("empty ec_point_formats"));
            }
            Extension::EcPointFormats(formats)
        }
        _ => Extension::Unknown {
            typ,
            payload: r.rest().to_vec(),
        },
    };
    r.finish()
        .map_err(|_| DecodeError::malformed(format!("trailing bytes in {typ}")))?;
    Ok(ext)
}

fn read_server_names(r: &mut Reader<'_>) -> Result<Vec<ServerNameEntry>, DecodeError> {
    let mut list = r.sub_u16()?;
    let mut names: Vec<ServerNameEntry> = Vec::new();
    while !list.is_empty() {
        let name_type = ServerNameType(list.read_u8()?);
        let name = list.sub_u16()?.rest().to_vec();
        if name.is_empty() {
            return Err(DecodeError::new(Alert::UnrecognizedName, "empty server name"));
        }
        if names.iter().any(|n| n.name_type == name_type) {
            return Err(DecodeError::malformed(format!(
                "duplicate server_name type {}",
                name_type.0
            )));
        }
        names.push(ServerNameEntry { name_type, name });
    }
    if names.is_empty() {
        return Err(DecodeError::malformed("empty server_name list"));
    }
    Ok(names)
}

fn read_u16_list(r: &mut Reader<'_>, what: &'static str) -> Result<Vec<u16>, DecodeError> {
    let mut list = r.sub_u16()?;
    if list.remaining() % 2 != 0 {
        return Err(DecodeError::malformed(format!("odd-length {what} list")));
    }
    let mut codes = Vec::with_capacity(list.remaining() / 2);
    while !list.is_empty() {
        codes.push(list.read_u16()?);
    }
    if codes.is_empty() {
        return Err(DecodeError::malformed(format!("empty {what} list")));
    }
    Ok(codes)
}

fn read_key_share(r: &mut Reader<'_>) -> Result<KeyShareEntry, DecodeError> {
    let group = NamedGroup(r.read_u16()?);
    let key_exchange = r.sub_u16()?.rest().to_vec();
    if key_exchange.is_empty() {
        return Err(DecodeError::malformed("empty key_exchange"));
    }
    Ok(KeyShareEntry { group, key_exchange })
}

fn read_client_shares(r: &mut Reader<'_>) -> Result<Vec<KeyShareEntry>, DecodeError> {
    let mut list = r.sub_u16()?;
    let mut shares: Vec<KeyShareEntry> = Vec::new();
    while !list.is_empty() {
        let share = read_key_share(&mut list)?;
        if shares.iter().any(|s| s.group == share.group) {
            return Err(DecodeError::illegal("duplicate key_share group"));
        }
        shares.push(share);
    }
    Ok(shares)
}

fn read_psk_offer(r: &mut Reader<'_>) -> Result<PskOffer, DecodeError> {
    let mut list = r.sub_u16()?;
    let mut identities = Vec::new();
    while !list.is_empty() {
        let identity = list.sub_u16()?.rest().to_vec();
        if identity.is_empty() {
            return Err(DecodeError::malformed("empty PSK identity"));
        }
        let obfuscated_ticket_age = list.read_u32()?;
        identities.push(PskIdentity {
            identity,
            obfuscated_ticket_age,
        });
    }
    if identities.is_empty() {
        return Err(DecodeError::malformed("no PSK identities"));
    }

    let mut list = r.sub_u16()?;
    let mut binders = Vec::new();
    while !list.is_empty() {
        let bytes = list.sub_u8()?.rest();
        let binder = PskBinder::new(bytes)
            .map_err(|_| DecodeError::malformed("PSK binder must be 32..=255 bytes"))?;
        binders.push(binder);
    }
    if binders.is_empty() || binders.len() > PskOffer::MAX_BINDERS {
        return Err(DecodeError::malformed("PSK binder count out of range"));
    }
    if binders.len() != identities.len() {
        return Err(DecodeError::illegal("PSK binder count differs from identity count"));
    }
    Ok(PskOffer { identities, binders })
}

fn read_versions(r: &mut Reader<'_>) -> Result<Vec<ProtocolVersion>, DecodeError> {
    let mut list = r.sub_u8()?;
    if list.remaining() % 2 != 0 || list.is_empty() {
        return Err(DecodeError::malformed("bad supported_versions length"));
    }
    let mut versions = Vec::new();
    while !list.is_empty() {
        versions.push(ProtocolVersion(list.read_u16()?));
    }
    Ok(versions)
}
