//! Registered TLS code points used by the handshake log and the negotiator.
//!
//! Each code point is a transparent newtype over its wire integer so that
//! unassigned values survive a decode/encode cycle unchanged.
//!
//! 握手日志与协商器使用的 TLS 注册码点。
//!
//! 每个码点都是对其线上整数的透明新类型封装，因此未分配的值在解码/编码后保持不变。
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! wire_code {
    (
        $(#[$meta:meta])*
        $name:ident($repr:ty) {
            $( $const:ident = $value:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $repr);

        impl $name {
            $( pub const $const: Self = Self($value); )*

            /// Returns the registered name of this code point, if it has one.
            pub fn name(self) -> Option<&'static str> {
                match self {
                    $( Self::$const => Some(stringify!($const)), )*
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.name() {
                    Some(name) => f.write_str(name),
                    None => write!(f, "{}(0x{:x})", stringify!($name), self.0),
                }
            }
        }

        impl From<$repr> for $name {
            fn from(value: $repr) -> Self {
                Self(value)
            }
        }
    };
}

wire_code! {
    /// A protocol version as carried in `supported_versions` and the legacy version fields.
    ProtocolVersion(u16) {
        TLS12 = 0x0303,
        TLS13 = 0x0304,
    }
}

wire_code! {
    /// A cipher suite identifier.
    CipherSuite(u16) {
        TLS_DHE_RSA_WITH_AES_128_GCM_SHA256 = 0x009e,
        TLS_DHE_RSA_WITH_AES_256_GCM_SHA384 = 0x009f,
        TLS13_AES_128_GCM_SHA256 = 0x1301,
        TLS13_AES_256_GCM_SHA384 = 0x1302,
        TLS13_CHACHA20_POLY1305_SHA256 = 0x1303,
        TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256 = 0xc02b,
        TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 = 0xc02c,
        TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256 = 0xc02f,
        TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384 = 0xc030,
        TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256 = 0xcca8,
        TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256 = 0xcca9,
        TLS_DHE_RSA_WITH_CHACHA20_POLY1305_SHA256 = 0xccaa,
    }
}

impl CipherSuite {
    /// Whether this is a TLS 1.3 suite (`0x13xx`).
    pub fn is_tls13(self) -> bool {
        self.0 >> 8 == 0x13
    }

    /// Whether this is a TLS 1.2 suite with an ephemeral elliptic-curve key exchange.
    pub fn is_ecdhe(self) -> bool {
        matches!(
            self.0,
            0xc006..=0xc00a
                | 0xc010..=0xc014
                | 0xc023
                | 0xc024
                | 0xc027
                | 0xc028
                | 0xc02b
                | 0xc02c
                | 0xc02f
                | 0xc030
                | 0xcca8
                | 0xcca9
        )
    }

    /// Whether this is a TLS 1.2 suite with a finite-field ephemeral key exchange.
    pub fn is_dhe(self) -> bool {
        matches!(self.0, 0x0033 | 0x0039 | 0x009e | 0x009f | 0xccaa)
    }

    /// Whether this suite can be used under the given protocol version.
    pub fn usable_with(self, version: ProtocolVersion) -> bool {
        if version == ProtocolVersion::TLS13 {
            self.is_tls13()
        } else {
            !self.is_tls13()
        }
    }
}

wire_code! {
    /// A key-exchange group from `supported_groups` and `key_share`.
    NamedGroup(u16) {
        SECP256R1 = 0x0017,
        SECP384R1 = 0x0018,
        SECP521R1 = 0x0019,
        X25519 = 0x001d,
        X448 = 0x001e,
        FFDHE2048 = 0x0100,
        FFDHE3072 = 0x0101,
    }
}

wire_code! {
    /// A signature scheme from `signature_algorithms`.
    SignatureScheme(u16) {
        RSA_PKCS1_SHA256 = 0x0401,
        ECDSA_SECP256R1_SHA256 = 0x0403,
        ECDSA_SECP384R1_SHA384 = 0x0503,
        RSA_PSS_RSAE_SHA256 = 0x0804,
        RSA_PSS_RSAE_SHA384 = 0x0805,
        ED25519 = 0x0807,
    }
}

wire_code! {
    /// The type tag of an extension.
    ExtensionType(u16) {
        SERVER_NAME = 0x0000,
        SUPPORTED_GROUPS = 0x000a,
        EC_POINT_FORMATS = 0x000b,
        SIGNATURE_ALGORITHMS = 0x000d,
        EXTENDED_MASTER_SECRET = 0x0017,
        KEY_SHARE = 0x0028,
        PRE_SHARED_KEY = 0x0029,
        EARLY_DATA = 0x002a,
        SUPPORTED_VERSIONS = 0x002b,
        COOKIE = 0x002c,
        PSK_KEY_EXCHANGE_MODES = 0x002d,
    }
}

impl ExtensionType {
    /// Whether the codec has a structured representation for this type.
    pub fn is_known(self) -> bool {
        self.name().is_some()
    }
}

wire_code! {
    /// A PSK key exchange mode.
    PskKeyExchangeMode(u8) {
        PSK_KE = 0,
        PSK_DHE_KE = 1,
    }
}

wire_code! {
    /// An EC point format (only `uncompressed` is meaningful in practice).
    EcPointFormat(u8) {
        UNCOMPRESSED = 0,
        ANSIX962_COMPRESSED_PRIME = 1,
        ANSIX962_COMPRESSED_CHAR2 = 2,
    }
}

wire_code! {
    /// The name type of a `server_name` entry.
    ServerNameType(u8) {
        HOST_NAME = 0,
    }
}

/// Which side of the connection produced (or will consume) an encoding.
///
/// Several extensions have a different shape depending on who sends them,
/// so the codec is parameterised by the role of the sender.
///
/// 编码的发送方角色。
///
/// 某些扩展的格式取决于发送方，因此编解码器以发送方角色为参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Client,
    Server,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => f.write_str("client"),
            Role::Server => f.write_str("server"),
        }
    }
}

/// The handshake message kinds this crate parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandshakeType {
    ClientHello,
    ServerHello,
    EncryptedExtensions,
    Finished,
}

impl HandshakeType {
    pub fn to_u8(self) -> u8 {
        match self {
            HandshakeType::ClientHello => 1,
            HandshakeType::ServerHello => 2,
            HandshakeType::EncryptedExtensions => 8,
            HandshakeType::Finished => 20,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(HandshakeType::ClientHello),
            2 => Some(HandshakeType::ServerHello),
            8 => Some(HandshakeType::EncryptedExtensions),
            20 => Some(HandshakeType::Finished),
            _ => None,
        }
    }
}
