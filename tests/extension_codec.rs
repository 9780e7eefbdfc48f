//! Wire-format tests for the extension codec.
//!
//! Known-answer vectors pin the byte layout; property tests check that every
//! well-formed list for a role decodes back to itself.

use proptest::prelude::*;
use tls_handshake_log::protocol::extension::{
    self, EarlyDataExt, Extension, KeyShareEntry, KeyShareExt, PreSharedKeyExt, PskBinder,
    PskIdentity, PskModes, PskOffer, ServerNameEntry, ServerNameExt, SupportedVersionsExt,
};
use tls_handshake_log::protocol::types::{
    EcPointFormat, ExtensionType, NamedGroup, ProtocolVersion, Role, SignatureScheme,
};

fn unknown_type() -> impl Strategy<Value = ExtensionType> {
    any::<u16>()
        .prop_map(ExtensionType)
        .prop_filter("registered types have a structured form", |t| !t.is_known())
}

fn bytes(range: std::ops::Range<usize>) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), range)
}

fn psk_modes() -> impl Strategy<Value = PskModes> {
    prop_oneof![
        Just(PskModes::PskKe),
        Just(PskModes::PskDheKe),
        Just(PskModes::PskKeThenDheKe),
        Just(PskModes::PskDheKeThenKe),
    ]
}

// Strategy for extensions a client may send.
fn client_extension() -> impl Strategy<Value = Extension> {
    prop_oneof![
        "[a-z]{1,24}(\\.[a-z]{2,8}){0,2}".prop_map(|name| {
            Extension::ServerName(ServerNameExt::Names(vec![ServerNameEntry::host_name(name)]))
        }),
        prop::collection::vec(any::<u16>().prop_map(NamedGroup), 1..8)
            .prop_map(Extension::SupportedGroups),
        prop::collection::vec(any::<u16>().prop_map(SignatureScheme), 1..8)
            .prop_map(Extension::SignatureAlgorithms),
        prop::collection::btree_map(any::<u16>(), bytes(1..48), 0..4).prop_map(|shares| {
            Extension::KeyShare(KeyShareExt::ClientShares(
                shares
                    .into_iter()
                    .map(|(group, key)| KeyShareEntry::new(NamedGroup(group), key))
                    .collect(),
            ))
        }),
        prop::collection::vec((bytes(1..24), any::<u32>(), bytes(32..40)), 1..4).prop_map(
            |entries| {
                let (identities, binders) = entries
                    .into_iter()
                    .map(|(identity, obfuscated_ticket_age, binder)| {
                        (
                            PskIdentity {
                                identity,
                                obfuscated_ticket_age,
                            },
                            PskBinder::new(binder).unwrap(),
                        )
                    })
                    .unzip();
                Extension::PreSharedKey(PreSharedKeyExt::Offer(PskOffer {
                    identities,
                    binders,
                }))
            }
        ),
        Just(Extension::EarlyData(EarlyDataExt::Indication)),
        prop::collection::vec(any::<u16>().prop_map(ProtocolVersion), 1..6).prop_map(|v| {
            Extension::SupportedVersions(SupportedVersionsExt::Offered(v))
        }),
        bytes(1..40).prop_map(Extension::Cookie),
        psk_modes().prop_map(Extension::PskKeyExchangeModes),
        Just(Extension::ExtendedMasterSecret),
        prop::collection::vec(any::<u8>().prop_map(EcPointFormat), 1..4)
            .prop_map(Extension::EcPointFormats),
        (unknown_type(), bytes(0..40))
            .prop_map(|(typ, payload)| Extension::Unknown { typ, payload }),
    ]
}

// Strategy for extensions a server may send.
fn server_extension() -> impl Strategy<Value = Extension> {
    prop_oneof![
        Just(Extension::ServerName(ServerNameExt::Acknowledged)),
        prop::collection::vec(any::<u16>().prop_map(NamedGroup), 1..8)
            .prop_map(Extension::SupportedGroups),
        prop::collection::vec(any::<u16>().prop_map(SignatureScheme), 1..8)
            .prop_map(Extension::SignatureAlgorithms),
        (any::<u16>(), bytes(1..48)).prop_map(|(group, key)| {
            Extension::KeyShare(KeyShareExt::ServerShare(KeyShareEntry::new(
                NamedGroup(group),
                key,
            )))
        }),
        any::<u16>().prop_map(|g| Extension::KeyShare(KeyShareExt::HelloRetry(NamedGroup(g)))),
        any::<u16>().prop_map(|i| Extension::PreSharedKey(PreSharedKeyExt::Selected(i))),
        Just(Extension::EarlyData(EarlyDataExt::Indication)),
        any::<u32>().prop_map(|size| Extension::EarlyData(EarlyDataExt::MaxSize(size))),
        any::<u16>().prop_map(|v| {
            Extension::SupportedVersions(SupportedVersionsExt::Selected(ProtocolVersion(v)))
        }),
        bytes(1..40).prop_map(Extension::Cookie),
        Just(Extension::ExtendedMasterSecret),
        prop::collection::vec(any::<u8>().prop_map(EcPointFormat), 1..4)
            .prop_map(Extension::EcPointFormats),
        (unknown_type(), bytes(0..40))
            .prop_map(|(typ, payload)| Extension::Unknown { typ, payload }),
    ]
}

// Keeps the first extension of each type; a client PSK offer moves to the end.
fn well_formed_list(role: Role, exts: Vec<Extension>) -> Vec<Extension> {
    let mut list: Vec<Extension> = Vec::with_capacity(exts.len());
    for ext in exts {
        if list.iter().all(|e| e.ext_type() != ext.ext_type()) {
            list.push(ext);
        }
    }
    if role == Role::Client {
        list.sort_by_key(|e| e.ext_type() == ExtensionType::PRE_SHARED_KEY);
    }
    list
}

#[test]
fn prop_client_list_round_trips() {
    proptest!(|(exts in prop::collection::vec(client_extension(), 0..10))| {
        let list = well_formed_list(Role::Client, exts);
        let wire = extension::encode_list(Role::Client, &list).unwrap();
        prop_assert_eq!(extension::decode_list(Role::Client, &wire).unwrap(), list);
    });
}

#[test]
fn prop_server_list_round_trips() {
    proptest!(|(exts in prop::collection::vec(server_extension(), 0..10))| {
        let list = well_formed_list(Role::Server, exts);
        let wire = extension::encode_list(Role::Server, &list).unwrap();
        prop_assert_eq!(extension::decode_list(Role::Server, &wire).unwrap(), list);
    });
}

#[test]
fn prop_truncated_list_never_decodes() {
    proptest!(|(
        exts in prop::collection::vec(client_extension(), 1..6),
        cut in any::<usize>(),
    )| {
        let list = well_formed_list(Role::Client, exts);
        let wire = extension::encode_list(Role::Client, &list).unwrap();
        let cut = cut % wire.len();
        prop_assert!(extension::decode_list(Role::Client, &wire[..cut]).is_err());
    });
}

#[test]
fn client_server_name_known_answer() {
    let list = vec![Extension::ServerName(ServerNameExt::Names(vec![
        ServerNameEntry::host_name("example.com"),
    ]))];
    let wire = extension::encode_list(Role::Client, &list).unwrap();
    assert_eq!(
        hex::encode(&wire),
        "001400000010000e00000b6578616d706c652e636f6d"
    );
    assert_eq!(extension::decode_list(Role::Client, &wire).unwrap(), list);
}

#[test]
fn supported_versions_known_answer() {
    let offered = Extension::SupportedVersions(SupportedVersionsExt::Offered(vec![
        ProtocolVersion::TLS13,
        ProtocolVersion::TLS12,
    ]));
    assert_eq!(
        hex::encode(extension::encode(Role::Client, &offered).unwrap()),
        "002b00050403040303"
    );

    let selected =
        Extension::SupportedVersions(SupportedVersionsExt::Selected(ProtocolVersion::TLS13));
    assert_eq!(
        hex::encode(extension::encode(Role::Server, &selected).unwrap()),
        "002b00020304"
    );
}

#[test]
fn server_key_share_known_answer() {
    let share = Extension::KeyShare(KeyShareExt::ServerShare(KeyShareEntry::new(
        NamedGroup::X25519,
        vec![0x11; 32],
    )));
    let wire = extension::encode(Role::Server, &share).unwrap();
    assert_eq!(
        hex::encode(&wire),
        format!("00280024001d0020{}", "11".repeat(32))
    );
    assert_eq!(extension::decode(Role::Server, &wire).unwrap(), share);
}

#[test]
fn psk_modes_known_answer() {
    let modes = Extension::PskKeyExchangeModes(PskModes::PskDheKeThenKe);
    assert_eq!(
        hex::encode(extension::encode(Role::Client, &modes).unwrap()),
        "002d0003020100"
    );
}

#[test]
fn duplicate_server_name_rejected_for_client() {
    // Two host_name entries inside one server_name extension.
    let wire = hex::decode("00120000000e000c000003612e62000003632e64").unwrap();
    let err = extension::decode_list(Role::Client, &wire).unwrap_err();
    assert!(err.reason.contains("duplicate server_name"), "got {err}");
}

#[test]
fn repeated_server_name_extension_rejected_for_client() {
    // Two server_name extensions, each naming "a.b".
    let ext = "000000080006000003612e62";
    let wire = hex::decode(format!("0018{ext}{ext}")).unwrap();
    let err = extension::decode_list(Role::Client, &wire).unwrap_err();
    assert!(err.reason.contains("duplicate extension"), "got {err}");
}

#[test]
fn duplicate_server_name_rejected_for_server() {
    // Two empty server_name acknowledgements.
    let wire = hex::decode("00080000000000000000").unwrap();
    let err = extension::decode_list(Role::Server, &wire).unwrap_err();
    assert!(err.reason.contains("duplicate extension"), "got {err}");
}

#[test]
fn server_early_data_forms() {
    let indication = hex::decode("002a0000").unwrap();
    assert_eq!(
        extension::decode(Role::Server, &indication).unwrap(),
        Extension::EarlyData(EarlyDataExt::Indication)
    );
    let max_size = hex::decode("002a000400004000").unwrap();
    assert_eq!(
        extension::decode(Role::Server, &max_size).unwrap(),
        Extension::EarlyData(EarlyDataExt::MaxSize(0x4000))
    );
    assert!(extension::decode(Role::Client, &max_size).is_err());
}
