//! Fixed-format NetFlow protocols: v5 and its close sibling v7. Neither
//! uses templates, so these modules implement `WireEncode`/`WireDecode`
//! directly on concrete header/record types.

pub mod v5;
pub mod v7;
