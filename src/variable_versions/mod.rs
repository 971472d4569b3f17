//! Template-driven NetFlow protocols: v9 (RFC 3954) and IPFIX (RFC 7011).
//!
//! Both protocols separate a record's *shape* (a template, announced once
//! per observation domain) from its *data* (subsequent sets decoded against
//! that shape). The registry holding observed templates lives on the
//! reader (`crate::reader`), keyed per observation domain; this module only
//! holds the wire-level domain types and the lookup tables used to decode
//! them.
//!
//! `common` holds the pieces shared between the two protocols (the decoded
//! value representation); `v9`/`v9_lookup` and `ipfix`/`ipfix_lookup` are
//! kept as separate pairs rather than merged, since their options-template
//! framing genuinely differs (design note §9).

pub mod common;
pub mod enterprise_registry;
pub mod ipfix;
pub mod ipfix_lookup;
pub mod v9;
pub mod v9_lookup;
