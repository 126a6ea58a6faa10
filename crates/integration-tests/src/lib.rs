//! Integration tests for MythicMarket.
//!
//! This crate contains cross-crate tests: the gateway router driven through
//! `tower::ServiceExt::oneshot`, the Discord message builders, and the
//! storefront submission pipeline against scripted transports. The library
//! target is empty; everything lives under `tests/`.

#![cfg_attr(not(test), forbid(unsafe_code))]
