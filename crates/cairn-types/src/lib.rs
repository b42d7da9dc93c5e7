//! Foundation types for Cairn.
//!
//! This crate provides the identity and value types shared by every other
//! Cairn crate. An asset is addressed by the triple `(asset type, asset id,
//! data format)`; the same triple keys the local cache and, rendered as
//! `"{asset_id}.{data_format}"`, the remote object store.
//!
//! # Key Types
//!
//! - [`AssetType`] -- What kind of thing an asset is (project, bitmap, vector, sound)
//! - [`DataFormat`] -- The file format / extension of the payload
//! - [`AssetKey`] -- The identity triple
//! - [`Asset`] -- Identity plus a payload that is populated at most once
//! - [`RequestDescriptor`] -- URL plus credential flag for write requests

pub mod asset;
pub mod error;
pub mod kind;
pub mod request;

pub use asset::{Asset, AssetKey};
pub use error::TypeError;
pub use kind::{AssetType, DataFormat};
pub use request::RequestDescriptor;
