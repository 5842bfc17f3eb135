//! # Service Catalog

pub mod provisioned_product;
