// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod annotations;
pub mod checks;
pub mod config;
pub mod constants;
pub mod converge;
pub mod error;
pub mod fixtures;
pub mod kubernetes;
pub mod projects;
pub mod types;

#[cfg(test)]
pub mod test_utils;
