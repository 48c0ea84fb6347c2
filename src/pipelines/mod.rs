// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines that run off the engine task
//!
//! - [`photo`]: PNG encoding and photo record assembly

pub mod photo;
