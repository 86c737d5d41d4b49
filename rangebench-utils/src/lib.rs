/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */
#![cfg_attr(
    not(test),
    warn(clippy::panic, clippy::unwrap_used, clippy::expect_used)
)]

pub mod io;
pub mod partition;
pub mod text;
pub mod views;

pub use partition::PartitionIter;
pub use views::Matrix;
