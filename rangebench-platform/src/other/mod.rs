/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Platforms without a `/proc` filesystem. Memory introspection is reported as unsupported.

use std::io;

use crate::MemoryFootprint;

pub fn memory_footprint() -> io::Result<MemoryFootprint> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "process status is only available on linux",
    ))
}
