// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

/// Point-in-time copy of the buffer state, taken under the buffer lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BufferStats {
    pub buffer_size: usize,
    pub total_tracked: u64,
    pub successful_flushes: u64,
    pub failed_flushes: u64,
    pub timer_active: bool,
    pub flushing: bool,
    pub shutting_down: bool,
}
