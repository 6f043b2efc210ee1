// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod bola;
pub mod dos;

pub use bola::BolaProber;
pub use dos::DosProber;

/// Pause between consecutive probes
pub(crate) const PROBE_PAUSE_MS: u64 = 50;

pub(crate) async fn pause() {
    tokio::time::sleep(std::time::Duration::from_millis(PROBE_PAUSE_MS)).await;
}
