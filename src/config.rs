// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Configuration document loading for the CLI.
//!
//! The document is a JSON object matching [`ScanTarget`]: required `url`
//! and non-empty `userContexts`, optional `schema` and
//! `bolaConfig.targetObjectTypes`.

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;

use crate::types::ScanTarget;

pub fn load_scan_target(path: &Path) -> Result<ScanTarget> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("No se pudo leer el archivo de configuración {}", path.display()))?;
    let target: ScanTarget = serde_json::from_str(&raw)
        .with_context(|| format!("El archivo de configuración {} no es JSON válido", path.display()))?;
    validate(&target)?;
    Ok(target)
}

fn validate(target: &ScanTarget) -> Result<()> {
    if target.url.trim().is_empty() {
        bail!("La configuración requiere una URL de destino");
    }
    if !target.url.starts_with("http://") && !target.url.starts_with("https://") {
        bail!("La URL de destino debe ser HTTP(S) absoluta: {}", target.url);
    }
    if target.user_contexts.is_empty() {
        bail!("La configuración requiere al menos un userContext");
    }

    let mut seen = HashSet::new();
    for ctx in &target.user_contexts {
        if ctx.id.is_empty() {
            bail!("Cada userContext requiere un id");
        }
        if !seen.insert(ctx.id.as_str()) {
            bail!("El id de userContext '{}' está duplicado", ctx.id);
        }
        if ctx.auth_token.is_empty() {
            bail!("El userContext '{}' requiere un authToken", ctx.id);
        }
    }
    Ok(())
}
