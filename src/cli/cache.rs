// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use streamhop::CacheManager;

pub enum CacheCommand {
    Clear,
}

impl CacheCommand {
    pub async fn execute(self) -> Result<()> {
        match self {
            Self::Clear => {
                let cache = CacheManager::new()?;
                eprintln!("Clearing cache in {}...", cache.cache_dir().display());
                cache.clear().await?;
                println!("Cache cleared");
            }
        }

        Ok(())
    }
}
