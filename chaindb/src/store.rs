use std::fs;

use crate::asset::AssetDatabase;
use crate::cert::CertDatabase;
use crate::error::Result;
use crate::history::HistoryDatabase;
use crate::settings::Settings;

/// The chain tables of one node, each in its own file under one directory.
pub struct ChainStore {
    assets: AssetDatabase,
    certs: CertDatabase,
    history: HistoryDatabase,
}

impl ChainStore {
    /// Creates the directory and fresh table files. Fails if any table file
    /// already exists.
    pub fn create(settings: &Settings) -> Result<Self> {
        fs::create_dir_all(&settings.directory)?;
        let store = Self {
            assets: AssetDatabase::create(settings.asset_path(), settings.asset_config())?,
            certs: CertDatabase::create(settings.cert_path(), settings.cert_config())?,
            history: HistoryDatabase::create(settings.history_path(), settings.history_config())?,
        };
        tracing::info!(directory = %settings.directory.display(), "created chain store");
        Ok(store)
    }

    pub fn open(settings: &Settings) -> Result<Self> {
        let store = Self {
            assets: AssetDatabase::open(settings.asset_path(), settings.asset_config())?,
            certs: CertDatabase::open(settings.cert_path(), settings.cert_config())?,
            history: HistoryDatabase::open(settings.history_path(), settings.history_config())?,
        };
        tracing::info!(directory = %settings.directory.display(), "opened chain store");
        Ok(store)
    }

    pub fn assets(&self) -> &AssetDatabase {
        &self.assets
    }

    pub fn certs(&self) -> &CertDatabase {
        &self.certs
    }

    pub fn history(&self) -> &HistoryDatabase {
        &self.history
    }

    pub fn sync(&self) -> Result<()> {
        self.assets.sync()?;
        self.certs.sync()?;
        self.history.sync()
    }

    pub fn stop(&self) -> Result<()> {
        self.assets.stop()?;
        self.certs.stop()?;
        self.history.stop()
    }

    pub fn close(&self) -> Result<()> {
        self.assets.close()?;
        self.certs.close()?;
        self.history.close()
    }
}
