use std::sync::{Mutex, MutexGuard, TryLockError};

use log::debug;

use crate::error::{Error, Result};
use crate::geo::model::GeoModel;

// The geometry engine is process-global: one session at a time.
static ENGINE: Mutex<()> = Mutex::new(());

/// Scoped handle on the geometry engine. Acquired by `initialize`, released on drop.
pub struct GeoSession {
    models: Vec<GeoModel>,
    _engine: MutexGuard<'static, ()>,
}

impl GeoSession {
    /// Waits until no other session is active.
    pub fn initialize() -> Self {
        let guard = ENGINE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        debug!("geometry session initialized");
        Self {
            models: Vec::new(),
            _engine: guard,
        }
    }
    pub fn try_initialize() -> Result<Self> {
        let guard = match ENGINE.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return Err(Error::SessionActive),
        };
        debug!("geometry session initialized");
        Ok(Self {
            models: Vec::new(),
            _engine: guard,
        })
    }
    /// Adds a model owned by this session.
    pub fn add_model(&mut self, name: &str) -> &mut GeoModel {
        self.models.push(GeoModel::new(name));
        let last = self.models.len() - 1;
        &mut self.models[last]
    }
}

impl Drop for GeoSession {
    fn drop(&mut self) {
        debug!("geometry session finalized ({} model(s))", self.models.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_session_is_rejected_while_first_is_active() {
        let mut session = GeoSession::initialize();
        session.add_model("first");
        assert!(matches!(
            GeoSession::try_initialize(),
            Err(Error::SessionActive)
        ));
        drop(session);
        let _again = GeoSession::initialize();
    }

    #[test]
    fn test_session_is_released_on_error_path() {
        fn failing_build() -> Result<()> {
            let mut session = GeoSession::initialize();
            let model = session.add_model("broken");
            model.add_point(0.0, 0.0, 0.0, -1.0)?;
            Ok(())
        }
        assert!(failing_build().is_err());
        // Would deadlock if the failed build leaked its session.
        let _session = GeoSession::initialize();
    }
}
