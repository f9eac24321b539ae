use crate::app::*;

use uuid::Uuid;

/// Key of the anonymous identity in the backing storage.
pub const USER_KEY: &str = "feelmeter_user";

/// The identity to vote as.
///
/// An explicitly configured identity wins. Otherwise the identity stored on a previous run
/// is reused, and on the very first run a new one is generated and stored.
pub fn resolve_user<S: KeyValueStore>(storage: &mut S, configured: Option<&str>) -> AppResult<String> {
    if let Some(u) = configured.map(str::trim).filter(|u| !u.is_empty()) {
        return Ok(u.to_string());
    }
    if let Some(u) = storage.get(USER_KEY).filter(|u| !u.trim().is_empty()) {
        debug!("resolve_user: reusing {}", u);
        return Ok(u);
    }
    let fresh = format!("user_{}", Uuid::new_v4().simple());
    storage
        .set(USER_KEY, &fresh)
        .context(SavingIdentitySnafu {})?;
    info!("resolve_user: generated identity {}", fresh);
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_stable() {
        let mut storage = MemoryStorage::new();
        let first = resolve_user(&mut storage, None).unwrap();
        assert!(first.starts_with("user_"));
        assert_eq!(resolve_user(&mut storage, None).unwrap(), first);
        assert_eq!(storage.get(USER_KEY), Some(first));
    }

    #[test]
    fn configured_identity_is_not_stored() {
        let mut storage = MemoryStorage::new();
        assert_eq!(resolve_user(&mut storage, Some(" alice ")).unwrap(), "alice");
        assert!(storage.is_empty());
    }
}
