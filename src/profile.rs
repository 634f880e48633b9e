use serde_json::{Map, Value};

use crate::{
    document::{DEFAULT_PROFILE, Document, FORMAT_KEY, is_reserved},
    error::Error,
};

/// Effective settings of profile `name`: the default profile with the named
/// profile's top-level keys laid over it.
///
/// The merge is shallow. A key present in the named profile replaces the
/// default's value wholesale, nested mappings included.
pub fn effective(document: &Document, name: &str) -> Result<Map<String, Value>, Error> {
    if name == FORMAT_KEY {
        return Err(Error::InvalidProfile(
            "your profile can not be named 'format'".to_string(),
        ));
    }
    if is_reserved(name) {
        return Err(Error::InvalidProfile(format!(
            "{name:?} is not a valid profile name"
        )));
    }

    let mut merged = document.default.to_map()?;
    if name == DEFAULT_PROFILE {
        return Ok(merged);
    }

    let overrides = document
        .profile(name)
        .ok_or_else(|| Error::InvalidProfile(format!("{name:?} is not a valid profile name")))?;
    merged.extend(overrides.clone());
    Ok(merged)
}

/// Names accepted by [`effective`], `default` first.
pub fn profile_names(document: &Document) -> Vec<&str> {
    std::iter::once(DEFAULT_PROFILE)
        .chain(document.profiles().map(|(name, _)| name))
        .collect()
}
