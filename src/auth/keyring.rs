use std::collections::HashMap;

use super::Session;

pub(crate) const SERVICE_NAME: &str = "doflow";

async fn open() -> Result<oo7::Keyring, String> {
    oo7::Keyring::new()
        .await
        .map_err(|e| format!("Failed to connect to keyring: {}", e))
}

fn attributes(server: &str) -> HashMap<&'static str, &str> {
    let mut attrs = HashMap::new();
    attrs.insert("service", SERVICE_NAME);
    attrs.insert("server", server);
    attrs
}

/// Store the signed-in session in the system keyring via Secret Service.
pub async fn store_session(server: &str, session: &Session) -> Result<(), String> {
    let keyring = open().await?;

    let secret = serde_json::to_string(session)
        .map_err(|e| format!("Failed to serialize session: {}", e))?;

    keyring
        .create_item(
            &format!("DoFlow session ({})", server),
            &attributes(server),
            secret.as_bytes(),
            true, // replace existing
        )
        .await
        .map_err(|e| format!("Failed to store session: {}", e))?;

    Ok(())
}

/// Load the stored session, if any. A session written by an older build that
/// no longer parses is dropped rather than surfaced as an error.
pub async fn load_session(server: &str) -> Result<Option<Session>, String> {
    let keyring = open().await?;

    let items = keyring
        .search_items(&attributes(server))
        .await
        .map_err(|e| format!("Failed to search keyring: {}", e))?;

    let Some(item) = items.first() else {
        return Ok(None);
    };

    let secret_bytes = item
        .secret()
        .await
        .map_err(|e| format!("Failed to read secret: {}", e))?;
    let secret = String::from_utf8(secret_bytes.to_vec())
        .map_err(|e| format!("Invalid UTF-8 in secret: {}", e))?;

    match serde_json::from_str(&secret) {
        Ok(session) => Ok(Some(session)),
        Err(e) => {
            log::warn!("Stored session is unreadable, ignoring it: {}", e);
            Ok(None)
        }
    }
}

/// Delete every stored session for `server` from the system keyring.
pub async fn delete_session(server: &str) -> Result<(), String> {
    let keyring = open().await?;

    let items = keyring
        .search_items(&attributes(server))
        .await
        .map_err(|e| format!("Failed to search keyring: {}", e))?;

    for item in items {
        item.delete()
            .await
            .map_err(|e| format!("Failed to delete session: {}", e))?;
    }

    Ok(())
}
