use sha2::{Digest, Sha256};

const STABLE_ID_LEN: usize = 16;

/// A stable session id derived from `tab_id` and `workspace`: SHA-256 of
/// `"{tab_id}:{workspace}"`, hex-encoded and truncated to 16 characters.
pub fn stable_session_id(tab_id: &str, workspace: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tab_id.as_bytes());
    hasher.update(b":");
    hasher.update(workspace.as_bytes());
    let digest = hasher.finalize();
    hex_encode(&digest)[..STABLE_ID_LEN].to_string()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_id_is_deterministic() {
        let a = stable_session_id("tab1", "/home/user/project");
        let b = stable_session_id("tab1", "/home/user/project");
        assert_eq!(a, b);
        assert_eq!(a.len(), STABLE_ID_LEN);
    }

    #[test]
    fn different_inputs_produce_different_ids() {
        let a = stable_session_id("tab1", "/home/user/project");
        let b = stable_session_id("tab2", "/home/user/project");
        assert_ne!(a, b);
    }
}
