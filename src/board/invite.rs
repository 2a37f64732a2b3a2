//! Invite codes and the links that carry them.

use rand::Rng;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A fresh random alphanumeric invite code.
pub fn generate_invite_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// `{public_url}/workspaces/{id}/join/{code}`
pub fn invite_link(public_url: &str, workspace_id: i64, invite_code: &str) -> String {
    format!(
        "{}/workspaces/{}/join/{}",
        public_url.trim_end_matches('/'),
        workspace_id,
        invite_code
    )
}
