//! Signed session cookies: `<uuid>.<hex hmac-sha256(uuid)>`.

use std::time::Duration;

use axum::http::{header::COOKIE, HeaderMap};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(id: &Uuid, secret: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(id.as_hyphenated().to_string().as_bytes());
    Some(mac)
}

/// Cookie value for a session id, or `None` if the secret cannot key an HMAC.
pub fn sign_session_id(id: &Uuid, secret: &[u8]) -> Option<String> {
    let mac = mac_for(id, secret)?;
    Some(format!("{}.{}", id.as_hyphenated(), hex::encode(mac.finalize().into_bytes())))
}

/// Session id carried by a cookie value, if its signature checks out.
pub fn verify_session_id(value: &str, secret: &[u8]) -> Option<Uuid> {
    let (id, signature) = value.split_once('.')?;
    let id = Uuid::parse_str(id).ok()?;
    let signature = hex::decode(signature).ok()?;
    mac_for(&id, secret)?.verify_slice(&signature).ok()?;
    Some(id)
}

pub fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub fn set_cookie_header(name: &str, value: &str, max_age: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name,
        value,
        max_age.as_secs()
    )
}
