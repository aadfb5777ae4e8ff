//! Unique id minting that works both natively and in the browser.
//! Device ids must survive a round trip through JS and storage, so they are
//! plain UUID strings rather than anything fancier.

#[cfg(not(target_arch = "wasm32"))]
pub fn mint_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Mint a fresh UUID from WebCrypto entropy. Every browser context we can
/// run in has `crypto.getRandomValues`; without it there is no sound way
/// to mint an id at all.
#[cfg(target_arch = "wasm32")]
pub fn mint_id() -> String {
    let crypto = web_sys::window()
        .expect("no window in this context")
        .crypto()
        .expect("WebCrypto unavailable");

    let mut bytes = [0u8; 16];
    crypto
        .get_random_values_with_u8_array(&mut bytes)
        .expect("getRandomValues failed");
    format_uuid(bytes)
}

/// Lay 16 random bytes out as a version 4 UUID.
#[cfg(any(test, target_arch = "wasm32"))]
fn format_uuid(mut b: [u8; 16]) -> String {
    b[6] = (b[6] & 0x0f) | 0x40;
    b[8] = (b[8] & 0x3f) | 0x80;
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        b[0],
        b[1],
        b[2],
        b[3],
        b[4],
        b[5],
        b[6],
        b[7],
        b[8],
        b[9],
        b[10],
        b[11],
        b[12],
        b[13],
        b[14],
        b[15],
    )
}
