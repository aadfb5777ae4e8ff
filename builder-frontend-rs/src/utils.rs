pub fn set_panic_hook() {
    // When the `console_error_panic_hook` feature is enabled, we can call the
    // `set_panic_hook` function at least once during initialization, and then
    // we will get better error messages if our code ever panics.
    //
    // For more details see
    // https://github.com/rustwasm/console-error-panic-hook#readme
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[cfg(target_arch = "wasm32")]
const DEVICE_ID_KEY: &str = "sentence-builder-device-id";

/// A stable id for this browser/device, minted once and kept in
/// localStorage. Events are sequenced per device, so the id must survive
/// reloads; if storage is unavailable we fall back to a throwaway id and
/// this device's events simply start a fresh sequence.
#[cfg(target_arch = "wasm32")]
pub fn get_or_create_device_id() -> String {
    let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
    let Some(storage) = storage else {
        log::warn!("localStorage unavailable, using a throwaway device id");
        return minted::mint_id();
    };

    if let Ok(Some(existing)) = storage.get_item(DEVICE_ID_KEY) {
        return existing;
    }

    let fresh = minted::mint_id();
    if let Err(e) = storage.set_item(DEVICE_ID_KEY, &fresh) {
        log::warn!("could not persist device id: {e:?}");
    }
    fresh
}

#[cfg(not(target_arch = "wasm32"))]
pub fn get_or_create_device_id() -> String {
    minted::mint_id()
}
