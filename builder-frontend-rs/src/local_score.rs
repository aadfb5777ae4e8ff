//! Signed-out fallback: mirror the score into browser localStorage so a
//! guest's points survive a reload. Best-effort only; failures are logged
//! and dropped, never surfaced to the session.

#[cfg(target_arch = "wasm32")]
const SCORE_KEY: &str = "sentence-builder-score";

#[cfg(target_arch = "wasm32")]
pub fn load() -> Option<u32> {
    let storage = web_sys::window()?.local_storage().ok()??;
    match storage.get_item(SCORE_KEY) {
        Ok(value) => value.and_then(|v| v.parse().ok()),
        Err(e) => {
            log::warn!("could not read stored score: {e:?}");
            None
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub fn save(score: u32) {
    let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) else {
        return;
    };
    if let Err(e) = storage.set_item(SCORE_KEY, &score.to_string()) {
        log::warn!("could not persist score: {e:?}");
    }
}

// Off the browser there is no localStorage; a process-wide cell keeps the
// same load/save contract for native tests.
#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::sync::atomic::AtomicI64;

    pub(super) static STORED: AtomicI64 = AtomicI64::new(-1);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load() -> Option<u32> {
    let value = native::STORED.load(std::sync::atomic::Ordering::Relaxed);
    u32::try_from(value).ok()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save(score: u32) {
    native::STORED.store(i64::from(score), std::sync::atomic::Ordering::Relaxed);
}

// The native cell is process-global; tests that read *and* write it take
// this lock so they do not interleave.
#[cfg(all(test, not(target_arch = "wasm32")))]
pub(crate) static STORE_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips() {
        let _lock = STORE_LOCK.lock().unwrap();
        save(40);
        assert_eq!(load(), Some(40));
        save(0);
        assert_eq!(load(), Some(0));
    }
}
