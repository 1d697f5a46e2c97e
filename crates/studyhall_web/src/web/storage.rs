use studyhall::config::MonitorConfig;
use studyhall::quality::QualityLevel;

use super::LOCALSTORAGE_MONITOR_KEY;

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

fn local_storage_get_string(key: &str) -> Option<String> {
    local_storage().and_then(|s| s.get_item(key).ok().flatten())
}

fn local_storage_set_string(key: &str, value: &str) {
    if let Some(s) = local_storage() {
        let _ = s.set_item(key, value);
    }
}

/// Missing fields fall back to their defaults; unreadable JSON is ignored.
pub(super) fn load_monitor_settings() -> Option<MonitorConfig> {
    let raw = local_storage_get_string(LOCALSTORAGE_MONITOR_KEY)?;
    MonitorConfig::from_json_str(&raw).ok()
}

pub(super) fn save_monitor_settings(settings: &MonitorConfig) {
    if let Ok(raw) = serde_json::to_string(settings) {
        local_storage_set_string(LOCALSTORAGE_MONITOR_KEY, &raw);
    }
}

/// Stylesheets key animation intensity off `html[data-quality]`.
pub(super) fn apply_quality_to_document(level: QualityLevel) {
    let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Some(el) = doc.document_element() else {
        return;
    };
    let _ = el.set_attribute("data-quality", level.label());
}
