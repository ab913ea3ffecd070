//! Platform Classification
//!
//! Picks the presentation mode requested from the proof service.
//! Has no effect on proof semantics.

use serde::{Serialize, Deserialize};

const MOBILE_MARKERS: &[&str] = &[
    "android", "webos", "iphone", "ipad", "ipod", "blackberry", "iemobile", "opera mini",
];

const APPLE_MARKERS: &[&str] = &["mac", "iphone", "ipad", "ipod"];

/// Device class sent to the proof service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Desktop browser: QR code flow.
    Desktop,
    /// Apple mobile device: App Clip flow.
    Ios,
    /// Any other mobile device: Instant App flow.
    Android,
}

impl DeviceType {
    /// Wire name used by the proof service.
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::Desktop => "desktop",
            DeviceType::Ios => "ios",
            DeviceType::Android => "android",
        }
    }

    /// App Clip / Instant App is used on every non-desktop device.
    pub fn use_app_clip(self) -> bool {
        self != DeviceType::Desktop
    }

    /// Mobile flows return to the dapp through a redirect URL.
    pub fn needs_redirect(self) -> bool {
        self != DeviceType::Desktop
    }
}

/// Classify a client from its user agent.
///
/// `has_orientation` reports whether the client exposes a screen
/// orientation, which marks touch devices that hide their user agent.
pub fn classify_device(user_agent: &str, has_orientation: bool) -> DeviceType {
    let ua = user_agent.to_lowercase();
    let is_mobile = has_orientation || MOBILE_MARKERS.iter().any(|m| ua.contains(m));
    if !is_mobile {
        return DeviceType::Desktop;
    }

    if APPLE_MARKERS.iter().any(|m| ua.contains(m)) {
        DeviceType::Ios
    } else {
        DeviceType::Android
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15";
    const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Chrome/120.0 Mobile";
    const MAC_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 Safari/605.1.15";
    const LINUX_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/121.0";

    #[test]
    fn test_desktop_browsers() {
        assert_eq!(classify_device(MAC_UA, false), DeviceType::Desktop);
        assert_eq!(classify_device(LINUX_UA, false), DeviceType::Desktop);
        assert_eq!(classify_device("", false), DeviceType::Desktop);
    }

    #[test]
    fn test_mobile_browsers() {
        assert_eq!(classify_device(IPHONE_UA, false), DeviceType::Ios);
        assert_eq!(classify_device(ANDROID_UA, false), DeviceType::Android);
    }

    #[test]
    fn test_orientation_marks_mobile() {
        // iPad in desktop mode reports a Mac user agent
        assert_eq!(classify_device(MAC_UA, true), DeviceType::Ios);
        assert_eq!(classify_device(LINUX_UA, true), DeviceType::Android);
    }

    #[test]
    fn test_presentation_flags() {
        assert!(!DeviceType::Desktop.use_app_clip());
        assert!(DeviceType::Ios.use_app_clip());
        assert!(DeviceType::Android.needs_redirect());
        assert_eq!(DeviceType::Ios.as_str(), "ios");
    }
}
