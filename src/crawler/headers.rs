//! Browser-like request header profiles
//!
//! Every request carries a plausible header set for a randomly chosen
//! browser, operating system and version. Chromium-based profiles also send
//! the `sec-ch-ua` client hints a real Chromium would.

use rand::seq::SliceRandom;
use rand::Rng;

const CHROMIUM_VERSIONS: &[u32] = &[120, 121, 122, 123, 124, 125, 126];
const FIREFOX_VERSIONS: &[u32] = &[122, 123, 124, 125, 126, 127];

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Chrome,
    Edge,
    Firefox,
}

impl Browser {
    pub fn is_chromium(&self) -> bool {
        matches!(self, Self::Chrome | Self::Edge)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingSystem {
    Windows,
    MacOs,
    Linux,
    Android,
}

impl OperatingSystem {
    fn ua_token(&self) -> &'static str {
        match self {
            Self::Windows => "Windows NT 10.0; Win64; x64",
            Self::MacOs => "Macintosh; Intel Mac OS X 10_15_7",
            Self::Linux => "X11; Linux x86_64",
            Self::Android => "Linux; Android 14; Pixel 7",
        }
    }

    fn platform(&self) -> &'static str {
        match self {
            Self::Windows => "\"Windows\"",
            Self::MacOs => "\"macOS\"",
            Self::Linux => "\"Linux\"",
            Self::Android => "\"Android\"",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Desktop,
    Mobile,
}

/// Identity a request presents to the site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    pub browser: Browser,
    pub os: OperatingSystem,
    pub device: Device,
    /// BCP 47 locale, e.g. `tr-TR`
    pub locale: String,
    pub referer: Option<String>,
}

impl DeviceProfile {
    /// Desktop Chrome on Windows, the most common visitor profile
    pub fn desktop_chrome(locale: &str, referer: Option<&str>) -> Self {
        Self {
            browser: Browser::Chrome,
            os: OperatingSystem::Windows,
            device: Device::Desktop,
            locale: locale.to_string(),
            referer: referer.map(str::to_string),
        }
    }

    /// A random desktop profile; Chrome is weighted the heaviest
    pub fn random(locale: &str, referer: Option<&str>) -> Self {
        let mut rng = rand::thread_rng();
        let browser = *[Browser::Chrome, Browser::Chrome, Browser::Edge, Browser::Firefox]
            .choose(&mut rng)
            .unwrap_or(&Browser::Chrome);
        let os = *[
            OperatingSystem::Windows,
            OperatingSystem::Windows,
            OperatingSystem::MacOs,
            OperatingSystem::Linux,
        ]
        .choose(&mut rng)
        .unwrap_or(&OperatingSystem::Windows);

        Self {
            browser,
            os,
            device: Device::Desktop,
            locale: locale.to_string(),
            referer: referer.map(str::to_string),
        }
    }
}

/// Produces the header set for a device profile
pub trait HeaderProfileGenerator: Send + Sync {
    fn headers(&self, profile: &DeviceProfile) -> Vec<(String, String)>;
}

/// Header generator modeled on current desktop and mobile browsers
#[derive(Debug, Clone, Default)]
pub struct BrowserHeaderGenerator;

impl HeaderProfileGenerator for BrowserHeaderGenerator {
    fn headers(&self, profile: &DeviceProfile) -> Vec<(String, String)> {
        let mut rng = rand::thread_rng();
        let pool = if profile.browser.is_chromium() {
            CHROMIUM_VERSIONS
        } else {
            FIREFOX_VERSIONS
        };
        let version = pool[rng.gen_range(0..pool.len())];
        let mobile = profile.device == Device::Mobile;

        let mut headers = vec![
            ("user-agent".to_string(), user_agent(profile, version)),
            ("accept".to_string(), ACCEPT_HTML.to_string()),
            ("accept-language".to_string(), accept_language(&profile.locale)),
            ("accept-encoding".to_string(), "gzip, br".to_string()),
            ("upgrade-insecure-requests".to_string(), "1".to_string()),
            ("sec-fetch-dest".to_string(), "document".to_string()),
            ("sec-fetch-mode".to_string(), "navigate".to_string()),
            (
                "sec-fetch-site".to_string(),
                if profile.referer.is_some() { "cross-site" } else { "none" }.to_string(),
            ),
        ];

        if profile.browser.is_chromium() {
            headers.push(("sec-ch-ua".to_string(), client_hint_brands(profile.browser, version)));
            headers.push((
                "sec-ch-ua-mobile".to_string(),
                if mobile { "?1" } else { "?0" }.to_string(),
            ));
            headers.push((
                "sec-ch-ua-platform".to_string(),
                profile.os.platform().to_string(),
            ));
        }

        if let Some(referer) = &profile.referer {
            headers.push(("referer".to_string(), referer.clone()));
        }

        headers
    }
}

fn user_agent(profile: &DeviceProfile, version: u32) -> String {
    let os = profile.os.ua_token();
    let mobile = if profile.device == Device::Mobile { "Mobile " } else { "" };

    match profile.browser {
        Browser::Chrome => format!(
            "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{}.0.0.0 {}Safari/537.36",
            os, version, mobile
        ),
        Browser::Edge => format!(
            "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{}.0.0.0 {}Safari/537.36 Edg/{}.0.0.0",
            os, version, mobile, version
        ),
        Browser::Firefox => format!(
            "Mozilla/5.0 ({}; rv:{}.0) Gecko/20100101 Firefox/{}.0",
            os, version, version
        ),
    }
}

fn client_hint_brands(browser: Browser, version: u32) -> String {
    let vendor = match browser {
        Browser::Edge => "Microsoft Edge",
        _ => "Google Chrome",
    };
    format!(
        "\"Chromium\";v=\"{}\", \"{}\";v=\"{}\", \"Not-A.Brand\";v=\"99\"",
        version, vendor, version
    )
}

/// `tr-TR` becomes `tr-TR,tr;q=0.9,en-US;q=0.8,en;q=0.7`
fn accept_language(locale: &str) -> String {
    let language = locale.split(['-', '_']).next().unwrap_or(locale);
    if language.eq_ignore_ascii_case("en") {
        format!("{},en;q=0.9", locale)
    } else {
        format!("{},{};q=0.9,en-US;q=0.8,en;q=0.7", locale, language)
    }
}
