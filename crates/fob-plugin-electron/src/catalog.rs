//! Electron API catalog
//!
//! Static table of the members exported by the `electron` module, each tagged
//! with the process types in which Electron actually provides it. The adapter
//! generator reads this table to decide which exports are bound to the real
//! module and which are bound to `undefined`.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Electron process type an API can be used from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessEnvironment {
    /// Main process (Node.js context that owns windows)
    Main,
    /// Renderer process (web page with node integration)
    #[default]
    Renderer,
    /// Utility process (`utilityProcess.fork`)
    Utility,
}

impl ProcessEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Renderer => "renderer",
            Self::Utility => "utility",
        }
    }
}

impl std::fmt::Display for ProcessEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named member of the `electron` module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiDescriptor {
    /// Export name as seen by `import { name } from "electron"`
    pub name: &'static str,
    /// Process types providing this API (never empty)
    pub environments: &'static [ProcessEnvironment],
    /// Whether Electron has deprecated the API
    pub deprecated: bool,
}

impl ApiDescriptor {
    const fn new(name: &'static str, environments: &'static [ProcessEnvironment]) -> Self {
        Self {
            name,
            environments,
            deprecated: false,
        }
    }

    const fn deprecated(name: &'static str, environments: &'static [ProcessEnvironment]) -> Self {
        Self {
            name,
            environments,
            deprecated: true,
        }
    }

    /// Check whether the API is usable from `env`
    pub fn is_available_in(&self, env: ProcessEnvironment) -> bool {
        self.environments.contains(&env)
    }

    /// True when the API exists only in the main process
    pub fn is_main_only(&self) -> bool {
        matches!(self.environments, [ProcessEnvironment::Main])
    }
}

use ProcessEnvironment::{Main, Renderer, Utility};

const MAIN: &[ProcessEnvironment] = &[Main];
const RENDERER: &[ProcessEnvironment] = &[Renderer];
const UTILITY: &[ProcessEnvironment] = &[Utility];
const MAIN_RENDERER: &[ProcessEnvironment] = &[Main, Renderer];
const MAIN_UTILITY: &[ProcessEnvironment] = &[Main, Utility];

/// Ordered list of every `electron` export the adapter knows about
static ELECTRON_APIS: &[ApiDescriptor] = &[
    // Shared between main and renderer
    ApiDescriptor::new("clipboard", MAIN_RENDERER),
    ApiDescriptor::new("crashReporter", MAIN_RENDERER),
    ApiDescriptor::new("nativeImage", MAIN_RENDERER),
    ApiDescriptor::new("shell", MAIN_RENDERER),
    // Renderer only
    ApiDescriptor::new("contextBridge", RENDERER),
    ApiDescriptor::new("ipcRenderer", RENDERER),
    ApiDescriptor::new("webFrame", RENDERER),
    ApiDescriptor::new("webUtils", RENDERER),
    // Utility process
    ApiDescriptor::new("parentPort", UTILITY),
    ApiDescriptor::new("net", MAIN_UTILITY),
    ApiDescriptor::new("systemPreferences", MAIN_UTILITY),
    // Main only
    ApiDescriptor::new("app", MAIN),
    ApiDescriptor::new("autoUpdater", MAIN),
    ApiDescriptor::new("BaseWindow", MAIN),
    ApiDescriptor::deprecated("BrowserView", MAIN),
    ApiDescriptor::new("BrowserWindow", MAIN),
    ApiDescriptor::new("contentTracing", MAIN),
    ApiDescriptor::new("desktopCapturer", MAIN),
    ApiDescriptor::new("dialog", MAIN),
    ApiDescriptor::new("globalShortcut", MAIN),
    ApiDescriptor::new("ImageView", MAIN),
    ApiDescriptor::new("inAppPurchase", MAIN),
    ApiDescriptor::new("ipcMain", MAIN),
    ApiDescriptor::new("Menu", MAIN),
    ApiDescriptor::new("MenuItem", MAIN),
    ApiDescriptor::new("MessageChannelMain", MAIN),
    ApiDescriptor::new("MessagePortMain", MAIN),
    ApiDescriptor::new("nativeTheme", MAIN),
    ApiDescriptor::new("netLog", MAIN),
    ApiDescriptor::new("Notification", MAIN),
    ApiDescriptor::new("powerMonitor", MAIN),
    ApiDescriptor::new("powerSaveBlocker", MAIN),
    ApiDescriptor::new("protocol", MAIN),
    ApiDescriptor::new("pushNotifications", MAIN),
    ApiDescriptor::new("safeStorage", MAIN),
    ApiDescriptor::new("screen", MAIN),
    ApiDescriptor::new("session", MAIN),
    ApiDescriptor::new("ShareMenu", MAIN),
    ApiDescriptor::new("TouchBar", MAIN),
    ApiDescriptor::new("Tray", MAIN),
    ApiDescriptor::new("utilityProcess", MAIN),
    ApiDescriptor::new("View", MAIN),
    ApiDescriptor::new("webContents", MAIN),
    ApiDescriptor::new("WebContentsView", MAIN),
    ApiDescriptor::new("webFrameMain", MAIN),
];

/// All known `electron` APIs, in declaration order
pub fn list_all() -> &'static [ApiDescriptor] {
    ELECTRON_APIS
}

/// Names of APIs that only exist in the main process
pub fn main_only_names() -> FxHashSet<&'static str> {
    ELECTRON_APIS
        .iter()
        .filter(|api| api.is_main_only())
        .map(|api| api.name)
        .collect()
}

/// Look up a single API by export name
pub fn find(name: &str) -> Option<&'static ApiDescriptor> {
    ELECTRON_APIS.iter().find(|api| api.name == name)
}
