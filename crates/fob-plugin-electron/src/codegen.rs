//! Adapter source generation
//!
//! Every adapter has the same shape: load the real module with the host's
//! synchronous `require`, then re-expose its members as static ES exports.
//!
//! ```text
//! const avoid_parse_require = require;
//! const _M_ = avoid_parse_require("fs");
//! export const readFile = _M_.readFile;
//! ...
//! export default _M_.default || _M_;
//! ```
//!
//! `require` is bound to an intermediate variable before being called. The
//! adapter is fed back into the bundler, and CommonJS detection looks for
//! literal `require("...")` calls; the indirection keeps the load opaque.
//!
//! All functions here are pure. Unknown or empty export lists produce an
//! adapter with only a default export.

use crate::builtins;
use crate::catalog::{self, ProcessEnvironment};
use crate::exports::scan_exports;
use rustc_hash::FxHashSet;
use std::fmt::Write as _;
use tracing::warn;

/// Name of the binding holding the loaded module
const MODULE_BINDING: &str = "_M_";

/// Electron export that needs a worker-safe stand-in
const IPC_RENDERER: &str = "ipcRenderer";

/// Members of `ipcRenderer` (own and inherited from EventEmitter) that the
/// worker stand-in replaces with throwing functions
const IPC_RENDERER_METHODS: &[&str] = &[
    "invoke",
    "postMessage",
    "send",
    "sendSync",
    "sendTo",
    "sendToHost",
    "addListener",
    "emit",
    "eventNames",
    "getMaxListeners",
    "listenerCount",
    "listeners",
    "off",
    "on",
    "once",
    "prependListener",
    "prependOnceListener",
    "rawListeners",
    "removeAllListeners",
    "removeListener",
    "setMaxListeners",
];

/// Names that cannot be bound by `export const` in module (strict) code
const RESERVED_WORDS: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Where the export names of a pre-bundled file come from
#[derive(Debug, Clone, Copy)]
pub enum ExportSource<'a> {
    /// Names already known to the caller
    Names(&'a [String]),
    /// Source text of the bundled file, scanned statically
    Source(&'a str),
}

/// Check whether `name` can be used as an `export const` binding
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first == '_' || first == '$' || first.is_alphabetic()) {
        return false;
    }
    if !chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric()) {
        return false;
    }
    !RESERVED_WORDS.contains(&name)
}

/// Render `value` as a JavaScript string literal
fn js_string(value: &str) -> String {
    // JSON string literals are valid JavaScript string literals
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

fn require_statement(specifier: &str) -> String {
    format!(
        "const avoid_parse_require = require;\nconst {} = avoid_parse_require({});\n",
        MODULE_BINDING,
        js_string(specifier)
    )
}

fn default_export() -> String {
    format!("export default {0}.default || {0};\n", MODULE_BINDING)
}

/// Append one `export const` per usable member name.
///
/// `default` is skipped (it is emitted separately), duplicates are dropped
/// and names that are not valid identifiers are logged and skipped.
fn push_member_exports<'a>(out: &mut String, names: impl IntoIterator<Item = &'a str>) {
    let mut seen = FxHashSet::default();
    for name in names {
        if name == "default" || !seen.insert(name) {
            continue;
        }
        if !is_valid_identifier(name) {
            warn!("[fob-electron] Skipping export '{}': not a valid identifier", name);
            continue;
        }
        let _ = writeln!(out, "export const {0} = {1}.{0};", name, MODULE_BINDING);
    }
}

fn wrap_members<'a>(specifier: &str, names: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = require_statement(specifier);
    out.push('\n');
    push_member_exports(&mut out, names);
    out.push('\n');
    out.push_str(&default_export());
    out
}

/// Adapter for the `electron` module as seen from `env`.
///
/// APIs unavailable in `env` are exported as `undefined` so that static
/// imports of them still link. In a renderer without node integration the
/// module object is empty and a hint is logged to the console. When loaded
/// outside a document (e.g. a Web Worker), `ipcRenderer` is replaced by an
/// object whose methods throw.
pub fn generate_platform_adapter(env: ProcessEnvironment) -> String {
    let mut out = String::new();

    let _ = write!(
        out,
        r#"const {m} = (function requireElectron() {{
  if (typeof require === "undefined") {{
    console.error('If you need to use "electron" in the {env} process, make sure that "nodeIntegration" is enabled in the Main process.');
    return {{}};
  }}
  const avoid_parse_require = require;
  return avoid_parse_require({id});
}})();
"#,
        m = MODULE_BINDING,
        env = env,
        id = js_string(builtins::ELECTRON),
    );

    let exposes_ipc = catalog::find(IPC_RENDERER).is_some_and(|api| api.is_available_in(env));
    if exposes_ipc {
        let methods = IPC_RENDERER_METHODS
            .iter()
            .map(|m| js_string(m))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(
            out,
            r#"
function unavailableIpcRenderer() {{
  const stub = {{}};
  for (const key of [{methods}]) {{
    stub[key] = () => {{
      throw new Error("ipcRenderer is not available in a Web Worker. Forward messages through the window that created the worker.");
    }};
  }}
  return stub;
}}
"#,
            methods = methods,
        );
    }

    out.push('\n');
    for api in catalog::list_all() {
        if api.name == IPC_RENDERER && exposes_ipc {
            let _ = writeln!(
                out,
                "export const {0} = typeof document === \"undefined\" ? unavailableIpcRenderer() : {1}.{0};",
                api.name, MODULE_BINDING
            );
        } else if api.is_available_in(env) {
            let _ = writeln!(out, "export const {0} = {1}.{0};", api.name, MODULE_BINDING);
        } else {
            let _ = writeln!(out, "export const {} = undefined;", api.name);
        }
    }

    out.push('\n');
    out.push_str(&default_export());
    out
}

/// Adapter for a Node.js built-in such as `fs` or `fs/promises`.
///
/// Members are taken from the built-in table for the current host OS, so
/// members that would be `undefined` on this host are left out.
pub fn generate_builtin_adapter(module_id: &str) -> String {
    wrap_members(module_id, builtins::builtin_members(module_id))
}

/// Adapter for an arbitrary CommonJS module with caller-supplied export names
pub fn generate_cjs_wrapper<S: AsRef<str>>(module_id: &str, export_names: &[S]) -> String {
    wrap_members(module_id, export_names.iter().map(AsRef::as_ref))
}

/// Adapter for a file produced by the pre-bundler.
///
/// `relative_path` is the bundle's location relative to the directory the
/// renderer's `require` resolves from; it is normalized to a `./` or `../`
/// specifier so it is never mistaken for a package name.
pub fn generate_prebundled_adapter(relative_path: &str, exports: ExportSource<'_>) -> String {
    let specifier = relative_specifier(relative_path);
    match exports {
        ExportSource::Names(names) => wrap_members(&specifier, names.iter().map(String::as_str)),
        ExportSource::Source(code) => {
            let named = match scan_exports(code) {
                Ok(scanned) => scanned.named,
                Err(e) => {
                    warn!(
                        "[fob-electron] Could not scan exports of {}: {}",
                        relative_path, e
                    );
                    Vec::new()
                }
            };
            wrap_members(&specifier, named.iter().map(String::as_str))
        }
    }
}

/// Turn a relative path into a relative module specifier with `/` separators
pub fn relative_specifier(path: &str) -> String {
    let path = path.replace('\\', "/");
    if path.starts_with("./") || path.starts_with("../") || path == "." || path == ".." {
        path
    } else {
        format!("./{}", path.trim_start_matches('/'))
    }
}
