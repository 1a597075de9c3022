//! Node.js built-in modules known to the plugin
//!
//! The renderer cannot `import` Node.js built-ins directly, so each one is
//! wrapped in a generated adapter. Adapters need the module's member names at
//! generation time; this table provides them without a Node.js process.
//!
//! Names are stored **without** the `node:` prefix.

use phf::phf_map;

/// Built-in modules interceptable from the renderer (without the `node:` prefix).
pub const NODE_BUILTINS: &[&str] = &[
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// The Electron module identifier
pub const ELECTRON: &str = "electron";

const PATH_MEMBERS: &[&str] = &[
    "basename",
    "delimiter",
    "dirname",
    "extname",
    "format",
    "isAbsolute",
    "join",
    "matchesGlob",
    "normalize",
    "parse",
    "posix",
    "relative",
    "resolve",
    "sep",
    "toNamespacedPath",
    "win32",
];

const FS_PROMISES_MEMBERS: &[&str] = &[
    "access",
    "appendFile",
    "chmod",
    "chown",
    "constants",
    "copyFile",
    "cp",
    "glob",
    "lchmod",
    "lchown",
    "link",
    "lstat",
    "lutimes",
    "mkdir",
    "mkdtemp",
    "open",
    "opendir",
    "readFile",
    "readdir",
    "readlink",
    "realpath",
    "rename",
    "rm",
    "rmdir",
    "stat",
    "statfs",
    "symlink",
    "truncate",
    "unlink",
    "utimes",
    "watch",
    "writeFile",
];

const STREAM_PROMISES_MEMBERS: &[&str] = &["finished", "pipeline"];

const TIMERS_PROMISES_MEMBERS: &[&str] = &["scheduler", "setImmediate", "setInterval", "setTimeout"];

const DNS_PROMISES_MEMBERS: &[&str] = &[
    "Resolver",
    "getDefaultResultOrder",
    "getServers",
    "lookup",
    "lookupService",
    "resolve",
    "resolve4",
    "resolve6",
    "resolveAny",
    "resolveCaa",
    "resolveCname",
    "resolveMx",
    "resolveNaptr",
    "resolveNs",
    "resolvePtr",
    "resolveSoa",
    "resolveSrv",
    "resolveTxt",
    "reverse",
    "setDefaultResultOrder",
    "setServers",
];

const ASSERT_MEMBERS: &[&str] = &[
    "AssertionError",
    "CallTracker",
    "deepEqual",
    "deepStrictEqual",
    "doesNotMatch",
    "doesNotReject",
    "doesNotThrow",
    "equal",
    "fail",
    "ifError",
    "match",
    "notDeepEqual",
    "notDeepStrictEqual",
    "notEqual",
    "notStrictEqual",
    "ok",
    "rejects",
    "strict",
    "strictEqual",
    "throws",
];

const UTIL_TYPES_MEMBERS: &[&str] = &[
    "isAnyArrayBuffer",
    "isArgumentsObject",
    "isArrayBuffer",
    "isArrayBufferView",
    "isAsyncFunction",
    "isBigInt64Array",
    "isBigIntObject",
    "isBigUint64Array",
    "isBooleanObject",
    "isBoxedPrimitive",
    "isCryptoKey",
    "isDataView",
    "isDate",
    "isExternal",
    "isFloat32Array",
    "isFloat64Array",
    "isGeneratorFunction",
    "isGeneratorObject",
    "isInt16Array",
    "isInt32Array",
    "isInt8Array",
    "isKeyObject",
    "isMap",
    "isMapIterator",
    "isModuleNamespaceObject",
    "isNativeError",
    "isNumberObject",
    "isPromise",
    "isProxy",
    "isRegExp",
    "isSet",
    "isSetIterator",
    "isSharedArrayBuffer",
    "isStringObject",
    "isSymbolObject",
    "isTypedArray",
    "isUint16Array",
    "isUint32Array",
    "isUint8Array",
    "isUint8ClampedArray",
    "isWeakMap",
    "isWeakSet",
];

const READLINE_PROMISES_MEMBERS: &[&str] = &["Interface", "Readline", "createInterface"];

const STREAM_MEMBERS: &[&str] = &[
    "Duplex",
    "PassThrough",
    "Readable",
    "Stream",
    "Transform",
    "Writable",
    "addAbortSignal",
    "compose",
    "destroy",
    "duplexPair",
    "finished",
    "getDefaultHighWaterMark",
    "isDisturbed",
    "isErrored",
    "isReadable",
    "pipeline",
    "promises",
    "setDefaultHighWaterMark",
];

/// Enumerable own members of each built-in module.
///
/// Mirrors `Object.keys(require(name))` on a recent Node.js release. Modules
/// missing from this map produce default-only adapters.
static BUILTIN_MEMBERS: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "assert" => ASSERT_MEMBERS,
    "assert/strict" => ASSERT_MEMBERS,
    "async_hooks" => &[
        "AsyncLocalStorage", "AsyncResource", "asyncWrapProviders", "createHook",
        "executionAsyncId", "executionAsyncResource", "triggerAsyncId",
    ],
    "buffer" => &[
        "Blob", "Buffer", "File", "INSPECT_MAX_BYTES", "SlowBuffer", "atob", "btoa",
        "constants", "isAscii", "isUtf8", "kMaxLength", "kStringMaxLength",
        "resolveObjectURL", "transcode",
    ],
    "child_process" => &[
        "ChildProcess", "exec", "execFile", "execFileSync", "execSync", "fork",
        "spawn", "spawnSync",
    ],
    "cluster" => &[
        "Worker", "disconnect", "fork", "isMaster", "isPrimary", "isWorker",
        "schedulingPolicy", "settings", "setupMaster", "setupPrimary", "workers",
    ],
    "console" => &[
        "Console", "assert", "clear", "count", "countReset", "debug", "dir", "dirxml",
        "error", "group", "groupCollapsed", "groupEnd", "info", "log", "profile",
        "profileEnd", "table", "time", "timeEnd", "timeLog", "timeStamp", "trace", "warn",
    ],
    "crypto" => &[
        "Certificate", "Cipher", "Cipheriv", "Decipher", "Decipheriv", "DiffieHellman",
        "DiffieHellmanGroup", "ECDH", "Hash", "Hmac", "KeyObject", "Sign", "Verify",
        "X509Certificate", "checkPrime", "checkPrimeSync", "constants", "createCipheriv",
        "createDecipheriv", "createDiffieHellman", "createDiffieHellmanGroup", "createECDH",
        "createHash", "createHmac", "createPrivateKey", "createPublicKey",
        "createSecretKey", "createSign", "createVerify", "diffieHellman", "generateKey",
        "generateKeyPair", "generateKeyPairSync", "generateKeySync", "generatePrime",
        "generatePrimeSync", "getCipherInfo", "getCiphers", "getCurves", "getDiffieHellman",
        "getFips", "getHashes", "getRandomValues", "hash", "hkdf", "hkdfSync", "pbkdf2",
        "pbkdf2Sync", "privateDecrypt", "privateEncrypt", "publicDecrypt", "publicEncrypt",
        "randomBytes", "randomFill", "randomFillSync", "randomInt", "randomUUID",
        "scrypt", "scryptSync", "secureHeapUsed", "setEngine", "setFips", "sign",
        "subtle", "timingSafeEqual", "verify", "webcrypto",
    ],
    "dgram" => &["Socket", "createSocket"],
    "diagnostics_channel" => &[
        "Channel", "channel", "hasSubscribers", "subscribe", "tracingChannel", "unsubscribe",
    ],
    "dns" => &[
        "ADDRCONFIG", "ALL", "Resolver", "V4MAPPED", "getDefaultResultOrder", "getServers",
        "lookup", "lookupService", "promises", "resolve", "resolve4", "resolve6",
        "resolveAny", "resolveCaa", "resolveCname", "resolveMx", "resolveNaptr",
        "resolveNs", "resolvePtr", "resolveSoa", "resolveSrv", "resolveTxt", "reverse",
        "setDefaultResultOrder", "setServers",
    ],
    "dns/promises" => DNS_PROMISES_MEMBERS,
    "domain" => &["Domain", "active", "create", "createDomain"],
    "events" => &[
        "EventEmitter", "EventEmitterAsyncResource", "addAbortListener", "captureRejectionSymbol",
        "captureRejections", "defaultMaxListeners", "errorMonitor", "getEventListeners",
        "getMaxListeners", "init", "listenerCount", "on", "once", "setMaxListeners",
        "usingDomains",
    ],
    "fs" => &[
        "Dir", "Dirent", "F_OK", "FileReadStream", "FileWriteStream", "R_OK", "ReadStream",
        "Stats", "W_OK", "WriteStream", "X_OK", "access", "accessSync", "appendFile",
        "appendFileSync", "chmod", "chmodSync", "chown", "chownSync", "close", "closeSync",
        "constants", "copyFile", "copyFileSync", "cp", "cpSync", "createReadStream",
        "createWriteStream", "exists", "existsSync", "fchmod", "fchmodSync", "fchown",
        "fchownSync", "fdatasync", "fdatasyncSync", "fstat", "fstatSync", "fsync",
        "fsyncSync", "ftruncate", "ftruncateSync", "futimes", "futimesSync", "glob",
        "globSync", "lchmod", "lchmodSync", "lchown", "lchownSync", "link", "linkSync",
        "lstat", "lstatSync", "lutimes", "lutimesSync", "mkdir", "mkdirSync", "mkdtemp",
        "mkdtempSync", "open", "openAsBlob", "openSync", "opendir", "opendirSync",
        "promises", "read", "readFile", "readFileSync", "readSync", "readdir",
        "readdirSync", "readlink", "readlinkSync", "readv", "readvSync", "realpath",
        "realpathSync", "rename", "renameSync", "rm", "rmSync", "rmdir", "rmdirSync",
        "stat", "statSync", "statfs", "statfsSync", "symlink", "symlinkSync", "truncate",
        "truncateSync", "unlink", "unlinkSync", "unwatchFile", "utimes", "utimesSync",
        "watch", "watchFile", "write", "writeFile", "writeFileSync", "writeSync",
        "writev", "writevSync",
    ],
    "fs/promises" => FS_PROMISES_MEMBERS,
    "http" => &[
        "Agent", "ClientRequest", "IncomingMessage", "METHODS", "OutgoingMessage",
        "STATUS_CODES", "Server", "ServerResponse", "createServer", "get", "globalAgent",
        "maxHeaderSize", "request", "setMaxIdleHTTPParsers", "validateHeaderName",
        "validateHeaderValue",
    ],
    "http2" => &[
        "Http2ServerRequest", "Http2ServerResponse", "connect", "constants",
        "createSecureServer", "createServer", "getDefaultSettings", "getPackedSettings",
        "getUnpackedSettings", "sensitiveHeaders",
    ],
    "https" => &["Agent", "Server", "createServer", "get", "globalAgent", "request"],
    "inspector" => &["Network", "Session", "close", "console", "open", "url", "waitForDebugger"],
    "module" => &[
        "Module", "SourceMap", "builtinModules", "createRequire", "enableCompileCache",
        "findSourceMap", "isBuiltin", "register", "syncBuiltinESMExports",
    ],
    "net" => &[
        "BlockList", "Server", "Socket", "SocketAddress", "Stream", "connect",
        "createConnection", "createServer", "getDefaultAutoSelectFamily",
        "getDefaultAutoSelectFamilyAttemptTimeout", "isIP", "isIPv4", "isIPv6",
        "setDefaultAutoSelectFamily", "setDefaultAutoSelectFamilyAttemptTimeout",
    ],
    "os" => &[
        "EOL", "arch", "availableParallelism", "constants", "cpus", "devNull", "endianness",
        "freemem", "getPriority", "homedir", "hostname", "loadavg", "machine",
        "networkInterfaces", "platform", "release", "setPriority", "tmpdir", "totalmem",
        "type", "uptime", "userInfo", "version",
    ],
    "path" => PATH_MEMBERS,
    "path/posix" => PATH_MEMBERS,
    "path/win32" => PATH_MEMBERS,
    "perf_hooks" => &[
        "Performance", "PerformanceEntry", "PerformanceMark", "PerformanceMeasure",
        "PerformanceObserver", "PerformanceObserverEntryList", "PerformanceResourceTiming",
        "constants", "createHistogram", "monitorEventLoopDelay", "performance",
    ],
    "process" => &[
        "abort", "arch", "argv", "argv0", "chdir", "config", "cpuUsage", "cwd", "emitWarning",
        "env", "execArgv", "execPath", "exit", "exitCode", "features", "getegid", "geteuid",
        "getgid", "getgroups", "getuid", "hrtime", "kill", "memoryUsage", "nextTick", "pid",
        "platform", "ppid", "release", "resourceUsage", "setegid", "seteuid", "setgid",
        "setgroups", "setuid", "title", "umask", "uptime", "version", "versions",
    ],
    "punycode" => &["decode", "encode", "toASCII", "toUnicode", "ucs2", "version"],
    "querystring" => &["decode", "encode", "escape", "parse", "stringify", "unescape", "unescapeBuffer"],
    "readline" => &[
        "Interface", "clearLine", "clearScreenDown", "createInterface", "cursorTo",
        "emitKeypressEvents", "moveCursor", "promises",
    ],
    "readline/promises" => READLINE_PROMISES_MEMBERS,
    "repl" => &["REPLServer", "REPL_MODE_SLOPPY", "REPL_MODE_STRICT", "builtinModules", "start", "writer"],
    "stream" => STREAM_MEMBERS,
    "stream/consumers" => &["arrayBuffer", "blob", "buffer", "json", "text"],
    "stream/promises" => STREAM_PROMISES_MEMBERS,
    "stream/web" => &[
        "ByteLengthQueuingStrategy", "CompressionStream", "CountQueuingStrategy",
        "DecompressionStream", "ReadableByteStreamController", "ReadableStream",
        "ReadableStreamBYOBReader", "ReadableStreamBYOBRequest",
        "ReadableStreamDefaultController", "ReadableStreamDefaultReader",
        "TextDecoderStream", "TextEncoderStream", "TransformStream",
        "TransformStreamDefaultController", "WritableStream",
        "WritableStreamDefaultController", "WritableStreamDefaultWriter",
    ],
    "string_decoder" => &["StringDecoder"],
    "sys" => &[
        "TextDecoder", "TextEncoder", "callbackify", "debuglog", "deprecate", "format",
        "formatWithOptions", "inherits", "inspect", "isDeepStrictEqual", "promisify", "types",
    ],
    "timers" => &[
        "clearImmediate", "clearInterval", "clearTimeout", "promises", "setImmediate",
        "setInterval", "setTimeout",
    ],
    "timers/promises" => TIMERS_PROMISES_MEMBERS,
    "tls" => &[
        "CLIENT_RENEG_LIMIT", "CLIENT_RENEG_WINDOW", "DEFAULT_CIPHERS", "DEFAULT_ECDH_CURVE",
        "DEFAULT_MAX_VERSION", "DEFAULT_MIN_VERSION", "SecureContext", "Server", "TLSSocket",
        "checkServerIdentity", "connect", "createSecureContext", "createServer",
        "getCiphers", "rootCertificates",
    ],
    "trace_events" => &["createTracing", "getEnabledCategories"],
    "tty" => &["ReadStream", "WriteStream", "isatty"],
    "url" => &[
        "URL", "URLSearchParams", "domainToASCII", "domainToUnicode", "fileURLToPath",
        "format", "parse", "pathToFileURL", "resolve", "resolveObject", "urlToHttpOptions",
    ],
    "util" => &[
        "MIMEParams", "MIMEType", "TextDecoder", "TextEncoder", "aborted", "callbackify",
        "debug", "debuglog", "deprecate", "format", "formatWithOptions", "getSystemErrorMap",
        "getSystemErrorName", "inherits", "inspect", "isDeepStrictEqual", "parseArgs",
        "parseEnv", "promisify", "stripVTControlCharacters", "styleText", "toUSVString",
        "transferableAbortController", "transferableAbortSignal", "types",
    ],
    "util/types" => UTIL_TYPES_MEMBERS,
    "v8" => &[
        "Deserializer", "GCProfiler", "Serializer", "cachedDataVersionTag",
        "getHeapCodeStatistics", "getHeapSnapshot", "getHeapSpaceStatistics",
        "getHeapStatistics", "promiseHooks", "queryObjects", "setFlagsFromString",
        "setHeapSnapshotNearHeapLimit", "startupSnapshot", "stopCoverage",
        "takeCoverage", "writeHeapSnapshot",
    ],
    "vm" => &[
        "Script", "compileFunction", "constants", "createContext", "createScript",
        "isContext", "measureMemory", "runInContext", "runInNewContext", "runInThisContext",
    ],
    "wasi" => &["WASI"],
    "worker_threads" => &[
        "BroadcastChannel", "MessageChannel", "MessagePort", "SHARE_ENV", "Worker",
        "getEnvironmentData", "isMainThread", "markAsUntransferable", "markAsUncloneable",
        "moveMessagePortToContext", "parentPort", "receiveMessageOnPort", "resourceLimits",
        "setEnvironmentData", "threadId", "workerData",
    ],
    "zlib" => &[
        "BrotliCompress", "BrotliDecompress", "Deflate", "DeflateRaw", "Gunzip", "Gzip",
        "Inflate", "InflateRaw", "Unzip", "brotliCompress", "brotliCompressSync",
        "brotliDecompress", "brotliDecompressSync", "codes", "constants", "crc32",
        "createBrotliCompress", "createBrotliDecompress", "createDeflate",
        "createDeflateRaw", "createGunzip", "createGzip", "createInflate",
        "createInflateRaw", "createUnzip", "deflate", "deflateRaw", "deflateRawSync",
        "deflateSync", "gunzip", "gunzipSync", "gzip", "gzipSync", "inflate", "inflateRaw",
        "inflateRawSync", "inflateSync", "unzip", "unzipSync",
    ],
};

/// Members whose value is `undefined` unless Node.js runs on one of the listed
/// host operating systems (`std::env::consts::OS` names).
static HOST_SPECIFIC_MEMBERS: &[(&str, &str, &[&str])] = &[
    ("fs", "lchmod", &["macos"]),
    ("fs", "lchmodSync", &["macos"]),
    ("fs/promises", "lchmod", &["macos"]),
    ("process", "getegid", UNIX_HOSTS),
    ("process", "geteuid", UNIX_HOSTS),
    ("process", "getgid", UNIX_HOSTS),
    ("process", "getgroups", UNIX_HOSTS),
    ("process", "getuid", UNIX_HOSTS),
    ("process", "setegid", UNIX_HOSTS),
    ("process", "seteuid", UNIX_HOSTS),
    ("process", "setgid", UNIX_HOSTS),
    ("process", "setgroups", UNIX_HOSTS),
    ("process", "setuid", UNIX_HOSTS),
];

const UNIX_HOSTS: &[&str] = &[
    "linux", "macos", "freebsd", "openbsd", "netbsd", "dragonfly", "solaris", "illumos", "android",
];

/// Check whether `name` (without the `node:` prefix) is a known built-in
pub fn is_builtin(name: &str) -> bool {
    NODE_BUILTINS.contains(&name)
}

/// Bare name of a platform-provided specifier: `electron` or a built-in,
/// with or without the `node:` scheme
pub fn normalize_platform(specifier: &str) -> Option<&str> {
    let name = specifier.strip_prefix("node:").unwrap_or(specifier);
    (name == ELECTRON || is_builtin(name)).then_some(name)
}

/// Member names of a built-in as they exist on the given host OS
pub fn builtin_members_for_host(name: &str, host_os: &str) -> Vec<&'static str> {
    let Some(members) = BUILTIN_MEMBERS.get(name) else {
        return Vec::new();
    };

    members
        .iter()
        .copied()
        .filter(|member| is_present_on_host(name, member, host_os))
        .collect()
}

/// Member names of a built-in on the host running this build
pub fn builtin_members(name: &str) -> Vec<&'static str> {
    builtin_members_for_host(name, std::env::consts::OS)
}

fn is_present_on_host(module: &str, member: &str, host_os: &str) -> bool {
    HOST_SPECIFIC_MEMBERS
        .iter()
        .find(|(m, name, _)| *m == module && *name == member)
        .map(|(_, _, hosts)| hosts.contains(&host_os))
        .unwrap_or(true)
}

/// Every identifier the plugin treats as platform-provided: `electron` plus
/// each built-in in bare and `node:` form.
///
/// Used as the external list for pre-bundling and for the host's CommonJS
/// ignore list.
pub fn platform_module_ids() -> Vec<String> {
    let mut ids = Vec::with_capacity(NODE_BUILTINS.len() * 2 + 1);
    ids.push(ELECTRON.to_string());
    for name in NODE_BUILTINS {
        ids.push((*name).to_string());
        ids.push(format!("node:{}", name));
    }
    ids
}
